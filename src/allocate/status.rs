use rust_decimal::Decimal;

/// Differences smaller than this many percent count as a match.
const MATCH_BAND: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Undetermined {
    /// No recommendation yet, usually because the trip has no dates.
    NoDates,
    NoBudget,
}

/// How the entered budget compares to the recommended one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStatus {
    Undetermined(Undetermined),
    Matched,
    /// Percent above the recommendation, one decimal place.
    Above(Decimal),
    /// Percent below the recommendation, one decimal place.
    Below(Decimal),
}

impl BudgetStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Undetermined(_) => "Undetermined",
            Self::Matched => "On target",
            Self::Above(_) => "Above",
            Self::Below(_) => "Below",
        }
    }
}

impl std::fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Undetermined(Undetermined::NoDates) => {
                write!(f, "Set trip dates to calculate a recommendation")
            }
            Self::Undetermined(Undetermined::NoBudget) => write!(f, "Enter your budget"),
            Self::Matched => write!(f, "Budget matches the recommendation"),
            Self::Above(pct) => write!(f, "{pct:.1}% above the recommendation"),
            Self::Below(pct) => write!(f, "{pct:.1}% below the recommendation"),
        }
    }
}

/// Classify `total` against `recommended`.
pub fn status_for_budget(total: Decimal, recommended: Decimal) -> BudgetStatus {
    if recommended.is_zero() {
        return BudgetStatus::Undetermined(Undetermined::NoDates);
    }
    if total.is_zero() {
        return BudgetStatus::Undetermined(Undetermined::NoBudget);
    }

    let difference = total
        .checked_sub(recommended)
        .and_then(|d| d.checked_div(recommended))
        .and_then(|d| d.checked_mul(Decimal::ONE_HUNDRED));
    let difference = match difference {
        Some(d) => d,
        // Only reachable near Decimal::MAX; direction is still known.
        None if total > recommended => Decimal::MAX,
        None => Decimal::MIN,
    };

    if difference.abs() < MATCH_BAND {
        BudgetStatus::Matched
    } else if difference > Decimal::ZERO {
        BudgetStatus::Above(difference.abs().round_dp(1))
    } else {
        BudgetStatus::Below(difference.abs().round_dp(1))
    }
}
