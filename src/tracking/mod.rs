use std::collections::HashMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::allocate::{amount_for_category, AllocationError};
use crate::models::{CategorySet, Expense};

/// Spending ratio at which a category is flagged.
pub(crate) const WARNING_RATIO: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UsageLevel {
    Ok,
    Warning,
    Exceeded,
}

impl UsageLevel {
    fn for_spending(allocated: Decimal, spent: Decimal, ratio: f64) -> Self {
        if allocated <= Decimal::ZERO {
            return if spent > Decimal::ZERO {
                Self::Exceeded
            } else {
                Self::Ok
            };
        }
        if spent > allocated {
            Self::Exceeded
        } else if ratio >= WARNING_RATIO {
            Self::Warning
        } else {
            Self::Ok
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CategoryUsage {
    pub(crate) key: String,
    pub(crate) label: String,
    pub(crate) allocated: Decimal,
    pub(crate) spent: Decimal,
    /// spent / allocated; 0 when nothing is allocated.
    pub(crate) ratio: f64,
    pub(crate) level: UsageLevel,
}

impl CategoryUsage {
    pub(crate) fn remaining(&self) -> Decimal {
        self.allocated - self.spent
    }
}

/// Spending per category against its share of `total_budget`, in set
/// order. Expenses filed under keys the set does not know count against the
/// buffer.
pub(crate) fn usage_report(
    set: &CategorySet,
    total_budget: Decimal,
    expenses: &[Expense],
) -> Result<Vec<CategoryUsage>, AllocationError> {
    let buffer_key = set.buffer().key.as_str();
    let mut spent: HashMap<&str, Decimal> = HashMap::new();
    for expense in expenses {
        let key = if set.contains(&expense.category_key) {
            expense.category_key.as_str()
        } else {
            buffer_key
        };
        let total = spent.entry(key).or_default();
        *total = total
            .checked_add(expense.amount)
            .ok_or(AllocationError::AmountOverflow)?;
    }

    set.iter()
        .map(|cat| {
            let allocated = amount_for_category(set, &cat.key, total_budget)?;
            let spent = spent.get(cat.key.as_str()).copied().unwrap_or_default();
            let ratio = if allocated > Decimal::ZERO {
                spent
                    .checked_div(allocated)
                    .ok_or(AllocationError::AmountOverflow)?
                    .to_f64()
                    .unwrap_or(0.0)
            } else {
                0.0
            };
            Ok(CategoryUsage {
                key: cat.key.clone(),
                label: cat.label.clone(),
                allocated,
                spent,
                ratio,
                level: UsageLevel::for_spending(allocated, spent, ratio),
            })
        })
        .collect()
}

/// Sum of all expenses, saturating at `Decimal::MAX`.
pub(crate) fn total_spent(expenses: &[Expense]) -> Decimal {
    expenses
        .iter()
        .try_fold(Decimal::ZERO, |acc, e| acc.checked_add(e.amount))
        .unwrap_or(Decimal::MAX)
}

/// Categories at warning level or worse, most overspent first.
pub(crate) fn alerts(report: &[CategoryUsage]) -> Vec<&CategoryUsage> {
    let mut flagged: Vec<&CategoryUsage> = report
        .iter()
        .filter(|u| u.level != UsageLevel::Ok)
        .collect();
    flagged.sort_by(|a, b| b.ratio.total_cmp(&a.ratio));
    flagged
}

#[cfg(test)]
mod tests;
