use anyhow::Result;
use rust_decimal::Decimal;

use super::{scale_daily, BudgetEstimator, EstimateRequest};
use crate::models::TripType;

/// Mid-range daily cost per traveler (USD) for common destinations.
const DAILY_COSTS: &[(&str, i64)] = &[
    ("australia", 180),
    ("brazil", 90),
    ("canada", 160),
    ("china", 90),
    ("france", 170),
    ("germany", 150),
    ("greece", 120),
    ("india", 50),
    ("indonesia", 60),
    ("italy", 160),
    ("japan", 150),
    ("mexico", 90),
    ("netherlands", 160),
    ("new zealand", 170),
    ("norway", 220),
    ("peru", 70),
    ("portugal", 110),
    ("south korea", 120),
    ("spain", 130),
    ("switzerland", 250),
    ("thailand", 60),
    ("turkey", 80),
    ("united kingdom", 180),
    ("united states", 200),
    ("vietnam", 50),
];

const DEFAULT_DAILY_COST: i64 = 120;

/// Built-in heuristic. Never fails for a well-formed request.
pub(crate) struct LocalEstimator;

impl LocalEstimator {
    pub(crate) fn daily_cost(destination: &str) -> Decimal {
        let lower = destination.trim().to_lowercase();
        let cost = DAILY_COSTS
            .iter()
            .find(|(country, _)| *country == lower)
            .map(|(_, cost)| *cost)
            .unwrap_or(DEFAULT_DAILY_COST);
        Decimal::from(cost)
    }

    /// Spending multiplier per trip style.
    pub(crate) fn factor(trip_type: TripType) -> Decimal {
        match trip_type {
            TripType::Backpacking => Decimal::new(6, 1),
            TripType::Leisure => Decimal::ONE,
            TripType::Family => Decimal::new(13, 1),
            TripType::Business => Decimal::new(16, 1),
            TripType::Luxury => Decimal::new(25, 1),
        }
    }
}

impl BudgetEstimator for LocalEstimator {
    fn name(&self) -> &str {
        "built-in"
    }

    fn estimate(&self, request: &EstimateRequest) -> Result<Decimal> {
        let daily = Self::daily_cost(&request.destination) * Self::factor(request.trip_type);
        scale_daily(daily, request)
    }
}
