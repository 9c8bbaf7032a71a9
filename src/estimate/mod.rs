//! Recommended-budget estimation.
//!
//! A user-maintained cost table is preferred; when it is missing or has no
//! row for the destination, the built-in heuristic answers instead.

mod local;
mod table;

use anyhow::Result;
use rust_decimal::Decimal;
use tracing::warn;

use crate::models::{Trip, TripType};

pub(crate) use local::LocalEstimator;
pub(crate) use table::TableEstimator;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EstimateRequest {
    pub(crate) destination: String,
    pub(crate) trip_type: TripType,
    pub(crate) days: u32,
    pub(crate) travelers: u32,
}

impl EstimateRequest {
    /// `None` when the trip has no usable dates yet.
    pub(crate) fn for_trip(trip: &Trip) -> Option<Self> {
        Some(Self {
            destination: trip.destination.clone(),
            trip_type: trip.trip_type,
            days: trip.days()?,
            travelers: trip.travelers.max(1),
        })
    }
}

pub(crate) trait BudgetEstimator {
    fn name(&self) -> &str;
    fn estimate(&self, request: &EstimateRequest) -> Result<Decimal>;
}

/// Try `primary`, fall back to `fallback` on any error.
pub(crate) struct FallbackEstimator {
    primary: Box<dyn BudgetEstimator>,
    fallback: Box<dyn BudgetEstimator>,
}

impl FallbackEstimator {
    pub(crate) fn new(primary: Box<dyn BudgetEstimator>, fallback: Box<dyn BudgetEstimator>) -> Self {
        Self { primary, fallback }
    }
}

impl BudgetEstimator for FallbackEstimator {
    fn name(&self) -> &str {
        self.primary.name()
    }

    fn estimate(&self, request: &EstimateRequest) -> Result<Decimal> {
        match self.primary.estimate(request) {
            Ok(amount) => Ok(amount),
            Err(e) => {
                warn!(
                    primary = self.primary.name(),
                    fallback = self.fallback.name(),
                    error = %e,
                    "estimator failed, falling back"
                );
                self.fallback.estimate(request)
            }
        }
    }
}

/// Estimator wired from configuration: the cost table when one is
/// configured, always backed by the built-in table.
pub(crate) fn from_config(config: &crate::config::Config) -> Box<dyn BudgetEstimator> {
    match &config.cost_table {
        Some(path) => Box::new(FallbackEstimator::new(
            Box::new(TableEstimator::new(path.clone())),
            Box::new(LocalEstimator),
        )),
        None => Box::new(LocalEstimator),
    }
}

/// Recommended budget for a trip; zero when the trip has no dates.
pub(crate) fn recommended_for(estimator: &dyn BudgetEstimator, trip: &Trip) -> Result<Decimal> {
    match EstimateRequest::for_trip(trip) {
        Some(request) => estimator.estimate(&request),
        None => Ok(Decimal::ZERO),
    }
}

/// `daily × days × travelers`, rounded to cents.
fn scale_daily(daily: Decimal, request: &EstimateRequest) -> Result<Decimal> {
    daily
        .checked_mul(Decimal::from(request.days))
        .and_then(|v| v.checked_mul(Decimal::from(request.travelers)))
        .map(|v| v.round_dp(2))
        .ok_or_else(|| anyhow::anyhow!("Estimate overflowed for {} days", request.days))
}

#[cfg(test)]
mod tests;
