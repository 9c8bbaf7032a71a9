#![allow(clippy::unwrap_used)]

use std::cell::Cell;
use std::io::Write;

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use super::*;

fn request(destination: &str, trip_type: TripType, days: u32, travelers: u32) -> EstimateRequest {
    EstimateRequest {
        destination: destination.into(),
        trip_type,
        days,
        travelers,
    }
}

fn cost_table(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

struct Failing;

impl BudgetEstimator for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn estimate(&self, _request: &EstimateRequest) -> Result<Decimal> {
        anyhow::bail!("unreachable service")
    }
}

struct Counting<'a> {
    calls: &'a Cell<u32>,
    amount: Decimal,
}

// ── LocalEstimator ────────────────────────────────────────────

#[test]
fn test_local_known_country() {
    let est = LocalEstimator.estimate(&request("Japan", TripType::Leisure, 10, 2)).unwrap();
    assert_eq!(est, dec!(3000));
}

#[test]
fn test_local_unknown_country_uses_default() {
    let est = LocalEstimator
        .estimate(&request("Atlantis", TripType::Leisure, 3, 1))
        .unwrap();
    assert_eq!(est, dec!(360));
}

#[test]
fn test_local_trip_type_factor() {
    let backpacking = LocalEstimator
        .estimate(&request("thailand", TripType::Backpacking, 10, 1))
        .unwrap();
    let luxury = LocalEstimator
        .estimate(&request("THAILAND", TripType::Luxury, 10, 1))
        .unwrap();
    assert_eq!(backpacking, dec!(360));
    assert_eq!(luxury, dec!(1500));
}

#[test]
fn test_local_scales_with_days_and_travelers() {
    let one = LocalEstimator.estimate(&request("Spain", TripType::Family, 1, 1)).unwrap();
    let many = LocalEstimator.estimate(&request("Spain", TripType::Family, 7, 4)).unwrap();
    assert_eq!(many, one * dec!(28));
}

// ── TableEstimator ────────────────────────────────────────────

#[test]
fn test_table_exact_type_beats_wildcard() {
    let file = cost_table(
        "country,trip_type,daily_cost\n\
         Iceland,*,200\n\
         Iceland,Backpacking,95.50\n",
    );
    let table = TableEstimator::new(file.path().to_path_buf());
    assert_eq!(
        table.estimate(&request("iceland", TripType::Backpacking, 2, 1)).unwrap(),
        dec!(191.00)
    );
    assert_eq!(
        table.estimate(&request("Iceland", TripType::Luxury, 2, 1)).unwrap(),
        dec!(400)
    );
}

#[test]
fn test_table_missing_row_is_error() {
    let file = cost_table("country,trip_type,daily_cost\nIceland,*,200\n");
    let table = TableEstimator::new(file.path().to_path_buf());
    assert!(table.estimate(&request("Peru", TripType::Leisure, 2, 1)).is_err());
}

#[test]
fn test_table_missing_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let table = TableEstimator::new(dir.path().join("nope.csv"));
    assert!(table.estimate(&request("Peru", TripType::Leisure, 2, 1)).is_err());
}

#[test]
fn test_table_bad_cost_is_error() {
    let file = cost_table("country,trip_type,daily_cost\nPeru,*,cheap\n");
    let table = TableEstimator::new(file.path().to_path_buf());
    assert!(table.estimate(&request("Peru", TripType::Leisure, 2, 1)).is_err());
}

// ── FallbackEstimator ─────────────────────────────────────────

impl BudgetEstimator for Counting<'_> {
    fn name(&self) -> &str {
        "counting"
    }

    fn estimate(&self, _request: &EstimateRequest) -> Result<Decimal> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.amount)
    }
}

#[test]
fn test_fallback_used_when_primary_fails() {
    let chain = FallbackEstimator::new(Box::new(Failing), Box::new(LocalEstimator));
    let est = chain.estimate(&request("Japan", TripType::Leisure, 1, 1)).unwrap();
    assert_eq!(est, dec!(150));
}

#[test]
fn test_fallback_not_called_when_primary_succeeds() {
    // Leaked so the boxed estimator can borrow it for 'static.
    let calls: &'static Cell<u32> = Box::leak(Box::new(Cell::new(0)));
    let chain = FallbackEstimator::new(
        Box::new(Counting {
            calls,
            amount: dec!(42),
        }),
        Box::new(Failing),
    );
    assert_eq!(chain.estimate(&request("x", TripType::Leisure, 1, 1)).unwrap(), dec!(42));
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_fallback_both_failing_is_error() {
    let chain = FallbackEstimator::new(Box::new(Failing), Box::new(Failing));
    assert!(chain.estimate(&request("x", TripType::Leisure, 1, 1)).is_err());
}

#[test]
fn test_table_then_local_chain() {
    let file = cost_table("country,trip_type,daily_cost\nIceland,*,200\n");
    let chain = FallbackEstimator::new(
        Box::new(TableEstimator::new(file.path().to_path_buf())),
        Box::new(LocalEstimator),
    );
    assert_eq!(
        chain.estimate(&request("Iceland", TripType::Leisure, 1, 1)).unwrap(),
        dec!(200)
    );
    // Not in the table: built-in answer.
    assert_eq!(
        chain.estimate(&request("Italy", TripType::Leisure, 1, 1)).unwrap(),
        dec!(160)
    );
}

// ── Trip helpers ──────────────────────────────────────────────

#[test]
fn test_recommended_for_trip_without_dates_is_zero() {
    let trip = Trip::new("T".into(), "Japan".into(), TripType::Leisure, "USD".into());
    assert_eq!(recommended_for(&LocalEstimator, &trip).unwrap(), Decimal::ZERO);
}

#[test]
fn test_recommended_for_trip_with_dates() {
    let mut trip = Trip::new("T".into(), "Japan".into(), TripType::Leisure, "USD".into());
    trip.start_date = NaiveDate::from_ymd_opt(2025, 4, 1);
    trip.end_date = NaiveDate::from_ymd_opt(2025, 4, 5);
    trip.travelers = 2;
    assert_eq!(recommended_for(&LocalEstimator, &trip).unwrap(), dec!(1500));
}

#[test]
fn test_request_clamps_travelers() {
    let mut trip = Trip::new("T".into(), "Japan".into(), TripType::Leisure, "USD".into());
    trip.start_date = NaiveDate::from_ymd_opt(2025, 4, 1);
    trip.end_date = NaiveDate::from_ymd_opt(2025, 4, 1);
    trip.travelers = 0;
    assert_eq!(EstimateRequest::for_trip(&trip).unwrap().travelers, 1);
}
