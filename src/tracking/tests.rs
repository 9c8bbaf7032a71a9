#![allow(clippy::unwrap_used)]

use rust_decimal_macros::dec;

use super::*;
use crate::models::{Category, CategorySet};

fn expense(key: &str, amount: Decimal) -> Expense {
    Expense::new(1, format!("{key} spend"), amount, key.into()).unwrap()
}

fn usage<'a>(report: &'a [CategoryUsage], key: &str) -> &'a CategoryUsage {
    report.iter().find(|u| u.key == key).unwrap()
}

#[test]
fn test_report_allocations_follow_percentages() {
    let report = usage_report(&CategorySet::default(), dec!(2000), &[]).unwrap();
    assert_eq!(report.len(), 6);
    assert_eq!(usage(&report, "accommodation").allocated, dec!(600));
    assert_eq!(usage(&report, "buffer").allocated, dec!(100));
    assert!(report.iter().all(|u| u.level == UsageLevel::Ok));
}

#[test]
fn test_report_levels() {
    let expenses = vec![
        expense("food", dec!(300)),
        expense("food", dec!(110)),
        expense("transport", dec!(250)),
        expense("shopping", dec!(50)),
    ];
    let report = usage_report(&CategorySet::default(), dec!(2000), &expenses).unwrap();

    let food = usage(&report, "food");
    assert_eq!(food.spent, dec!(410));
    assert_eq!(food.level, UsageLevel::Warning);
    assert_eq!(food.remaining(), dec!(90));

    let transport = usage(&report, "transport");
    assert_eq!(transport.level, UsageLevel::Exceeded);
    assert_eq!(transport.remaining(), dec!(-50));

    assert_eq!(usage(&report, "shopping").level, UsageLevel::Ok);
}

#[test]
fn test_report_exactly_at_allocation_is_warning() {
    let expenses = vec![expense("transport", dec!(200))];
    let report = usage_report(&CategorySet::default(), dec!(2000), &expenses).unwrap();
    assert_eq!(usage(&report, "transport").level, UsageLevel::Warning);
}

#[test]
fn test_unknown_keys_count_against_buffer() {
    let expenses = vec![expense("visa fees", dec!(85))];
    let report = usage_report(&CategorySet::default(), dec!(2000), &expenses).unwrap();
    let buffer = usage(&report, "buffer");
    assert_eq!(buffer.spent, dec!(85));
    assert_eq!(buffer.level, UsageLevel::Warning);
}

#[test]
fn test_zero_allocation_with_spending_exceeded() {
    let set = CategorySet::new(vec![
        Category::new("food", "Food", 0.0),
        Category::buffer("buffer", "Buffer", 100.0),
    ])
    .unwrap();
    let report = usage_report(&set, dec!(500), &[expense("food", dec!(1))]).unwrap();
    assert_eq!(usage(&report, "food").level, UsageLevel::Exceeded);
    assert_eq!(usage(&report, "food").ratio, 0.0);

    let empty = usage_report(&set, dec!(0), &[]).unwrap();
    assert!(empty.iter().all(|u| u.level == UsageLevel::Ok));
}

#[test]
fn test_alerts_sorted_by_ratio() {
    let expenses = vec![
        expense("food", dec!(450)),
        expense("transport", dec!(400)),
        expense("shopping", dec!(10)),
    ];
    let report = usage_report(&CategorySet::default(), dec!(2000), &expenses).unwrap();
    let flagged: Vec<&str> = alerts(&report).iter().map(|u| u.key.as_str()).collect();
    assert_eq!(flagged, ["transport", "food"]);
}

#[test]
fn test_total_spent() {
    let expenses = vec![expense("food", dec!(12.50)), expense("transport", dec!(7.25))];
    assert_eq!(total_spent(&expenses), dec!(19.75));
    assert_eq!(total_spent(&[]), Decimal::ZERO);
}

#[test]
fn test_spending_overflow_reported() {
    let expenses = vec![expense("food", Decimal::MAX), expense("food", Decimal::MAX)];
    assert_eq!(
        usage_report(&CategorySet::default(), dec!(1000), &expenses),
        Err(AllocationError::AmountOverflow)
    );
    assert_eq!(total_spent(&expenses), Decimal::MAX);
}

#[test]
fn test_ratio_overflow_on_tiny_allocation() {
    let expenses = vec![expense("food", Decimal::MAX)];
    assert_eq!(
        usage_report(&CategorySet::default(), dec!(0.0001), &expenses),
        Err(AllocationError::AmountOverflow)
    );
}
