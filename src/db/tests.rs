#![allow(clippy::unwrap_used)]

use super::*;
use crate::allocate::CategoryAllocator;
use rust_decimal_macros::dec;

fn sample_trip() -> Trip {
    let mut trip = Trip::new(
        "Tokyo Spring".into(),
        "Japan".into(),
        TripType::Leisure,
        "USD".into(),
    );
    trip.start_date = NaiveDate::from_ymd_opt(2025, 4, 1);
    trip.end_date = NaiveDate::from_ymd_opt(2025, 4, 10);
    trip.travelers = 2;
    trip.total_budget = dec!(4500.50);
    trip
}

fn expense(trip_id: i64, date: &str, desc: &str, amount: Decimal, key: &str) -> Expense {
    Expense::new(trip_id, desc.into(), amount, key.into())
        .unwrap()
        .with_date(date.into())
}

fn setup_expenses(db: &mut Database) -> i64 {
    let trip_id = db.insert_trip(&sample_trip()).unwrap();
    let rows = [
        expense(trip_id, "2025-04-01", "Hotel Gracery", dec!(180.00), "accommodation"),
        expense(trip_id, "2025-04-01", "Ramen", dec!(12.50), "food"),
        expense(trip_id, "2025-04-02", "Sushi dinner", dec!(64.25), "food"),
        expense(trip_id, "2025-04-03", "Suica top-up", dec!(30), "transport"),
    ];
    for e in &rows {
        db.insert_expense(e).unwrap();
    }
    trip_id
}

// ── Trips ─────────────────────────────────────────────────────

#[test]
fn test_trip_crud() {
    let mut db = Database::open_in_memory().unwrap();
    let id = db.insert_trip(&sample_trip()).unwrap();
    assert!(id > 0);

    let fetched = db.get_trip_by_id(id).unwrap().unwrap();
    assert_eq!(fetched.name, "Tokyo Spring");
    assert_eq!(fetched.destination, "Japan");
    assert_eq!(fetched.trip_type, TripType::Leisure);
    assert_eq!(fetched.start_date, NaiveDate::from_ymd_opt(2025, 4, 1));
    assert_eq!(fetched.end_date, NaiveDate::from_ymd_opt(2025, 4, 10));
    assert_eq!(fetched.travelers, 2);
    assert_eq!(fetched.total_budget, dec!(4500.50));
    assert_eq!(fetched.days(), Some(10));

    let mut updated = fetched.clone();
    updated.total_budget = dec!(6000);
    updated.trip_type = TripType::Luxury;
    updated.end_date = None;
    db.update_trip(&updated).unwrap();

    let again = db.get_trip_by_id(id).unwrap().unwrap();
    assert_eq!(again.total_budget, dec!(6000));
    assert_eq!(again.trip_type, TripType::Luxury);
    assert_eq!(again.end_date, None);

    db.delete_trip(id).unwrap();
    assert!(db.get_trip_by_id(id).unwrap().is_none());
}

#[test]
fn test_trip_by_id_not_found() {
    let db = Database::open_in_memory().unwrap();
    assert!(db.get_trip_by_id(9999).unwrap().is_none());
}

#[test]
fn test_update_unsaved_trip_fails() {
    let db = Database::open_in_memory().unwrap();
    assert!(db.update_trip(&sample_trip()).is_err());

    let mut ghost = sample_trip();
    ghost.id = Some(42);
    assert!(db.update_trip(&ghost).is_err());
}

#[test]
fn test_trips_ordered_by_start_date() {
    let mut db = Database::open_in_memory().unwrap();
    let mut later = sample_trip();
    later.name = "Rome".into();
    later.start_date = NaiveDate::from_ymd_opt(2025, 9, 1);
    let mut undated = sample_trip();
    undated.name = "Someday".into();
    undated.start_date = None;

    db.insert_trip(&undated).unwrap();
    db.insert_trip(&later).unwrap();
    db.insert_trip(&sample_trip()).unwrap();

    let names: Vec<String> = db.get_trips().unwrap().into_iter().map(|t| t.name).collect();
    assert_eq!(names, ["Tokyo Spring", "Rome", "Someday"]);
}

// ── Categories ────────────────────────────────────────────────

#[test]
fn test_new_trip_gets_default_categories() {
    let mut db = Database::open_in_memory().unwrap();
    let id = db.insert_trip(&sample_trip()).unwrap();
    let set = db.load_categories(id).unwrap().unwrap();
    assert_eq!(set, CategorySet::default());
}

#[test]
fn test_save_and_load_categories_round_trip() {
    let mut db = Database::open_in_memory().unwrap();
    let id = db.insert_trip(&sample_trip()).unwrap();

    let allocator = CategoryAllocator::default();
    let set = allocator
        .set_percentage(&CategorySet::default(), "food", 40.0)
        .unwrap();
    let set = allocator.set_locked(&set, "transport", true).unwrap();
    db.save_categories(id, &set).unwrap();

    let loaded = db.load_categories(id).unwrap().unwrap();
    assert_eq!(loaded, set);
    assert!(loaded.get("transport").unwrap().locked);
    assert!((loaded.total() - 100.0).abs() < 1e-6);
}

#[test]
fn test_save_categories_replaces_rows() {
    let mut db = Database::open_in_memory().unwrap();
    let id = db.insert_trip(&sample_trip()).unwrap();

    let small = CategorySet::new(vec![
        Category::new("stay", "Stay", 70.0),
        Category::buffer("buffer", "Buffer", 30.0),
    ])
    .unwrap();
    db.save_categories(id, &small).unwrap();

    let loaded = db.load_categories(id).unwrap().unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.buffer().key, "buffer");
}

#[test]
fn test_load_categories_missing_trip() {
    let db = Database::open_in_memory().unwrap();
    assert!(db.load_categories(123).unwrap().is_none());
}

#[test]
fn test_categories_are_per_trip() {
    let mut db = Database::open_in_memory().unwrap();
    let a = db.insert_trip(&sample_trip()).unwrap();
    let b = db.insert_trip(&sample_trip()).unwrap();

    let allocator = CategoryAllocator::default();
    let edited = allocator
        .set_percentage(&CategorySet::default(), "shopping", 5.0)
        .unwrap();
    db.save_categories(a, &edited).unwrap();

    assert_eq!(db.load_categories(a).unwrap().unwrap(), edited);
    assert_eq!(db.load_categories(b).unwrap().unwrap(), CategorySet::default());
}

// ── Expenses ──────────────────────────────────────────────────

#[test]
fn test_expense_insert_and_query() {
    let mut db = Database::open_in_memory().unwrap();
    let trip_id = setup_expenses(&mut db);

    let expenses = db.get_expenses(trip_id).unwrap();
    assert_eq!(expenses.len(), 4);
    // Newest first
    assert_eq!(expenses[0].description, "Suica top-up");
    assert_eq!(expenses[3].date, "2025-04-01");
    assert!(expenses.iter().all(|e| e.id.is_some()));
    assert_eq!(expenses[1].amount, dec!(64.25));
}

#[test]
fn test_expense_delete_and_recategorize() {
    let mut db = Database::open_in_memory().unwrap();
    let trip_id = setup_expenses(&mut db);
    let expenses = db.get_expenses(trip_id).unwrap();

    let ramen = expenses.iter().find(|e| e.description == "Ramen").unwrap();
    db.update_expense_category(ramen.id.unwrap(), "attractions")
        .unwrap();
    let hotel = expenses
        .iter()
        .find(|e| e.description == "Hotel Gracery")
        .unwrap();
    db.delete_expense(hotel.id.unwrap()).unwrap();

    let after = db.get_expenses(trip_id).unwrap();
    assert_eq!(after.len(), 3);
    let ramen = after.iter().find(|e| e.description == "Ramen").unwrap();
    assert_eq!(ramen.category_key, "attractions");
}

#[test]
fn test_delete_trip_cascades() {
    let mut db = Database::open_in_memory().unwrap();
    let trip_id = setup_expenses(&mut db);
    db.delete_trip(trip_id).unwrap();

    assert!(db.get_expenses(trip_id).unwrap().is_empty());
    assert!(db.load_categories(trip_id).unwrap().is_none());
}

#[test]
fn test_spending_by_category() {
    let mut db = Database::open_in_memory().unwrap();
    let trip_id = setup_expenses(&mut db);

    let spending = db.get_spending_by_category(trip_id).unwrap();
    assert_eq!(
        spending,
        vec![
            ("accommodation".to_string(), dec!(180.00)),
            ("food".to_string(), dec!(76.75)),
            ("transport".to_string(), dec!(30)),
        ]
    );
}

#[test]
fn test_spending_by_category_empty() {
    let mut db = Database::open_in_memory().unwrap();
    let trip_id = db.insert_trip(&sample_trip()).unwrap();
    assert!(db.get_spending_by_category(trip_id).unwrap().is_empty());
}

// ── Export ────────────────────────────────────────────────────

#[test]
fn test_export_expenses_csv() {
    let mut db = Database::open_in_memory().unwrap();
    let trip_id = setup_expenses(&mut db);
    let file = tempfile::NamedTempFile::new().unwrap();

    let count = db.export_expenses_csv(trip_id, file.path()).unwrap();
    assert_eq!(count, 4);

    let mut rdr = csv::Reader::from_path(file.path()).unwrap();
    let headers = rdr.headers().unwrap().clone();
    assert_eq!(&headers[0], "date");
    assert_eq!(&headers[3], "amount");
    let records: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 4);
    // Oldest first in the file
    assert_eq!(&records[0][0], "2025-04-01");
    assert_eq!(&records[3][1], "Suica top-up");
}

#[test]
fn test_export_empty_writes_nothing() {
    let mut db = Database::open_in_memory().unwrap();
    let trip_id = db.insert_trip(&sample_trip()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");

    assert_eq!(db.export_expenses_csv(trip_id, &path).unwrap(), 0);
    assert!(!path.exists());
}

// ── Category rules ────────────────────────────────────────────

#[test]
fn test_category_rule_crud() {
    let db = Database::open_in_memory().unwrap();
    let rule = CategoryRule::new_contains("ryokan".into(), "accommodation".into());
    let id = db.insert_category_rule(&rule).unwrap();

    let rules = db.get_category_rules().unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].pattern, "ryokan");
    assert_eq!(rules[0].category_key, "accommodation");
    assert!(!rules[0].is_regex);

    db.delete_category_rule(id).unwrap();
    assert!(db.get_category_rules().unwrap().is_empty());
}

#[test]
fn test_category_rules_ordered_by_priority() {
    let db = Database::open_in_memory().unwrap();
    let mut low = CategoryRule::new_contains("taxi".into(), "transport".into());
    low.priority = 1;
    let mut high = CategoryRule::new_regex(r"^jr\b".into(), "transport".into());
    high.priority = 10;
    db.insert_category_rule(&low).unwrap();
    db.insert_category_rule(&high).unwrap();

    let rules = db.get_category_rules().unwrap();
    assert_eq!(rules[0].pattern, r"^jr\b");
    assert!(rules[0].is_regex);
    assert_eq!(rules[1].pattern, "taxi");
}

// ── Schema migration ──────────────────────────────────────────

#[test]
fn test_schema_version_set() {
    let db = Database::open_in_memory().unwrap();
    let version: i32 = db
        .conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(version, schema::CURRENT_VERSION);
}

#[test]
fn test_double_migrate_idempotent() {
    let mut db = Database::open_in_memory().unwrap();
    db.migrate().unwrap();
    let version: i32 = db
        .conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(version, schema::CURRENT_VERSION);
}

#[test]
fn test_open_file_database_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trips.db");
    let id = {
        let mut db = Database::open(&path).unwrap();
        db.insert_trip(&sample_trip()).unwrap()
    };
    let db = Database::open(&path).unwrap();
    assert_eq!(db.get_trip_by_id(id).unwrap().unwrap().name, "Tokyo Spring");
}
