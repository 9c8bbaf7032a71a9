pub(crate) const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS trips (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    name         TEXT NOT NULL,
    destination  TEXT NOT NULL,
    trip_type    TEXT NOT NULL DEFAULT 'Leisure',
    start_date   TEXT,
    end_date     TEXT,
    travelers    INTEGER NOT NULL DEFAULT 1,
    currency     TEXT NOT NULL DEFAULT 'USD',
    total_budget TEXT NOT NULL DEFAULT '0',
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS budget_categories (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    trip_id     INTEGER NOT NULL REFERENCES trips(id) ON DELETE CASCADE,
    key         TEXT NOT NULL,
    label       TEXT NOT NULL,
    percentage  REAL NOT NULL,
    locked      BOOLEAN NOT NULL DEFAULT 0,
    is_buffer   BOOLEAN NOT NULL DEFAULT 0,
    position    INTEGER NOT NULL,
    UNIQUE(trip_id, key)
);

CREATE TABLE IF NOT EXISTS expenses (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    trip_id      INTEGER NOT NULL REFERENCES trips(id) ON DELETE CASCADE,
    date         TEXT NOT NULL,
    description  TEXT NOT NULL,
    amount       TEXT NOT NULL,
    category_key TEXT NOT NULL,
    notes        TEXT NOT NULL DEFAULT '',
    created_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_expenses_trip ON expenses(trip_id);
CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date);

CREATE TABLE IF NOT EXISTS category_rules (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    pattern      TEXT NOT NULL,
    category_key TEXT NOT NULL,
    is_regex     BOOLEAN NOT NULL DEFAULT 0,
    priority     INTEGER NOT NULL DEFAULT 0
);

"#;

pub(crate) const CURRENT_VERSION: i32 = 1;

/// Migrations from version N to N+1.
/// Each entry is (from_version, sql).
pub(crate) const MIGRATIONS: &[(i32, &str)] = &[];
