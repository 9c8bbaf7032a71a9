mod schema;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

use crate::models::*;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to set database pragmas")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        info!(path = %path.display(), "database opened");
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            debug!(version = schema::CURRENT_VERSION, "created schema");
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                debug!(from_version, "applying migration");
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
        }

        Ok(())
    }

    // ── Trips ─────────────────────────────────────────────────

    /// Insert a trip together with the default category split.
    pub(crate) fn insert_trip(&mut self, trip: &Trip) -> Result<i64> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO trips (name, destination, trip_type, start_date, end_date, travelers, currency, total_budget, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                trip.name,
                trip.destination,
                trip.trip_type.as_str(),
                trip.start_date.map(|d| d.format(DATE_FORMAT).to_string()),
                trip.end_date.map(|d| d.format(DATE_FORMAT).to_string()),
                trip.travelers,
                trip.currency,
                trip.total_budget.to_string(),
                trip.created_at,
            ],
        )?;
        let id = tx.last_insert_rowid();
        write_categories(&tx, id, &CategorySet::default())?;
        tx.commit()?;
        info!(trip_id = id, name = %trip.name, "trip created");
        Ok(id)
    }

    pub(crate) fn get_trips(&self) -> Result<Vec<Trip>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, destination, trip_type, start_date, end_date, travelers, currency, total_budget, created_at
             FROM trips ORDER BY COALESCE(start_date, '9999-12-31'), name",
        )?;
        let rows = stmt.query_map([], trip_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_trip_by_id(&self, id: i64) -> Result<Option<Trip>> {
        let result = self.conn.query_row(
            "SELECT id, name, destination, trip_type, start_date, end_date, travelers, currency, total_budget, created_at
             FROM trips WHERE id = ?1",
            params![id],
            trip_from_row,
        );
        match result {
            Ok(t) => Ok(Some(t)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn update_trip(&self, trip: &Trip) -> Result<()> {
        let id = trip.id.context("Cannot update a trip that was never saved")?;
        let changed = self.conn.execute(
            "UPDATE trips SET name = ?1, destination = ?2, trip_type = ?3, start_date = ?4, end_date = ?5,
                              travelers = ?6, currency = ?7, total_budget = ?8
             WHERE id = ?9",
            params![
                trip.name,
                trip.destination,
                trip.trip_type.as_str(),
                trip.start_date.map(|d| d.format(DATE_FORMAT).to_string()),
                trip.end_date.map(|d| d.format(DATE_FORMAT).to_string()),
                trip.travelers,
                trip.currency,
                trip.total_budget.to_string(),
                id,
            ],
        )?;
        if changed == 0 {
            anyhow::bail!("Trip {id} not found");
        }
        debug!(trip_id = id, "trip updated");
        Ok(())
    }

    /// Remove a trip; its categories and expenses go with it.
    pub(crate) fn delete_trip(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM trips WHERE id = ?1", params![id])?;
        info!(trip_id = id, "trip deleted");
        Ok(())
    }

    // ── Budget categories ─────────────────────────────────────

    /// Replace every stored category row for `trip_id` with `set`.
    pub(crate) fn save_categories(&mut self, trip_id: i64, set: &CategorySet) -> Result<()> {
        let tx = self.conn.transaction()?;
        write_categories(&tx, trip_id, set)?;
        tx.commit()?;
        debug!(trip_id, count = set.len(), "categories saved");
        Ok(())
    }

    /// Load the category set for a trip, in saved order. `None` when the
    /// trip has no rows.
    pub(crate) fn load_categories(&self, trip_id: i64) -> Result<Option<CategorySet>> {
        let mut stmt = self.conn.prepare(
            "SELECT key, label, percentage, locked, is_buffer FROM budget_categories
             WHERE trip_id = ?1 ORDER BY position",
        )?;
        let rows = stmt.query_map(params![trip_id], |row| {
            Ok(Category {
                key: row.get(0)?,
                label: row.get(1)?,
                percentage: row.get(2)?,
                locked: row.get(3)?,
                is_buffer: row.get(4)?,
            })
        })?;
        let categories = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        if categories.is_empty() {
            return Ok(None);
        }
        let set = CategorySet::new(categories)
            .with_context(|| format!("Stored categories for trip {trip_id} are invalid"))?;
        Ok(Some(set))
    }

    // ── Expenses ──────────────────────────────────────────────

    pub(crate) fn insert_expense(&self, expense: &Expense) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO expenses (trip_id, date, description, amount, category_key, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                expense.trip_id,
                expense.date,
                expense.description,
                expense.amount.to_string(),
                expense.category_key,
                expense.notes,
                expense.created_at,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(expense_id = id, trip_id = expense.trip_id, "expense recorded");
        Ok(id)
    }

    /// Expenses for a trip, newest first.
    pub(crate) fn get_expenses(&self, trip_id: i64) -> Result<Vec<Expense>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, trip_id, date, description, amount, category_key, notes, created_at
             FROM expenses WHERE trip_id = ?1 ORDER BY date DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![trip_id], |row| {
            let amount_str: String = row.get(4)?;
            Ok(Expense {
                id: Some(row.get(0)?),
                trip_id: row.get(1)?,
                date: row.get(2)?,
                description: row.get(3)?,
                amount: Decimal::from_str(&amount_str).unwrap_or_default(),
                category_key: row.get(5)?,
                notes: row.get(6)?,
                created_at: row.get(7)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn delete_expense(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM expenses WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub(crate) fn update_expense_category(&self, id: i64, category_key: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE expenses SET category_key = ?1 WHERE id = ?2",
            params![category_key, id],
        )?;
        Ok(())
    }

    /// Totals per category key, largest first. Summed as decimals so the
    /// stored TEXT amounts never pass through floating point.
    pub(crate) fn get_spending_by_category(&self, trip_id: i64) -> Result<Vec<(String, Decimal)>> {
        let mut totals: Vec<(String, Decimal)> = Vec::new();
        for expense in self.get_expenses(trip_id)? {
            match totals.iter_mut().find(|(k, _)| *k == expense.category_key) {
                Some((_, sum)) => *sum = sum.saturating_add(expense.amount),
                None => totals.push((expense.category_key, expense.amount)),
            }
        }
        totals.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(totals)
    }

    /// Write a trip's expenses to `path` as CSV. Returns the row count.
    pub(crate) fn export_expenses_csv(&self, trip_id: i64, path: &Path) -> Result<usize> {
        let expenses = self.get_expenses(trip_id)?;
        if expenses.is_empty() {
            return Ok(0);
        }

        let mut wtr = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        wtr.write_record(["date", "description", "category", "amount", "notes"])?;
        for e in expenses.iter().rev() {
            let amount = e.amount.to_string();
            wtr.write_record([
                e.date.as_str(),
                e.description.as_str(),
                e.category_key.as_str(),
                amount.as_str(),
                e.notes.as_str(),
            ])?;
        }
        wtr.flush()?;
        info!(trip_id, rows = expenses.len(), path = %path.display(), "expenses exported");
        Ok(expenses.len())
    }

    // ── Category rules ────────────────────────────────────────

    pub(crate) fn get_category_rules(&self) -> Result<Vec<CategoryRule>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, pattern, category_key, is_regex, priority FROM category_rules ORDER BY priority DESC, pattern",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CategoryRule {
                id: Some(row.get(0)?),
                pattern: row.get(1)?,
                category_key: row.get(2)?,
                is_regex: row.get(3)?,
                priority: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn insert_category_rule(&self, rule: &CategoryRule) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO category_rules (pattern, category_key, is_regex, priority)
             VALUES (?1, ?2, ?3, ?4)",
            params![rule.pattern, rule.category_key, rule.is_regex, rule.priority],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub(crate) fn delete_category_rule(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM category_rules WHERE id = ?1", params![id])?;
        Ok(())
    }
}

fn write_categories(conn: &Connection, trip_id: i64, set: &CategorySet) -> Result<()> {
    conn.execute(
        "DELETE FROM budget_categories WHERE trip_id = ?1",
        params![trip_id],
    )?;
    let mut stmt = conn.prepare(
        "INSERT INTO budget_categories (trip_id, key, label, percentage, locked, is_buffer, position)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for (position, cat) in set.iter().enumerate() {
        stmt.execute(params![
            trip_id,
            cat.key,
            cat.label,
            cat.percentage,
            cat.locked,
            cat.is_buffer,
            position as i64,
        ])?;
    }
    Ok(())
}

fn trip_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Trip> {
    let parse_date = |raw: Option<String>| {
        raw.and_then(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).ok())
    };
    let budget_str: String = row.get(8)?;
    Ok(Trip {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        destination: row.get(2)?,
        trip_type: TripType::parse(&row.get::<_, String>(3)?),
        start_date: parse_date(row.get(4)?),
        end_date: parse_date(row.get(5)?),
        travelers: row.get(6)?,
        currency: row.get(7)?,
        total_budget: Decimal::from_str(&budget_str).unwrap_or_default(),
        created_at: row.get(9)?,
    })
}

#[cfg(test)]
mod tests;
