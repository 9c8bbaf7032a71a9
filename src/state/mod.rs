//! Planner state as immutable snapshots.
//!
//! Every user edit is an [`Action`]. [`reduce`] turns the current snapshot
//! and an action into the next snapshot without touching the old one, and
//! [`Store::dispatch`] is the only place the active snapshot is replaced.

use anyhow::Result;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::allocate::{amount_for_category, status_for_budget, BudgetStatus, CategoryAllocator};
use crate::models::{CategorySet, Expense, Trip};
use crate::tracking::{usage_report, CategoryUsage};

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct PlannerState {
    pub(crate) trip: Option<Trip>,
    pub(crate) categories: CategorySet,
    pub(crate) expenses: Vec<Expense>,
    pub(crate) recommended: Decimal,
}

impl PlannerState {
    pub(crate) fn total_budget(&self) -> Decimal {
        self.trip
            .as_ref()
            .map(|t| t.total_budget)
            .unwrap_or_default()
    }

    pub(crate) fn status(&self) -> BudgetStatus {
        status_for_budget(self.total_budget(), self.recommended)
    }

    /// Zero (and a warning in the log) when the amount cannot be computed.
    pub(crate) fn amount_for(&self, key: &str) -> Decimal {
        amount_for_category(&self.categories, key, self.total_budget()).unwrap_or_else(|e| {
            warn!(category = key, error = %e, "category amount unavailable");
            Decimal::ZERO
        })
    }

    /// Empty (and a warning in the log) when spending cannot be tallied.
    pub(crate) fn usage(&self) -> Vec<CategoryUsage> {
        usage_report(&self.categories, self.total_budget(), &self.expenses).unwrap_or_else(|e| {
            warn!(trip_id = ?self.trip_id(), error = %e, "spending report unavailable");
            Vec::new()
        })
    }

    pub(crate) fn trip_id(&self) -> Option<i64> {
        self.trip.as_ref().and_then(|t| t.id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Action {
    LoadTrip {
        trip: Trip,
        categories: CategorySet,
        expenses: Vec<Expense>,
        recommended: Decimal,
    },
    UpdateTrip(Trip),
    SetPercentage { key: String, value: f64 },
    SetLocked { key: String, locked: bool },
    SetTotalBudget(Decimal),
    SetRecommended(Decimal),
    AddExpense(Expense),
    RemoveExpense(i64),
    RecategorizeExpense { id: i64, key: String },
    ResetCategories,
}

/// Produce the snapshot that follows `state` once `action` is applied.
pub(crate) fn reduce(
    state: &PlannerState,
    allocator: &CategoryAllocator,
    action: Action,
) -> Result<PlannerState> {
    let mut next = state.clone();
    match action {
        Action::LoadTrip {
            trip,
            categories,
            expenses,
            recommended,
        } => {
            next = PlannerState {
                trip: Some(trip),
                categories,
                expenses,
                recommended,
            };
        }
        Action::UpdateTrip(trip) => {
            if state.trip_id() != trip.id {
                anyhow::bail!("Trip {} is not the active trip", trip.name);
            }
            next.trip = Some(trip);
        }
        Action::SetPercentage { key, value } => {
            next.categories = allocator.set_percentage(&state.categories, &key, value)?;
        }
        Action::SetLocked { key, locked } => {
            next.categories = allocator.set_locked(&state.categories, &key, locked)?;
        }
        Action::SetTotalBudget(amount) => {
            if amount < Decimal::ZERO {
                anyhow::bail!("Budget cannot be negative: {amount}");
            }
            let trip = next
                .trip
                .as_mut()
                .ok_or_else(|| anyhow::anyhow!("No active trip"))?;
            trip.total_budget = amount;
        }
        Action::SetRecommended(amount) => {
            next.recommended = amount.max(Decimal::ZERO);
        }
        Action::AddExpense(expense) => {
            if state.trip_id() != Some(expense.trip_id) {
                anyhow::bail!("Expense belongs to a different trip");
            }
            next.expenses.push(expense);
        }
        Action::RemoveExpense(id) => {
            let before = next.expenses.len();
            next.expenses.retain(|e| e.id != Some(id));
            if next.expenses.len() == before {
                anyhow::bail!("No expense with id {id}");
            }
        }
        Action::RecategorizeExpense { id, key } => {
            if !state.categories.contains(&key) {
                anyhow::bail!("Unknown category: {key}");
            }
            let expense = next
                .expenses
                .iter_mut()
                .find(|e| e.id == Some(id))
                .ok_or_else(|| anyhow::anyhow!("No expense with id {id}"))?;
            expense.category_key = key;
        }
        Action::ResetCategories => {
            next.categories = CategorySet::default();
        }
    }
    Ok(next)
}

/// Which persisted parts of the snapshot an action touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Changed {
    pub(crate) trip: bool,
    pub(crate) categories: bool,
    pub(crate) expenses: bool,
}

impl Changed {
    fn between(old: &PlannerState, new: &PlannerState) -> Self {
        Self {
            trip: old.trip != new.trip,
            categories: old.categories != new.categories,
            expenses: old.expenses != new.expenses,
        }
    }

    pub(crate) fn any(&self) -> bool {
        self.trip || self.categories || self.expenses
    }
}

pub(crate) struct Store {
    current: PlannerState,
    allocator: CategoryAllocator,
    revision: u64,
}

impl Store {
    pub(crate) fn new(allocator: CategoryAllocator) -> Self {
        Self {
            current: PlannerState::default(),
            allocator,
            revision: 0,
        }
    }

    pub(crate) fn state(&self) -> &PlannerState {
        &self.current
    }

    /// Bumped every time the active snapshot is replaced.
    pub(crate) fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn allocator(&self) -> &CategoryAllocator {
        &self.allocator
    }

    /// The snapshot `action` would produce, without making it active.
    pub(crate) fn preview(&self, action: Action) -> Result<(PlannerState, Changed)> {
        let next = reduce(&self.current, &self.allocator, action)?;
        let changed = Changed::between(&self.current, &next);
        Ok((next, changed))
    }

    /// Make `next` the active snapshot.
    pub(crate) fn commit(&mut self, next: PlannerState) {
        if next == self.current {
            return;
        }
        let changed = Changed::between(&self.current, &next);
        self.current = next;
        self.revision += 1;
        debug!(revision = self.revision, ?changed, "planner state replaced");
    }

    /// Apply `action`. On error the active snapshot is left as it was.
    pub(crate) fn dispatch(&mut self, action: Action) -> Result<Changed> {
        let (next, changed) = self.preview(action)?;
        self.commit(next);
        Ok(changed)
    }
}
