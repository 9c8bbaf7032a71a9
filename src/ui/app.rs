use anyhow::Result;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::allocate::CategoryAllocator;
use crate::categorize::ClassifierChain;
use crate::config::Config;
use crate::db::Database;
use crate::estimate::{self, BudgetEstimator};
use crate::models::*;
use crate::state::{Action, Changed, PlannerState, Store};
use crate::tracking::CategoryUsage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Planner,
    Expenses,
    Trips,
}

impl Screen {
    pub(crate) fn all() -> &'static [Screen] {
        &[Self::Planner, Self::Expenses, Self::Trips]
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Planner => write!(f, "Planner"),
            Self::Expenses => write!(f, "Expenses"),
            Self::Trips => write!(f, "Trips"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InputMode {
    Normal,
    Command,
    Editing,
    Confirm,
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::Command => write!(f, "COMMAND"),
            Self::Editing => write!(f, "EDIT"),
            Self::Confirm => write!(f, "CONFIRM"),
        }
    }
}

/// Pending action that requires user confirmation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PendingAction {
    DeleteExpense { id: i64, description: String },
    DeleteTrip { id: i64, name: String },
    DeleteRule { id: i64, pattern: String },
    ResetCategories,
}

pub(crate) struct App {
    pub(crate) running: bool,
    pub(crate) screen: Screen,
    pub(crate) input_mode: InputMode,
    pub(crate) command_input: String,
    pub(crate) status_message: String,
    pub(crate) show_help: bool,

    pub(crate) store: Store,
    pub(crate) estimator: Box<dyn BudgetEstimator>,
    pub(crate) classifier: ClassifierChain,
    /// Currency for trips created from the TUI.
    pub(crate) default_currency: String,

    // Planner
    pub(crate) category_index: usize,
    /// Spending per category, recomputed when the store revision moves.
    pub(crate) usage: Vec<CategoryUsage>,
    usage_revision: Option<u64>,

    // Expenses
    pub(crate) expense_index: usize,
    pub(crate) expense_scroll: usize,

    // Trips
    pub(crate) trips: Vec<Trip>,
    pub(crate) trip_index: usize,
    pub(crate) trip_scroll: usize,

    pub(crate) rules: Vec<CategoryRule>,

    // Confirmation
    pub(crate) pending_action: Option<PendingAction>,
    pub(crate) confirm_message: String,

    // Layout (updated each render frame)
    pub(crate) visible_rows: usize,
}

impl App {
    pub(crate) fn new(config: &Config) -> Result<Self> {
        let allocator = CategoryAllocator::new(config.buffer_minimum)?;
        let (classifier, _) = ClassifierChain::with_rules(&[]);
        Ok(Self {
            running: true,
            screen: Screen::Trips,
            input_mode: InputMode::Normal,
            command_input: String::new(),
            status_message: String::new(),
            show_help: false,

            store: Store::new(allocator),
            estimator: estimate::from_config(config),
            classifier,
            default_currency: config.currency.clone(),

            category_index: 0,
            usage: Vec::new(),
            usage_revision: None,

            expense_index: 0,
            expense_scroll: 0,

            trips: Vec::new(),
            trip_index: 0,
            trip_scroll: 0,

            rules: Vec::new(),

            pending_action: None,
            confirm_message: String::new(),

            visible_rows: 20,
        })
    }

    pub(crate) fn state(&self) -> &PlannerState {
        self.store.state()
    }

    pub(crate) fn currency(&self) -> &str {
        self.state()
            .trip
            .as_ref()
            .map_or(self.default_currency.as_str(), |t| t.currency.as_str())
    }

    pub(crate) fn refresh_trips(&mut self, db: &Database) -> Result<()> {
        self.trips = db.get_trips()?;
        if self.trip_index >= self.trips.len() {
            self.trip_index = self.trips.len().saturating_sub(1);
        }
        Ok(())
    }

    pub(crate) fn refresh_rules(&mut self, db: &Database) -> Result<()> {
        self.rules = db.get_category_rules()?;
        let (classifier, bad_patterns) = ClassifierChain::with_rules(&self.rules);
        self.classifier = classifier;
        if !bad_patterns.is_empty() {
            self.set_status(format!(
                "Ignoring invalid rule patterns: {}",
                bad_patterns.join(", ")
            ));
        }
        Ok(())
    }

    /// Load everything on startup and open the first trip, if any.
    pub(crate) fn refresh_all(&mut self, db: &Database) -> Result<()> {
        self.refresh_trips(db)?;
        self.refresh_rules(db)?;
        if let Some(id) = self.trips.first().and_then(|t| t.id) {
            self.open_trip(db, id)?;
            self.screen = Screen::Planner;
        }
        Ok(())
    }

    /// Make `trip_id` the active trip.
    pub(crate) fn open_trip(&mut self, db: &Database, trip_id: i64) -> Result<()> {
        let trip = db
            .get_trip_by_id(trip_id)?
            .ok_or_else(|| anyhow::anyhow!("Trip {trip_id} not found"))?;
        let categories = db.load_categories(trip_id)?.unwrap_or_default();
        let expenses = db.get_expenses(trip_id)?;
        let recommended = self.recommendation_for(&trip);

        self.store.dispatch(Action::LoadTrip {
            trip,
            categories,
            expenses,
            recommended,
        })?;
        self.category_index = 0;
        self.expense_index = 0;
        self.expense_scroll = 0;
        if let Some(pos) = self.trips.iter().position(|t| t.id == Some(trip_id)) {
            self.trip_index = pos;
        }
        info!(trip_id, "trip opened");
        Ok(())
    }

    /// Recommended budget, or zero when no estimator can answer.
    pub(crate) fn recommendation_for(&self, trip: &Trip) -> Decimal {
        match estimate::recommended_for(self.estimator.as_ref(), trip) {
            Ok(amount) => amount,
            Err(e) => {
                warn!(error = %e, destination = %trip.destination, "no budget recommendation");
                Decimal::ZERO
            }
        }
    }

    /// Persist what `action` changes, then make the result active. A failed
    /// write leaves the active snapshot untouched.
    pub(crate) fn apply(&mut self, db: &mut Database, action: Action) -> Result<Changed> {
        let (mut next, changed) = self.store.preview(action)?;
        let trip = next.trip.clone();
        let trip_id = trip.as_ref().and_then(|t| t.id);

        if let (Some(trip), Some(trip_id)) = (trip, trip_id) {
            if changed.categories {
                db.save_categories(trip_id, &next.categories)?;
            }
            if changed.trip {
                db.update_trip(&trip)?;
                next.recommended = self.recommendation_for(&trip);
            }
        }

        self.store.commit(next);
        if changed.trip {
            self.refresh_trips(db)?;
        }
        Ok(changed)
    }

    pub(crate) fn selected_category(&self) -> Option<&Category> {
        self.state().categories.as_slice().get(self.category_index)
    }

    pub(crate) fn selected_expense(&self) -> Option<&Expense> {
        self.state().expenses.get(self.expense_index)
    }

    pub(crate) fn selected_trip(&self) -> Option<&Trip> {
        self.trips.get(self.trip_index)
    }

    /// Nudge the selected category's share by `delta` percentage points.
    pub(crate) fn adjust_selected(&mut self, db: &mut Database, delta: f64) -> Result<()> {
        let Some(cat) = self.selected_category() else {
            return Ok(());
        };
        let key = cat.key.clone();
        let value = cat.percentage + delta;
        self.set_percentage(db, &key, value)
    }

    pub(crate) fn set_percentage(&mut self, db: &mut Database, key: &str, value: f64) -> Result<()> {
        if self.state().trip.is_none() {
            self.set_status("Open a trip first (:open <name>)");
            return Ok(());
        }
        self.apply(
            db,
            Action::SetPercentage {
                key: key.to_string(),
                value,
            },
        )?;
        if let Some(cat) = self.state().categories.get(key) {
            let pct = crate::ui::util::format_percent(cat.percentage);
            let label = cat.label.clone();
            self.set_status(format!("{label} set to {pct}"));
        }
        Ok(())
    }

    pub(crate) fn toggle_selected_lock(&mut self, db: &mut Database) -> Result<()> {
        let Some(cat) = self.selected_category() else {
            return Ok(());
        };
        let (key, label, locked) = (cat.key.clone(), cat.label.clone(), !cat.locked);
        self.apply(db, Action::SetLocked { key, locked })?;
        self.set_status(if locked {
            format!("Locked {label}")
        } else {
            format!("Unlocked {label}")
        });
        Ok(())
    }

    /// Persist a new expense, then add it to the active trip.
    pub(crate) fn add_expense(&mut self, db: &mut Database, mut expense: Expense) -> Result<()> {
        let id = db.insert_expense(&expense)?;
        expense.id = Some(id);
        if let Err(e) = self.store.dispatch(Action::AddExpense(expense)) {
            db.delete_expense(id)?;
            return Err(e);
        }
        Ok(())
    }

    pub(crate) fn remove_expense(&mut self, db: &mut Database, id: i64) -> Result<()> {
        let (next, _) = self.store.preview(Action::RemoveExpense(id))?;
        db.delete_expense(id)?;
        self.store.commit(next);
        let len = self.state().expenses.len();
        if self.expense_index >= len {
            self.expense_index = len.saturating_sub(1);
        }
        Ok(())
    }

    pub(crate) fn recategorize_expense(
        &mut self,
        db: &mut Database,
        id: i64,
        key: String,
    ) -> Result<()> {
        let (next, _) = self
            .store
            .preview(Action::RecategorizeExpense { id, key: key.clone() })?;
        db.update_expense_category(id, &key)?;
        self.store.commit(next);
        Ok(())
    }

    /// Forget the active trip (after it was deleted).
    pub(crate) fn close_trip(&mut self) {
        self.store = Store::new(*self.store.allocator());
        self.usage.clear();
        self.usage_revision = None;
        self.category_index = 0;
        self.expense_index = 0;
        self.expense_scroll = 0;
    }

    /// Refresh `usage` if the planner changed since the last call. Returns
    /// whether it was recomputed.
    pub(crate) fn sync_usage(&mut self) -> bool {
        let revision = self.store.revision();
        if self.usage_revision == Some(revision) {
            return false;
        }
        self.usage = self.store.state().usage();
        self.usage_revision = Some(revision);
        true
    }

    pub(crate) fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }
}
