use std::collections::HashMap;
use std::sync::LazyLock;

use tracing::info;

use super::app::{App, InputMode, PendingAction, Screen};
use super::util::{format_money, format_percent, parse_amount, parse_date, parse_percent};
use crate::categorize::suggest_rule;
use crate::db::Database;
use crate::models::{CategoryRule, Expense, Trip, TripType};
use crate::state::Action;

pub(crate) struct Command {
    pub(crate) description: &'static str,
    pub(crate) run: fn(&str, &mut App, &mut Database) -> anyhow::Result<()>,
}

macro_rules! register_command {
    ($name:expr, $desc:expr, $func:expr, $registry:expr) => {{
        $registry.insert(
            $name,
            Command {
                description: $desc,
                run: $func,
            },
        );
    }};
}

pub(crate) static COMMANDS: LazyLock<HashMap<&str, Command>> = LazyLock::new(|| {
    let mut r: HashMap<&str, Command> = HashMap::new();

    register_command!("q", "Quit TripBudget", cmd_quit, r);
    register_command!("quit", "Quit TripBudget", cmd_quit, r);
    register_command!("p", "Go to Planner", cmd_planner, r);
    register_command!("planner", "Go to Planner", cmd_planner, r);
    register_command!("e", "Go to Expenses", cmd_expenses, r);
    register_command!("expenses", "Go to Expenses", cmd_expenses, r);
    register_command!("t", "Go to Trips", cmd_trips, r);
    register_command!("trips", "Go to Trips", cmd_trips, r);
    register_command!("help", "Show available commands", cmd_help, r);
    register_command!("h", "Show available commands", cmd_help, r);
    register_command!(
        "trip",
        "Create trip (e.g. :trip Spring Break to Japan)",
        cmd_trip,
        r
    );
    register_command!("open", "Open trip by name or id (e.g. :open Rome)", cmd_open, r);
    register_command!("o", "Open trip by name or id", cmd_open, r);
    register_command!("rename", "Rename the active trip", cmd_rename, r);
    register_command!(
        "dest",
        "Change destination country (e.g. :dest Italy)",
        cmd_dest,
        r
    );
    register_command!(
        "dates",
        "Set trip dates (e.g. :dates 2025-04-01 2025-04-10)",
        cmd_dates,
        r
    );
    register_command!("budget", "Set total budget (e.g. :budget 4500)", cmd_budget, r);
    register_command!("b", "Set total budget (e.g. :b 4500)", cmd_budget, r);
    register_command!(
        "type",
        "Set trip type (Leisure, Business, Backpacking, Luxury, Family)",
        cmd_type,
        r
    );
    register_command!("travelers", "Set number of travelers", cmd_travelers, r);
    register_command!("currency", "Set trip currency (e.g. :currency EUR)", cmd_currency, r);
    register_command!(
        "set",
        "Set category share (e.g. :set food 30)",
        cmd_set,
        r
    );
    register_command!("lock", "Lock a category (e.g. :lock transport)", cmd_lock, r);
    register_command!("unlock", "Unlock a category", cmd_unlock, r);
    register_command!("reset", "Reset categories to the default split", cmd_reset, r);
    register_command!(
        "spend",
        "Record expense (e.g. :spend 12.50 Ramen @food)",
        cmd_spend,
        r
    );
    register_command!("s", "Record expense (e.g. :s 12.50 Ramen)", cmd_spend, r);
    register_command!("recat", "Re-categorize selected expense", cmd_recat, r);
    register_command!(
        "delete-expense",
        "Delete selected expense",
        cmd_delete_expense,
        r
    );
    register_command!("delete-trip", "Delete selected trip", cmd_delete_trip, r);
    register_command!(
        "rule",
        "Add categorization rule (e.g. :rule ryokan accommodation)",
        cmd_rule,
        r
    );
    register_command!(
        "regex-rule",
        "Add regex rule (e.g. :regex-rule ^jr\\b transport)",
        cmd_regex_rule,
        r
    );
    register_command!("rules", "List categorization rules", cmd_rules, r);
    register_command!(
        "delete-rule",
        "Delete rule by pattern (e.g. :delete-rule ryokan)",
        cmd_delete_rule,
        r
    );
    register_command!(
        "export",
        "Export expenses to CSV (e.g. :export ~/rome.csv)",
        cmd_export,
        r
    );
    register_command!("estimate", "Recalculate the recommended budget", cmd_estimate, r);

    r
});

pub(crate) fn handle_command(input: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let trimmed = input.trim();
    let mut parts = trimmed.splitn(2, ' ');
    let cmd_name = parts.next().unwrap_or("");
    let args = parts.next().unwrap_or("").trim();

    if let Some(cmd) = COMMANDS.get(cmd_name) {
        (cmd.run)(args, app, db)?;
    } else {
        let suggestion = find_closest(cmd_name);
        app.set_status(format!(
            "Unknown command: :{cmd_name}. Did you mean :{suggestion}?"
        ));
    }

    Ok(())
}

fn find_closest(input: &str) -> String {
    COMMANDS
        .keys()
        .filter(|k| k.len() > 1) // skip single-letter aliases for suggestions
        .min_by_key(|k| levenshtein(input, k))
        .unwrap_or(&"help")
        .to_string()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// The active trip, or a status hint when none is open.
fn active_trip(app: &mut App) -> Option<Trip> {
    let trip = app.state().trip.clone();
    if trip.is_none() {
        app.set_status("No trip open. Create one with :trip <name> to <country>");
    }
    trip
}

fn update_trip(app: &mut App, db: &mut Database, trip: Trip, msg: String) -> anyhow::Result<()> {
    app.apply(db, Action::UpdateTrip(trip))?;
    app.set_status(msg);
    Ok(())
}

// ── Command implementations ──────────────────────────────────

fn cmd_quit(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.running = false;
    Ok(())
}

fn cmd_planner(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.screen = Screen::Planner;
    Ok(())
}

fn cmd_expenses(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.screen = Screen::Expenses;
    Ok(())
}

fn cmd_trips(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.screen = Screen::Trips;
    app.refresh_trips(db)?;
    Ok(())
}

fn cmd_help(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    app.show_help = true;
    Ok(())
}

fn cmd_trip(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let Some((name, destination)) = args.rsplit_once(" to ") else {
        app.set_status("Usage: :trip <name> to <country>");
        return Ok(());
    };
    let (name, destination) = (name.trim(), destination.trim());
    if name.is_empty() || destination.is_empty() {
        app.set_status("Usage: :trip <name> to <country>");
        return Ok(());
    }

    let trip = Trip::new(
        name.to_string(),
        destination.to_string(),
        TripType::Leisure,
        app.default_currency.clone(),
    );
    let id = db.insert_trip(&trip)?;
    app.refresh_trips(db)?;
    app.open_trip(db, id)?;
    app.screen = Screen::Planner;
    app.set_status(format!(
        "Created {name}. Set :dates and :budget to get a recommendation"
    ));
    Ok(())
}

fn cmd_open(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :open <trip name or id>");
        return Ok(());
    }

    app.refresh_trips(db)?;
    let found = Trip::find_by_name(&app.trips, args)
        .or_else(|| {
            args.parse::<i64>()
                .ok()
                .and_then(|id| app.trips.iter().find(|t| t.id == Some(id)))
        })
        .and_then(|t| t.id.map(|id| (id, t.name.clone())));

    match found {
        Some((id, name)) => {
            app.open_trip(db, id)?;
            app.screen = Screen::Planner;
            app.set_status(format!("Opened {name}"));
        }
        None => {
            let names: Vec<&str> = app.trips.iter().map(|t| t.name.as_str()).collect();
            app.set_status(format!("Trip not found. Available: {}", names.join(", ")));
        }
    }
    Ok(())
}

fn cmd_rename(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :rename <new name>");
        return Ok(());
    }
    let Some(mut trip) = active_trip(app) else {
        return Ok(());
    };
    trip.name = args.to_string();
    update_trip(app, db, trip, format!("Renamed to {args}"))
}

fn cmd_dest(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :dest <country>");
        return Ok(());
    }
    let Some(mut trip) = active_trip(app) else {
        return Ok(());
    };
    trip.destination = args.to_string();
    update_trip(app, db, trip, format!("Destination set to {args}"))
}

fn cmd_dates(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let parts: Vec<&str> = args.split_whitespace().collect();
    if parts.len() != 2 {
        app.set_status("Usage: :dates <YYYY-MM-DD> <YYYY-MM-DD>");
        return Ok(());
    }
    let (start, end) = match (parse_date(parts[0]), parse_date(parts[1])) {
        (Ok(s), Ok(e)) => (s, e),
        (Err(e), _) | (_, Err(e)) => {
            app.set_status(e.to_string());
            return Ok(());
        }
    };
    if end < start {
        app.set_status("The trip cannot end before it starts");
        return Ok(());
    }
    let Some(mut trip) = active_trip(app) else {
        return Ok(());
    };
    trip.start_date = Some(start);
    trip.end_date = Some(end);
    let days = trip.days().unwrap_or(0);
    update_trip(app, db, trip, format!("Dates set: {days} days"))
}

fn cmd_budget(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :budget <amount>");
        return Ok(());
    }
    let amount = match parse_amount(args) {
        Ok(a) => a,
        Err(e) => {
            app.set_status(e.to_string());
            return Ok(());
        }
    };
    if active_trip(app).is_none() {
        return Ok(());
    }
    app.apply(db, Action::SetTotalBudget(amount))?;
    let status = app.state().status();
    let money = format_money(amount, app.currency());
    app.set_status(format!("Budget set to {money}. {status}"));
    Ok(())
}

fn cmd_type(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if args.is_empty() {
        let types: Vec<&str> = TripType::all().iter().map(|t| t.as_str()).collect();
        app.set_status(format!("Usage: :type <type>. Types: {}", types.join(", ")));
        return Ok(());
    }
    let Some(mut trip) = active_trip(app) else {
        return Ok(());
    };
    trip.trip_type = TripType::parse(args);
    let msg = format!("Trip type set to {}", trip.trip_type);
    update_trip(app, db, trip, msg)
}

fn cmd_travelers(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let count = match args.trim().parse::<u32>() {
        Ok(n) if n > 0 => n,
        _ => {
            app.set_status("Usage: :travelers <number greater than 0>");
            return Ok(());
        }
    };
    let Some(mut trip) = active_trip(app) else {
        return Ok(());
    };
    trip.travelers = count;
    update_trip(app, db, trip, format!("Travelers set to {count}"))
}

fn cmd_currency(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let code = args.trim().to_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        app.set_status("Usage: :currency <3-letter code>");
        return Ok(());
    }
    let Some(mut trip) = active_trip(app) else {
        return Ok(());
    };
    trip.currency = code.clone();
    update_trip(app, db, trip, format!("Currency set to {code}"))
}

fn cmd_set(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let Some((name, value)) = args.rsplit_once(' ') else {
        app.set_status("Usage: :set <category> <percent>");
        return Ok(());
    };
    let value = match parse_percent(value) {
        Ok(v) => v,
        Err(e) => {
            app.set_status(e.to_string());
            return Ok(());
        }
    };
    let Some(key) = app.state().categories.find(name.trim()).map(|c| c.key.clone()) else {
        app.set_status(format!("Category '{}' not found", name.trim()));
        return Ok(());
    };
    app.set_percentage(db, &key, value)
}

fn set_lock(args: &str, app: &mut App, db: &mut Database, locked: bool) -> anyhow::Result<()> {
    let Some(cat) = app.state().categories.find(args).cloned() else {
        app.set_status(format!("Category '{args}' not found"));
        return Ok(());
    };
    app.apply(
        db,
        Action::SetLocked {
            key: cat.key,
            locked,
        },
    )?;
    let verb = if locked { "Locked" } else { "Unlocked" };
    app.set_status(format!("{verb} {}", cat.label));
    Ok(())
}

fn cmd_lock(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    set_lock(args, app, db, true)
}

fn cmd_unlock(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    set_lock(args, app, db, false)
}

fn cmd_reset(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    if active_trip(app).is_none() {
        return Ok(());
    }
    app.confirm_message = "Reset all categories to the default split?".into();
    app.pending_action = Some(PendingAction::ResetCategories);
    app.input_mode = InputMode::Confirm;
    Ok(())
}

fn cmd_spend(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let Some((amount, rest)) = args.split_once(' ') else {
        app.set_status("Usage: :spend <amount> <description> [@category]");
        return Ok(());
    };
    let amount = match parse_amount(amount) {
        Ok(a) => a,
        Err(e) => {
            app.set_status(e.to_string());
            return Ok(());
        }
    };
    let Some(trip) = active_trip(app) else {
        return Ok(());
    };
    let Some(trip_id) = trip.id else {
        return Ok(());
    };

    let (description, explicit) = match rest.rsplit_once(" @") {
        Some((desc, cat)) => (desc.trim(), Some(cat.trim())),
        None => (rest.trim(), None),
    };
    let categories = &app.state().categories;
    let key = match explicit {
        Some(name) => match categories.find(name) {
            Some(c) => c.key.clone(),
            None => {
                app.set_status(format!("Category '{name}' not found"));
                return Ok(());
            }
        },
        None => app.classifier.classify_within(description, categories),
    };

    let expense = match Expense::new(trip_id, description.to_string(), amount, key.clone()) {
        Ok(e) => e,
        Err(e) => {
            app.set_status(e.to_string());
            return Ok(());
        }
    };
    app.add_expense(db, expense)?;
    let money = format_money(amount, &trip.currency);
    app.set_status(format!("Recorded {money} for {description} under {key}"));
    Ok(())
}

fn cmd_recat(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    if app.screen != Screen::Expenses || app.state().expenses.is_empty() {
        app.set_status("Navigate to Expenses and select one first");
        return Ok(());
    }
    if args.is_empty() {
        app.set_status("Usage: :recat <category>");
        return Ok(());
    }

    let Some(cat) = app.state().categories.find(args).cloned() else {
        app.set_status(format!("Category '{args}' not found"));
        return Ok(());
    };
    let Some((id, description)) = app
        .selected_expense()
        .and_then(|e| e.id.map(|id| (id, e.description.clone())))
    else {
        return Ok(());
    };

    app.recategorize_expense(db, id, cat.key.clone())?;
    app.set_status(format!(
        "Categorized as: {}. Tip: :rule {} {}",
        cat.label,
        suggest_rule(&description).to_lowercase(),
        cat.key
    ));
    Ok(())
}

fn cmd_delete_expense(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    if app.screen != Screen::Expenses || app.state().expenses.is_empty() {
        app.set_status("Navigate to Expenses and select one first");
        return Ok(());
    }

    if let Some((id, desc)) = app
        .selected_expense()
        .and_then(|e| e.id.map(|id| (id, e.description.clone())))
    {
        app.confirm_message = format!("Delete '{desc}'?");
        app.pending_action = Some(PendingAction::DeleteExpense {
            id,
            description: desc,
        });
        app.input_mode = InputMode::Confirm;
    }
    Ok(())
}

fn cmd_delete_trip(_args: &str, app: &mut App, _db: &mut Database) -> anyhow::Result<()> {
    if app.screen != Screen::Trips || app.trips.is_empty() {
        app.set_status("Navigate to Trips and select one first");
        return Ok(());
    }

    if let Some((id, name)) = app
        .selected_trip()
        .and_then(|t| t.id.map(|id| (id, t.name.clone())))
    {
        app.confirm_message = format!("Delete trip '{name}' and all its expenses?");
        app.pending_action = Some(PendingAction::DeleteTrip { id, name });
        app.input_mode = InputMode::Confirm;
    }
    Ok(())
}

fn add_rule(args: &str, app: &mut App, db: &mut Database, is_regex: bool) -> anyhow::Result<()> {
    let Some((pattern, category)) = args.rsplit_once(' ') else {
        app.set_status("Usage: :rule <pattern> <category>");
        return Ok(());
    };
    let Some(cat) = app.state().categories.find(category).cloned() else {
        app.set_status(format!("Category '{category}' not found"));
        return Ok(());
    };

    let rule = if is_regex {
        if let Err(e) = regex::Regex::new(pattern) {
            app.set_status(format!("Invalid regex: {e}"));
            return Ok(());
        }
        CategoryRule::new_regex(pattern.to_string(), cat.key.clone())
    } else {
        CategoryRule::new_contains(pattern.to_lowercase(), cat.key.clone())
    };
    db.insert_category_rule(&rule)?;
    app.refresh_rules(db)?;
    info!(pattern = %rule.pattern, category = %cat.key, "rule added");
    app.set_status(format!("Added rule: '{}' -> {}", rule.pattern, cat.label));
    Ok(())
}

fn cmd_rule(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    add_rule(args, app, db, false)
}

fn cmd_regex_rule(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    add_rule(args, app, db, true)
}

fn cmd_rules(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.refresh_rules(db)?;
    if app.rules.is_empty() {
        app.set_status("No rules yet. Add one with :rule <pattern> <category>");
        return Ok(());
    }
    let listed: Vec<String> = app
        .rules
        .iter()
        .map(|r| format!("{} -> {}", r.pattern, r.category_key))
        .collect();
    app.set_status(format!("Rules: {}", listed.join(" | ")));
    Ok(())
}

fn cmd_delete_rule(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    app.refresh_rules(db)?;
    let needle = args.trim().to_lowercase();
    let Some((id, pattern)) = app
        .rules
        .iter()
        .find(|r| r.pattern.to_lowercase() == needle)
        .and_then(|r| r.id.map(|id| (id, r.pattern.clone())))
    else {
        app.set_status(format!("No rule with pattern '{args}'"));
        return Ok(());
    };
    app.confirm_message = format!("Delete rule '{pattern}'?");
    app.pending_action = Some(PendingAction::DeleteRule { id, pattern });
    app.input_mode = InputMode::Confirm;
    Ok(())
}

fn cmd_export(args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let Some(trip) = active_trip(app) else {
        return Ok(());
    };
    let Some(trip_id) = trip.id else {
        return Ok(());
    };
    let path = if args.is_empty() {
        let slug: String = trip
            .name
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '-' })
            .collect();
        crate::config::shellexpand(&format!("~/tripbudget-{slug}.csv"))
    } else {
        crate::config::shellexpand(args)
    };

    let count = db.export_expenses_csv(trip_id, std::path::Path::new(&path))?;
    if count == 0 {
        app.set_status("No expenses to export");
    } else {
        app.set_status(format!("Exported {count} expenses to {path}"));
    }
    Ok(())
}

fn cmd_estimate(_args: &str, app: &mut App, db: &mut Database) -> anyhow::Result<()> {
    let Some(trip) = active_trip(app) else {
        return Ok(());
    };
    let recommended = app.recommendation_for(&trip);
    app.apply(db, Action::SetRecommended(recommended))?;
    if recommended.is_zero() {
        app.set_status(app.state().status().to_string());
    } else {
        let money = format_money(recommended, &trip.currency);
        let source = app.estimator.name().to_string();
        app.set_status(format!("Recommended {money} ({source})"));
    }
    Ok(())
}

/// Carry out a confirmed [`PendingAction`].
pub(crate) fn execute_pending(
    action: PendingAction,
    app: &mut App,
    db: &mut Database,
) -> anyhow::Result<()> {
    match action {
        PendingAction::DeleteExpense { id, description } => {
            app.remove_expense(db, id)?;
            app.set_status(format!("Deleted '{description}'"));
        }
        PendingAction::DeleteTrip { id, name } => {
            db.delete_trip(id)?;
            if app.state().trip_id() == Some(id) {
                app.close_trip();
            }
            app.refresh_trips(db)?;
            app.set_status(format!("Deleted trip '{name}'"));
        }
        PendingAction::DeleteRule { id, pattern } => {
            db.delete_category_rule(id)?;
            app.refresh_rules(db)?;
            app.set_status(format!("Deleted rule '{pattern}'"));
        }
        PendingAction::ResetCategories => {
            app.apply(db, Action::ResetCategories)?;
            app.category_index = 0;
            let buffer = &app.state().categories.buffer().label;
            let msg = format!(
                "Categories reset. {buffer} at {}",
                format_percent(app.state().categories.buffer().percentage)
            );
            app.set_status(msg);
        }
    }
    Ok(())
}
