use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing::info;

use crate::allocate::CategoryAllocator;
use crate::categorize::ClassifierChain;
use crate::config::{shellexpand, Config};
use crate::db::Database;
use crate::estimate;
use crate::models::{CategoryRule, Expense, Trip, TripType};
use crate::state::{Action, Store};
use crate::tracking::{alerts, total_spent, UsageLevel};
use crate::ui::util::{format_money, format_percent, parse_amount, parse_date, parse_percent};

pub(crate) fn as_cli(args: &[String], config: &Config, db: &mut Database) -> Result<()> {
    let rest = &args[2..];
    match args[1].as_str() {
        "trips" | "ls" => cli_trips(db),
        "new" => cli_new(rest, config, db),
        "plan" | "show" => cli_plan(rest, config, db),
        "set" => cli_set(rest, config, db),
        "lock" => cli_lock(rest, config, db, true),
        "unlock" => cli_lock(rest, config, db, false),
        "budget" => cli_budget(rest, config, db),
        "spend" => cli_spend(rest, config, db),
        "expenses" => cli_expenses(rest, db),
        "export" => cli_export(rest, db),
        "rule" => cli_rule(rest, db),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("tripbudget {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("TripBudget: plan a trip budget and track what you spend");
    println!();
    println!("Usage: tripbudget [command]");
    println!();
    println!("Commands:");
    println!("  (none)                          Launch interactive TUI");
    println!("  trips                           List trips");
    println!("  new <name> --to <country>       Create a trip");
    println!("    --type <type>                 Leisure, Business, Backpacking, Luxury, Family");
    println!("    --from <YYYY-MM-DD>           First day");
    println!("    --until <YYYY-MM-DD>          Last day");
    println!("    --budget <amount>             Total budget");
    println!("    --travelers <n>               Number of travelers (default 1)");
    println!("    --currency <code>             Display currency (default from config)");
    println!("  plan <trip>                     Print the budget split and spending");
    println!("  set <trip> <category> <pct>     Set a category's share");
    println!("  lock <trip> <category>          Lock a category");
    println!("  unlock <trip> <category>        Unlock a category");
    println!("  budget <trip> <amount>          Set the total budget");
    println!("  spend <trip> <amount> <desc>    Record an expense");
    println!("    --category <key>              Skip auto-categorization");
    println!("    --date <YYYY-MM-DD>           Expense date (default today)");
    println!("  expenses <trip>                 List expenses");
    println!("  export <trip> [path]            Export expenses to CSV");
    println!("  rule <pattern> <category>       Add a categorization rule");
    println!("  --help, -h                      Show this help");
    println!("  --version, -V                   Show version");
    println!();
    println!("<trip> is a trip id or name.");
}

// ── Argument helpers ─────────────────────────────────────────

const VALUE_FLAGS: &[&str] = &[
    "--to",
    "--type",
    "--from",
    "--until",
    "--budget",
    "--travelers",
    "--currency",
    "--category",
    "--date",
];

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

/// Arguments that are neither flags nor flag values.
fn positional(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if VALUE_FLAGS.contains(&arg.as_str()) {
            iter.next();
        } else if !arg.starts_with("--") {
            out.push(arg.as_str());
        }
    }
    out
}

/// Resolve a trip by id, falling back to a case-insensitive name match.
fn find_trip(db: &Database, reference: &str) -> Result<Trip> {
    if let Ok(id) = reference.parse::<i64>() {
        if let Some(trip) = db.get_trip_by_id(id)? {
            return Ok(trip);
        }
    }
    let trips = db.get_trips()?;
    Trip::find_by_name(&trips, reference)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Trip '{reference}' not found"))
}

/// A store holding `trip` with its categories and expenses.
fn load_store(config: &Config, db: &Database, trip: Trip) -> Result<Store> {
    let trip_id = trip.id.context("Trip has no ID")?;
    let estimator = estimate::from_config(config);
    let recommended = estimate::recommended_for(estimator.as_ref(), &trip)?;
    let categories = db.load_categories(trip_id)?.unwrap_or_default();
    let expenses = db.get_expenses(trip_id)?;

    let mut store = Store::new(CategoryAllocator::new(config.buffer_minimum)?);
    store.dispatch(Action::LoadTrip {
        trip,
        categories,
        expenses,
        recommended,
    })?;
    Ok(store)
}

fn save_categories(db: &mut Database, store: &Store) -> Result<()> {
    let trip_id = store.state().trip_id().context("No trip loaded")?;
    db.save_categories(trip_id, &store.state().categories)
}

fn category_key(store: &Store, name: &str) -> Result<String> {
    store
        .state()
        .categories
        .find(name)
        .map(|c| c.key.clone())
        .ok_or_else(|| anyhow::anyhow!("Unknown category: {name}"))
}

// ── Commands ─────────────────────────────────────────────────

fn cli_trips(db: &mut Database) -> Result<()> {
    let trips = db.get_trips()?;
    if trips.is_empty() {
        println!("No trips");
        return Ok(());
    }

    println!(
        "{:<4} {:<20} {:<16} {:<12} {:<26} Budget",
        "ID", "Name", "Destination", "Type", "Dates"
    );
    println!("{}", "─".repeat(90));
    for trip in &trips {
        println!(
            "{:<4} {:<20} {:<16} {:<12} {:<26} {}",
            trip.id.unwrap_or(0),
            trip.name,
            trip.destination,
            trip.trip_type,
            trip.date_range_label(),
            format_money(trip.total_budget, &trip.currency),
        );
    }
    Ok(())
}

fn cli_new(args: &[String], config: &Config, db: &mut Database) -> Result<()> {
    let usage = "Usage: tripbudget new <name> --to <country> [--type T] [--from D --until D] [--budget N] [--travelers N] [--currency C]";
    let name = positional(args).join(" ");
    let destination = flag_value(args, "--to").unwrap_or_default().trim();
    if name.is_empty() || destination.is_empty() {
        anyhow::bail!(usage);
    }

    let trip_type = flag_value(args, "--type").map_or(TripType::Leisure, TripType::parse);
    let currency = flag_value(args, "--currency").map_or_else(
        || config.currency.clone(),
        |c| c.trim().to_uppercase(),
    );
    let mut trip = Trip::new(name, destination.to_string(), trip_type, currency);
    trip.start_date = flag_value(args, "--from").map(parse_date).transpose()?;
    trip.end_date = flag_value(args, "--until").map(parse_date).transpose()?;
    if let (Some(start), Some(end)) = (trip.start_date, trip.end_date) {
        if end < start {
            anyhow::bail!("End date {end} is before start date {start}");
        }
    }
    if let Some(budget) = flag_value(args, "--budget") {
        let amount = parse_amount(budget)?;
        if amount < Decimal::ZERO {
            anyhow::bail!("Budget cannot be negative");
        }
        trip.total_budget = amount;
    }
    if let Some(travelers) = flag_value(args, "--travelers") {
        trip.travelers = travelers
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| anyhow::anyhow!("Travelers must be a positive number"))?;
    }

    let id = db.insert_trip(&trip)?;
    info!(trip_id = id, "trip created from cli");
    println!("Created trip {id}: {trip}");

    let estimator = estimate::from_config(config);
    let recommended = estimate::recommended_for(estimator.as_ref(), &trip)?;
    if !recommended.is_zero() {
        println!(
            "Recommended budget: {}",
            format_money(recommended, &trip.currency)
        );
    }
    Ok(())
}

fn cli_plan(args: &[String], config: &Config, db: &mut Database) -> Result<()> {
    let reference = positional(args)
        .first()
        .copied()
        .ok_or_else(|| anyhow::anyhow!("Usage: tripbudget plan <trip>"))?;
    let store = load_store(config, db, find_trip(db, reference)?)?;
    print_plan(&store);
    Ok(())
}

fn print_plan(store: &Store) {
    let state = store.state();
    let Some(trip) = state.trip.as_ref() else {
        return;
    };
    let currency = trip.currency.as_str();
    let usage = state.usage();

    println!("{trip}");
    println!("{}", "─".repeat(72));
    println!(
        "  {} · {} · {} traveler(s)",
        trip.trip_type,
        trip.date_range_label(),
        trip.travelers
    );
    println!("  Budget:       {}", format_money(trip.total_budget, currency));
    if !state.recommended.is_zero() {
        println!("  Recommended:  {}", format_money(state.recommended, currency));
    }
    println!(
        "  Spent:        {}",
        format_money(total_spent(&state.expenses), currency)
    );
    println!("  Status:       {}", state.status());
    println!();
    println!(
        "  {:<3}{:<20} {:>7} {:>14} {:>14}",
        "", "Category", "Share", "Amount", "Spent"
    );
    for cat in &state.categories {
        let spent = usage
            .iter()
            .find(|u| u.key == cat.key)
            .map(|u| format_money(u.spent, currency))
            .unwrap_or_default();
        let marker = if cat.locked { "* " } else { "  " };
        println!(
            "  {marker} {:<20} {:>7} {:>14} {:>14}",
            cat.label,
            format_percent(cat.percentage),
            format_money(state.amount_for(&cat.key), currency),
            spent,
        );
    }

    let flagged = alerts(&usage);
    if !flagged.is_empty() {
        println!();
        for u in flagged {
            let verb = if u.level == UsageLevel::Exceeded {
                "over budget"
            } else {
                "nearly spent"
            };
            println!(
                "  ! {} is {verb}: {} of {} ({} left)",
                u.label,
                format_money(u.spent, currency),
                format_money(u.allocated, currency),
                format_money(u.remaining(), currency)
            );
        }
    }
}

fn cli_set(args: &[String], config: &Config, db: &mut Database) -> Result<()> {
    let [reference, category, pct] = positional(args)[..] else {
        anyhow::bail!("Usage: tripbudget set <trip> <category> <percent>");
    };
    let value = parse_percent(pct)?;
    let mut store = load_store(config, db, find_trip(db, reference)?)?;
    let key = category_key(&store, category)?;
    store.dispatch(Action::SetPercentage {
        key: key.clone(),
        value,
    })?;
    save_categories(db, &store)?;

    let actual = store
        .state()
        .categories
        .get(&key)
        .map_or(0.0, |c| c.percentage);
    println!("{category} set to {}", format_percent(actual));
    print_plan(&store);
    Ok(())
}

fn cli_lock(args: &[String], config: &Config, db: &mut Database, locked: bool) -> Result<()> {
    let [reference, category] = positional(args)[..] else {
        let verb = if locked { "lock" } else { "unlock" };
        anyhow::bail!("Usage: tripbudget {verb} <trip> <category>");
    };
    let mut store = load_store(config, db, find_trip(db, reference)?)?;
    let key = category_key(&store, category)?;
    store.dispatch(Action::SetLocked { key, locked })?;
    save_categories(db, &store)?;
    println!(
        "{category} {}",
        if locked { "locked" } else { "unlocked" }
    );
    Ok(())
}

fn cli_budget(args: &[String], config: &Config, db: &mut Database) -> Result<()> {
    let [reference, amount] = positional(args)[..] else {
        anyhow::bail!("Usage: tripbudget budget <trip> <amount>");
    };
    let amount = parse_amount(amount)?;
    let mut store = load_store(config, db, find_trip(db, reference)?)?;
    store.dispatch(Action::SetTotalBudget(amount))?;
    let trip = store.state().trip.clone().context("No trip loaded")?;
    db.update_trip(&trip)?;

    println!(
        "Budget set to {} ({})",
        format_money(amount, &trip.currency),
        store.state().status()
    );
    Ok(())
}

fn cli_spend(args: &[String], config: &Config, db: &mut Database) -> Result<()> {
    let words = positional(args);
    let [reference, amount, description @ ..] = &words[..] else {
        anyhow::bail!("Usage: tripbudget spend <trip> <amount> <description> [--category K] [--date D]");
    };
    let description = description.join(" ");
    if description.is_empty() {
        anyhow::bail!("Expense needs a description");
    }
    let amount = parse_amount(amount)?;
    let mut store = load_store(config, db, find_trip(db, reference)?)?;
    let trip_id = store.state().trip_id().context("No trip loaded")?;

    let key = match flag_value(args, "--category") {
        Some(name) => category_key(&store, name)?,
        None => {
            let (classifier, bad_patterns) = ClassifierChain::with_rules(&db.get_category_rules()?);
            if !bad_patterns.is_empty() {
                eprintln!(
                    "Warning: invalid regex rule(s): {}",
                    bad_patterns.join(", ")
                );
            }
            classifier.classify_within(&description, &store.state().categories)
        }
    };

    let mut expense = Expense::new(trip_id, description, amount, key)?;
    if let Some(date) = flag_value(args, "--date") {
        expense = expense.with_date(parse_date(date)?.to_string());
    }
    expense.id = Some(db.insert_expense(&expense)?);
    store.dispatch(Action::AddExpense(expense.clone()))?;

    let currency = store
        .state()
        .trip
        .as_ref()
        .map_or(config.currency.as_str(), |t| t.currency.as_str());
    let label = store
        .state()
        .categories
        .get(&expense.category_key)
        .map_or(expense.category_key.as_str(), |c| c.label.as_str());
    println!(
        "Recorded {} for {} under {label}",
        format_money(expense.amount, currency),
        expense.description
    );
    if let Some(u) = store
        .state()
        .usage()
        .into_iter()
        .find(|u| u.key == expense.category_key && u.level != UsageLevel::Ok)
    {
        println!(
            "! {} at {:.0}% of its allocation",
            u.label,
            u.ratio * 100.0
        );
    }
    Ok(())
}

fn cli_expenses(args: &[String], db: &mut Database) -> Result<()> {
    let reference = positional(args)
        .first()
        .copied()
        .ok_or_else(|| anyhow::anyhow!("Usage: tripbudget expenses <trip>"))?;
    let trip = find_trip(db, reference)?;
    let trip_id = trip.id.context("Trip has no ID")?;
    let expenses = db.get_expenses(trip_id)?;
    if expenses.is_empty() {
        println!("No expenses for {}", trip.name);
        return Ok(());
    }

    println!(
        "{:<4} {:<12} {:<32} {:<16} Amount",
        "ID", "Date", "Description", "Category"
    );
    println!("{}", "─".repeat(80));
    for e in &expenses {
        println!(
            "{:<4} {:<12} {:<32} {:<16} {}",
            e.id.unwrap_or(0),
            e.date,
            e.description,
            e.category_key,
            format_money(e.amount, &trip.currency),
        );
    }
    println!("{}", "─".repeat(80));
    println!(
        "Total: {}",
        format_money(total_spent(&expenses), &trip.currency)
    );

    println!();
    println!("By category:");
    for (key, amount) in db.get_spending_by_category(trip_id)? {
        println!("  {key:<24} {}", format_money(amount, &trip.currency));
    }
    Ok(())
}

fn cli_export(args: &[String], db: &mut Database) -> Result<()> {
    let words = positional(args);
    let Some(reference) = words.first() else {
        anyhow::bail!("Usage: tripbudget export <trip> [path]");
    };
    let trip = find_trip(db, reference)?;
    let trip_id = trip.id.context("Trip has no ID")?;

    let output_path = words.get(1).map(|p| shellexpand(p)).unwrap_or_else(|| {
        let slug: String = trip
            .name
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '-' })
            .collect();
        shellexpand(&format!("~/tripbudget-{slug}.csv"))
    });

    let count = db.export_expenses_csv(trip_id, &PathBuf::from(&output_path))?;
    if count == 0 {
        println!("No expenses for {}", trip.name);
    } else {
        println!("Exported {count} expenses to {output_path}");
    }
    Ok(())
}

fn cli_rule(args: &[String], db: &mut Database) -> Result<()> {
    let words = positional(args);
    let [pattern @ .., category] = &words[..] else {
        anyhow::bail!("Usage: tripbudget rule <pattern> <category>");
    };
    let pattern = pattern.join(" ");
    if pattern.is_empty() {
        anyhow::bail!("Usage: tripbudget rule <pattern> <category>");
    }
    let rule = CategoryRule::new_contains(pattern.clone(), category.to_lowercase());
    let id = db.insert_category_rule(&rule)?;
    println!("Rule {id}: '{pattern}' → {}", rule.category_key);
    Ok(())
}
