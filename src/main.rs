mod allocate;
mod categorize;
mod config;
mod db;
mod estimate;
mod models;
mod run;
mod state;
mod tracking;
mod ui;

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config = config::Config::load()?;
    config.ensure_data_dir()?;
    init_logging(&config)?;

    let mut db = db::Database::open(&config.db_path)?;

    match args.len() {
        1 => run::as_tui(&config, &mut db),
        2.. => run::as_cli(&args, &config, &mut db),
        _ => {
            eprintln!("Usage: tripbudget [command]");
            Ok(())
        }
    }
}

/// Log to a file in the data directory; the terminal belongs to the UI.
fn init_logging(config: &config::Config) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
        .with_context(|| format!("Failed to open log file: {}", config.log_path.display()))?;
    let filter = EnvFilter::try_new(&config.log_filter)
        .with_context(|| format!("Invalid TRIPBUDGET_LOG filter: {}", config.log_filter))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))
}
