use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;

use crate::allocate::DEFAULT_BUFFER_MINIMUM;

const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Config {
    pub(crate) data_dir: PathBuf,
    pub(crate) db_path: PathBuf,
    pub(crate) log_path: PathBuf,
    pub(crate) buffer_minimum: f64,
    pub(crate) currency: String,
    /// Optional CSV of daily costs preferred over the built-in estimates.
    pub(crate) cost_table: Option<PathBuf>,
    pub(crate) log_filter: String,
}

impl Config {
    /// Read configuration from the process environment.
    pub(crate) fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), default_data_dir)
    }

    /// Build a config from `lookup` (an environment-like getter).
    /// `default_dir` is only consulted when `TRIPBUDGET_DATA_DIR` is unset.
    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        default_dir: impl FnOnce() -> Result<PathBuf>,
    ) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_dir = match var("TRIPBUDGET_DATA_DIR") {
            Some(dir) => PathBuf::from(shellexpand(&dir)),
            None => default_dir()?,
        };
        let db_path = var("TRIPBUDGET_DB")
            .map(|p| PathBuf::from(shellexpand(&p)))
            .unwrap_or_else(|| data_dir.join("tripbudget.db"));
        let log_path = data_dir.join("tripbudget.log");

        let buffer_minimum: f64 = parse_or(
            "TRIPBUDGET_BUFFER_MIN",
            var("TRIPBUDGET_BUFFER_MIN"),
            DEFAULT_BUFFER_MINIMUM,
        )?;
        if !buffer_minimum.is_finite() || !(0.0..=100.0).contains(&buffer_minimum) {
            anyhow::bail!("TRIPBUDGET_BUFFER_MIN must be between 0 and 100, got {buffer_minimum}");
        }

        let currency = var("TRIPBUDGET_CURRENCY")
            .map(|c| c.trim().to_uppercase())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            anyhow::bail!("TRIPBUDGET_CURRENCY must be a 3-letter code, got {currency}");
        }

        let cost_table = var("TRIPBUDGET_COST_TABLE").map(|p| PathBuf::from(shellexpand(&p)));
        let log_filter = var("TRIPBUDGET_LOG").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            data_dir,
            db_path,
            log_path,
            buffer_minimum,
            currency,
            cost_table,
            log_filter,
        })
    }

    pub(crate) fn ensure_data_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir).with_context(|| {
            format!("Failed to create data directory: {}", self.data_dir.display())
        })
    }
}

fn parse_or<T: FromStr>(key: &str, value: Option<String>, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid {key} value '{raw}': {e}")),
        None => Ok(default),
    }
}

fn default_data_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "tripbudget", "TripBudget")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(proj_dirs.data_dir().to_path_buf())
}

pub(crate) fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = directories::UserDirs::new()
            .map(|d| d.home_dir().display().to_string())
            .or_else(|| std::env::var("HOME").ok())
            .unwrap_or_else(|| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(
            |k| map.get(k).cloned(),
            || Ok(PathBuf::from("/data/tripbudget")),
        )
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/data/tripbudget"));
        assert_eq!(config.db_path, PathBuf::from("/data/tripbudget/tripbudget.db"));
        assert_eq!(config.log_path, PathBuf::from("/data/tripbudget/tripbudget.log"));
        assert_eq!(config.buffer_minimum, 10.0);
        assert_eq!(config.currency, "USD");
        assert!(config.cost_table.is_none());
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("TRIPBUDGET_DATA_DIR", "/tmp/tb"),
            ("TRIPBUDGET_BUFFER_MIN", "15"),
            ("TRIPBUDGET_CURRENCY", "eur"),
            ("TRIPBUDGET_COST_TABLE", "/tmp/costs.csv"),
            ("TRIPBUDGET_LOG", "debug"),
        ])
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/tb/tripbudget.db"));
        assert_eq!(config.buffer_minimum, 15.0);
        assert_eq!(config.currency, "EUR");
        assert_eq!(config.cost_table, Some(PathBuf::from("/tmp/costs.csv")));
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn test_explicit_db_path() {
        let config = load(&[("TRIPBUDGET_DB", "/var/lib/trips.db")]).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/var/lib/trips.db"));
        assert_eq!(config.data_dir, PathBuf::from("/data/tripbudget"));
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = load(&[("TRIPBUDGET_CURRENCY", "  "), ("TRIPBUDGET_BUFFER_MIN", "")]).unwrap();
        assert_eq!(config.currency, "USD");
        assert_eq!(config.buffer_minimum, 10.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(load(&[("TRIPBUDGET_BUFFER_MIN", "ten")]).is_err());
        assert!(load(&[("TRIPBUDGET_BUFFER_MIN", "150")]).is_err());
        assert!(load(&[("TRIPBUDGET_BUFFER_MIN", "NaN")]).is_err());
        assert!(load(&[("TRIPBUDGET_CURRENCY", "EURO")]).is_err());
    }

    #[test]
    fn test_default_dir_error_propagates() {
        let result = Config::from_lookup(|_| None, || anyhow::bail!("no home"));
        assert!(result.is_err());
    }

    #[test]
    fn test_shellexpand_passthrough() {
        assert_eq!(shellexpand("/abs/path.csv"), "/abs/path.csv");
        assert!(!shellexpand("~/x.csv").starts_with('~'));
    }
}
