use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::str::FromStr;

use super::{scale_daily, BudgetEstimator, EstimateRequest};

/// Daily costs from a CSV file with the header
/// `country,trip_type,daily_cost`. A `*` trip type matches any trip.
///
/// The file is read on every estimate so edits show up without a restart.
pub(crate) struct TableEstimator {
    path: PathBuf,
}

impl TableEstimator {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn lookup(&self, request: &EstimateRequest) -> Result<Decimal> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .with_context(|| format!("Failed to open cost table: {}", self.path.display()))?;

        let country = request.destination.trim().to_lowercase();
        let trip_type = request.trip_type.as_str().to_lowercase();
        let mut wildcard = None;

        for (line, result) in rdr.records().enumerate() {
            let record = result.context("Failed to read cost table record")?;
            let (Some(c), Some(t), Some(cost)) = (record.get(0), record.get(1), record.get(2)) else {
                anyhow::bail!("Cost table row {} has fewer than 3 columns", line + 2);
            };
            if c.to_lowercase() != country {
                continue;
            }
            let cost = Decimal::from_str(cost)
                .with_context(|| format!("Invalid daily cost on row {}: {cost}", line + 2))?;
            if t.to_lowercase() == trip_type {
                return Ok(cost);
            }
            if t == "*" && wildcard.is_none() {
                wildcard = Some(cost);
            }
        }

        wildcard.ok_or_else(|| {
            anyhow::anyhow!(
                "No cost table entry for {} ({})",
                request.destination,
                request.trip_type
            )
        })
    }
}

impl BudgetEstimator for TableEstimator {
    fn name(&self) -> &str {
        "cost table"
    }

    fn estimate(&self, request: &EstimateRequest) -> Result<Decimal> {
        let daily = self.lookup(request)?;
        scale_daily(daily, request)
    }
}
