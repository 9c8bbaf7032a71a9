//! Budget-category percentage allocation.
//!
//! Every edit returns a fresh [`CategorySet`] whose shares add up to 100.
//! Growth in one category is paid for by the other unlocked categories in
//! proportion to their size; shrinkage flows into the buffer category.

mod error;
mod status;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::models::{Category, CategorySet};

pub use error::AllocationError;
pub use status::{status_for_budget, BudgetStatus, Undetermined};

/// The whole budget, in percent.
pub const FULL_SHARE: f64 = 100.0;
/// Allowed drift when comparing a set's total to [`FULL_SHARE`].
pub const TOLERANCE: f64 = 1e-6;
pub const DEFAULT_BUFFER_MINIMUM: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryAllocator {
    buffer_minimum: f64,
}

impl Default for CategoryAllocator {
    fn default() -> Self {
        Self {
            buffer_minimum: DEFAULT_BUFFER_MINIMUM,
        }
    }
}

impl CategoryAllocator {
    pub fn new(buffer_minimum: f64) -> Result<Self, AllocationError> {
        if !buffer_minimum.is_finite() || !(0.0..=FULL_SHARE).contains(&buffer_minimum) {
            return Err(AllocationError::InvalidMinimum(buffer_minimum));
        }
        Ok(Self { buffer_minimum })
    }

    pub fn buffer_minimum(&self) -> f64 {
        self.buffer_minimum
    }

    /// Set `changed_key` to `requested` (clamped to 0..=100, the buffer to
    /// its minimum..=100) and rebalance the rest of the set.
    ///
    /// The input set is never modified; on error nothing changes.
    pub fn set_percentage(
        &self,
        set: &CategorySet,
        changed_key: &str,
        requested: f64,
    ) -> Result<CategorySet, AllocationError> {
        if !requested.is_finite() {
            return Err(AllocationError::NonFinite(requested));
        }
        let changed = set
            .position(changed_key)
            .ok_or_else(|| AllocationError::UnknownCategory(changed_key.to_string()))?;
        let buffer = set.buffer_index();

        let mut value = requested.clamp(0.0, FULL_SHARE);
        if changed == buffer {
            value = value.max(self.buffer_minimum);
        }

        let mut next = set.clone();
        let cats = next.categories_mut();
        cats[changed].percentage = value;
        // A set can arrive with the buffer under its floor (the default one
        // does); any edit restores the floor.
        if changed != buffer && cats[buffer].percentage < self.buffer_minimum {
            cats[buffer].percentage = self.buffer_minimum;
        }

        let total: f64 = cats.iter().map(|c| c.percentage).sum();
        if total > FULL_SHARE {
            let residual = self.shed_excess(cats, changed, buffer, total - FULL_SHARE);
            if residual > 0.0 {
                let floor = self.floor_of(changed, buffer);
                let room = cats[changed].percentage - floor;
                if residual - room > TOLERANCE {
                    warn!(
                        category = changed_key,
                        excess = residual - room,
                        "edit cannot be balanced against locked categories"
                    );
                    return Err(AllocationError::Overallocated {
                        excess: residual - room,
                    });
                }
                cats[changed].percentage = (cats[changed].percentage - residual).max(floor);
            }
        } else if total < FULL_SHARE {
            let deficit = FULL_SHARE - total;
            cats[buffer].percentage = (cats[buffer].percentage + deficit).min(FULL_SHARE);
        }

        debug!(
            category = changed_key,
            requested,
            applied = next.as_slice()[changed].percentage,
            buffer = next.buffer().percentage,
            "percentage updated"
        );
        Ok(next)
    }

    /// Lock or unlock a category.
    pub fn set_locked(
        &self,
        set: &CategorySet,
        key: &str,
        locked: bool,
    ) -> Result<CategorySet, AllocationError> {
        let index = set
            .position(key)
            .ok_or_else(|| AllocationError::UnknownCategory(key.to_string()))?;
        let mut next = set.clone();
        next.categories_mut()[index].locked = locked;
        Ok(next)
    }

    fn floor_of(&self, index: usize, buffer: usize) -> f64 {
        if index == buffer {
            self.buffer_minimum
        } else {
            0.0
        }
    }

    /// Take `excess` out of every unlocked category except `changed`, in
    /// proportion to size. A category that reaches its floor drops out and
    /// the remainder is spread over the rest. Returns what could not be shed.
    fn shed_excess(
        &self,
        cats: &mut [Category],
        changed: usize,
        buffer: usize,
        mut excess: f64,
    ) -> f64 {
        while excess > 0.0 {
            let pool: Vec<usize> = (0..cats.len())
                .filter(|&i| {
                    i != changed && !cats[i].locked && cats[i].percentage > self.floor_of(i, buffer)
                })
                .collect();
            let pool_total: f64 = pool.iter().map(|&i| cats[i].percentage).sum();
            if pool.is_empty() || pool_total <= 0.0 {
                break;
            }

            let mut shed = 0.0;
            let mut floored = false;
            for &i in &pool {
                let floor = self.floor_of(i, buffer);
                let wanted = cats[i].percentage / pool_total * excess;
                let room = cats[i].percentage - floor;
                if wanted >= room {
                    cats[i].percentage = floor;
                    shed += room;
                    floored = true;
                } else {
                    cats[i].percentage -= wanted;
                    shed += wanted;
                }
            }
            excess -= shed;

            if !floored {
                break;
            }
        }
        excess.max(0.0)
    }
}

/// Share of `total_budget` that goes to `key`.
pub fn amount_for_category(
    set: &CategorySet,
    key: &str,
    total_budget: Decimal,
) -> Result<Decimal, AllocationError> {
    let category = set
        .get(key)
        .ok_or_else(|| AllocationError::UnknownCategory(key.to_string()))?;
    let share = Decimal::from_f64(category.percentage)
        .ok_or(AllocationError::NonFinite(category.percentage))?;
    total_budget
        .checked_mul(share)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .ok_or(AllocationError::AmountOverflow)
}
