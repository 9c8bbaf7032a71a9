use std::collections::HashSet;

use crate::allocate::{AllocationError, FULL_SHARE, TOLERANCE};

/// One named share of a trip budget.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub key: String,
    pub label: String,
    pub percentage: f64,
    /// Locked categories are skipped when an edit elsewhere has to be paid for.
    pub locked: bool,
    pub is_buffer: bool,
}

impl Category {
    pub fn new(key: impl Into<String>, label: impl Into<String>, percentage: f64) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            percentage,
            locked: false,
            is_buffer: false,
        }
    }

    pub fn buffer(key: impl Into<String>, label: impl Into<String>, percentage: f64) -> Self {
        Self {
            is_buffer: true,
            ..Self::new(key, label, percentage)
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// Ordered set of budget categories with exactly one buffer.
///
/// Order is display order only. Construction checks the structural rules
/// (non-empty, unique keys, one buffer, percentages finite and within
/// 0..=100); whether the shares add up to 100 is left to [`Self::is_normalized`]
/// because sets loaded from storage are checked separately.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySet {
    categories: Vec<Category>,
    buffer_index: usize,
}

impl CategorySet {
    pub fn new(categories: Vec<Category>) -> Result<Self, AllocationError> {
        if categories.is_empty() {
            return Err(AllocationError::Empty);
        }

        let mut seen = HashSet::new();
        for cat in &categories {
            if !seen.insert(cat.key.as_str()) {
                return Err(AllocationError::DuplicateKey(cat.key.clone()));
            }
            if !cat.percentage.is_finite() {
                return Err(AllocationError::NonFinite(cat.percentage));
            }
            if !(0.0..=FULL_SHARE).contains(&cat.percentage) {
                return Err(AllocationError::OutOfRange {
                    key: cat.key.clone(),
                    value: cat.percentage,
                });
            }
        }

        let buffers: Vec<usize> = categories
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_buffer)
            .map(|(i, _)| i)
            .collect();
        let buffer_index = match buffers.as_slice() {
            [only] => *only,
            _ => return Err(AllocationError::BufferCount(buffers.len())),
        };

        Ok(Self {
            categories,
            buffer_index,
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Category> {
        self.categories.iter()
    }

    pub fn as_slice(&self) -> &[Category] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn get(&self, key: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.key == key)
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.categories.iter().position(|c| c.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn buffer(&self) -> &Category {
        &self.categories[self.buffer_index]
    }

    pub fn buffer_index(&self) -> usize {
        self.buffer_index
    }

    pub fn total(&self) -> f64 {
        self.categories.iter().map(|c| c.percentage).sum()
    }

    pub fn is_normalized(&self) -> bool {
        (self.total() - FULL_SHARE).abs() <= TOLERANCE
            && self.categories.iter().all(|c| c.percentage >= 0.0)
    }

    /// Case-insensitive lookup by key or label.
    pub fn find(&self, name: &str) -> Option<&Category> {
        let lower = name.trim().to_lowercase();
        self.categories
            .iter()
            .find(|c| c.key.to_lowercase() == lower || c.label.to_lowercase() == lower)
    }

    pub(crate) fn categories_mut(&mut self) -> &mut [Category] {
        &mut self.categories
    }
}

impl Default for CategorySet {
    /// The distribution every new trip starts with.
    fn default() -> Self {
        Self {
            categories: vec![
                Category::new("accommodation", "Accommodation", 30.0),
                Category::new("food", "Food & Dining", 25.0),
                Category::new("shopping", "Shopping", 15.0),
                Category::new("attractions", "Attractions", 15.0),
                Category::new("transport", "Transport", 10.0),
                Category::buffer("buffer", "Emergency Buffer", 5.0),
            ],
            buffer_index: 5,
        }
    }
}

impl<'a> IntoIterator for &'a CategorySet {
    type Item = &'a Category;
    type IntoIter = std::slice::Iter<'a, Category>;

    fn into_iter(self) -> Self::IntoIter {
        self.categories.iter()
    }
}
