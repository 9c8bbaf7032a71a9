use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AllocationError {
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Percentage must be a finite number, got {0}")]
    NonFinite(f64),

    #[error("Category '{key}' has percentage {value} outside 0-100")]
    OutOfRange { key: String, value: f64 },

    #[error("Duplicate category key: {0}")]
    DuplicateKey(String),

    #[error("Expected exactly one buffer category, found {0}")]
    BufferCount(usize),

    #[error("A category set needs at least one category")]
    Empty,

    #[error("Buffer minimum must be between 0 and 100, got {0}")]
    InvalidMinimum(f64),

    #[error("Locked categories leave no room: {excess:.2}% over budget")]
    Overallocated { excess: f64 },

    #[error("Amount is too large to allocate")]
    AmountOverflow,
}
