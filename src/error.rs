//! Error types for the runbook core.

use thiserror::Error;

/// Result type for core runbook operations.
pub type RunbookResult<T> = Result<T, RunbookError>;

/// Errors raised by the catalog, status store and session.
#[derive(Debug, Error)]
pub enum RunbookError {
    /// An operation referenced a step id that is not in the catalog.
    #[error("unknown step: {0}")]
    UnknownStep(String),

    /// Persisted status data was unreadable. Recovered by falling back to all-pending.
    #[error("failed to read persisted status: {0}")]
    PersistenceRead(String),

    /// Two catalog steps share the same id.
    #[error("duplicate step id in catalog: {0}")]
    DuplicateStep(String),

    /// The catalog has no steps.
    #[error("catalog has no steps")]
    EmptyCatalog,

    /// A catalog step is missing a required field.
    #[error("step {index} has an empty {field}")]
    InvalidStep { index: usize, field: &'static str },

    /// The catalog document could not be parsed.
    #[error("invalid catalog document: {0}")]
    InvalidCatalog(#[from] serde_yaml::Error),
}
