//! Error types for workflow operations

use thiserror::Error;

/// Errors that can occur while driving the workflow
///
/// Per-claim provider failures never surface here; they are contained at the
/// claim boundary and reported through stage reports and metrics.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// Storage layer error
    #[error("Storage error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A submitted claim was rejected before storage
    #[error("Invalid claim: {0}")]
    InvalidClaim(String),

    /// Worker error (tokio runtime issues)
    #[error("Worker error: {0}")]
    Worker(String),
}

impl From<aegis_policy::PolicyError> for WorkflowError {
    fn from(e: aegis_policy::PolicyError) -> Self {
        WorkflowError::Config(e.to_string())
    }
}
