//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workflow error
    #[error("Workflow error: {0}")]
    Workflow(#[from] aegis_workflow::WorkflowError),

    /// Storage error
    #[error("Storage error: {0}")]
    Store(#[from] aegis_store::StoreError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Claim not found
    #[error("Claim not found: {0}")]
    NotFound(String),
}

impl From<aegis_policy::PolicyError> for CliError {
    fn from(e: aegis_policy::PolicyError) -> Self {
        CliError::Config(e.to_string())
    }
}
