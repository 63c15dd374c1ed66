//! Policy error types

use thiserror::Error;

/// Errors that can occur while loading or checking a policy
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PolicyError {
    /// A threshold or list is outside its allowed range
    #[error("Configuration error: {0}")]
    Config(String),

    /// The policy document could not be parsed or written
    #[error("TOML error: {0}")]
    Toml(String),
}
