//! Error taxonomy shared across the workflow

use crate::{ClaimId, ClaimStatus};
use std::time::Duration;
use thiserror::Error;

/// A claim transition that would violate the lifecycle rules
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransitionError {
    /// The target status is not a legal successor of the current one
    #[error("Invalid transition for claim {claim_id}: {from} -> {to}")]
    InvalidTransition {
        /// Claim being transitioned
        claim_id: ClaimId,
        /// Current status
        from: ClaimStatus,
        /// Requested status
        to: ClaimStatus,
    },

    /// A score was outside [0.0, 1.0] (or not a number)
    #[error("{field} score {value} is outside [0.0, 1.0]")]
    ScoreOutOfRange {
        /// Which score
        field: &'static str,
        /// Offending value
        value: f64,
    },

    /// The status requires a derived field that is not set
    #[error("Claim {claim_id} in status {status} is missing {field}")]
    MissingField {
        /// Claim being checked
        claim_id: ClaimId,
        /// Status that requires the field
        status: ClaimStatus,
        /// Name of the missing field
        field: &'static str,
    },

    /// The retry counter has no headroom left
    #[error("Retry budget exhausted for claim {claim_id} ({retry_count}/{max_retries})")]
    RetryBudgetExhausted {
        /// Claim being checked
        claim_id: ClaimId,
        /// Current counter value
        retry_count: u32,
        /// Configured maximum
        max_retries: u32,
    },
}

/// Failure of an external enrichment or expert provider
///
/// The variants follow the failure taxonomy the workflow reacts to: transient
/// failures are retried on a later cycle, permanent ones park the claim.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// The call exceeded its time bound
    #[error("Provider call timed out after {0:?}")]
    Timeout(Duration),

    /// Network error, 5xx, or rate limit
    #[error("Transient provider failure: {0}")]
    Transient(String),

    /// Response could not be parsed or was out of range
    #[error("Malformed provider response: {0}")]
    Malformed(String),

    /// Authentication, quota, or configuration error
    #[error("Permanent provider failure: {0}")]
    Permanent(String),
}

impl ProviderError {
    /// Whether trying again later may succeed without operator action
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Timeout(_) | ProviderError::Transient(_))
    }

    /// Short machine-readable kind, used as a log field
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Timeout(_) => "timeout",
            ProviderError::Transient(_) => "transient",
            ProviderError::Malformed(_) => "malformed",
            ProviderError::Permanent(_) => "permanent",
        }
    }
}

/// An evidence bundle whose shape the core cannot inspect
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvidenceError {
    /// The document is not an object or a known field has the wrong type
    #[error("Malformed evidence bundle: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for EvidenceError {
    fn from(e: serde_json::Error) -> Self {
        EvidenceError::Malformed(e.to_string())
    }
}
