//! Expert Escalation Handler
//!
//! Invokes the expert adjudicator for an escalated claim under the retry
//! budget, and turns the answer (or the failure) into the claim's next state.
//! Nothing is written here; the engine commits the returned claim.

use aegis_domain::traits::ExpertProvider;
use aegis_domain::{CaseFile, Claim, ProviderError, TransitionError, VerifiedRecord};
use std::sync::Arc;
use std::time::Duration;

/// What became of one escalated claim
#[derive(Debug, Clone, PartialEq)]
pub enum EscalationOutcome {
    /// The retry budget is spent; the expert was not called and the claim is unchanged
    Exhausted,

    /// The expert answered; the claim is now `resolved`
    Resolved {
        /// Claim after the transition
        claim: Claim,
        /// Record to write with it
        record: VerifiedRecord,
    },

    /// The expert failed; the claim is now `failed` with one more retry used
    Failed {
        /// Claim after the transition
        claim: Claim,
        /// Why the attempt failed
        error: ProviderError,
    },
}

/// Runs expert adjudication with a bounded retry counter
#[derive(Clone)]
pub struct EscalationHandler {
    expert: Arc<dyn ExpertProvider>,
    max_retries: u32,
    expert_timeout: Duration,
}

impl EscalationHandler {
    /// Create a handler around an expert provider
    pub fn new(expert: Arc<dyn ExpertProvider>, max_retries: u32, expert_timeout: Duration) -> Self {
        Self {
            expert,
            max_retries,
            expert_timeout,
        }
    }

    /// Configured retry budget
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Adjudicate one escalated claim
    ///
    /// Provider failures of every kind are returned as
    /// [`EscalationOutcome::Failed`], never as an error. An error is only
    /// returned when the claim itself cannot legally make the transition.
    pub async fn handle(&self, claim: &Claim) -> Result<EscalationOutcome, TransitionError> {
        if !claim.has_retry_headroom(self.max_retries) {
            tracing::warn!(
                "Claim {} has exhausted its retry budget ({}/{}), not calling the expert",
                claim.id,
                claim.retry_count,
                self.max_retries
            );
            return Ok(EscalationOutcome::Exhausted);
        }

        let case = CaseFile::from_claim(claim)?;
        let answer = match tokio::time::timeout(self.expert_timeout, self.expert.adjudicate(&case)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.expert_timeout)),
        };

        let mut next = claim.clone();
        match answer {
            Ok(adjudication) => {
                next.resolve()?;
                let record = VerifiedRecord::by_investigator(claim.id, adjudication);
                tracing::info!(
                    "Expert resolved claim {}: {} ({:?})",
                    claim.id,
                    record.verdict,
                    record.confidence
                );
                Ok(EscalationOutcome::Resolved { claim: next, record })
            }
            Err(error) => {
                next.record_expert_failure(self.max_retries)?;
                tracing::error!(
                    "Expert adjudication failed for claim {} ({}): {}. Retry count: {}/{}",
                    claim.id,
                    error.kind(),
                    error,
                    next.retry_count,
                    self.max_retries
                );
                Ok(EscalationOutcome::Failed { claim: next, error })
            }
        }
    }
}
