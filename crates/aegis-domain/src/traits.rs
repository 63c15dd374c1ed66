//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the claim lifecycle and the
//! infrastructure around it. Implementations live in other crates.

use crate::{
    Adjudication, CaseFile, Claim, ClaimId, ClaimStatus, ProviderError, VerificationEvent,
    VerifiedRecord,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;

/// Trait for storing and retrieving claims and verified records
///
/// Implemented by the infrastructure layer (aegis-store)
pub trait ClaimStore {
    /// Error type for store operations
    type Error;

    /// Insert a newly discovered claim
    fn insert_claim(&mut self, claim: &Claim) -> Result<ClaimId, Self::Error>;

    /// Get a claim by ID
    fn get_claim(&self, id: ClaimId) -> Result<Option<Claim>, Self::Error>;

    /// Query claims matching criteria, oldest first
    fn query_claims(&self, query: &ClaimQuery) -> Result<Vec<Claim>, Self::Error>;

    /// Lease the claims matching `query` that nobody else holds
    ///
    /// A claim is available when it has no lease or its lease expired at or
    /// before `lease.acquired_at`. Selection and marking happen atomically, so
    /// two callers never receive the same claim.
    fn lease_batch(&mut self, query: &ClaimQuery, lease: &Lease) -> Result<Vec<Claim>, Self::Error>;

    /// Persist a claim transition, and the record it produced, atomically
    ///
    /// The write only applies if the stored revision still equals
    /// `claim.revision`. On success the stored revision is bumped and the lease
    /// cleared. A revision mismatch, or a record that already exists for the
    /// claim, yields [`CommitOutcome::Conflict`] and nothing is written.
    fn commit_transition(
        &mut self,
        claim: &Claim,
        record: Option<&VerifiedRecord>,
    ) -> Result<CommitOutcome, Self::Error>;

    /// Drop `owner`'s lease on one claim without changing it
    fn release_lease(&mut self, id: ClaimId, owner: &str) -> Result<(), Self::Error>;

    /// Drop every lease held by `owner`, returning how many were released
    fn release_leases(&mut self, owner: &str) -> Result<usize, Self::Error>;

    /// Get the verified record for a claim
    fn get_record(&self, claim_id: ClaimId) -> Result<Option<VerifiedRecord>, Self::Error>;

    /// Most recent verified records first
    fn list_records(&self, limit: Option<usize>) -> Result<Vec<VerifiedRecord>, Self::Error>;

    /// Number of claims in each status (statuses with no claims are omitted)
    fn count_by_status(&self) -> Result<BTreeMap<ClaimStatus, usize>, Self::Error>;
}

/// Query criteria for retrieving claims
#[derive(Debug, Clone, Default)]
pub struct ClaimQuery {
    /// Filter by status
    pub status: Option<ClaimStatus>,

    /// Only claims whose retry counter is strictly below this value
    pub max_retry_count: Option<u32>,

    /// Maximum results to return
    pub limit: Option<usize>,
}

impl ClaimQuery {
    /// All claims in one status
    pub fn by_status(status: ClaimStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Restrict to claims with retry headroom below `max`
    pub fn with_retry_headroom(mut self, max: u32) -> Self {
        self.max_retry_count = Some(max);
        self
    }

    /// Cap the number of results
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A time-bounded ownership mark placed on a batch of claims
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lease {
    /// Identifier of the engine instance holding the lease
    pub owner: String,
    /// When the lease was taken (seconds since Unix epoch)
    pub acquired_at: u64,
    /// When the lease lapses (seconds since Unix epoch)
    pub expires_at: u64,
}

impl Lease {
    /// Lease for `owner` starting now and lasting `secs`
    pub fn new(owner: impl Into<String>, secs: u64) -> Self {
        let now = crate::unix_now();
        Self {
            owner: owner.into(),
            acquired_at: now,
            expires_at: now.saturating_add(secs),
        }
    }
}

/// Result of a revision-guarded commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The transition was written
    Committed,
    /// Another writer got there first; nothing was written
    Conflict,
}

/// Scores how suspicious a claim's text is
///
/// Implemented by the provider layer (aegis-providers)
#[async_trait]
pub trait SuspicionScorer: Send + Sync {
    /// Suspicion score in [0, 1]
    async fn score_suspicion(&self, text: &str) -> Result<f64, ProviderError>;
}

/// Scores how credible the claim's source is
#[async_trait]
pub trait CredibilityScorer: Send + Sync {
    /// Credibility score in [0, 1] for the source described by `metadata`
    async fn score_credibility(&self, metadata: &Value) -> Result<f64, ProviderError>;
}

/// Gathers an evidence bundle for a claim
#[async_trait]
pub trait EvidenceProvider: Send + Sync {
    /// Research the claim text and return the evidence document
    async fn gather(&self, text: &str) -> Result<Value, ProviderError>;
}

/// The costly expert adjudicator
#[async_trait]
pub trait ExpertProvider: Send + Sync {
    /// Reach a verdict for the case file
    async fn adjudicate(&self, case: &CaseFile) -> Result<Adjudication, ProviderError>;
}

/// Receives one event per verified record; delivery is fire-and-forget
pub trait Notifier: Send + Sync {
    /// Deliver an event; must not block the workflow
    fn notify(&self, event: &VerificationEvent);
}
