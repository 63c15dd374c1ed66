//! Claim module - the unit of work moved through the verification pipeline

use crate::{unix_now, ClaimStatus, TransitionError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Unique identifier for a claim based on UUIDv7
///
/// UUIDv7 provides:
/// - Chronological sortability, so batches come back in discovery order
/// - 128-bit uniqueness without coordination between discovery sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClaimId(u128);

impl ClaimId {
    /// Generate a new UUIDv7-based ClaimId
    ///
    /// # Examples
    ///
    /// ```
    /// use aegis_domain::ClaimId;
    ///
    /// let id = ClaimId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a ClaimId from a raw u128 value
    ///
    /// This is primarily for storage layer deserialization.
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a ClaimId from its hyphenated UUID string
    ///
    /// # Examples
    ///
    /// ```
    /// use aegis_domain::ClaimId;
    ///
    /// let id = ClaimId::new();
    /// let parsed = ClaimId::from_string(&id.to_string()).unwrap();
    /// assert_eq!(id, parsed);
    /// ```
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid claim id: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }

    /// Milliseconds since the Unix epoch encoded in the top 48 bits
    pub fn timestamp(&self) -> u64 {
        (self.0 >> 80) as u64
    }
}

impl Default for ClaimId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

impl Serialize for ClaimId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClaimId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ClaimId::from_string(&s).map_err(serde::de::Error::custom)
    }
}

/// A claim awaiting or having completed verification
///
/// Fields are public for the storage layer; stage processors change a claim
/// only through the transition methods, which enforce the lifecycle rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// Unique identifier (immutable)
    pub id: ClaimId,

    /// The claim text
    pub text: String,

    /// Source metadata, shape defined by the discovery collaborator
    pub source_metadata: Value,

    /// Suspicion score in [0, 1], set by the score stage
    pub suspicion: Option<f64>,

    /// Source credibility score in [0, 1], set by the score stage
    pub credibility: Option<f64>,

    /// Evidence bundle, set by the triage stage
    pub evidence: Option<Value>,

    /// Current lifecycle status
    pub status: ClaimStatus,

    /// Failed expert attempts so far
    pub retry_count: u32,

    /// Creation time (seconds since Unix epoch)
    pub created_at: u64,

    /// Time of the last transition (seconds since Unix epoch)
    pub updated_at: u64,

    /// Optimistic-concurrency revision, bumped by the store on every commit
    pub revision: u64,
}

impl Claim {
    /// Create a claim in the `new` status
    pub fn new(text: impl Into<String>, source_metadata: Value) -> Self {
        let now = unix_now();
        Self {
            id: ClaimId::new(),
            text: text.into(),
            source_metadata,
            suspicion: None,
            credibility: None,
            evidence: None,
            status: ClaimStatus::New,
            retry_count: 0,
            created_at: now,
            updated_at: now,
            revision: 0,
        }
    }

    /// Both scores, if set
    pub fn scores(&self) -> Option<(f64, f64)> {
        Some((self.suspicion?, self.credibility?))
    }

    /// Whether the expert path may still be attempted for this claim
    pub fn has_retry_headroom(&self, max_retries: u32) -> bool {
        self.retry_count < max_retries
    }

    /// `new` → `scored`
    ///
    /// Both scores are validated before anything is written, so a rejected
    /// call leaves the claim unchanged.
    pub fn record_scores(&mut self, suspicion: f64, credibility: f64) -> Result<(), TransitionError> {
        self.ensure_transition(ClaimStatus::Scored)?;
        validate_score("suspicion", suspicion)?;
        validate_score("credibility", credibility)?;

        self.suspicion = Some(suspicion);
        self.credibility = Some(credibility);
        self.advance(ClaimStatus::Scored)
    }

    /// `scored` → `archived`
    pub fn archive(&mut self) -> Result<(), TransitionError> {
        self.ensure_transition(ClaimStatus::Archived)?;
        self.advance(ClaimStatus::Archived)
    }

    /// `scored` → `fused-pending`
    pub fn attach_evidence(&mut self, evidence: Value) -> Result<(), TransitionError> {
        self.ensure_transition(ClaimStatus::FusedPending)?;
        self.evidence = Some(evidence);
        self.advance(ClaimStatus::FusedPending)
    }

    /// `fused-pending` → `escalated`
    pub fn escalate(&mut self) -> Result<(), TransitionError> {
        self.ensure_transition(ClaimStatus::Escalated)?;
        self.advance(ClaimStatus::Escalated)
    }

    /// `fused-pending` or `escalated` → `resolved`
    pub fn resolve(&mut self) -> Result<(), TransitionError> {
        self.ensure_transition(ClaimStatus::Resolved)?;
        self.advance(ClaimStatus::Resolved)
    }

    /// `escalated` → `failed`, incrementing the retry counter by exactly one
    pub fn record_expert_failure(&mut self, max_retries: u32) -> Result<(), TransitionError> {
        self.ensure_transition(ClaimStatus::Failed)?;
        self.ensure_headroom(max_retries)?;
        self.retry_count += 1;
        self.advance(ClaimStatus::Failed)
    }

    /// `failed` → `escalated`, only while the counter has headroom
    pub fn requeue(&mut self, max_retries: u32) -> Result<(), TransitionError> {
        self.ensure_transition(ClaimStatus::Escalated)?;
        self.ensure_headroom(max_retries)?;
        self.advance(ClaimStatus::Escalated)
    }

    /// Check that every field the current status implies is present and valid
    pub fn check_invariants(&self) -> Result<(), TransitionError> {
        if self.status.requires_scores() {
            let suspicion = self.suspicion.ok_or_else(|| self.missing("suspicion"))?;
            let credibility = self.credibility.ok_or_else(|| self.missing("credibility"))?;
            validate_score("suspicion", suspicion)?;
            validate_score("credibility", credibility)?;
        }
        if self.status.requires_evidence() && self.evidence.is_none() {
            return Err(self.missing("evidence"));
        }
        Ok(())
    }

    fn ensure_transition(&self, to: ClaimStatus) -> Result<(), TransitionError> {
        if self.status.can_transition_to(to) {
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition {
                claim_id: self.id,
                from: self.status,
                to,
            })
        }
    }

    fn ensure_headroom(&self, max_retries: u32) -> Result<(), TransitionError> {
        if self.has_retry_headroom(max_retries) {
            Ok(())
        } else {
            Err(TransitionError::RetryBudgetExhausted {
                claim_id: self.id,
                retry_count: self.retry_count,
                max_retries,
            })
        }
    }

    /// Move to `to` after confirming the target status' field requirements
    fn advance(&mut self, to: ClaimStatus) -> Result<(), TransitionError> {
        let from = self.status;
        self.status = to;
        if let Err(e) = self.check_invariants() {
            self.status = from;
            return Err(e);
        }
        self.updated_at = unix_now();
        Ok(())
    }

    fn missing(&self, field: &'static str) -> TransitionError {
        TransitionError::MissingField {
            claim_id: self.id,
            status: self.status,
            field,
        }
    }
}

fn validate_score(field: &'static str, value: f64) -> Result<(), TransitionError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TransitionError::ScoreOutOfRange { field, value })
    }
}
