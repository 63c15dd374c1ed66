//! Status module - the closed set of lifecycle states for a claim

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a claim
///
/// The status is the sole driver of which stage processor picks a claim up
/// next. Transitions are strictly forward, with one exception: a `Failed`
/// claim with retry headroom may go back to `Escalated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClaimStatus {
    /// Just discovered, no scores yet
    New,

    /// Suspicion and credibility scores are set
    Scored,

    /// Scores and evidence are set, waiting for the fusion decision
    FusedPending,

    /// Clearly benign, no verdict needed (terminal)
    Archived,

    /// Routed to the expert adjudication path
    Escalated,

    /// A verified record exists (terminal)
    Resolved,

    /// Expert adjudication failed; retryable while the counter has headroom
    Failed,
}

impl ClaimStatus {
    /// All statuses in pipeline order
    pub const ALL: [ClaimStatus; 7] = [
        ClaimStatus::New,
        ClaimStatus::Scored,
        ClaimStatus::FusedPending,
        ClaimStatus::Archived,
        ClaimStatus::Escalated,
        ClaimStatus::Resolved,
        ClaimStatus::Failed,
    ];

    /// Get the status name as stored and displayed
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::New => "new",
            ClaimStatus::Scored => "scored",
            ClaimStatus::FusedPending => "fused-pending",
            ClaimStatus::Archived => "archived",
            ClaimStatus::Escalated => "escalated",
            ClaimStatus::Resolved => "resolved",
            ClaimStatus::Failed => "failed",
        }
    }

    /// Parse a status from its stored name
    ///
    /// Accepts `fused_pending` as well as `fused-pending`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "new" => Some(ClaimStatus::New),
            "scored" => Some(ClaimStatus::Scored),
            "fused-pending" | "fused_pending" => Some(ClaimStatus::FusedPending),
            "archived" => Some(ClaimStatus::Archived),
            "escalated" => Some(ClaimStatus::Escalated),
            "resolved" => Some(ClaimStatus::Resolved),
            "failed" => Some(ClaimStatus::Failed),
            _ => None,
        }
    }

    /// Whether no transition can ever leave this status
    ///
    /// `Failed` is not listed: it is terminal only once the retry counter is
    /// exhausted, which depends on the claim, not the status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ClaimStatus::Archived | ClaimStatus::Resolved)
    }

    /// Whether a claim in this status must carry both scores
    pub fn requires_scores(&self) -> bool {
        !matches!(self, ClaimStatus::New)
    }

    /// Whether a claim in this status must carry an evidence bundle
    pub fn requires_evidence(&self) -> bool {
        matches!(
            self,
            ClaimStatus::FusedPending
                | ClaimStatus::Escalated
                | ClaimStatus::Failed
                | ClaimStatus::Resolved
        )
    }

    /// Whether `next` is a legal successor of this status
    pub fn can_transition_to(&self, next: ClaimStatus) -> bool {
        use ClaimStatus::*;
        matches!(
            (self, next),
            (New, Scored)
                | (Scored, Archived)
                | (Scored, FusedPending)
                | (FusedPending, Resolved)
                | (FusedPending, Escalated)
                | (Escalated, Resolved)
                | (Escalated, Failed)
                | (Failed, Escalated)
        )
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ClaimStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid claim status: {}", s))
    }
}
