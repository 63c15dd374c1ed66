//! Verdicts, verified records, and the expert case file

use crate::{unix_now, Claim, ClaimId, TransitionError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Outcome of verifying a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// The claim is accurate
    True,
    /// The claim is false
    False,
    /// The claim is partly accurate, lacks context, or could not be settled
    Misleading,
}

impl Verdict {
    /// Get the verdict name as stored and displayed
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::True => "True",
            Verdict::False => "False",
            Verdict::Misleading => "Misleading",
        }
    }

    /// Parse one of the three verdict names (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "true" => Some(Verdict::True),
            "false" => Some(Verdict::False),
            "misleading" => Some(Verdict::Misleading),
            _ => None,
        }
    }

    /// Map a free-text fact-check rating to a verdict
    ///
    /// Anything that is not clearly true or clearly false is `Misleading`.
    pub fn from_rating(rating: &str) -> Self {
        let normalized = rating
            .trim()
            .to_lowercase()
            .replace(['-', '_'], " ");
        match normalized.as_str() {
            "true" | "mostly true" | "correct" | "accurate" => Verdict::True,
            "false" | "mostly false" | "pants on fire" | "incorrect" | "fake" => Verdict::False,
            _ => Verdict::Misleading,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which path produced a verified record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPath {
    /// Resolved automatically from scores and evidence
    ResolvedByFusion,
    /// Resolved by the expert adjudicator
    ResolvedByInvestigator,
}

impl ResolutionPath {
    /// Get the path name as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionPath::ResolvedByFusion => "resolved_by_fusion",
            ResolutionPath::ResolvedByInvestigator => "resolved_by_investigator",
        }
    }

    /// Parse a stored path name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "resolved_by_fusion" => Some(ResolutionPath::ResolvedByFusion),
            "resolved_by_investigator" => Some(ResolutionPath::ResolvedByInvestigator),
            _ => None,
        }
    }
}

impl fmt::Display for ResolutionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The terminal, write-once result for a resolved claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedRecord {
    /// Claim this record resolves (unique)
    pub claim_id: ClaimId,
    /// Final verdict
    pub verdict: Verdict,
    /// Human-readable explanation (never empty)
    pub explanation: String,
    /// Which path produced the verdict
    pub resolution_path: ResolutionPath,
    /// Expert confidence in [0, 1], when supplied
    pub confidence: Option<f64>,
    /// Creation time (seconds since Unix epoch)
    pub created_at: u64,
}

impl VerifiedRecord {
    /// Record produced by the fusion resolver
    pub fn by_fusion(claim_id: ClaimId, verdict: Verdict, explanation: impl Into<String>) -> Self {
        Self {
            claim_id,
            verdict,
            explanation: explanation.into(),
            resolution_path: ResolutionPath::ResolvedByFusion,
            confidence: None,
            created_at: unix_now(),
        }
    }

    /// Record produced from an expert adjudication
    pub fn by_investigator(claim_id: ClaimId, adjudication: Adjudication) -> Self {
        Self {
            claim_id,
            verdict: adjudication.verdict,
            explanation: adjudication.explanation,
            resolution_path: ResolutionPath::ResolvedByInvestigator,
            confidence: adjudication.confidence,
            created_at: unix_now(),
        }
    }
}

/// An expert's answer for one case file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjudication {
    /// Verdict reached
    pub verdict: Verdict,
    /// Reasoning behind the verdict
    pub explanation: String,
    /// Confidence in [0, 1], if the expert reports one
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Everything the expert adjudicator is given about a claim
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseFile {
    /// Claim under adjudication
    pub claim_id: ClaimId,
    /// Claim text
    pub claim_text: String,
    /// Source metadata as discovered
    pub source_metadata: Value,
    /// Suspicion score
    pub suspicion: f64,
    /// Source credibility score
    pub credibility: f64,
    /// Full evidence document
    pub evidence: Value,
}

impl CaseFile {
    /// Assemble the case file for a claim that has scores and evidence
    pub fn from_claim(claim: &Claim) -> Result<Self, TransitionError> {
        let missing = |field| TransitionError::MissingField {
            claim_id: claim.id,
            status: claim.status,
            field,
        };
        Ok(Self {
            claim_id: claim.id,
            claim_text: claim.text.clone(),
            source_metadata: claim.source_metadata.clone(),
            suspicion: claim.suspicion.ok_or_else(|| missing("suspicion"))?,
            credibility: claim.credibility.ok_or_else(|| missing("credibility"))?,
            evidence: claim.evidence.clone().ok_or_else(|| missing("evidence"))?,
        })
    }
}
