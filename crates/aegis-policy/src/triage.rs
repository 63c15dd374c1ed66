//! Triage - the archive short-circuit applied to scored claims

use crate::PolicyConfig;

/// What the triage stage should do with a scored claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriageDecision {
    /// Clearly benign: archive without gathering evidence
    Archive,
    /// Gather evidence and continue to the decision stage
    GatherEvidence,
}

/// Decides which scored claims skip evidence gathering
#[derive(Debug, Clone)]
pub struct Triage {
    config: PolicyConfig,
}

impl Triage {
    /// Create a triage policy with the given configuration
    pub fn new(config: PolicyConfig) -> Self {
        Self { config }
    }

    /// Archive iff suspicion is low and credibility is high (both strict)
    pub fn decide(&self, suspicion: f64, credibility: f64) -> TriageDecision {
        if suspicion < self.config.archive_suspicion_below
            && credibility > self.config.archive_credibility_above
        {
            TriageDecision::Archive
        } else {
            TriageDecision::GatherEvidence
        }
    }
}
