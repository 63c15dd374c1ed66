//! Policy configuration
//!
//! Thresholds for triage, escalation, and fusion resolution.

use crate::PolicyError;
use serde::{Deserialize, Serialize};

/// Configuration for the decision functions
///
/// All comparisons are strict: a score equal to a threshold does not satisfy
/// it.
///
/// # Examples
///
/// ```
/// use aegis_policy::PolicyConfig;
///
/// let config = PolicyConfig::default();
/// assert_eq!(config.escalation_suspicion_above, 0.85);
///
/// let config = PolicyConfig::from_toml("corroboration_min_sources = 5").unwrap();
/// assert_eq!(config.corroboration_min_sources, 5);
/// assert_eq!(config.archive_suspicion_below, 0.2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Archive when suspicion is below this value...
    /// Default: 0.2
    pub archive_suspicion_below: f64,

    /// ...and credibility is above this value
    /// Default: 0.8
    pub archive_credibility_above: f64,

    /// Escalation requires suspicion above this value
    /// Default: 0.85
    pub escalation_suspicion_above: f64,

    /// Escalation requires credibility below this value
    /// Default: 0.30
    pub escalation_credibility_below: f64,

    /// Substrings of the knowledge summary that signal a contradiction
    /// Matched case-insensitively as plain substrings.
    pub contradiction_markers: Vec<String>,

    /// Fusion rates a claim False when suspicion is above this value...
    /// Default: 0.7
    pub fusion_suspicion_above: f64,

    /// ...and credibility is below this value
    /// Default: 0.4
    pub fusion_credibility_below: f64,

    /// Distinct credible sources needed to rate a claim True by corroboration
    /// Default: 3
    pub corroboration_min_sources: usize,
}

fn default_markers() -> Vec<String> {
    ["contradict", "false", "not", "incorrect", "myth"]
        .iter()
        .map(|m| m.to_string())
        .collect()
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            archive_suspicion_below: 0.2,
            archive_credibility_above: 0.8,
            escalation_suspicion_above: 0.85,
            escalation_credibility_below: 0.30,
            contradiction_markers: default_markers(),
            fusion_suspicion_above: 0.7,
            fusion_credibility_below: 0.4,
            corroboration_min_sources: 3,
        }
    }
}

impl PolicyConfig {
    /// Archive less, escalate sooner, demand more corroboration
    pub fn strict() -> Self {
        Self {
            archive_suspicion_below: 0.1,
            archive_credibility_above: 0.9,
            escalation_suspicion_above: 0.75,
            escalation_credibility_below: 0.4,
            contradiction_markers: default_markers(),
            fusion_suspicion_above: 0.6,
            fusion_credibility_below: 0.5,
            corroboration_min_sources: 4,
        }
    }

    /// Archive more, escalate only the most extreme claims
    pub fn permissive() -> Self {
        Self {
            archive_suspicion_below: 0.3,
            archive_credibility_above: 0.7,
            escalation_suspicion_above: 0.9,
            escalation_credibility_below: 0.2,
            contradiction_markers: default_markers(),
            fusion_suspicion_above: 0.8,
            fusion_credibility_below: 0.3,
            corroboration_min_sources: 2,
        }
    }

    /// Check that every threshold lies in [0, 1] and the lists are usable
    pub fn validate(&self) -> Result<(), PolicyError> {
        let thresholds = [
            ("archive_suspicion_below", self.archive_suspicion_below),
            ("archive_credibility_above", self.archive_credibility_above),
            ("escalation_suspicion_above", self.escalation_suspicion_above),
            ("escalation_credibility_below", self.escalation_credibility_below),
            ("fusion_suspicion_above", self.fusion_suspicion_above),
            ("fusion_credibility_below", self.fusion_credibility_below),
        ];
        for (name, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(PolicyError::Config(format!(
                    "{} must be within [0.0, 1.0], got {}",
                    name, value
                )));
            }
        }

        if self.contradiction_markers.iter().any(|m| m.trim().is_empty()) {
            return Err(PolicyError::Config(
                "contradiction_markers must not contain empty entries".to_string(),
            ));
        }

        if self.corroboration_min_sources == 0 {
            return Err(PolicyError::Config(
                "corroboration_min_sources must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Parse a policy from TOML; missing keys take their defaults
    pub fn from_toml(s: &str) -> Result<Self, PolicyError> {
        let config: Self = toml::from_str(s).map_err(|e| PolicyError::Toml(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the policy to TOML
    pub fn to_toml(&self) -> Result<String, PolicyError> {
        toml::to_string_pretty(self).map_err(|e| PolicyError::Toml(e.to_string()))
    }
}
