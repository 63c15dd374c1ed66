//! Configuration for the workflow engine
//!
//! Cycle cadence, time bounds, batch sizing, and the retry budget.

use crate::WorkflowError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the workflow engine and worker
///
/// # Examples
///
/// ```
/// use aegis_workflow::WorkflowConfig;
///
/// // Default configuration (balanced)
/// let config = WorkflowConfig::default();
/// assert_eq!(config.max_retries, 3);
///
/// // Short cycles, large batches
/// let config = WorkflowConfig::aggressive();
/// assert_eq!(config.cycle_interval_secs, 15);
///
/// // Long cycles, small batches
/// let config = WorkflowConfig::lenient();
/// assert_eq!(config.cycle_interval_secs, 300);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// How often the worker starts a cycle (in seconds)
    /// Default: 60
    pub cycle_interval_secs: u64,

    /// Upper bound on one whole cycle (in seconds)
    /// Default: 600
    pub cycle_timeout_secs: u64,

    /// Bound on each scoring or evidence call (in seconds)
    /// Default: 30
    pub provider_timeout_secs: u64,

    /// Bound on each expert call (in seconds)
    /// Default: 120
    pub expert_timeout_secs: u64,

    /// Failed expert attempts allowed per claim
    /// Default: 3
    pub max_retries: u32,

    /// Claims leased per stage pass
    /// Default: 100
    pub batch_size: usize,

    /// Claims processed concurrently within a stage pass
    /// Default: 8
    pub max_concurrency: usize,

    /// Lifetime of a batch lease (in seconds); must outlast a cycle
    /// Default: 900
    pub lease_secs: u64,

    /// Score substituted when a scorer fails transiently
    /// Default: unset (the claim waits for the next cycle)
    pub degraded_score: Option<f64>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            cycle_interval_secs: 60,
            cycle_timeout_secs: 600,
            provider_timeout_secs: 30,
            expert_timeout_secs: 120,
            max_retries: 3,
            batch_size: 100,
            max_concurrency: 8,
            lease_secs: 900,
            degraded_score: None,
        }
    }
}

impl WorkflowConfig {
    /// Frequent cycles with wide batches
    ///
    /// Suitable when claims arrive in bursts and providers have headroom.
    pub fn aggressive() -> Self {
        Self {
            cycle_interval_secs: 15,
            cycle_timeout_secs: 300,
            provider_timeout_secs: 15,
            expert_timeout_secs: 60,
            max_retries: 3,
            batch_size: 250,
            max_concurrency: 16,
            lease_secs: 450,
            degraded_score: None,
        }
    }

    /// Infrequent cycles with narrow batches and a larger retry budget
    ///
    /// Suitable for development or rate-limited providers.
    pub fn lenient() -> Self {
        Self {
            cycle_interval_secs: 300,
            cycle_timeout_secs: 1800,
            provider_timeout_secs: 60,
            expert_timeout_secs: 300,
            max_retries: 5,
            batch_size: 50,
            max_concurrency: 4,
            lease_secs: 2400,
            degraded_score: None,
        }
    }

    /// Check the configuration for values the engine cannot run with
    pub fn validate(&self) -> Result<(), WorkflowError> {
        let positive = [
            ("cycle_interval_secs", self.cycle_interval_secs),
            ("cycle_timeout_secs", self.cycle_timeout_secs),
            ("provider_timeout_secs", self.provider_timeout_secs),
            ("expert_timeout_secs", self.expert_timeout_secs),
            ("batch_size", self.batch_size as u64),
            ("max_concurrency", self.max_concurrency as u64),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(WorkflowError::Config(format!("{} must be greater than 0", name)));
            }
        }

        let call_bounds = [
            ("provider_timeout_secs", self.provider_timeout_secs),
            ("expert_timeout_secs", self.expert_timeout_secs),
        ];
        for (name, value) in call_bounds {
            if value >= self.cycle_timeout_secs {
                return Err(WorkflowError::Config(format!(
                    "{} ({}) must be less than cycle_timeout_secs ({})",
                    name, value, self.cycle_timeout_secs
                )));
            }
        }

        if self.lease_secs < self.cycle_timeout_secs {
            return Err(WorkflowError::Config(format!(
                "lease_secs ({}) must be at least cycle_timeout_secs ({})",
                self.lease_secs, self.cycle_timeout_secs
            )));
        }

        if let Some(score) = self.degraded_score {
            if !(0.0..=1.0).contains(&score) {
                return Err(WorkflowError::Config(format!(
                    "degraded_score must be within [0.0, 1.0], got {}",
                    score
                )));
            }
        }

        Ok(())
    }

    /// Parse a configuration from TOML; missing keys take their defaults
    pub fn from_toml(s: &str) -> Result<Self, WorkflowError> {
        let config: Self = toml::from_str(s).map_err(|e| WorkflowError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to TOML
    pub fn to_toml(&self) -> Result<String, WorkflowError> {
        toml::to_string_pretty(self).map_err(|e| WorkflowError::Config(e.to_string()))
    }

    /// Get cycle interval as Duration
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.cycle_interval_secs)
    }

    /// Get cycle timeout as Duration
    pub fn cycle_timeout(&self) -> Duration {
        Duration::from_secs(self.cycle_timeout_secs)
    }

    /// Get provider timeout as Duration
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    /// Get expert timeout as Duration
    pub fn expert_timeout(&self) -> Duration {
        Duration::from_secs(self.expert_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WorkflowConfig::default();
        assert_eq!(config.cycle_interval_secs, 60);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.max_concurrency, 8);
        assert!(config.degraded_score.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        let aggressive = WorkflowConfig::aggressive();
        let lenient = WorkflowConfig::lenient();
        assert!(aggressive.validate().is_ok());
        assert!(lenient.validate().is_ok());
        assert!(aggressive.cycle_interval_secs < WorkflowConfig::default().cycle_interval_secs);
        assert!(lenient.max_retries > WorkflowConfig::default().max_retries);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = WorkflowConfig {
            max_concurrency: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = WorkflowConfig {
            lease_secs: 10,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = WorkflowConfig {
            degraded_score: Some(1.1),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_requires_call_bounds_inside_cycle_bound() {
        let config = WorkflowConfig {
            cycle_timeout_secs: 1,
            expert_timeout_secs: 10,
            provider_timeout_secs: 1,
            lease_secs: 60,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = WorkflowConfig {
            cycle_timeout_secs: 60,
            expert_timeout_secs: 60,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(WorkflowError::Config(msg)) if msg.contains("expert_timeout_secs")));

        let config = WorkflowConfig {
            cycle_timeout_secs: 60,
            provider_timeout_secs: 90,
            expert_timeout_secs: 30,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(WorkflowError::Config(msg)) if msg.contains("provider_timeout_secs")));
    }

    #[test]
    fn test_duration_conversions() {
        let config = WorkflowConfig::default();
        assert_eq!(config.cycle_interval(), Duration::from_secs(60));
        assert_eq!(config.cycle_timeout(), Duration::from_secs(600));
        assert_eq!(config.provider_timeout(), Duration::from_secs(30));
        assert_eq!(config.expert_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = WorkflowConfig {
            degraded_score: Some(0.5),
            ..WorkflowConfig::lenient()
        };
        let parsed = WorkflowConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);

        let partial = WorkflowConfig::from_toml("max_retries = 7").unwrap();
        assert_eq!(partial.max_retries, 7);
        assert_eq!(partial.batch_size, 100);
    }
}
