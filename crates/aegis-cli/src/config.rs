//! Configuration management for the CLI.
//!
//! One TOML file (default `~/.aegis/config.toml`) holds every section:
//!
//! ```toml
//! [store]
//! path = "/var/lib/aegis/aegis.db"
//!
//! [workflow]
//! max_retries = 3
//!
//! [policy]
//! escalation_suspicion_above = 0.85
//!
//! [providers]
//! evidence = "http"
//! evidence_endpoint = "http://localhost:8000/research"
//! expert = "ollama"
//! ollama_model = "llama3.2"
//!
//! [settings]
//! color = true
//! format = "table"
//! ```

use crate::error::{CliError, Result};
use aegis_policy::PolicyConfig;
use aegis_workflow::WorkflowConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AegisConfig {
    /// Claim store location
    pub store: StoreSettings,

    /// Workflow engine tuning
    pub workflow: WorkflowConfig,

    /// Decision thresholds
    pub policy: PolicyConfig,

    /// Which provider backends to use
    pub providers: ProviderSettings,

    /// Output settings
    pub settings: Settings,
}

/// Claim store settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// SQLite database path (default: `~/.aegis/aegis.db`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Evidence backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceBackend {
    /// Research service over HTTP
    Http,
    /// No research: every claim gets an empty dossier
    Empty,
}

/// Expert backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpertBackend {
    /// Local Ollama model
    Ollama,
    /// No expert: escalated claims fail and spend their retries
    Unavailable,
}

/// Notification sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierBackend {
    /// Log each verification event
    Log,
    /// Discard events
    None,
}

/// Provider backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Evidence gathering
    pub evidence: EvidenceBackend,

    /// Research service endpoint
    pub evidence_endpoint: String,

    /// Expert adjudication
    pub expert: ExpertBackend,

    /// Ollama server URL
    pub ollama_endpoint: String,

    /// Ollama model name
    pub ollama_model: String,

    /// Attempts per research call, fitted inside `workflow.provider_timeout_secs`
    pub http_retries: u32,

    /// Reuse expert answers for repeated claim text
    pub cache_expert: bool,

    /// Lifetime of a cached expert answer (in hours)
    pub expert_cache_hours: u64,

    /// Where verification events go
    pub notifier: NotifierBackend,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            evidence: EvidenceBackend::Http,
            evidence_endpoint: "http://localhost:8000/research".to_string(),
            expert: ExpertBackend::Ollama,
            ollama_endpoint: "http://localhost:11434".to_string(),
            ollama_model: "llama3.2".to_string(),
            http_retries: 3,
            cache_expert: true,
            expert_cache_hours: 24 * 30,
            notifier: NotifierBackend::Log,
        }
    }
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Enable colored output
    pub color: bool,

    /// Default output format
    pub format: OutputFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl AegisConfig {
    /// Directory holding the default config and database.
    pub fn home() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".aegis"))
    }

    /// Get the default configuration file path.
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::home()?.join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default path is used
    /// when present and built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Self::default_path()?;
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    Self::default()
                }
            }
        };
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| CliError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Ok(toml::from_str(&contents)?)
    }

    /// Save configuration to file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Check every section.
    pub fn validate(&self) -> Result<()> {
        self.workflow.validate()?;
        self.policy.validate()?;

        let providers = &self.providers;
        if providers.evidence == EvidenceBackend::Http && providers.evidence_endpoint.trim().is_empty() {
            return Err(CliError::Config("providers.evidence_endpoint must be set for the http backend".into()));
        }
        if providers.expert == ExpertBackend::Ollama && providers.ollama_model.trim().is_empty() {
            return Err(CliError::Config("providers.ollama_model must be set for the ollama backend".into()));
        }
        Ok(())
    }

    /// Resolved database path.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.store.path {
            Some(path) => Ok(PathBuf::from(path)),
            None => Ok(Self::home()?.join("aegis.db")),
        }
    }
}
