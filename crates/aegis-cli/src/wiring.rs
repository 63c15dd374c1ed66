//! Builds the workflow engine from configuration.

use crate::config::{AegisConfig, EvidenceBackend, ExpertBackend, NotifierBackend};
use crate::error::Result;
use aegis_domain::traits::{EvidenceProvider, ExpertProvider, Notifier};
use aegis_providers::{
    CachedExpert, EmptyEvidence, HttpEvidenceProvider, KeywordSuspicionScorer, OllamaExpert,
    ProfileCredibilityScorer, UnavailableExpert,
};
use aegis_store::SqliteStore;
use aegis_workflow::{LogNotifier, NullNotifier, Providers, WorkflowEngine};
use std::sync::Arc;
use std::time::Duration;

/// Research client whose attempts and backoff fit the provider timeout.
pub fn http_evidence(config: &AegisConfig) -> HttpEvidenceProvider {
    HttpEvidenceProvider::new(config.providers.evidence_endpoint.clone())
        .with_max_retries(config.providers.http_retries)
        .within(config.workflow.provider_timeout())
}

/// Ollama client making one request per adjudication.
///
/// Repeated attempts are counted by the workflow's retry budget.
pub fn ollama_expert(config: &AegisConfig) -> OllamaExpert {
    OllamaExpert::new(
        config.providers.ollama_endpoint.clone(),
        config.providers.ollama_model.clone(),
    )
    .with_timeout(config.workflow.expert_timeout())
}

/// Provider set described by the `[providers]` section.
pub fn providers(config: &AegisConfig) -> Providers {
    let settings = &config.providers;

    let evidence: Arc<dyn EvidenceProvider> = match settings.evidence {
        EvidenceBackend::Http => Arc::new(http_evidence(config)),
        EvidenceBackend::Empty => Arc::new(EmptyEvidence),
    };

    let expert: Arc<dyn ExpertProvider> = match settings.expert {
        ExpertBackend::Ollama => {
            let ollama = ollama_expert(config);
            if settings.cache_expert {
                let ttl = Duration::from_secs(settings.expert_cache_hours * 3600);
                Arc::new(CachedExpert::with_ttl(ollama, ttl))
            } else {
                Arc::new(ollama)
            }
        }
        ExpertBackend::Unavailable => Arc::new(UnavailableExpert),
    };

    let notifier: Arc<dyn Notifier> = match settings.notifier {
        NotifierBackend::Log => Arc::new(LogNotifier),
        NotifierBackend::None => Arc::new(NullNotifier),
    };

    Providers {
        suspicion: Arc::new(KeywordSuspicionScorer::new()),
        credibility: Arc::new(ProfileCredibilityScorer::new()),
        evidence,
        expert,
        notifier,
    }
}

/// Open the configured store.
pub fn open_store(config: &AegisConfig) -> Result<SqliteStore> {
    let path = config.database_path()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    tracing::debug!("Opening claim store at {}", path.display());
    Ok(SqliteStore::new(&path)?)
}

/// Engine over the configured store and providers.
pub fn engine(config: &AegisConfig) -> Result<WorkflowEngine<SqliteStore>> {
    Ok(WorkflowEngine::new(
        open_store(config)?,
        providers(config),
        config.workflow.clone(),
        config.policy.clone(),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreSettings;

    #[tokio::test]
    async fn test_offline_engine_runs_a_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AegisConfig::default();
        config.store = StoreSettings {
            path: Some(dir.path().join("db").join("aegis.db").display().to_string()),
        };
        config.providers.evidence = EvidenceBackend::Empty;
        config.providers.expert = ExpertBackend::Unavailable;
        config.providers.notifier = NotifierBackend::None;

        let engine = engine(&config).unwrap();
        let id = engine
            .submit("Lovely sunset over the bay", serde_json::json!({"verified": true}))
            .unwrap();
        let report = engine.run_cycle().await.unwrap();

        assert!(!report.timed_out);
        let claim = engine.claim(id).unwrap().unwrap();
        assert!(claim.status.is_terminal());
    }

    #[test]
    fn test_research_retries_fit_the_provider_timeout() {
        let config = AegisConfig::default();
        let evidence = http_evidence(&config);
        assert_eq!(evidence.max_retries(), config.providers.http_retries);
        assert!(evidence.timeout() < config.workflow.provider_timeout());
        assert!(evidence.worst_case() <= config.workflow.provider_timeout());

        let mut config = AegisConfig::default();
        config.workflow.provider_timeout_secs = 3;
        let evidence = http_evidence(&config);
        assert_eq!(evidence.max_retries(), 1);
        assert_eq!(evidence.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_expert_request_is_bounded_by_expert_timeout() {
        let mut config = AegisConfig::default();
        config.workflow.expert_timeout_secs = 45;
        assert_eq!(ollama_expert(&config).timeout(), Duration::from_secs(45));
    }
}
