//! Stand-ins for deployments without a research service or expert model

use aegis_domain::traits::{EvidenceProvider, ExpertProvider};
use aegis_domain::{Adjudication, CaseFile, ProviderError};
use async_trait::async_trait;
use serde_json::{json, Value};

/// Evidence provider that finds nothing
///
/// Every claim gets a dossier with no knowledge summary and no snippets, so
/// decisions rest on the scores alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyEvidence;

#[async_trait]
impl EvidenceProvider for EmptyEvidence {
    async fn gather(&self, _text: &str) -> Result<Value, ProviderError> {
        Ok(json!({ "knowledge_summary": null, "snippets": [] }))
    }
}

/// Expert that is not there
///
/// Every adjudication fails permanently, so escalated claims spend their
/// retry budget and end in `failed`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableExpert;

#[async_trait]
impl ExpertProvider for UnavailableExpert {
    async fn adjudicate(&self, case: &CaseFile) -> Result<Adjudication, ProviderError> {
        tracing::debug!("No expert configured for claim {}", case.claim_id);
        Err(ProviderError::Permanent("no expert backend configured".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_domain::{ClaimId, EvidenceBundle};

    #[tokio::test]
    async fn test_empty_evidence_is_a_valid_bundle() {
        let dossier = EmptyEvidence.gather("anything").await.unwrap();
        let bundle = EvidenceBundle::from_value(&dossier).unwrap();
        assert!(bundle.snippets.is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_expert_fails_permanently() {
        let case = CaseFile {
            claim_id: ClaimId::new(),
            claim_text: "claim".to_string(),
            source_metadata: json!({}),
            suspicion: 0.9,
            credibility: 0.1,
            evidence: json!({}),
        };
        let err = UnavailableExpert.adjudicate(&case).await.unwrap_err();
        assert_eq!(err.kind(), "permanent");
    }
}
