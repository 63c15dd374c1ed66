//! Aegis Provider Layer
//!
//! Implementations of the enrichment and expert traits from `aegis-domain`.
//!
//! # Providers
//!
//! - `MockScorer`, `MockEvidence`, `MockExpert`: deterministic mocks for testing
//! - `KeywordSuspicionScorer`, `ProfileCredibilityScorer`: local heuristics
//! - `HttpEvidenceProvider`: a research service reached over HTTP
//! - `OllamaExpert`: expert adjudication by a local Ollama model
//! - `CachedExpert`: reuses adjudications for repeated claim texts
//! - `EmptyEvidence`, `UnavailableExpert`: offline stand-ins
//!
//! # Examples
//!
//! ```
//! use aegis_providers::MockScorer;
//! use aegis_domain::traits::SuspicionScorer;
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! let scorer = MockScorer::new(0.42);
//! let score = rt.block_on(scorer.score_suspicion("any text")).unwrap();
//! assert_eq!(score, 0.42);
//! ```

#![warn(missing_docs)]

pub mod cache;
pub mod heuristics;
pub mod http;
pub mod offline;
pub mod ollama;

use aegis_domain::traits::{CredibilityScorer, EvidenceProvider, ExpertProvider, SuspicionScorer};
use aegis_domain::{Adjudication, CaseFile, ProviderError, Verdict};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

pub use cache::CachedExpert;
pub use heuristics::{KeywordSuspicionScorer, ProfileCredibilityScorer};
pub use http::HttpEvidenceProvider;
pub use offline::{EmptyEvidence, UnavailableExpert};
pub use ollama::OllamaExpert;

/// Lock a mock's state, recovering it if a panicking test poisoned the lock
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mock scorer for deterministic testing
///
/// Implements both scoring traits. Suspicion responses are keyed by claim
/// text; credibility responses by the `handle` field of the source metadata.
/// Unknown keys get the default score.
///
/// # Examples
///
/// ```
/// use aegis_providers::MockScorer;
/// use aegis_domain::ProviderError;
///
/// let mut scorer = MockScorer::new(0.5);
/// scorer.add_response("The moon landing was faked", Ok(0.95));
/// scorer.add_response("@bot", Err(ProviderError::Transient("503".into())));
/// ```
#[derive(Debug, Clone)]
pub struct MockScorer {
    default_score: f64,
    responses: Arc<Mutex<HashMap<String, Result<f64, ProviderError>>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockScorer {
    /// Create a scorer returning `score` for every input
    pub fn new(score: f64) -> Self {
        Self {
            default_score: score,
            responses: Arc::new(Mutex::new(HashMap::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Respond to a specific claim text or source handle
    pub fn add_response(&mut self, key: impl Into<String>, response: Result<f64, ProviderError>) {
        lock(&self.responses).insert(key.into(), response);
    }

    /// Number of scoring calls made (both traits)
    pub fn call_count(&self) -> usize {
        *lock(&self.call_count)
    }

    fn respond(&self, key: &str) -> Result<f64, ProviderError> {
        *lock(&self.call_count) += 1;
        lock(&self.responses)
            .get(key)
            .cloned()
            .unwrap_or(Ok(self.default_score))
    }
}

#[async_trait]
impl SuspicionScorer for MockScorer {
    async fn score_suspicion(&self, text: &str) -> Result<f64, ProviderError> {
        self.respond(text)
    }
}

#[async_trait]
impl CredibilityScorer for MockScorer {
    async fn score_credibility(&self, metadata: &Value) -> Result<f64, ProviderError> {
        let handle = metadata.get("handle").and_then(Value::as_str).unwrap_or_default();
        self.respond(handle)
    }
}

/// Mock evidence provider keyed by claim text
#[derive(Debug, Clone)]
pub struct MockEvidence {
    default_bundle: Value,
    responses: Arc<Mutex<HashMap<String, Result<Value, ProviderError>>>>,
    call_count: Arc<Mutex<usize>>,
    delay: Option<Duration>,
}

impl MockEvidence {
    /// Create a provider returning `bundle` for every claim
    pub fn new(bundle: Value) -> Self {
        Self {
            default_bundle: bundle,
            responses: Arc::new(Mutex::new(HashMap::new())),
            call_count: Arc::new(Mutex::new(0)),
            delay: None,
        }
    }

    /// Respond to a specific claim text
    pub fn add_response(&mut self, text: impl Into<String>, response: Result<Value, ProviderError>) {
        lock(&self.responses).insert(text.into(), response);
    }

    /// Sleep this long before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of gather calls made
    pub fn call_count(&self) -> usize {
        *lock(&self.call_count)
    }
}

impl Default for MockEvidence {
    fn default() -> Self {
        Self::new(serde_json::json!({ "knowledge_summary": null, "snippets": [] }))
    }
}

#[async_trait]
impl EvidenceProvider for MockEvidence {
    async fn gather(&self, text: &str) -> Result<Value, ProviderError> {
        *lock(&self.call_count) += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        lock(&self.responses)
            .get(text)
            .cloned()
            .unwrap_or_else(|| Ok(self.default_bundle.clone()))
    }
}

/// Mock expert with scripted answers
///
/// Scripted results for a claim text are consumed in order; once a script is
/// used up (or for unscripted texts) the default answer is returned.
#[derive(Debug, Clone)]
pub struct MockExpert {
    default_result: Result<Adjudication, ProviderError>,
    scripts: Arc<Mutex<HashMap<String, VecDeque<Result<Adjudication, ProviderError>>>>>,
    call_count: Arc<Mutex<usize>>,
    delay: Option<Duration>,
}

impl MockExpert {
    /// Create an expert that always answers with `verdict`
    pub fn new(verdict: Verdict, explanation: impl Into<String>) -> Self {
        Self::with_default(Ok(Adjudication {
            verdict,
            explanation: explanation.into(),
            confidence: Some(0.9),
        }))
    }

    /// Create an expert whose unscripted answer is `result`
    pub fn with_default(result: Result<Adjudication, ProviderError>) -> Self {
        Self {
            default_result: result,
            scripts: Arc::new(Mutex::new(HashMap::new())),
            call_count: Arc::new(Mutex::new(0)),
            delay: None,
        }
    }

    /// Create an expert that always fails with `error`
    pub fn failing(error: ProviderError) -> Self {
        Self::with_default(Err(error))
    }

    /// Queue the next answer for a claim text
    pub fn push_result(&mut self, text: impl Into<String>, result: Result<Adjudication, ProviderError>) {
        lock(&self.scripts).entry(text.into()).or_default().push_back(result);
    }

    /// Sleep this long before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of adjudications requested
    pub fn call_count(&self) -> usize {
        *lock(&self.call_count)
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        *lock(&self.call_count) = 0;
    }
}

#[async_trait]
impl ExpertProvider for MockExpert {
    async fn adjudicate(&self, case: &CaseFile) -> Result<Adjudication, ProviderError> {
        *lock(&self.call_count) += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = lock(&self.scripts)
            .get_mut(&case.claim_text)
            .and_then(VecDeque::pop_front);
        scripted.unwrap_or_else(|| self.default_result.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_domain::ClaimId;
    use serde_json::json;

    fn case(text: &str) -> CaseFile {
        CaseFile {
            claim_id: ClaimId::new(),
            claim_text: text.to_string(),
            source_metadata: json!({}),
            suspicion: 0.9,
            credibility: 0.1,
            evidence: json!({}),
        }
    }

    #[tokio::test]
    async fn test_mock_scorer_keys() {
        let mut scorer = MockScorer::new(0.5);
        scorer.add_response("suspicious", Ok(0.9));
        scorer.add_response("@trusted", Ok(0.95));

        assert_eq!(scorer.score_suspicion("suspicious").await.unwrap(), 0.9);
        assert_eq!(scorer.score_suspicion("other").await.unwrap(), 0.5);
        assert_eq!(
            scorer.score_credibility(&json!({"handle": "@trusted"})).await.unwrap(),
            0.95
        );
        assert_eq!(scorer.score_credibility(&json!({})).await.unwrap(), 0.5);
        assert_eq!(scorer.call_count(), 4);
    }

    #[tokio::test]
    async fn test_mock_evidence_error() {
        let mut evidence = MockEvidence::default();
        evidence.add_response("down", Err(ProviderError::Transient("timeout".into())));

        assert!(evidence.gather("down").await.is_err());
        assert!(evidence.gather("fine").await.is_ok());
        assert_eq!(evidence.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_expert_script_then_default() {
        let mut expert = MockExpert::new(Verdict::True, "default");
        expert.push_result("claim", Err(ProviderError::Malformed("bad json".into())));

        assert!(expert.adjudicate(&case("claim")).await.is_err());
        let answer = expert.adjudicate(&case("claim")).await.unwrap();
        assert_eq!(answer.explanation, "default");
        assert_eq!(expert.call_count(), 2);

        expert.reset_call_count();
        assert_eq!(expert.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_clone_shares_state() {
        let expert = MockExpert::failing(ProviderError::Permanent("401".into()));
        let clone = expert.clone();
        let _ = clone.adjudicate(&case("x")).await;
        assert_eq!(expert.call_count(), 1);
    }
}
