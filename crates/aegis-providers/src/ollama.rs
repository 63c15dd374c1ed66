//! Ollama-backed expert adjudicator
//!
//! Sends the case file to a local Ollama model together with an investigator
//! brief, and expects a JSON object back:
//!
//! ```json
//! { "verdict": "True" | "False" | "Misleading", "confidence": 0.0-1.0, "reasoning": "..." }
//! ```
//!
//! Anything else is reported as [`ProviderError::Malformed`], which the
//! workflow counts as a failed attempt.
//!
//! Each adjudication is exactly one request. Retries belong to the workflow's
//! retry counter, never to the transport.
//!
//! # Examples
//!
//! ```no_run
//! use aegis_providers::OllamaExpert;
//! use std::time::Duration;
//!
//! let expert = OllamaExpert::new("http://localhost:11434", "llama3")
//!     .with_timeout(Duration::from_secs(60));
//! ```

use crate::http::{build_client, send_once};
use aegis_domain::traits::ExpertProvider;
use aegis_domain::{Adjudication, CaseFile, EvidenceBundle, ProviderError, Verdict};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default timeout for adjudication requests (120 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

const INVESTIGATOR_BRIEF: &str = "\
You are an impartial fact-checking investigator. The automated pipeline could \
not settle the claim below, so you must make the final call.

Weigh all of the case file: a high suspicion score, a low-credibility source \
and inconclusive research together point towards misinformation, but use your \
own knowledge to decide.

Answer with ONLY a JSON object with exactly these keys:
{\"verdict\": \"True\" | \"False\" | \"Misleading\", \"confidence\": <number between 0 and 1>, \"reasoning\": \"<one sentence>\"}";

/// Expert adjudicator using Ollama's generate API
#[derive(Debug, Clone)]
pub struct OllamaExpert {
    endpoint: String,
    model: String,
    client: reqwest::Client,
    timeout: Duration,
}

/// Request body for Ollama generate API
#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'a str,
}

/// Response from Ollama generate API
#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// The investigator's JSON answer
#[derive(Deserialize)]
struct InvestigatorAnswer {
    verdict: String,
    #[serde(default)]
    confidence: Option<f64>,
    reasoning: String,
}

impl OllamaExpert {
    /// Create a new Ollama expert
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    /// - `model`: Model to use (e.g., "llama3", "mistral")
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        let timeout = Duration::from_secs(DEFAULT_TIMEOUT_SECS);
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            client: build_client(timeout),
            timeout,
        }
    }

    /// Create an expert against the default local endpoint
    pub fn default_endpoint(model: impl Into<String>) -> Self {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.client = build_client(timeout);
        self
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Build the full prompt for a case file
    pub fn build_prompt(case: &CaseFile) -> String {
        let bundle = EvidenceBundle::from_value(&case.evidence).unwrap_or_default();
        let case_json = serde_json::to_string_pretty(case).unwrap_or_else(|_| case.claim_text.clone());

        format!(
            "{brief}\n\nSUMMARY:\n- Suspicion score: {s:.2}\n- Source credibility: {c:.2}\n\
             - Knowledge summary: {summary}\n- Web sources found: {sources}\n\nCASE FILE:\n{case_json}",
            brief = INVESTIGATOR_BRIEF,
            s = case.suspicion,
            c = case.credibility,
            summary = if bundle.knowledge_summary.is_some() { "available" } else { "none" },
            sources = bundle.snippets.len(),
            case_json = case_json,
        )
    }

    /// Parse the model's answer into an adjudication
    pub fn parse_answer(raw: &str) -> Result<Adjudication, ProviderError> {
        // Models sometimes wrap the object in prose or code fences
        let start = raw.find('{');
        let end = raw.rfind('}');
        let json = match (start, end) {
            (Some(s), Some(e)) if s < e => &raw[s..=e],
            _ => {
                return Err(ProviderError::Malformed(format!(
                    "No JSON object in response: {}",
                    truncate(raw, 120)
                )))
            }
        };

        let answer: InvestigatorAnswer = serde_json::from_str(json)
            .map_err(|e| ProviderError::Malformed(format!("Invalid investigator JSON: {}", e)))?;

        let verdict = Verdict::parse(&answer.verdict).ok_or_else(|| {
            ProviderError::Malformed(format!("Unknown verdict: {}", answer.verdict))
        })?;

        if let Some(confidence) = answer.confidence {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(ProviderError::Malformed(format!(
                    "Confidence {} is outside [0.0, 1.0]",
                    confidence
                )));
            }
        }

        let explanation = answer.reasoning.trim().to_string();
        if explanation.is_empty() {
            return Err(ProviderError::Malformed("Empty reasoning".to_string()));
        }

        Ok(Adjudication {
            verdict,
            explanation,
            confidence: answer.confidence,
        })
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[async_trait]
impl ExpertProvider for OllamaExpert {
    async fn adjudicate(&self, case: &CaseFile) -> Result<Adjudication, ProviderError> {
        let url = format!("{}/api/generate", self.endpoint);
        let prompt = Self::build_prompt(case);
        let body = GenerateRequest {
            model: &self.model,
            prompt: &prompt,
            stream: false,
            format: "json",
        };

        let response = send_once(self.client.post(&url).json(&body), self.timeout).await?;

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(format!("Failed to parse response: {}", e)))?;

        let adjudication = Self::parse_answer(&generated.response)?;
        tracing::debug!(
            "Ollama verdict for claim {}: {} ({:?})",
            case.claim_id,
            adjudication.verdict,
            adjudication.confidence
        );
        Ok(adjudication)
    }
}
