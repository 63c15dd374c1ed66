//! Local heuristic scorers
//!
//! Cheap, deterministic stand-ins for the ML suspicion model and the source
//! profiler. Useful offline and as fallbacks.

use aegis_domain::traits::{CredibilityScorer, SuspicionScorer};
use aegis_domain::ProviderError;
use async_trait::async_trait;
use serde_json::Value;

/// Phrases typical of sensational or manipulative claims
const SENSATIONAL_PHRASES: &[&str] = &[
    "shocking",
    "miracle",
    "secret",
    "they don't want you to know",
    "doctors hate",
    "exposed",
    "cover-up",
    "cover up",
    "hoax",
    "banned",
    "100%",
    "guaranteed",
    "wake up",
    "share before",
    "mainstream media",
    "cure",
];

/// Suspicion from sensational language, shouting, and exclamation marks
///
/// Returns the neutral score 0.5 when nothing matches.
#[derive(Debug, Clone)]
pub struct KeywordSuspicionScorer {
    phrases: Vec<String>,
}

impl KeywordSuspicionScorer {
    /// Scorer with the built-in phrase list
    pub fn new() -> Self {
        Self {
            phrases: SENSATIONAL_PHRASES.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Scorer with a custom phrase list (matched case-insensitively)
    pub fn with_phrases(phrases: Vec<String>) -> Self {
        Self {
            phrases: phrases.into_iter().map(|p| p.to_lowercase()).collect(),
        }
    }

    /// Score a text synchronously
    pub fn score(&self, text: &str) -> f64 {
        let lower = text.to_lowercase();
        let phrase_hits = self
            .phrases
            .iter()
            .filter(|p| lower.contains(p.as_str()))
            .count();

        let shouted_words = text
            .split_whitespace()
            .filter(|w| {
                let letters: Vec<char> = w.chars().filter(|c| c.is_alphabetic()).collect();
                letters.len() >= 3 && letters.iter().all(|c| c.is_uppercase())
            })
            .count();

        let exclamations = text.matches('!').count();

        if phrase_hits == 0 && shouted_words == 0 && exclamations == 0 {
            return 0.5;
        }

        let score = 0.5
            + 0.12 * phrase_hits as f64
            + 0.05 * shouted_words.min(4) as f64
            + 0.04 * exclamations.min(5) as f64;
        score.clamp(0.0, 1.0)
    }
}

impl Default for KeywordSuspicionScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SuspicionScorer for KeywordSuspicionScorer {
    async fn score_suspicion(&self, text: &str) -> Result<f64, ProviderError> {
        Ok(self.score(text))
    }
}

/// Credibility from account age, follower ratio, and verification
///
/// Reads `account_age_days`, `followers`, `following`, and `is_verified` from
/// the source metadata; missing fields count as zero / false.
#[derive(Debug, Clone, Default)]
pub struct ProfileCredibilityScorer;

impl ProfileCredibilityScorer {
    /// Create a profile scorer
    pub fn new() -> Self {
        Self
    }

    /// Score a source profile synchronously
    pub fn score(&self, metadata: &Value) -> Result<f64, ProviderError> {
        let profile = metadata.as_object().ok_or_else(|| {
            ProviderError::Malformed("source metadata must be an object".to_string())
        })?;

        let number = |key: &str| profile.get(key).and_then(Value::as_f64).unwrap_or(0.0);
        let account_age_days = number("account_age_days");
        let followers = number("followers");
        let following = number("following");
        let is_verified = profile
            .get("is_verified")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let mut score = 0.5;

        if is_verified {
            score += 0.4;
        }

        if account_age_days < 30.0 {
            score -= 0.25;
        } else if account_age_days > 365.0 {
            score += 0.1;
        }

        if following > 0.0 {
            if followers > following * 5.0 {
                score += 0.1;
            }
            // Follows far more than it is followed: bot-like
            if following > followers * 10.0 && followers < 1000.0 {
                score -= 0.2;
            }
        }

        if followers > 1_000_000.0 {
            score += 0.1;
        }

        Ok(f64::clamp(score, 0.0, 1.0))
    }
}

#[async_trait]
impl CredibilityScorer for ProfileCredibilityScorer {
    async fn score_credibility(&self, metadata: &Value) -> Result<f64, ProviderError> {
        self.score(metadata)
    }
}
