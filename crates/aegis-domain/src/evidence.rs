//! Evidence module - a typed, read-only view over the opaque evidence bundle
//!
//! Research collaborators return an arbitrary JSON document. The workflow only
//! ever looks at three fields of it:
//!
//! - `fact_check`: `{ "rating" | "verdict", "source", "url"? }`
//! - `knowledge_summary` (or `wikipedia_summary`): a string, or an object
//!   with a `summary` string
//! - `snippets` (or `web_snippets`): a list of `{ "source", "text"?, "url"?,
//!   "credible"? }` objects, or bare strings naming a URL or source
//!
//! Everything else in the document is ignored.

use crate::{EvidenceError, Verdict};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashSet;

/// A matching entry from a fact-check source
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FactCheckMatch {
    /// Free-text rating as published, e.g. "Pants on Fire"
    #[serde(alias = "verdict")]
    pub rating: String,

    /// Name of the fact-check organisation
    pub source: String,

    /// Link to the published check
    #[serde(default)]
    pub url: Option<String>,
}

impl FactCheckMatch {
    /// Normalise the published rating to a verdict
    pub fn verdict(&self) -> Verdict {
        Verdict::from_rating(&self.rating)
    }
}

/// A single search result or corroborating source
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceSnippet {
    /// Publisher or host the snippet came from
    pub source: String,
    /// Snippet text, if the provider returned any
    pub text: Option<String>,
    /// Link to the result
    pub url: Option<String>,
    /// Whether the provider considers the source credible (defaults to true)
    pub credible: bool,
}

impl<'de> Deserialize<'de> for EvidenceSnippet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bare(String),
            Full {
                source: String,
                #[serde(default)]
                text: Option<String>,
                #[serde(default)]
                url: Option<String>,
                #[serde(default = "default_credible")]
                credible: bool,
            },
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Bare(s) => {
                let is_url = s.starts_with("http://") || s.starts_with("https://");
                EvidenceSnippet {
                    source: if is_url { host_of(&s).to_string() } else { s.clone() },
                    text: None,
                    url: is_url.then_some(s),
                    credible: true,
                }
            }
            Raw::Full { source, text, url, credible } => EvidenceSnippet {
                source,
                text,
                url,
                credible,
            },
        })
    }
}

fn default_credible() -> bool {
    true
}

/// Host part of an http(s) URL, without any `www.` prefix
fn host_of(url: &str) -> &str {
    let rest = url.split_once("://").map(|(_, r)| r).unwrap_or(url);
    let host = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    host.strip_prefix("www.").unwrap_or(host)
}

/// Accept either a plain string or an object carrying a `summary` string
fn deserialize_summary<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Object {
            #[serde(default)]
            summary: Option<String>,
        },
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(s)) => Some(s),
        Some(Raw::Object { summary }) => summary,
        None => None,
    })
}

/// Typed view of an evidence bundle
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EvidenceBundle {
    /// Fact-check match, if any source has checked this claim
    #[serde(default)]
    pub fact_check: Option<FactCheckMatch>,

    /// Knowledge-base summary text
    #[serde(
        default,
        alias = "wikipedia_summary",
        deserialize_with = "deserialize_summary"
    )]
    pub knowledge_summary: Option<String>,

    /// Search results and corroborating sources
    #[serde(default, alias = "web_snippets", deserialize_with = "deserialize_snippets")]
    pub snippets: Vec<EvidenceSnippet>,
}

fn deserialize_snippets<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<EvidenceSnippet>, D::Error> {
    Ok(Option::<Vec<EvidenceSnippet>>::deserialize(deserializer)?.unwrap_or_default())
}

impl EvidenceBundle {
    /// Parse the fields the workflow inspects out of an evidence document
    ///
    /// # Errors
    ///
    /// Returns [`EvidenceError::Malformed`] when the document is not a JSON
    /// object, or when one of the inspected fields has the wrong shape.
    pub fn from_value(value: &Value) -> Result<Self, EvidenceError> {
        if !value.is_object() {
            return Err(EvidenceError::Malformed(format!(
                "expected an object, got {}",
                json_kind(value)
            )));
        }
        Ok(Self::deserialize(value)?)
    }

    /// Whether at least one snippet corroborates the claim's research
    pub fn has_corroborating_snippet(&self) -> bool {
        !self.snippets.is_empty()
    }

    /// Number of distinct credible sources among the snippets
    ///
    /// Sources are compared case-insensitively after trimming; empty source
    /// names are not counted.
    pub fn distinct_credible_sources(&self) -> usize {
        self.snippets
            .iter()
            .filter(|s| s.credible)
            .map(|s| s.source.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect::<HashSet<_>>()
            .len()
    }

    /// First marker found in the knowledge summary (case-insensitive substring)
    pub fn summary_marker<'m>(&self, markers: &'m [String]) -> Option<&'m str> {
        let summary = self.knowledge_summary.as_deref()?.to_lowercase();
        markers
            .iter()
            .find(|m| !m.is_empty() && summary.contains(&m.to_lowercase()))
            .map(String::as_str)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn markers() -> Vec<String> {
        ["contradict", "false", "not", "incorrect", "myth"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_parse_canonical_fields() {
        let bundle = EvidenceBundle::from_value(&json!({
            "fact_check": {"verdict": "Pants on Fire", "source": "PolitiFact", "url": "https://politifact.com/x"},
            "knowledge_summary": "A popular myth.",
            "snippets": [{"source": "Reuters", "text": "..."}],
            "unrelated": 42
        }))
        .unwrap();

        let fc = bundle.fact_check.as_ref().unwrap();
        assert_eq!(fc.source, "PolitiFact");
        assert_eq!(fc.verdict(), Verdict::False);
        assert_eq!(bundle.knowledge_summary.as_deref(), Some("A popular myth."));
        assert_eq!(bundle.snippets.len(), 1);
        assert!(bundle.snippets[0].credible);
    }

    #[test]
    fn test_parse_research_dossier_aliases() {
        let bundle = EvidenceBundle::from_value(&json!({
            "wikipedia_summary": {"found": true, "summary": "Earth is round.", "url": "https://en.wikipedia.org/wiki/Earth"},
            "web_snippets": [
                "https://www.nasa.gov/earth",
                "https://apnews.com/article/1"
            ]
        }))
        .unwrap();

        assert_eq!(bundle.knowledge_summary.as_deref(), Some("Earth is round."));
        assert_eq!(bundle.snippets[0].source, "nasa.gov");
        assert_eq!(bundle.snippets[0].url.as_deref(), Some("https://www.nasa.gov/earth"));
        assert_eq!(bundle.distinct_credible_sources(), 2);
    }

    #[test]
    fn test_null_fields_are_absent() {
        let bundle = EvidenceBundle::from_value(&json!({
            "wikipedia_summary": null,
            "web_snippets": null
        }))
        .unwrap();
        assert_eq!(bundle, EvidenceBundle::default());
        assert!(!bundle.has_corroborating_snippet());
    }

    #[test]
    fn test_malformed_shapes() {
        assert!(EvidenceBundle::from_value(&json!("just text")).is_err());
        assert!(EvidenceBundle::from_value(&json!([1, 2])).is_err());
        assert!(EvidenceBundle::from_value(&json!({"snippets": "nope"})).is_err());
        assert!(EvidenceBundle::from_value(&json!({"fact_check": {"source": "x"}})).is_err());
    }

    #[test]
    fn test_distinct_sources_ignore_case_and_non_credible() {
        let bundle = EvidenceBundle::from_value(&json!({
            "snippets": [
                {"source": "Reuters"},
                {"source": " reuters "},
                {"source": "AP"},
                {"source": "blog", "credible": false},
                {"source": ""}
            ]
        }))
        .unwrap();
        assert_eq!(bundle.distinct_credible_sources(), 2);
    }

    #[test]
    fn test_summary_marker_is_substring_match() {
        let mut bundle = EvidenceBundle {
            knowledge_summary: Some("This claim is Incorrect.".into()),
            ..Default::default()
        };
        assert_eq!(bundle.summary_marker(&markers()), Some("incorrect"));

        // Plain substring matching: "nothing" contains "not"
        bundle.knowledge_summary = Some("There is nothing to see.".into());
        assert_eq!(bundle.summary_marker(&markers()), Some("not"));

        bundle.knowledge_summary = Some("Earth orbits the Sun.".into());
        assert_eq!(bundle.summary_marker(&markers()), None);

        bundle.knowledge_summary = None;
        assert_eq!(bundle.summary_marker(&markers()), None);
    }
}
