//! Fusion Resolver - a verdict from scores and evidence without the expert

use crate::PolicyConfig;
use aegis_domain::{EvidenceBundle, Verdict};
use std::fmt;

/// The rule that produced a fusion verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FusionRule {
    /// Adopted a fact-check rating
    FactCheck,
    /// Enough distinct credible sources agree
    Corroboration,
    /// High suspicion from a low-credibility source
    ScoreThreshold,
    /// The knowledge summary contradicts the claim
    ContradictionMarker,
    /// Nothing conclusive
    Inconclusive,
}

impl FusionRule {
    /// Short name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            FusionRule::FactCheck => "fact_check",
            FusionRule::Corroboration => "corroboration",
            FusionRule::ScoreThreshold => "score_threshold",
            FusionRule::ContradictionMarker => "contradiction_marker",
            FusionRule::Inconclusive => "inconclusive",
        }
    }
}

impl fmt::Display for FusionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A verdict reached by fusion, with its explanation
#[derive(Debug, Clone, PartialEq)]
pub struct FusionVerdict {
    /// Verdict
    pub verdict: Verdict,
    /// Non-empty, human-readable explanation
    pub explanation: String,
    /// Which rule fired
    pub rule: FusionRule,
}

/// Pure fusion policy
#[derive(Debug, Clone)]
pub struct FusionResolver {
    config: PolicyConfig,
}

impl FusionResolver {
    /// Create a resolver with the given configuration
    pub fn new(config: PolicyConfig) -> Self {
        Self { config }
    }

    /// Resolve a claim; the first matching rule wins
    ///
    /// 1. a fact-check match: adopt its rating
    /// 2. at least `corroboration_min_sources` distinct credible sources: True
    /// 3. suspicion above `fusion_suspicion_above` and credibility below
    ///    `fusion_credibility_below`: False
    /// 4. a contradiction marker in the knowledge summary: False
    /// 5. otherwise: Misleading
    pub fn resolve(
        &self,
        suspicion: f64,
        credibility: f64,
        evidence: Option<&EvidenceBundle>,
    ) -> FusionVerdict {
        if let Some(fact_check) = evidence.and_then(|e| e.fact_check.as_ref()) {
            let mut explanation = format!(
                "Fact-check by {} rated this claim \"{}\".",
                non_empty(&fact_check.source, "an independent fact-checker"),
                fact_check.rating.trim()
            );
            if let Some(url) = fact_check.url.as_deref().filter(|u| !u.is_empty()) {
                explanation.push_str(&format!(" Source: {}", url));
            }
            return FusionVerdict {
                verdict: fact_check.verdict(),
                explanation,
                rule: FusionRule::FactCheck,
            };
        }

        let sources = evidence.map_or(0, EvidenceBundle::distinct_credible_sources);
        if sources >= self.config.corroboration_min_sources {
            return FusionVerdict {
                verdict: Verdict::True,
                explanation: format!("Corroborated by {} independent credible sources.", sources),
                rule: FusionRule::Corroboration,
            };
        }

        if suspicion > self.config.fusion_suspicion_above
            && credibility < self.config.fusion_credibility_below
        {
            return FusionVerdict {
                verdict: Verdict::False,
                explanation: format!(
                    "Highly suspicious content ({:.2}) from a low-credibility source ({:.2}).",
                    suspicion, credibility
                ),
                rule: FusionRule::ScoreThreshold,
            };
        }

        if let Some(marker) = evidence.and_then(|e| e.summary_marker(&self.config.contradiction_markers)) {
            return FusionVerdict {
                verdict: Verdict::False,
                explanation: format!(
                    "Reference material contradicts the claim (matched \"{}\").",
                    marker
                ),
                rule: FusionRule::ContradictionMarker,
            };
        }

        FusionVerdict {
            verdict: Verdict::Misleading,
            explanation: "Available evidence neither confirms nor refutes the claim.".to_string(),
            rule: FusionRule::Inconclusive,
        }
    }
}

fn non_empty<'a>(s: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        fallback
    } else {
        trimmed
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: every rule produces a non-empty explanation
        #[test]
        fn test_explanation_never_empty(s in 0.0f64..=1.0, c in 0.0f64..=1.0, n in 0usize..5) {
            let evidence = EvidenceBundle {
                snippets: (0..n)
                    .map(|i| aegis_domain::EvidenceSnippet {
                        source: format!("source-{}", i),
                        text: None,
                        url: None,
                        credible: true,
                    })
                    .collect(),
                ..Default::default()
            };
            let verdict = FusionResolver::new(PolicyConfig::default()).resolve(s, c, Some(&evidence));
            prop_assert!(!verdict.explanation.trim().is_empty());
        }
    }
}
