//! Escalation Evaluator - decides which claims need the expert path

use crate::PolicyConfig;
use aegis_domain::EvidenceBundle;
use std::fmt;

/// Outcome of evaluating a fused-pending claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationDecision {
    /// Resolve with the fusion resolver
    ResolveAutomatically,
    /// Hand the claim to the expert adjudicator
    Escalate,
}

/// Which escalation conditions held, and the resulting decision
#[derive(Debug, Clone, PartialEq)]
pub struct EscalationAssessment {
    /// Suspicion above the escalation threshold
    pub high_suspicion: bool,
    /// Credibility below the escalation threshold
    pub low_credibility: bool,
    /// Contradiction marker found in the knowledge summary, if any
    pub contradiction_marker: Option<String>,
    /// At least one corroborating snippet is present
    pub corroborated: bool,
    /// Escalate iff every condition above holds
    pub decision: EscalationDecision,
}

impl EscalationAssessment {
    /// Whether the claim goes to the expert path
    pub fn should_escalate(&self) -> bool {
        self.decision == EscalationDecision::Escalate
    }
}

impl fmt::Display for EscalationAssessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "high_suspicion={} low_credibility={} marker={} corroborated={}",
            self.high_suspicion,
            self.low_credibility,
            self.contradiction_marker.as_deref().unwrap_or("-"),
            self.corroborated
        )
    }
}

/// Pure escalation policy
#[derive(Debug, Clone)]
pub struct EscalationEvaluator {
    config: PolicyConfig,
}

impl EscalationEvaluator {
    /// Create an evaluator with the given configuration
    pub fn new(config: PolicyConfig) -> Self {
        Self { config }
    }

    /// Evaluate a claim's scores and evidence
    ///
    /// Escalates iff all of these hold:
    ///
    /// 1. suspicion is above `escalation_suspicion_above`
    /// 2. credibility is below `escalation_credibility_below`
    /// 3. the knowledge summary contains a contradiction marker
    /// 4. at least one corroborating snippet is present
    ///
    /// Without evidence the claim is never escalated.
    pub fn evaluate(
        &self,
        suspicion: f64,
        credibility: f64,
        evidence: Option<&EvidenceBundle>,
    ) -> EscalationAssessment {
        let high_suspicion = suspicion > self.config.escalation_suspicion_above;
        let low_credibility = credibility < self.config.escalation_credibility_below;
        let contradiction_marker = evidence
            .and_then(|e| e.summary_marker(&self.config.contradiction_markers))
            .map(str::to_string);
        let corroborated = evidence.is_some_and(EvidenceBundle::has_corroborating_snippet);

        let decision = if high_suspicion
            && low_credibility
            && contradiction_marker.is_some()
            && corroborated
        {
            EscalationDecision::Escalate
        } else {
            EscalationDecision::ResolveAutomatically
        };

        EscalationAssessment {
            high_suspicion,
            low_credibility,
            contradiction_marker,
            corroborated,
            decision,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_domain::EvidenceSnippet;

    fn snippet(source: &str) -> EvidenceSnippet {
        EvidenceSnippet {
            source: source.to_string(),
            text: None,
            url: None,
            credible: true,
        }
    }

    fn contradicting_evidence() -> EvidenceBundle {
        EvidenceBundle {
            fact_check: None,
            knowledge_summary: Some("This is a common myth.".to_string()),
            snippets: vec![snippet("Reuters")],
        }
    }

    fn evaluator() -> EscalationEvaluator {
        EscalationEvaluator::new(PolicyConfig::default())
    }

    #[test]
    fn test_escalates_when_all_conditions_hold() {
        let evidence = contradicting_evidence();
        let assessment = evaluator().evaluate(0.9, 0.2, Some(&evidence));
        assert!(assessment.should_escalate());
        assert_eq!(assessment.contradiction_marker.as_deref(), Some("myth"));
    }

    #[test]
    fn test_not_suspicious_enough() {
        let evidence = contradicting_evidence();
        let assessment = evaluator().evaluate(0.85, 0.2, Some(&evidence));
        assert!(!assessment.high_suspicion);
        assert!(!assessment.should_escalate());
    }

    #[test]
    fn test_source_too_credible() {
        let evidence = contradicting_evidence();
        let assessment = evaluator().evaluate(0.9, 0.3, Some(&evidence));
        assert!(!assessment.low_credibility);
        assert!(!assessment.should_escalate());
    }

    #[test]
    fn test_no_contradiction_marker() {
        let mut evidence = contradicting_evidence();
        evidence.knowledge_summary = Some("Water boils at 100 degrees Celsius at sea level.".into());
        let assessment = evaluator().evaluate(0.9, 0.2, Some(&evidence));
        assert!(assessment.contradiction_marker.is_none());
        assert!(!assessment.should_escalate());

        evidence.knowledge_summary = None;
        assert!(!evaluator().evaluate(0.9, 0.2, Some(&evidence)).should_escalate());
    }

    #[test]
    fn test_no_corroborating_snippet() {
        let mut evidence = contradicting_evidence();
        evidence.snippets.clear();
        let assessment = evaluator().evaluate(0.9, 0.2, Some(&evidence));
        assert!(!assessment.corroborated);
        assert!(!assessment.should_escalate());
    }

    #[test]
    fn test_absent_evidence_never_escalates() {
        let assessment = evaluator().evaluate(1.0, 0.0, None);
        assert_eq!(assessment.decision, EscalationDecision::ResolveAutomatically);
        assert!(assessment.high_suspicion && assessment.low_credibility);
    }

    #[test]
    fn test_marker_match_is_case_insensitive_substring() {
        let mut evidence = contradicting_evidence();
        evidence.knowledge_summary = Some("Scientists have NOT found any link.".into());
        assert!(evaluator().evaluate(0.9, 0.2, Some(&evidence)).should_escalate());

        // "nothing" contains "not": a known imprecision of plain substring matching
        evidence.knowledge_summary = Some("There is nothing unusual here.".into());
        assert!(evaluator().evaluate(0.9, 0.2, Some(&evidence)).should_escalate());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: without evidence the decision is always automatic
        #[test]
        fn test_no_evidence_property(s in 0.0f64..=1.0, c in 0.0f64..=1.0) {
            let evaluator = EscalationEvaluator::new(PolicyConfig::default());
            prop_assert!(!evaluator.evaluate(s, c, None).should_escalate());
        }
    }
}
