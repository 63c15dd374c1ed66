//! Verification events emitted once per verified record

use crate::{ClaimId, ResolutionPath, Verdict, VerifiedRecord};
use serde::{Deserialize, Serialize};

/// Notification payload for downstream consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationEvent {
    /// Resolved claim
    pub claim_id: ClaimId,
    /// Final verdict
    pub verdict: Verdict,
    /// Explanation from the record
    pub explanation: String,
    /// Which path produced the verdict
    pub resolution_path: ResolutionPath,
    /// Expert confidence, when the record has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl VerificationEvent {
    /// Public alert text for dashboards and feeds
    ///
    /// # Examples
    ///
    /// ```
    /// use aegis_domain::{ClaimId, VerificationEvent, VerifiedRecord, Verdict};
    ///
    /// let record = VerifiedRecord::by_fusion(ClaimId::new(), Verdict::False, "Rated false by Snopes.");
    /// let alert = VerificationEvent::from(&record).public_alert();
    /// assert_eq!(alert, "This information has been confirmed as false. Rated false by Snopes.");
    /// ```
    pub fn public_alert(&self) -> String {
        let lead = match self.verdict {
            Verdict::True => "This information has been verified as accurate.",
            Verdict::False => "This information has been confirmed as false.",
            Verdict::Misleading => "This information may be misleading.",
        };
        let mut alert = format!("{} {}", lead, self.explanation.trim());
        if let Some(confidence) = self.confidence {
            alert.push_str(&format!(
                " Our confidence level is {:.0}%.",
                confidence * 100.0
            ));
        }
        alert
    }
}

impl From<&VerifiedRecord> for VerificationEvent {
    fn from(record: &VerifiedRecord) -> Self {
        Self {
            claim_id: record.claim_id,
            verdict: record.verdict,
            explanation: record.explanation.clone(),
            resolution_path: record.resolution_path,
            confidence: record.confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Adjudication;

    #[test]
    fn test_alert_includes_confidence_when_present() {
        let record = VerifiedRecord::by_investigator(
            ClaimId::new(),
            Adjudication {
                verdict: Verdict::True,
                explanation: "Multiple agencies confirm it.".into(),
                confidence: Some(0.874),
            },
        );
        let event = VerificationEvent::from(&record);
        assert_eq!(
            event.public_alert(),
            "This information has been verified as accurate. Multiple agencies confirm it. Our confidence level is 87%."
        );
    }

    #[test]
    fn test_misleading_alert() {
        let record = VerifiedRecord::by_fusion(ClaimId::new(), Verdict::Misleading, "Mixed evidence.");
        let alert = VerificationEvent::from(&record).public_alert();
        assert!(alert.starts_with("This information may be misleading."));
        assert!(!alert.contains("confidence"));
    }
}
