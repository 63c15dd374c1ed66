//! Aegis Policy
//!
//! Pure decision functions applied by the workflow stages. Nothing in this
//! crate performs I/O or touches the store.
//!
//! The policy provides:
//! - Triage: the archive short-circuit for clearly benign claims
//! - The Escalation Evaluator: whether a claim needs the expert path
//! - The Fusion Resolver: a verdict from scores and evidence alone
//!
//! # Examples
//!
//! ```
//! use aegis_policy::{EscalationEvaluator, FusionResolver, PolicyConfig, Triage, TriageDecision};
//!
//! let config = PolicyConfig::default();
//! let triage = Triage::new(config.clone());
//! assert_eq!(triage.decide(0.1, 0.9), TriageDecision::Archive);
//!
//! let evaluator = EscalationEvaluator::new(config.clone());
//! assert!(!evaluator.evaluate(0.9, 0.1, None).should_escalate());
//!
//! let resolver = FusionResolver::new(config);
//! let verdict = resolver.resolve(0.5, 0.5, None);
//! assert!(!verdict.explanation.is_empty());
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod evaluator;
mod resolver;
mod triage;

pub use config::PolicyConfig;
pub use error::PolicyError;
pub use evaluator::{EscalationAssessment, EscalationDecision, EscalationEvaluator};
pub use resolver::{FusionResolver, FusionRule, FusionVerdict};
pub use triage::{Triage, TriageDecision};
