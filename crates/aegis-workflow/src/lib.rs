//! Aegis Workflow
//!
//! Drives claims through the verification lifecycle as a sequence of
//! store-backed stage passes.
//!
//! # Overview
//!
//! Each cycle runs four passes in order:
//!
//! | Stage | Input status | Outcomes |
//! |-------|--------------|----------|
//! | **Score** | `new` | `scored` |
//! | **Triage** | `scored` | `archived`, or `fused-pending` with evidence attached |
//! | **Decide** | `fused-pending` | `resolved` by fusion, or `escalated` |
//! | **Escalate** | `failed` (requeue), then `escalated` | `resolved` by the expert, or `failed` |
//!
//! Every pass leases its batch, so several engines may share one database
//! without double-processing a claim. Each claim's transition is committed
//! on its own; a provider failure leaves that claim in place and never
//! touches its siblings. Resolutions write a verified record in the same
//! commit and emit a [`VerificationEvent`](aegis_domain::VerificationEvent)
//! to the configured notifier.
//!
//! # Usage
//!
//! ## One-time Cycle
//!
//! ```no_run
//! use aegis_workflow::{LogNotifier, Providers, WorkflowConfig, WorkflowEngine};
//! use aegis_policy::PolicyConfig;
//! use aegis_providers::{MockEvidence, MockExpert, MockScorer};
//! use aegis_domain::Verdict;
//! use aegis_store::SqliteStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let scorer = Arc::new(MockScorer::new(0.5));
//! let providers = Providers {
//!     suspicion: scorer.clone(),
//!     credibility: scorer,
//!     evidence: Arc::new(MockEvidence::default()),
//!     expert: Arc::new(MockExpert::new(Verdict::Misleading, "Unclear")),
//!     notifier: Arc::new(LogNotifier),
//! };
//! let engine = WorkflowEngine::new(
//!     SqliteStore::new("aegis.db")?,
//!     providers,
//!     WorkflowConfig::default(),
//!     PolicyConfig::default(),
//! )?;
//!
//! let report = engine.run_cycle().await?;
//! println!("{}", engine.metrics().summary());
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration Presets
//!
//! ```
//! use aegis_workflow::WorkflowConfig;
//!
//! // Default: one cycle a minute, 100-claim batches
//! let config = WorkflowConfig::default();
//!
//! // Aggressive: short cycles and wide batches
//! let config = WorkflowConfig::aggressive();
//!
//! // Lenient: long cycles and a larger retry budget
//! let config = WorkflowConfig::lenient();
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [workflow]
//! cycle_interval_secs = 60
//! cycle_timeout_secs = 600
//! provider_timeout_secs = 30
//! expert_timeout_secs = 120
//! max_retries = 3
//! batch_size = 100
//! max_concurrency = 8
//! lease_secs = 900
//! ```

#![warn(missing_docs)]

mod config;
mod engine;
mod error;
mod escalation;
mod metrics;
mod notify;
mod worker;

#[cfg(test)]
mod tests;

pub use config::WorkflowConfig;
pub use engine::{CycleReport, Providers, Stage, StageReport, WorkflowEngine};
pub use error::WorkflowError;
pub use escalation::{EscalationHandler, EscalationOutcome};
pub use metrics::WorkflowMetrics;
pub use notify::{ChannelNotifier, LogNotifier, NullNotifier};
pub use worker::WorkflowWorker;
