//! Metrics collection for workflow cycles

use crate::StageReport;
use aegis_domain::ClaimStatus;
use std::collections::BTreeMap;

/// Metrics accumulated across workflow cycles
///
/// Tracks transitions per target status, claims left in place, and expert
/// usage.
#[derive(Debug, Clone, Default)]
pub struct WorkflowMetrics {
    /// Committed transitions, by the status the claim moved to
    pub transitions: BTreeMap<ClaimStatus, usize>,

    /// Claims left in place for a later cycle (transient failures)
    pub deferred: usize,

    /// Claims parked after a permanent failure
    pub parked: usize,

    /// Commits lost to a concurrent writer
    pub conflicts: usize,

    /// Verified records written
    pub records: usize,

    /// Failed claims put back on the expert path
    pub requeued: usize,

    /// Escalated claims skipped with no retry budget left
    pub exhausted: usize,

    /// Expert adjudications requested
    pub expert_attempts: usize,

    /// Expert adjudications that failed
    pub expert_failures: usize,

    /// Total cycles completed
    pub cycle_count: usize,

    /// Cycles cut short by the cycle timeout
    pub timed_out_cycles: usize,

    /// Total runtime in milliseconds
    pub total_runtime_ms: u64,
}

impl WorkflowMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a committed transition
    pub fn record_transition(&mut self, to: ClaimStatus) {
        *self.transitions.entry(to).or_insert(0) += 1;
    }

    /// Fold a stage report into the totals
    pub fn record_stage(&mut self, report: &StageReport) {
        for (status, count) in &report.transitions {
            *self.transitions.entry(*status).or_insert(0) += count;
        }
        self.deferred += report.deferred;
        self.parked += report.parked;
        self.conflicts += report.conflicts;
        self.records += report.records;
        self.requeued += report.requeued;
        self.exhausted += report.exhausted;
        self.expert_attempts += report.expert_attempts;
        self.expert_failures += report.expert_failures;
    }

    /// Record expert calls cut off by the cycle timeout and committed as failures
    pub fn record_interrupted_expert_calls(&mut self, count: usize) {
        *self.transitions.entry(ClaimStatus::Failed).or_insert(0) += count;
        self.expert_attempts += count;
        self.expert_failures += count;
    }

    /// Record a cycle completion
    pub fn record_cycle(&mut self, runtime_ms: u64, timed_out: bool) {
        self.cycle_count += 1;
        self.total_runtime_ms += runtime_ms;
        if timed_out {
            self.timed_out_cycles += 1;
        }
    }

    /// Get total committed transitions
    pub fn total_transitions(&self) -> usize {
        self.transitions.values().sum()
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Workflow Metrics Summary".to_string(),
            "========================".to_string(),
            format!("Cycles: {} ({} timed out)", self.cycle_count, self.timed_out_cycles),
            format!("Total runtime: {}ms", self.total_runtime_ms),
            String::new(),
        ];

        if !self.transitions.is_empty() {
            lines.push("Transitions into:".to_string());
            for (status, count) in &self.transitions {
                lines.push(format!("  {}: {}", status, count));
            }
            lines.push(format!("  Total: {}", self.total_transitions()));
            lines.push(String::new());
        }

        lines.push(format!("Verified records: {}", self.records));
        lines.push(format!(
            "Expert attempts: {} ({} failed, {} requeued, {} exhausted)",
            self.expert_attempts, self.expert_failures, self.requeued, self.exhausted
        ));
        lines.push(format!(
            "Deferred: {}  Parked: {}  Conflicts: {}",
            self.deferred, self.parked, self.conflicts
        ));

        lines.join("\n")
    }
}
