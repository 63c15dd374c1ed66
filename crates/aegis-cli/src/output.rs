//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use aegis_domain::{Claim, ClaimId, ClaimStatus, VerifiedRecord};
use aegis_workflow::{CycleReport, StageReport};
use colored::*;
use std::collections::BTreeMap;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self { format, color_enabled }
    }

    /// Format a list of claims.
    pub fn format_claims(&self, claims: &[Claim]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(claims)?),
            OutputFormat::Quiet => Ok(join_ids(claims.iter().map(|c| c.id))),
            OutputFormat::Table => {
                if claims.is_empty() {
                    return Ok(self.colorize("No claims found.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["ID", "Status", "Suspicion", "Credibility", "Retries", "Text"]);
                for claim in claims {
                    builder.push_record([
                        claim.id.to_string(),
                        self.status(claim.status),
                        score(claim.suspicion),
                        score(claim.credibility),
                        claim.retry_count.to_string(),
                        truncate(&claim.text, 60),
                    ]);
                }
                Ok(self.table(builder))
            }
        }
    }

    /// Format a list of verified records.
    pub fn format_records(&self, records: &[VerifiedRecord]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(records)?),
            OutputFormat::Quiet => Ok(join_ids(records.iter().map(|r| r.claim_id))),
            OutputFormat::Table => {
                if records.is_empty() {
                    return Ok(self.colorize("No verified records found.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["Claim", "Verdict", "Path", "Confidence", "Explanation"]);
                for record in records {
                    builder.push_record([
                        record.claim_id.to_string(),
                        record.verdict.to_string(),
                        record.resolution_path.to_string(),
                        score(record.confidence),
                        truncate(&record.explanation, 60),
                    ]);
                }
                Ok(self.table(builder))
            }
        }
    }

    /// Format one claim with its record, if any.
    pub fn format_claim_detail(&self, claim: &Claim, record: Option<&VerifiedRecord>) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "claim": claim,
                "record": record,
            }))?),
            OutputFormat::Quiet => Ok(claim.status.to_string()),
            OutputFormat::Table => {
                let mut lines = vec![
                    format!("Claim:       {}", claim.id),
                    format!("Status:      {}", self.status(claim.status)),
                    format!("Text:        {}", claim.text),
                    format!("Source:      {}", claim.source_metadata),
                    format!("Suspicion:   {}", score(claim.suspicion)),
                    format!("Credibility: {}", score(claim.credibility)),
                    format!("Retries:     {}", claim.retry_count),
                ];
                if let Some(evidence) = &claim.evidence {
                    lines.push(format!("Evidence:    {}", truncate(&evidence.to_string(), 120)));
                }
                if let Some(record) = record {
                    lines.push(String::new());
                    lines.push(format!("Verdict:     {}", record.verdict));
                    lines.push(format!("Resolved by: {}", record.resolution_path));
                    lines.push(format!("Confidence:  {}", score(record.confidence)));
                    lines.push(format!("Explanation: {}", record.explanation));
                }
                Ok(lines.join("\n"))
            }
        }
    }

    /// Format a cycle report.
    pub fn format_cycle(&self, report: &CycleReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let stages: Vec<_> = report.stages.iter().map(stage_json).collect();
                Ok(serde_json::to_string_pretty(&serde_json::json!({
                    "stages": stages,
                    "timed_out": report.timed_out,
                    "released_leases": report.released_leases,
                    "interrupted_expert_calls": report.interrupted_expert_calls,
                    "duration_ms": report.duration.as_millis() as u64,
                }))?)
            }
            OutputFormat::Quiet => Ok(report.total_transitions().to_string()),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Stage", "Selected", "Advanced", "Deferred", "Parked", "Conflicts", "Records"]);
                for stage in &report.stages {
                    builder.push_record(stage_row(stage));
                }
                let mut out = self.table(builder);
                out.push('\n');
                if report.timed_out {
                    out.push_str(&self.warning(&format!(
                        "Cycle timed out after {:?}; released {} leases, {} expert calls charged as failed",
                        report.duration, report.released_leases, report.interrupted_expert_calls
                    )));
                } else {
                    out.push_str(&self.success(&format!(
                        "Cycle finished in {:?}: {} transitions, {} verified records",
                        report.duration,
                        report.total_transitions(),
                        report.records()
                    )));
                }
                Ok(out)
            }
        }
    }

    /// Format a single stage report.
    pub fn format_stage(&self, report: &StageReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&stage_json(report))?),
            OutputFormat::Quiet => Ok(report.advanced().to_string()),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Stage", "Selected", "Advanced", "Deferred", "Parked", "Conflicts", "Records"]);
                builder.push_record(stage_row(report));
                Ok(self.table(builder))
            }
        }
    }

    /// Format claim counts by status.
    pub fn format_stats(&self, counts: &BTreeMap<ClaimStatus, usize>) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let map: BTreeMap<&str, usize> = ClaimStatus::ALL
                    .iter()
                    .map(|s| (s.as_str(), counts.get(s).copied().unwrap_or(0)))
                    .collect();
                Ok(serde_json::to_string_pretty(&map)?)
            }
            OutputFormat::Quiet => Ok(counts.values().sum::<usize>().to_string()),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Status", "Claims"]);
                for status in ClaimStatus::ALL {
                    builder.push_record([
                        self.status(status),
                        counts.get(&status).copied().unwrap_or(0).to_string(),
                    ]);
                }
                builder.push_record(["total".to_string(), counts.values().sum::<usize>().to_string()]);
                Ok(self.table(builder))
            }
        }
    }

    /// Format a submitted claim ID.
    pub fn claim_submitted(&self, claim_id: &ClaimId) -> String {
        match self.format {
            OutputFormat::Json => serde_json::json!({ "id": claim_id.to_string() }).to_string(),
            OutputFormat::Quiet => claim_id.to_string(),
            OutputFormat::Table => self.success(&format!("Claim submitted: {}", claim_id)),
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn status(&self, status: ClaimStatus) -> String {
        let color = match status {
            ClaimStatus::Resolved => "green",
            ClaimStatus::Failed => "red",
            ClaimStatus::Escalated => "magenta",
            ClaimStatus::Archived => "cyan",
            _ => "",
        };
        self.colorize(status.as_str(), color)
    }

    fn table(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            "magenta" => text.magenta().to_string(),
            _ => text.to_string(),
        }
    }
}

fn stage_row(stage: &StageReport) -> [String; 7] {
    [
        stage.stage.to_string(),
        stage.selected.to_string(),
        stage.advanced().to_string(),
        stage.deferred.to_string(),
        stage.parked.to_string(),
        stage.conflicts.to_string(),
        stage.records.to_string(),
    ]
}

fn stage_json(stage: &StageReport) -> serde_json::Value {
    let transitions: BTreeMap<&str, usize> = stage
        .transitions
        .iter()
        .map(|(status, count)| (status.as_str(), *count))
        .collect();
    serde_json::json!({
        "stage": stage.stage.as_str(),
        "selected": stage.selected,
        "transitions": transitions,
        "deferred": stage.deferred,
        "parked": stage.parked,
        "conflicts": stage.conflicts,
        "records": stage.records,
        "requeued": stage.requeued,
        "exhausted": stage.exhausted,
        "expert_attempts": stage.expert_attempts,
        "expert_failures": stage.expert_failures,
    })
}

fn join_ids(ids: impl Iterator<Item = ClaimId>) -> String {
    ids.map(|id| id.to_string()).collect::<Vec<_>>().join("\n")
}

fn score(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", cut)
}
