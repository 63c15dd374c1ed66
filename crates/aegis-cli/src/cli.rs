//! CLI command definitions and argument parsing.

use aegis_domain::ClaimStatus;
use aegis_workflow::Stage;
use clap::{Parser, Subcommand};

/// Aegis CLI - Verify claims through scoring, evidence, and expert review.
#[derive(Debug, Parser)]
#[command(name = "aegis")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "AEGIS_CONFIG")]
    pub config: Option<String>,

    /// Database path (overrides [store] path)
    #[arg(short, long, global = true, env = "AEGIS_DB")]
    pub database: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Submit a claim for verification
    Submit(SubmitArgs),

    /// Run one workflow cycle (or a single stage)
    Cycle(CycleArgs),

    /// Run the workflow worker continuously
    Run(RunArgs),

    /// List claims or verified records
    List(ListArgs),

    /// Show one claim and its verified record
    Show(ShowArgs),

    /// Show claim counts by status
    Stats,

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for the submit command.
#[derive(Debug, Parser)]
pub struct SubmitArgs {
    /// Claim text
    pub text: String,

    /// Source metadata as a JSON object
    #[arg(short, long)]
    pub metadata: Option<String>,

    /// Source handle (merged into the metadata)
    #[arg(long)]
    pub handle: Option<String>,
}

/// Arguments for the cycle command.
#[derive(Debug, Parser)]
pub struct CycleArgs {
    /// Run only this stage
    #[arg(short, long, value_enum)]
    pub stage: Option<StageArg>,
}

/// Arguments for the run command.
#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Stop after this many cycles
    #[arg(short = 'n', long)]
    pub cycles: Option<usize>,

    /// Seconds between cycles (overrides [workflow] cycle_interval_secs)
    #[arg(short, long)]
    pub interval: Option<u64>,
}

/// Arguments for the list command.
#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Filter by status
    #[arg(short, long, value_enum)]
    pub status: Option<StatusArg>,

    /// Maximum number of results
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// List verified records instead of claims
    #[arg(short, long)]
    pub records: bool,
}

/// Arguments for the show command.
#[derive(Debug, Parser)]
pub struct ShowArgs {
    /// Claim ID
    pub id: String,
}

/// Arguments for configuration management.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Print the configuration file path
    Path,

    /// Write a configuration file
    Init {
        /// Workflow preset
        #[arg(short, long, value_enum, default_value = "default")]
        preset: PresetArg,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Workflow stage argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum StageArg {
    /// `new` → `scored`
    Score,
    /// `scored` → `archived` | `fused-pending`
    Triage,
    /// `fused-pending` → `resolved` | `escalated`
    Decide,
    /// `escalated` → `resolved` | `failed`
    Escalate,
}

/// Claim status argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum StatusArg {
    /// Awaiting scores
    New,
    /// Scored, awaiting triage
    Scored,
    /// Evidence attached, awaiting a decision
    FusedPending,
    /// Dismissed as benign
    Archived,
    /// Awaiting expert review
    Escalated,
    /// Verified
    Resolved,
    /// Expert review failed
    Failed,
}

/// Configuration preset argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum PresetArg {
    /// Balanced defaults
    Default,
    /// Short cycles, wide batches, strict thresholds
    Aggressive,
    /// Long cycles, narrow batches, permissive thresholds
    Lenient,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<StageArg> for Stage {
    fn from(stage: StageArg) -> Self {
        match stage {
            StageArg::Score => Stage::Score,
            StageArg::Triage => Stage::Triage,
            StageArg::Decide => Stage::Decide,
            StageArg::Escalate => Stage::Escalate,
        }
    }
}

impl From<StatusArg> for ClaimStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::New => ClaimStatus::New,
            StatusArg::Scored => ClaimStatus::Scored,
            StatusArg::FusedPending => ClaimStatus::FusedPending,
            StatusArg::Archived => ClaimStatus::Archived,
            StatusArg::Escalated => ClaimStatus::Escalated,
            StatusArg::Resolved => ClaimStatus::Resolved,
            StatusArg::Failed => ClaimStatus::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_command() {
        let cli = Cli::parse_from(["aegis", "submit", "The moon is cheese", "--handle", "@anon"]);
        match cli.command {
            Command::Submit(args) => {
                assert_eq!(args.text, "The moon is cheese");
                assert_eq!(args.handle.as_deref(), Some("@anon"));
            }
            _ => panic!("Expected Submit command"),
        }
    }

    #[test]
    fn test_list_status_is_kebab_case() {
        let cli = Cli::parse_from(["aegis", "list", "--status", "fused-pending", "-l", "5"]);
        match cli.command {
            Command::List(args) => {
                let status: ClaimStatus = args.status.unwrap().into();
                assert_eq!(status, ClaimStatus::FusedPending);
                assert_eq!(args.limit, Some(5));
            }
            _ => panic!("Expected List command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["aegis", "cycle", "--stage", "decide", "--format", "json", "-d", "x.db"]);
        assert!(matches!(cli.format, Some(CliFormat::Json)));
        assert_eq!(cli.database.as_deref(), Some("x.db"));
        match cli.command {
            Command::Cycle(args) => assert_eq!(Stage::from(args.stage.unwrap()), Stage::Decide),
            _ => panic!("Expected Cycle command"),
        }
    }

    #[test]
    fn test_missing_subcommand_is_an_error() {
        assert!(Cli::try_parse_from(["aegis"]).is_err());
    }
}
