//! Config command implementation.

use crate::cli::{ConfigAction, ConfigArgs, PresetArg};
use crate::config::AegisConfig;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use aegis_policy::PolicyConfig;
use aegis_workflow::WorkflowConfig;
use std::path::Path;

/// Execute the config command.
///
/// `path` is the file named with `--config`, if any.
pub fn execute_config(
    args: ConfigArgs,
    config: &AegisConfig,
    path: Option<&Path>,
    formatter: &Formatter,
) -> Result<()> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => AegisConfig::default_path()?,
    };

    match args.action {
        ConfigAction::Show => {
            println!("{}", config.to_toml()?);
        }
        ConfigAction::Path => {
            println!("{}", path.display());
        }
        ConfigAction::Init { preset, force } => {
            if path.exists() && !force {
                return Err(CliError::InvalidInput(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                )));
            }
            preset_config(preset).save(&path)?;
            println!("{}", formatter.success(&format!("Wrote {}", path.display())));
        }
    }
    Ok(())
}

fn preset_config(preset: PresetArg) -> AegisConfig {
    let (workflow, policy) = match preset {
        PresetArg::Default => (WorkflowConfig::default(), PolicyConfig::default()),
        PresetArg::Aggressive => (WorkflowConfig::aggressive(), PolicyConfig::strict()),
        PresetArg::Lenient => (WorkflowConfig::lenient(), PolicyConfig::permissive()),
    };
    AegisConfig {
        workflow,
        policy,
        ..Default::default()
    }
}
