//! Aegis CLI - Command-line interface for the Aegis claim verification workflow.

use aegis_cli::commands;
use aegis_cli::{AegisConfig, Cli, Command, Formatter};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> aegis_cli::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable
    let filter = EnvFilter::try_from_env("AEGIS_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_ref().map(PathBuf::from);
    let mut config = AegisConfig::load(config_path.as_deref())?;
    if let Some(database) = cli.database {
        config.store.path = Some(database);
    }

    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Submit(args) => commands::execute_submit(args, &config, &formatter)?,
        Command::Cycle(args) => commands::execute_cycle(args, &config, &formatter).await?,
        Command::Run(args) => commands::execute_run(args, &config, &formatter).await?,
        Command::List(args) => commands::execute_list(args, &config, &formatter)?,
        Command::Show(args) => commands::execute_show(args, &config, &formatter)?,
        Command::Stats => commands::execute_stats(&config, &formatter)?,
        Command::Config(args) => {
            commands::execute_config(args, &config, config_path.as_deref(), &formatter)?
        }
    }

    Ok(())
}
