//! Cycle and run command implementations.

use crate::cli::{CycleArgs, RunArgs};
use crate::config::AegisConfig;
use crate::error::Result;
use crate::output::Formatter;
use crate::wiring;
use aegis_workflow::WorkflowWorker;
use std::sync::Arc;

/// Execute the cycle command.
pub async fn execute_cycle(args: CycleArgs, config: &AegisConfig, formatter: &Formatter) -> Result<()> {
    let engine = wiring::engine(config)?;

    match args.stage {
        Some(stage) => {
            let report = engine.run_stage(stage.into()).await?;
            println!("{}", formatter.format_stage(&report)?);
        }
        None => {
            let report = engine.run_cycle().await?;
            println!("{}", formatter.format_cycle(&report)?);
        }
    }
    Ok(())
}

/// Execute the run command.
pub async fn execute_run(args: RunArgs, config: &AegisConfig, formatter: &Formatter) -> Result<()> {
    let mut config = config.clone();
    if let Some(interval) = args.interval {
        config.workflow.cycle_interval_secs = interval;
    }

    let worker = WorkflowWorker::new(Arc::new(wiring::engine(&config)?));
    match args.cycles {
        Some(cycles) => worker.run_cycles(cycles).await?,
        None => worker.run().await?,
    }

    println!("{}", formatter.info(&worker.metrics().summary()));
    Ok(())
}
