//! Show command implementation.

use crate::cli::ShowArgs;
use crate::config::AegisConfig;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::wiring;
use aegis_domain::traits::ClaimStore;
use aegis_domain::ClaimId;

/// Execute the show command.
pub fn execute_show(args: ShowArgs, config: &AegisConfig, formatter: &Formatter) -> Result<()> {
    let id = ClaimId::from_string(args.id.trim()).map_err(CliError::InvalidInput)?;
    let store = wiring::open_store(config)?;

    let claim = store
        .get_claim(id)?
        .ok_or_else(|| CliError::NotFound(id.to_string()))?;
    let record = store.get_record(id)?;

    println!("{}", formatter.format_claim_detail(&claim, record.as_ref())?);
    Ok(())
}
