//! Stats command implementation.

use crate::config::AegisConfig;
use crate::error::Result;
use crate::output::Formatter;
use crate::wiring;
use aegis_domain::traits::ClaimStore;

/// Execute the stats command.
pub fn execute_stats(config: &AegisConfig, formatter: &Formatter) -> Result<()> {
    let store = wiring::open_store(config)?;
    let counts = store.count_by_status()?;
    println!("{}", formatter.format_stats(&counts)?);
    Ok(())
}
