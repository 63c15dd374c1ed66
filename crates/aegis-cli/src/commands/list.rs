//! List command implementation.

use crate::cli::ListArgs;
use crate::config::AegisConfig;
use crate::error::Result;
use crate::output::Formatter;
use crate::wiring;
use aegis_domain::traits::{ClaimQuery, ClaimStore};

/// Execute the list command.
pub fn execute_list(args: ListArgs, config: &AegisConfig, formatter: &Formatter) -> Result<()> {
    let store = wiring::open_store(config)?;

    if args.records {
        let records = store.list_records(args.limit)?;
        println!("{}", formatter.format_records(&records)?);
        return Ok(());
    }

    let query = ClaimQuery {
        status: args.status.map(Into::into),
        max_retry_count: None,
        limit: args.limit,
    };
    let claims = store.query_claims(&query)?;
    println!("{}", formatter.format_claims(&claims)?);
    Ok(())
}
