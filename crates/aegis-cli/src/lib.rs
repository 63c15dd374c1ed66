//! Aegis CLI library.
//!
//! Configuration loading, provider wiring, command execution, and output
//! formatting for the `aegis` command-line tool.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod wiring;

pub use cli::{Cli, Command};
pub use config::AegisConfig;
pub use error::{CliError, Result};
pub use output::Formatter;
