//! Command implementations.

pub mod config;
pub mod cycle;
pub mod list;
pub mod show;
pub mod stats;
pub mod submit;

pub use self::config::execute_config;
pub use self::cycle::{execute_cycle, execute_run};
pub use self::list::execute_list;
pub use self::show::execute_show;
pub use self::stats::execute_stats;
pub use self::submit::execute_submit;
