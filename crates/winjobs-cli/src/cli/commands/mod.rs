//! CLI command handlers, one file per command.

mod config;
mod control;
mod run;

pub use config::run_config;
pub use control::run_control;
pub use run::{run_plan, RunOptions};
