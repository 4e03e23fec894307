//! CLI for the winjobs sliding-window scheduler.

mod commands;
mod control_socket;
mod plan;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use winjobs_core::config::{self, SchedulerConfig};
use winjobs_core::control::ControlCommand;

use commands::{run_config, run_control, run_plan, RunOptions};

/// Top-level CLI for winjobs.
#[derive(Debug, Parser)]
#[command(name = "winjobs")]
#[command(about = "winjobs: run job plans through a sliding window with retries", long_about = None)]
pub struct Cli {
    /// Read scheduler settings from this file instead of ~/.config/winjobs/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run every job in a plan file and print the results in plan order.
    Run {
        /// Path to the TOML job plan.
        plan: PathBuf,
        /// Jobs considered per batch (overrides config and plan).
        #[arg(long, value_name = "N")]
        window: Option<usize>,
        /// Retries per job after its first failure (overrides config and plan).
        #[arg(long, value_name = "N")]
        retry: Option<u32>,
        /// Print the results as a JSON array.
        #[arg(long)]
        json: bool,
    },

    /// Pause the active `winjobs run`; running jobs finish, no new ones start.
    Pause,

    /// Resume a paused `winjobs run`.
    Resume,

    /// Stop the active `winjobs run` after its running jobs finish.
    Stop,

    /// Show the config file path and the effective scheduler settings.
    Config,
}

fn load_config(path: Option<&PathBuf>) -> Result<SchedulerConfig> {
    match path {
        Some(path) => config::load_from_path(path),
        None => config::load_or_init(),
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Run {
                plan,
                window,
                retry,
                json,
            } => {
                let cfg = load_config(cli.config.as_ref())?;
                tracing::debug!("loaded config: {:?}", cfg);
                let opts = RunOptions {
                    window,
                    retry,
                    json,
                };
                run_plan(&plan, cfg, opts).await?;
            }
            CliCommand::Pause => run_control(ControlCommand::Pause).await?,
            CliCommand::Resume => run_control(ControlCommand::Resume).await?,
            CliCommand::Stop => run_control(ControlCommand::Stop).await?,
            CliCommand::Config => {
                let cfg = load_config(cli.config.as_ref())?;
                run_config(cli.config.as_deref(), &cfg)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
