//! `winjobs config` – show where settings come from and their effective values.

use anyhow::Result;
use std::path::Path;
use winjobs_core::config::{self, SchedulerConfig};

pub fn run_config(explicit: Option<&Path>, cfg: &SchedulerConfig) -> Result<()> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => config::config_path()?,
    };
    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(cfg)?);
    Ok(())
}
