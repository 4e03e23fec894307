//! Job plans: a TOML file listing the jobs for one `winjobs run`.
//!
//! ```toml
//! window_size = 3
//! retry = 1
//!
//! [[jobs]]
//! kind = "command"
//! program = "curl"
//! args = ["-fsS", "https://example.com/a"]
//!
//! [[jobs]]
//! kind = "sleep"
//! delay_ms = 200
//! fail_times = 1
//! output = "warmed up"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use winjobs_core::{job, Job, SchedulerConfig};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Plan {
    /// Overrides the configured window size for this plan.
    #[serde(default)]
    pub window_size: Option<usize>,
    /// Overrides the configured retry limit for this plan.
    #[serde(default)]
    pub retry: Option<u32>,
    #[serde(default)]
    pub jobs: Vec<JobSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum JobSpec {
    /// Waits, fails the first `fail_times` attempts, then yields `output`.
    Sleep {
        delay_ms: u64,
        #[serde(default)]
        fail_times: u32,
        #[serde(default)]
        output: Option<String>,
    },
    /// Runs a program; trimmed stdout on exit 0 is the result, anything else fails.
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

impl Plan {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("read plan {}", path.display()))?;
        Self::parse(&data).with_context(|| format!("parse plan {}", path.display()))
    }

    pub fn parse(data: &str) -> Result<Self> {
        Ok(toml::from_str(data)?)
    }

    /// Plan settings layered over `base`.
    pub fn apply_to(&self, base: SchedulerConfig) -> SchedulerConfig {
        SchedulerConfig {
            window_size: self.window_size.unwrap_or(base.window_size),
            retry: self.retry.unwrap_or(base.retry),
        }
    }

    pub fn into_jobs(self) -> Vec<Job<String, String>> {
        self.jobs
            .into_iter()
            .enumerate()
            .map(|(index, spec)| spec.into_job(index))
            .collect()
    }
}

impl JobSpec {
    pub fn into_job(self, index: usize) -> Job<String, String> {
        match self {
            JobSpec::Sleep {
                delay_ms,
                fail_times,
                output,
            } => {
                let output = output.unwrap_or_else(|| format!("job {} done", index));
                let attempts = Arc::new(AtomicU32::new(0));
                job(move || {
                    let attempt = attempts.fetch_add(1, Ordering::Relaxed) + 1;
                    let output = output.clone();
                    async move {
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        if attempt <= fail_times {
                            Err(format!("simulated failure {} of {}", attempt, fail_times))
                        } else {
                            Ok(output)
                        }
                    }
                })
            }
            JobSpec::Command { program, args } => job(move || {
                let program = program.clone();
                let args = args.clone();
                async move { run_command(&program, &args).await }
            }),
        }
    }
}

async fn run_command(program: &str, args: &[String]) -> Result<String, String> {
    let output = tokio::process::Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| format!("spawn {}: {}", program, e))?;
    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(format!("{} exited with {}: {}", program, output.status, stderr.trim()))
    }
}
