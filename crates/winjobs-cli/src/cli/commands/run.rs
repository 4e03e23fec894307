//! `winjobs run` – execute a job plan through the sliding-window scheduler.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use winjobs_core::control::default_control_socket_path;
use winjobs_core::{
    CompletionError, JobError, JobObserver, JobReport, SchedulerConfig, SchedulerStatus,
    SlidingWindowJobs,
};

use crate::cli::control_socket::{self, SocketGuard};
use crate::cli::plan::Plan;

/// Flags that override the plan and config file.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub window: Option<usize>,
    pub retry: Option<u32>,
    pub json: bool,
}

impl RunOptions {
    fn apply_to(&self, base: SchedulerConfig) -> SchedulerConfig {
        SchedulerConfig {
            window_size: self.window.unwrap_or(base.window_size),
            retry: self.retry.unwrap_or(base.retry),
        }
    }
}

/// Prints one line per attempt as jobs settle.
struct ConsoleObserver {
    total: usize,
}

impl JobObserver<String, String> for ConsoleObserver {
    fn on_job_succeed(&self, index: usize, result: &String) {
        println!("  [{}/{}] ok: {}", index + 1, self.total, first_line(result));
    }

    fn on_job_fail(&self, index: usize, error: &JobError<String>) {
        println!("  [{}/{}] failed: {}", index + 1, self.total, error);
    }
}

fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or("")
}

pub async fn run_plan(plan_path: &Path, cfg: SchedulerConfig, opts: RunOptions) -> Result<()> {
    let plan = Plan::load(plan_path)?;
    let cfg = opts.apply_to(plan.apply_to(cfg));
    cfg.validate()?;
    let jobs = plan.into_jobs();
    if jobs.is_empty() {
        println!("No jobs in plan.");
        return Ok(());
    }
    let total = jobs.len();

    let scheduler = SlidingWindowJobs::builder(jobs)
        .config(cfg)
        .observer(Arc::new(ConsoleObserver { total }))
        .build()?;

    let mut socket_guard = None;
    let mut listener = None;
    if let Ok(socket_path) = default_control_socket_path() {
        match control_socket::spawn_control_listener(scheduler.clone(), &socket_path) {
            Ok(handle) => {
                tracing::debug!(path = %socket_path.display(), "control socket listening");
                listener = Some(handle);
                socket_guard = Some(SocketGuard(socket_path));
            }
            Err(e) => tracing::warn!(path = %socket_path.display(), "control socket: {:#}", e),
        }
    }

    println!(
        "Running {} job(s), window {}, retry {}",
        total, cfg.window_size, cfg.retry
    );
    let completion = scheduler.start()?;
    let status_rx = scheduler.subscribe_status();

    let outcome = tokio::select! {
        outcome = completion.wait() => Some(outcome),
        _ = wait_for_stop(status_rx) => None,
        _ = tokio::signal::ctrl_c() => {
            scheduler.stop();
            None
        }
    };

    if let Some(handle) = listener {
        handle.abort();
    }
    drop(socket_guard);

    match outcome {
        Some(Ok(results)) => {
            if opts.json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                for (index, result) in results.iter().enumerate() {
                    println!("{:<6} {}", index, result);
                }
            }
            tracing::info!("run completed {} job(s)", total);
            Ok(())
        }
        Some(Err(CompletionError::JobFailed(failed))) => {
            print_reports(&failed.reports);
            anyhow::bail!(
                "{}: job {} exhausted {} retries",
                failed.message(),
                failed.failed_job_index,
                cfg.retry
            )
        }
        Some(Err(CompletionError::Abandoned)) => anyhow::bail!("scheduler shut down unexpectedly"),
        None => {
            let snapshot = scheduler.snapshot().await?;
            print_reports(&snapshot.reports);
            let progress = snapshot.progress();
            anyhow::bail!(
                "stopped with {}/{} job(s) done, {} still running",
                progress.succeeded,
                progress.total,
                progress.running
            )
        }
    }
}

/// Resolves once the scheduler has been stopped (e.g. via `winjobs stop`).
async fn wait_for_stop(mut rx: watch::Receiver<SchedulerStatus>) {
    if rx
        .wait_for(|status| *status == SchedulerStatus::Stopped)
        .await
        .is_err()
    {
        std::future::pending::<()>().await;
    }
}

fn print_reports(reports: &[JobReport<String, String>]) {
    println!("{:<6} {:<8} {:<6} DETAIL", "INDEX", "STATUS", "TRIED");
    for report in reports {
        let detail = match (report.result(), report.error()) {
            (Some(result), _) => first_line(result).to_string(),
            (_, Some(error)) => error.to_string(),
            _ => "-".to_string(),
        };
        println!(
            "{:<6} {:<8} {:<6} {}",
            report.index(),
            report.status(),
            report.tried(),
            detail
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_base() {
        let base = SchedulerConfig {
            window_size: 5,
            retry: 2,
        };
        let opts = RunOptions {
            window: Some(1),
            retry: None,
            json: false,
        };
        assert_eq!(
            opts.apply_to(base),
            SchedulerConfig {
                window_size: 1,
                retry: 2,
            }
        );
    }

    #[test]
    fn first_line_of_multiline_output() {
        assert_eq!(first_line("a\nb"), "a");
        assert_eq!(first_line(""), "");
    }
}
