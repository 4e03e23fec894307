//! Point-in-time views of a scheduler: reports, cursor and aggregate counts.

use crate::report::{JobReport, JobStatus};

use super::status::SchedulerStatus;

/// Consistent copy of the scheduler state, taken between two completion handlers.
#[derive(Debug, Clone)]
pub struct Snapshot<T, E> {
    pub status: SchedulerStatus,
    /// Last index of the contiguous success prefix, `None` before job 0 succeeded.
    pub cursor: Option<usize>,
    pub reports: Vec<JobReport<T, E>>,
}

impl<T, E> Snapshot<T, E> {
    pub fn progress(&self) -> ProgressStats {
        ProgressStats::from_reports(&self.reports)
    }
}

/// Job counts by status (CLI-friendly).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressStats {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub running: usize,
    /// Jobs that have never been launched.
    pub pending: usize,
    /// Completed attempts across all jobs, retries included.
    pub attempts: u64,
}

impl ProgressStats {
    pub fn from_reports<T, E>(reports: &[JobReport<T, E>]) -> Self {
        let mut stats = ProgressStats {
            total: reports.len(),
            ..Self::default()
        };
        for report in reports {
            match report.status() {
                JobStatus::Init => stats.pending += 1,
                JobStatus::Running => stats.running += 1,
                JobStatus::Success => stats.succeeded += 1,
                JobStatus::Fail => stats.failed += 1,
            }
            stats.attempts += u64::from(report.tried());
        }
        stats
    }

    /// Fraction of jobs that succeeded, in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.succeeded as f64 / self.total as f64).min(1.0)
    }

    pub fn is_complete(&self) -> bool {
        self.succeeded == self.total
    }
}
