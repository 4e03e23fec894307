//! Retry policy: which jobs may (re)run and when a failure becomes fatal.
//!
//! Decisions are pure functions of a report and the configured limit, so the
//! window selector and the completion handler share one definition.

use crate::report::{JobReport, JobStatus};

/// Decision for a report after one of its attempts completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// The job succeeded; nothing to retry.
    Done,
    /// The job failed but may run again.
    Retry,
    /// The job failed and its budget is spent.
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first failure.
    pub limit: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            limit: crate::config::DEFAULT_RETRY,
        }
    }
}

impl RetryPolicy {
    pub fn new(limit: u32) -> Self {
        Self { limit }
    }

    /// True iff the job has never run, or failed with budget remaining.
    /// Running and successful jobs are never eligible.
    pub fn is_eligible<T, E>(&self, report: &JobReport<T, E>) -> bool {
        match report.status() {
            JobStatus::Init => true,
            JobStatus::Fail => report.tried() <= self.limit,
            JobStatus::Running | JobStatus::Success => false,
        }
    }

    /// True iff the job is failed and has used more attempts than the limit allows.
    pub fn is_exhausted<T, E>(&self, report: &JobReport<T, E>) -> bool {
        report.status() == JobStatus::Fail && report.tried() > self.limit
    }

    pub fn decide<T, E>(&self, report: &JobReport<T, E>) -> RetryDecision {
        if self.is_exhausted(report) {
            RetryDecision::Exhausted
        } else if report.status() == JobStatus::Fail {
            RetryDecision::Retry
        } else {
            RetryDecision::Done
        }
    }
}
