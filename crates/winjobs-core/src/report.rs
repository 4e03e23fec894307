//! Per-job reports: status, attempt count and the latest outcome.
//!
//! One report exists for every job from construction onwards. Only the
//! scheduler driver mutates them; callers see clones through snapshots and
//! the failure payload.

use std::fmt;

/// Status of a single job. Distinct from the scheduler's own status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Init,
    Running,
    Success,
    Fail,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Init => "init",
            JobStatus::Running => "running",
            JobStatus::Success => "success",
            JobStatus::Fail => "fail",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a single attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobError<E> {
    /// The job's future resolved to `Err`.
    Failed(E),
    /// The job's task panicked; holds the panic message when it was a string.
    Panicked(String),
}

impl<E> JobError<E> {
    /// The job's own error, if the attempt did not panic.
    pub fn as_failed(&self) -> Option<&E> {
        match self {
            JobError::Failed(e) => Some(e),
            JobError::Panicked(_) => None,
        }
    }
}

impl<E: fmt::Display> fmt::Display for JobError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobError::Failed(e) => write!(f, "{}", e),
            JobError::Panicked(msg) => write!(f, "job panicked: {}", msg),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for JobError<E> {}

/// Status plus the payload that goes with it, so a result exists only on
/// success and an error only on failure.
#[derive(Debug, Clone)]
enum JobState<T, E> {
    Init,
    Running,
    Success(T),
    Fail(JobError<E>),
}

/// Record of one job, identified by its position in the input.
#[derive(Debug, Clone)]
pub struct JobReport<T, E> {
    index: usize,
    tried: u32,
    state: JobState<T, E>,
}

impl<T, E> JobReport<T, E> {
    fn new(index: usize) -> Self {
        Self {
            index,
            tried: 0,
            state: JobState::Init,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Completed attempts, successful or not.
    pub fn tried(&self) -> u32 {
        self.tried
    }

    pub fn status(&self) -> JobStatus {
        match self.state {
            JobState::Init => JobStatus::Init,
            JobState::Running => JobStatus::Running,
            JobState::Success(_) => JobStatus::Success,
            JobState::Fail(_) => JobStatus::Fail,
        }
    }

    pub fn result(&self) -> Option<&T> {
        match &self.state {
            JobState::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&JobError<E>> {
        match &self.state {
            JobState::Fail(err) => Some(err),
            _ => None,
        }
    }
}

/// Reports for every job, indexed by job position.
#[derive(Debug)]
pub struct ReportStore<T, E> {
    reports: Vec<JobReport<T, E>>,
}

impl<T, E> ReportStore<T, E> {
    pub fn new(len: usize) -> Self {
        Self {
            reports: (0..len).map(JobReport::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&JobReport<T, E>> {
        self.reports.get(index)
    }

    pub fn as_slice(&self) -> &[JobReport<T, E>] {
        &self.reports
    }

    pub fn mark_running(&mut self, index: usize) {
        self.reports[index].state = JobState::Running;
    }

    /// Stores a successful outcome and returns a reference to it for observers.
    pub fn record_success(&mut self, index: usize, value: T) -> &T {
        let report = &mut self.reports[index];
        report.state = JobState::Success(value);
        match &report.state {
            JobState::Success(value) => value,
            _ => unreachable!("state was just set to Success"),
        }
    }

    /// Stores a failed outcome and returns a reference to it for observers.
    pub fn record_failure(&mut self, index: usize, err: JobError<E>) -> &JobError<E> {
        let report = &mut self.reports[index];
        report.state = JobState::Fail(err);
        match &report.state {
            JobState::Fail(err) => err,
            _ => unreachable!("state was just set to Fail"),
        }
    }

    /// Counts one completed attempt; returns the new total.
    pub fn record_attempt(&mut self, index: usize) -> u32 {
        let report = &mut self.reports[index];
        report.tried += 1;
        report.tried
    }
}

impl<T: Clone, E: Clone> ReportStore<T, E> {
    pub fn snapshot(&self) -> Vec<JobReport<T, E>> {
        self.reports.clone()
    }

    /// All results in index order, or `None` while any job has not succeeded.
    pub fn results(&self) -> Option<Vec<T>> {
        self.reports
            .iter()
            .map(|report| report.result().cloned())
            .collect()
    }
}
