//! The completion signal: settled once, with every result or the first fatal failure.

use std::fmt;
use std::future::{Future, IntoFuture};
use std::pin::Pin;

use tokio::sync::watch;

use crate::report::JobReport;

const JOB_FAILED_MESSAGE: &str = "job failed";

/// Rejection payload: a job exhausted its retry budget.
#[derive(Debug, Clone)]
pub struct JobFailed<T, E> {
    /// Index of the job whose budget ran out.
    pub failed_job_index: usize,
    /// Every report as it was when the failure was recorded. Jobs still in
    /// flight at that moment show up as `Running`.
    pub reports: Vec<JobReport<T, E>>,
}

impl<T, E> JobFailed<T, E> {
    pub fn message(&self) -> &'static str {
        JOB_FAILED_MESSAGE
    }
}

impl<T, E> fmt::Display for JobFailed<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (job {})", JOB_FAILED_MESSAGE, self.failed_job_index)
    }
}

impl<T: fmt::Debug, E: fmt::Debug> std::error::Error for JobFailed<T, E> {}

/// Why the completion signal did not resolve with results.
#[derive(Debug, Clone)]
pub enum CompletionError<T, E> {
    /// A job exhausted its retries.
    JobFailed(JobFailed<T, E>),
    /// The scheduler shut down before the signal settled (every handle was
    /// dropped while nothing was left to run).
    Abandoned,
}

impl<T, E> CompletionError<T, E> {
    pub fn failed_job_index(&self) -> Option<usize> {
        match self {
            CompletionError::JobFailed(failed) => Some(failed.failed_job_index),
            CompletionError::Abandoned => None,
        }
    }
}

impl<T, E> fmt::Display for CompletionError<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionError::JobFailed(failed) => write!(f, "{}", failed),
            CompletionError::Abandoned => write!(f, "scheduler dropped before completion"),
        }
    }
}

impl<T: fmt::Debug, E: fmt::Debug> std::error::Error for CompletionError<T, E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

type Outcome<T, E> = Result<Vec<T>, JobFailed<T, E>>;
type Slot<T, E> = Option<Outcome<T, E>>;

/// Driver side of the signal. Settles at most once.
pub(crate) struct CompletionSender<T, E> {
    tx: watch::Sender<Slot<T, E>>,
}

impl<T, E> CompletionSender<T, E> {
    pub(crate) fn channel() -> (Self, Completion<T, E>) {
        let (tx, rx) = watch::channel(None);
        (Self { tx }, Completion { rx })
    }

    pub(crate) fn is_settled(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Returns false if the signal had already settled.
    pub(crate) fn resolve(&self, results: Vec<T>) -> bool {
        self.settle(Ok(results))
    }

    /// Returns false if the signal had already settled.
    pub(crate) fn reject(&self, failed: JobFailed<T, E>) -> bool {
        self.settle(Err(failed))
    }

    fn settle(&self, outcome: Outcome<T, E>) -> bool {
        self.tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(outcome);
            true
        })
    }
}

/// Handle to the scheduler's single completion signal.
///
/// Cloning is cheap; every clone observes the same outcome. Await it directly
/// (it implements [`IntoFuture`]) or call [`Completion::wait`].
#[derive(Debug, Clone)]
pub struct Completion<T, E> {
    rx: watch::Receiver<Slot<T, E>>,
}

impl<T: Clone, E: Clone> Completion<T, E> {
    pub fn is_settled(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// The outcome if the signal has already settled.
    pub fn try_outcome(&self) -> Option<Result<Vec<T>, CompletionError<T, E>>> {
        let slot = self.rx.borrow().clone();
        slot.map(|outcome| outcome.map_err(CompletionError::JobFailed))
    }

    /// Waits for the signal to settle.
    pub async fn wait(mut self) -> Result<Vec<T>, CompletionError<T, E>> {
        let slot = match self.rx.wait_for(Option::is_some).await {
            Ok(slot) => slot.clone(),
            Err(_) => None,
        };
        match slot {
            Some(outcome) => outcome.map_err(CompletionError::JobFailed),
            None => Err(CompletionError::Abandoned),
        }
    }
}

impl<T, E> IntoFuture for Completion<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    type Output = Result<Vec<T>, CompletionError<T, E>>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.wait())
    }
}
