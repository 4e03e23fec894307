//! Jobs and observers as the scheduler consumes them.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::report::JobError;

/// Boxed future produced by one attempt of a job.
pub type JobFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'static>>;

/// A zero-argument async operation, invoked once per attempt.
pub type Job<T, E> = Arc<dyn Fn() -> JobFuture<T, E> + Send + Sync + 'static>;

/// Wraps a closure returning a future into a [`Job`].
///
/// ```
/// use winjobs_core::{job, Job};
///
/// let fetch: Job<u32, String> = job(|| async { Ok(42) });
/// ```
pub fn job<T, E, F, Fut>(f: F) -> Job<T, E>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    Arc::new(move || Box::pin(f()) as JobFuture<T, E>)
}

/// Per-job callbacks, invoked from the scheduler's completion handler.
///
/// Every method defaults to a no-op. Calls are sequential: no two callbacks
/// run at the same time for one scheduler, and they may call back into the
/// scheduler handle (e.g. `pause()`).
pub trait JobObserver<T, E>: Send + Sync {
    fn on_job_succeed(&self, _index: usize, _result: &T) {}

    fn on_job_fail(&self, _index: usize, _error: &JobError<E>) {}

    /// Called after every attempt, after success/failure was recorded.
    fn on_job_executed(&self, _index: usize) {}
}
