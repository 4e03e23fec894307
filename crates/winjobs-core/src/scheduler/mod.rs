//! Sliding-window scheduler.
//!
//! Launches jobs in batches drawn from a window just past the longest run of
//! finished jobs, retries failures within a budget, and settles one
//! completion signal with results in input order:
//! handle (lifecycle) → driver (work loop) → window selector → job tasks.

mod completion;
mod driver;
mod handle;
mod job;
mod progress;
mod status;
mod window;

pub use completion::{Completion, CompletionError, JobFailed};
pub use handle::{BuildError, Builder, DriverGone, SlidingWindowJobs};
pub use job::{job, Job, JobFuture, JobObserver};
pub use progress::{ProgressStats, Snapshot};
pub use status::{LifecycleError, SchedulerStatus};
pub use window::{select_next_batch, Cursor};
