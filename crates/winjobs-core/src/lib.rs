pub mod config;
pub mod control;
pub mod logging;

pub mod report;
pub mod retry;
pub mod scheduler;

pub use config::SchedulerConfig;
pub use report::{JobError, JobReport, JobStatus};
pub use retry::RetryPolicy;
pub use scheduler::{
    job, BuildError, Completion, CompletionError, Job, JobFailed, JobObserver, LifecycleError,
    ProgressStats, SchedulerStatus, SlidingWindowJobs, Snapshot,
};
