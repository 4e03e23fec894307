//! Public scheduler handle: construction and lifecycle controls.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};

use crate::config::{ConfigError, SchedulerConfig};
use crate::retry::RetryPolicy;

use super::completion::{Completion, CompletionSender};
use super::driver::{Command, Driver};
use super::job::{Job, JobObserver};
use super::progress::Snapshot;
use super::status::{start_transition, LifecycleError, SchedulerStatus, StartTransition};

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("scheduler must be built inside a Tokio runtime")]
    NoRuntime,
}

/// The driver task has exited: every handle was dropped with no job in
/// flight, or an observer callback panicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("scheduler driver has shut down")]
pub struct DriverGone;

/// Collects jobs, limits and the optional observer before spawning the driver.
pub struct Builder<T, E> {
    jobs: Vec<Job<T, E>>,
    config: SchedulerConfig,
    observer: Option<Arc<dyn JobObserver<T, E>>>,
}

impl<T, E> Builder<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn window_size(mut self, window_size: usize) -> Self {
        self.config.window_size = window_size;
        self
    }

    pub fn retry(mut self, retry: u32) -> Self {
        self.config.retry = retry;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn JobObserver<T, E>>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Validates the limits and spawns the driver on the current Tokio runtime.
    pub fn build(self) -> Result<SlidingWindowJobs<T, E>, BuildError> {
        self.config.validate()?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| BuildError::NoRuntime)?;

        let (status_tx, _) = watch::channel(SchedulerStatus::Init);
        let status = Arc::new(status_tx);
        let (completion_tx, completion) = CompletionSender::channel();
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let len = self.jobs.len();

        let driver = Driver::new(
            self.jobs,
            self.config.window_size,
            RetryPolicy::new(self.config.retry),
            self.observer,
            Arc::clone(&status),
            completion_tx,
            commands_rx,
        );
        runtime.spawn(driver.run());
        tracing::debug!(
            jobs = len,
            window_size = self.config.window_size,
            retry = self.config.retry,
            "scheduler created"
        );

        Ok(SlidingWindowJobs {
            status,
            commands: commands_tx,
            completion,
            config: self.config,
            len,
        })
    }
}

/// Runs jobs through a sliding window of limited width, retrying failures,
/// and resolves one [`Completion`] with every result in input order.
///
/// Cloning yields another handle to the same scheduler. The driver keeps
/// running in-flight work after the last handle is dropped.
pub struct SlidingWindowJobs<T, E> {
    status: Arc<watch::Sender<SchedulerStatus>>,
    commands: mpsc::UnboundedSender<Command<T, E>>,
    completion: Completion<T, E>,
    config: SchedulerConfig,
    len: usize,
}

impl<T, E> Clone for SlidingWindowJobs<T, E>
where
    T: Clone,
    E: Clone,
{
    fn clone(&self) -> Self {
        Self {
            status: Arc::clone(&self.status),
            commands: self.commands.clone(),
            completion: self.completion.clone(),
            config: self.config,
            len: self.len,
        }
    }
}

impl<T, E> SlidingWindowJobs<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn builder(jobs: Vec<Job<T, E>>) -> Builder<T, E> {
        Builder {
            jobs,
            config: SchedulerConfig::default(),
            observer: None,
        }
    }

    /// Starts (or continues after `pause()`) scheduling and returns the completion signal.
    ///
    /// Calling it while already running only returns the signal. After the
    /// scheduler failed, was stopped or finished, returns an error and
    /// changes nothing.
    pub fn start(&self) -> Result<Completion<T, E>, LifecycleError> {
        let mut transition = Ok(StartTransition::AlreadyRunning);
        self.status.send_if_modified(|status| {
            transition = start_transition(*status);
            if transition == Ok(StartTransition::Begin) {
                *status = SchedulerStatus::Running;
                true
            } else {
                false
            }
        });

        match transition {
            Ok(StartTransition::Begin) => {
                tracing::info!(jobs = self.len, "scheduler started");
                self.kick();
            }
            Ok(StartTransition::AlreadyRunning) => {}
            Err(e) => {
                tracing::warn!("start rejected: {}", e);
                return Err(e);
            }
        }
        Ok(self.completion.clone())
    }

    /// Stops launching new batches. In-flight jobs still finish.
    pub fn stop(&self) {
        self.status.send_replace(SchedulerStatus::Stopped);
        tracing::info!("scheduler stopped");
    }

    /// Holds new batches until `resume()`. In-flight jobs still finish.
    pub fn pause(&self) {
        self.status.send_replace(SchedulerStatus::Paused);
        tracing::info!("scheduler paused");
    }

    /// Sets the status to running from any state and runs the work loop.
    pub fn resume(&self) {
        self.status.send_replace(SchedulerStatus::Running);
        tracing::info!("scheduler resumed");
        self.kick();
    }

    pub fn status(&self) -> SchedulerStatus {
        *self.status.borrow()
    }

    /// Receiver notified on every status change.
    pub fn subscribe_status(&self) -> watch::Receiver<SchedulerStatus> {
        self.status.subscribe()
    }

    /// The completion signal, whatever the current status.
    pub fn completion(&self) -> Completion<T, E> {
        self.completion.clone()
    }

    /// Reports, cursor and status as seen between two completion handlers.
    pub async fn snapshot(&self) -> Result<Snapshot<T, E>, DriverGone> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Snapshot(tx))
            .map_err(|_| DriverGone)?;
        rx.await.map_err(|_| DriverGone)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn config(&self) -> SchedulerConfig {
        self.config
    }

    fn kick(&self) {
        if self.commands.send(Command::Kick).is_err() {
            tracing::warn!("scheduler driver has shut down; kick dropped");
        }
    }
}
