//! Execution driver: the single task that owns reports, cursor and signal.
//!
//! Job attempts run as their own tasks; their outcomes come back through a
//! `JoinSet` and control commands through a channel. Both are handled one at
//! a time here, so no two scheduling decisions ever overlap.

use std::any::Any;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinSet};

use crate::report::{JobError, ReportStore};
use crate::retry::RetryPolicy;

use super::completion::{CompletionSender, JobFailed};
use super::job::{Job, JobObserver};
use super::progress::Snapshot;
use super::status::SchedulerStatus;
use super::window::{select_next_batch, Cursor};

/// Requests from scheduler handles.
pub(crate) enum Command<T, E> {
    /// Schedule a batch on behalf of `start()` or `resume()`. The caller has
    /// already set the status to running, so the status is not rechecked.
    Kick,
    Snapshot(oneshot::Sender<Snapshot<T, E>>),
}

type Settled<T, E> = (usize, Result<T, JobError<E>>);

pub(crate) struct Driver<T, E> {
    jobs: Vec<Job<T, E>>,
    store: ReportStore<T, E>,
    cursor: Cursor,
    window_size: usize,
    policy: RetryPolicy,
    observer: Option<Arc<dyn JobObserver<T, E>>>,
    status: Arc<watch::Sender<SchedulerStatus>>,
    completion: CompletionSender<T, E>,
    commands: mpsc::UnboundedReceiver<Command<T, E>>,
    in_flight: JoinSet<Settled<T, E>>,
}

impl<T, E> Driver<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(
        jobs: Vec<Job<T, E>>,
        window_size: usize,
        policy: RetryPolicy,
        observer: Option<Arc<dyn JobObserver<T, E>>>,
        status: Arc<watch::Sender<SchedulerStatus>>,
        completion: CompletionSender<T, E>,
        commands: mpsc::UnboundedReceiver<Command<T, E>>,
    ) -> Self {
        let store = ReportStore::new(jobs.len());
        Self {
            jobs,
            store,
            cursor: Cursor::new(),
            window_size,
            policy,
            observer,
            status,
            completion,
            commands,
            in_flight: JoinSet::new(),
        }
    }

    /// Runs until every handle is gone and no attempt is in flight.
    pub(crate) async fn run(mut self) {
        let mut commands_open = true;
        loop {
            if !commands_open && self.in_flight.is_empty() {
                break;
            }
            tokio::select! {
                cmd = self.commands.recv(), if commands_open => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => commands_open = false,
                },
                Some(joined) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
                    self.on_joined(joined);
                }
                else => break,
            }
        }
        tracing::debug!(
            settled = self.completion.is_settled(),
            "scheduler driver exiting"
        );
    }

    fn handle_command(&mut self, cmd: Command<T, E>) {
        match cmd {
            Command::Kick => self.schedule(),
            Command::Snapshot(reply) => {
                let _ = reply.send(Snapshot {
                    status: *self.status.borrow(),
                    cursor: self.cursor.index(),
                    reports: self.store.snapshot(),
                });
            }
        }
    }

    fn work_loop(&mut self) {
        if *self.status.borrow() != SchedulerStatus::Running {
            return;
        }
        self.schedule();
    }

    /// Advances the cursor, resolves when every job succeeded, and launches
    /// the next batch.
    fn schedule(&mut self) {
        // Terminal once settled: nothing left to run, or failure is final.
        if self.completion.is_settled() {
            return;
        }

        if self.cursor.advance(self.store.as_slice()) > 0 {
            tracing::debug!(cursor = ?self.cursor.index(), "cursor advanced");
        }
        if self.cursor.covers(self.store.len()) {
            self.resolve();
        }

        let batch = select_next_batch(
            self.store.as_slice(),
            self.cursor,
            self.window_size,
            &self.policy,
        );
        for index in batch {
            self.launch(index);
        }
    }

    fn resolve(&mut self) {
        let Some(results) = self.store.results() else {
            return;
        };
        let count = results.len();
        if self.completion.resolve(results) {
            self.status.send_replace(SchedulerStatus::Success);
            tracing::info!(jobs = count, "all jobs succeeded");
        }
    }

    fn launch(&mut self, index: usize) {
        self.store.mark_running(index);
        let attempt = self.store.as_slice()[index].tried() + 1;
        tracing::debug!(index, attempt, "launching job");

        // The factory runs inside the task too, so a panic there is caught.
        let job = Arc::clone(&self.jobs[index]);
        self.in_flight.spawn(async move {
            let outcome = match tokio::spawn(async move { job().await }).await {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(err)) => Err(JobError::Failed(err)),
                Err(join_err) => Err(JobError::Panicked(panic_message(join_err))),
            };
            (index, outcome)
        });
    }

    fn on_joined(&mut self, joined: Result<Settled<T, E>, JoinError>) {
        match joined {
            Ok((index, outcome)) => self.on_settled(index, outcome),
            Err(e) => tracing::error!("job task join: {}", e),
        }
    }

    fn on_settled(&mut self, index: usize, outcome: Result<T, JobError<E>>) {
        match outcome {
            Ok(value) => {
                let value = self.store.record_success(index, value);
                tracing::debug!(index, "job succeeded");
                if let Some(observer) = &self.observer {
                    observer.on_job_succeed(index, value);
                }
            }
            Err(err) => {
                let err = self.store.record_failure(index, err);
                if let JobError::Panicked(msg) = err {
                    tracing::warn!(index, "job panicked: {}", msg);
                } else {
                    tracing::warn!(index, "job attempt failed");
                }
                if let Some(observer) = &self.observer {
                    observer.on_job_fail(index, err);
                }
            }
        }

        let tried = self.store.record_attempt(index);
        if self.policy.is_exhausted(&self.store.as_slice()[index]) {
            self.fail(index, tried);
        } else if index == self.cursor.next_index() {
            self.work_loop();
        }

        if let Some(observer) = &self.observer {
            observer.on_job_executed(index);
        }
    }

    fn fail(&mut self, index: usize, tried: u32) {
        self.status.send_replace(SchedulerStatus::Fail);
        let failed = JobFailed {
            failed_job_index: index,
            reports: self.store.snapshot(),
        };
        if self.completion.reject(failed) {
            tracing::error!(
                index,
                tried,
                retry = self.policy.limit,
                "job exhausted its retries; scheduler failed"
            );
        }
    }
}

fn panic_message(err: JoinError) -> String {
    if err.is_cancelled() {
        return "task cancelled".to_string();
    }
    match err.try_into_panic() {
        Ok(payload) => describe_panic(payload.as_ref()),
        Err(err) => err.to_string(),
    }
}

fn describe_panic(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
