//! Scheduler lifecycle: overall status and which transitions `start()` accepts.

use std::fmt;

/// Overall scheduler status, separate from each job's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulerStatus {
    Init,
    Running,
    Success,
    Fail,
    Paused,
    Stopped,
}

impl SchedulerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SchedulerStatus::Init => "init",
            SchedulerStatus::Running => "running",
            SchedulerStatus::Success => "success",
            SchedulerStatus::Fail => "fail",
            SchedulerStatus::Paused => "paused",
            SchedulerStatus::Stopped => "stopped",
        }
    }
}

impl fmt::Display for SchedulerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `start()` called on a scheduler that can no longer start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("tried to start a failed scheduler")]
    Failed,
    #[error("tried to start a stopped scheduler")]
    Stopped,
    #[error("tried to start a finished scheduler")]
    Finished,
}

/// What `start()` should do from a given status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StartTransition {
    /// Move to `Running` and run the work loop.
    Begin,
    /// Already running; hand back the completion signal only.
    AlreadyRunning,
}

pub(crate) fn start_transition(status: SchedulerStatus) -> Result<StartTransition, LifecycleError> {
    match status {
        SchedulerStatus::Init | SchedulerStatus::Paused => Ok(StartTransition::Begin),
        SchedulerStatus::Running => Ok(StartTransition::AlreadyRunning),
        SchedulerStatus::Fail => Err(LifecycleError::Failed),
        SchedulerStatus::Stopped => Err(LifecycleError::Stopped),
        SchedulerStatus::Success => Err(LifecycleError::Finished),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_allowed_from_init_and_paused() {
        assert_eq!(
            start_transition(SchedulerStatus::Init),
            Ok(StartTransition::Begin)
        );
        assert_eq!(
            start_transition(SchedulerStatus::Paused),
            Ok(StartTransition::Begin)
        );
        assert_eq!(
            start_transition(SchedulerStatus::Running),
            Ok(StartTransition::AlreadyRunning)
        );
    }

    #[test]
    fn start_rejected_from_terminal_states() {
        assert_eq!(
            start_transition(SchedulerStatus::Fail),
            Err(LifecycleError::Failed)
        );
        assert_eq!(
            start_transition(SchedulerStatus::Stopped),
            Err(LifecycleError::Stopped)
        );
        assert_eq!(
            start_transition(SchedulerStatus::Success),
            Err(LifecycleError::Finished)
        );
    }

    #[test]
    fn lifecycle_error_messages_name_the_state() {
        assert!(LifecycleError::Failed.to_string().contains("failed"));
        assert!(LifecycleError::Stopped.to_string().contains("stopped"));
        assert!(LifecycleError::Finished.to_string().contains("finished"));
    }
}
