//! Lifecycle control from outside the process: a one-line text protocol.
//!
//! A running scheduler can listen on a control socket; each line names one
//! lifecycle operation ("pause", "resume" or "stop") and is applied to the
//! scheduler handle as if called in-process.

use anyhow::Result;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::scheduler::SlidingWindowJobs;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControlError {
    #[error("empty control line")]
    Empty,
    #[error("unknown control command: {0}")]
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Pause,
    Resume,
    Stop,
}

impl ControlCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            ControlCommand::Pause => "pause",
            ControlCommand::Resume => "resume",
            ControlCommand::Stop => "stop",
        }
    }

    /// Applies the command to a scheduler handle.
    pub fn apply<T, E>(self, scheduler: &SlidingWindowJobs<T, E>)
    where
        T: Clone + Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        match self {
            ControlCommand::Pause => scheduler.pause(),
            ControlCommand::Resume => scheduler.resume(),
            ControlCommand::Stop => scheduler.stop(),
        }
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControlCommand {
    type Err = ControlError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        match line.trim().to_ascii_lowercase().as_str() {
            "" => Err(ControlError::Empty),
            "pause" => Ok(ControlCommand::Pause),
            "resume" => Ok(ControlCommand::Resume),
            "stop" => Ok(ControlCommand::Stop),
            other => Err(ControlError::Unknown(other.to_string())),
        }
    }
}

/// Default path for the control socket (same XDG state dir as the log).
pub fn default_control_socket_path() -> Result<PathBuf> {
    Ok(crate::config::state_dir()?.join("control.sock"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_commands() {
        assert_eq!("pause".parse::<ControlCommand>(), Ok(ControlCommand::Pause));
        assert_eq!(" Resume\n".parse::<ControlCommand>(), Ok(ControlCommand::Resume));
        assert_eq!("STOP".parse::<ControlCommand>(), Ok(ControlCommand::Stop));
    }

    #[test]
    fn rejects_empty_and_unknown_lines() {
        assert_eq!("  ".parse::<ControlCommand>(), Err(ControlError::Empty));
        assert_eq!(
            "cancel".parse::<ControlCommand>(),
            Err(ControlError::Unknown("cancel".to_string()))
        );
    }

    #[test]
    fn display_matches_wire_form() {
        for cmd in [
            ControlCommand::Pause,
            ControlCommand::Resume,
            ControlCommand::Stop,
        ] {
            assert_eq!(cmd.to_string().parse::<ControlCommand>(), Ok(cmd));
        }
    }

    #[tokio::test]
    async fn apply_drives_the_lifecycle() {
        use crate::scheduler::SchedulerStatus;

        let sched = SlidingWindowJobs::<u8, ()>::builder(Vec::new())
            .build()
            .unwrap();
        ControlCommand::Pause.apply(&sched);
        assert_eq!(sched.status(), SchedulerStatus::Paused);
        ControlCommand::Stop.apply(&sched);
        assert_eq!(sched.status(), SchedulerStatus::Stopped);
        ControlCommand::Resume.apply(&sched);
        assert_eq!(sched.status(), SchedulerStatus::Running);
    }
}
