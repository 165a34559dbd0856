//! Error types for the launcher.
//!
//! - [`FailureCode`]: the distinguishable readiness failures. Each one has a
//!   fixed user message and exit status (see [`crate::report`]).
//! - [`CommandError`]: an external helper could not be run or exited non-zero.
//! - [`LaunchError`]: what a stage returns; wraps either of the above or a
//!   system lookup or configuration problem.

use thiserror::Error;

use crate::vm::VmState;

/// Readiness failures that are reported to the user and mapped to a stable
/// exit status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureCode {
    #[error("hypervisor refused to start the VM")]
    FailStart,

    #[error("hypervisor refused to resume the VM")]
    FailResume,

    #[error("hypervisor refused to destroy the crashed VM")]
    FailDestroy,

    #[error("VM did not finish shutting down in time")]
    ShutdownTimeout,

    #[error("VM did not finish dying in time")]
    DieTimeout,

    #[error("VM does not exist")]
    NotExist,

    #[error("user is not a member of the required groups: {}", .0.join(", "))]
    NotInGroup(Vec<String>),

    #[error("no IP address found for the VM")]
    NoIp,

    #[error("remote-desktop port is not reachable")]
    BadPort,

    /// The VM sits in a state the launcher has no rule for, or did not
    /// report `running` after the transition it was driven through.
    #[error("VM is in unexpected state '{0}'")]
    UnexpectedState(VmState),
}

/// An external command failed.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with {}: {stderr}", .status.map_or("signal".to_string(), |s| format!("status {s}")))]
    Exit {
        program: String,
        status: Option<i32>,
        stderr: String,
    },
}

impl CommandError {
    /// Exit status the launcher propagates for this failure.
    ///
    /// Spawn failures use the shell's "command not found" status; a child
    /// killed by a signal maps to 1.
    pub fn native_status(&self) -> u8 {
        match self {
            CommandError::Spawn { .. } => 127,
            CommandError::Exit { status, .. } => match status {
                Some(code) if (1..=255).contains(code) => *code as u8,
                _ => 1,
            },
        }
    }
}

/// Error returned by the readiness stages.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error(transparent)]
    Failure(#[from] FailureCode),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("system call failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0:#}")]
    Config(anyhow::Error),
}
