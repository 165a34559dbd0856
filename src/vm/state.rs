//! Typed power state of the managed domain.
//!
//! `virsh domstate` prints a short human string; [`VmState::from_domstate`]
//! turns it into an enum so the lifecycle code never matches on text.

use std::fmt;

/// Observed power/transition state of the VM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VmState {
    /// The hypervisor does not know a domain by that name.
    Absent,
    ShutOff,
    Paused,
    Running,
    /// A guest-initiated shutdown is in progress.
    ShuttingDown,
    Crashed,
    /// The domain is being torn down by the hypervisor.
    Dying,
    /// Power-management suspend (S3/S4) inside the guest.
    Suspended,
    /// Anything the launcher has no rule for. Carries the raw text.
    Other(String),
}

impl VmState {
    /// Parse the output of `virsh domstate <name>`.
    pub fn from_domstate(text: &str) -> Self {
        let text = text.trim();
        match text.to_ascii_lowercase().as_str() {
            // idle/blocked are running vCPUs waiting on a resource.
            "running" | "idle" | "blocked" => VmState::Running,
            "shut off" => VmState::ShutOff,
            "paused" => VmState::Paused,
            "in shutdown" => VmState::ShuttingDown,
            "crashed" => VmState::Crashed,
            "dying" => VmState::Dying,
            "pmsuspended" => VmState::Suspended,
            _ => VmState::Other(text.to_string()),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, VmState::Running)
    }
}

impl fmt::Display for VmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmState::Absent => f.write_str("absent"),
            VmState::ShutOff => f.write_str("shut off"),
            VmState::Paused => f.write_str("paused"),
            VmState::Running => f.write_str("running"),
            VmState::ShuttingDown => f.write_str("in shutdown"),
            VmState::Crashed => f.write_str("crashed"),
            VmState::Dying => f.write_str("dying"),
            VmState::Suspended => f.write_str("pmsuspended"),
            VmState::Other(raw) if raw.is_empty() => f.write_str("no state"),
            VmState::Other(raw) => f.write_str(raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domstate_strings_map_to_states() {
        assert_eq!(VmState::from_domstate("running\n\n"), VmState::Running);
        assert_eq!(VmState::from_domstate("shut off"), VmState::ShutOff);
        assert_eq!(VmState::from_domstate("paused"), VmState::Paused);
        assert_eq!(VmState::from_domstate("in shutdown"), VmState::ShuttingDown);
        assert_eq!(VmState::from_domstate("crashed"), VmState::Crashed);
        assert_eq!(VmState::from_domstate("dying"), VmState::Dying);
        assert_eq!(VmState::from_domstate("pmsuspended"), VmState::Suspended);
    }

    #[test]
    fn blocked_and_idle_count_as_running() {
        assert!(VmState::from_domstate("idle").is_running());
        assert!(VmState::from_domstate("blocked").is_running());
    }

    #[test]
    fn unknown_text_is_kept_verbatim() {
        let state = VmState::from_domstate("  no state \n");
        assert_eq!(state, VmState::Other("no state".into()));
        assert_eq!(state.to_string(), "no state");
    }

    #[test]
    fn display_round_trips_known_states() {
        for state in [
            VmState::ShutOff,
            VmState::Paused,
            VmState::Running,
            VmState::ShuttingDown,
            VmState::Crashed,
            VmState::Dying,
            VmState::Suspended,
        ] {
            assert_eq!(VmState::from_domstate(&state.to_string()), state);
        }
    }
}
