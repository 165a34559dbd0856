//! Failure reporting: code → {message, exit status}.
//!
//! The exit status table is deliberately coarse so callers can tell three
//! classes apart without reading messages:
//!
//! | class          | status | codes                 |
//! |----------------|--------|-----------------------|
//! | not permitted  | 77     | `NotInGroup`          |
//! | unreachable    | 68     | `NoIp`, `BadPort`     |
//! | everything else| 69     | all VM-management codes |
//!
//! Internal errors that are not in the table keep the status of whatever
//! failed underneath (see [`crate::error::CommandError::native_status`]).

use tracing::error;

use crate::error::{FailureCode, LaunchError};
use crate::notify::{Notification, Notifier};

pub const EXIT_UNAVAILABLE: u8 = 69;
pub const EXIT_NO_PERMISSION: u8 = 77;
pub const EXIT_UNREACHABLE: u8 = 68;
/// Group/passwd database lookup failed (`EX_OSERR`).
pub const EXIT_OS_ERROR: u8 = 71;
/// Malformed configuration file (`EX_CONFIG`).
pub const EXIT_CONFIG: u8 = 78;

const NO_IP_MESSAGE: &str = "\
The VM is running but no IP address could be found for it.
Check that its network interface is attached to a libvirt network
and that the guest has finished booting.";

const BAD_PORT_MESSAGE: &str = "\
The VM has an IP address but its remote-desktop port is not accepting connections.
Make sure remote desktop is enabled inside the guest
and that no firewall is blocking the port.";

/// Exit status for a failure code.
pub fn exit_status(code: &FailureCode) -> u8 {
    match code {
        FailureCode::NotInGroup(_) => EXIT_NO_PERMISSION,
        FailureCode::NoIp | FailureCode::BadPort => EXIT_UNREACHABLE,
        FailureCode::FailStart
        | FailureCode::FailResume
        | FailureCode::FailDestroy
        | FailureCode::ShutdownTimeout
        | FailureCode::DieTimeout
        | FailureCode::NotExist
        | FailureCode::UnexpectedState(_) => EXIT_UNAVAILABLE,
    }
}

/// Notification shown to the user for a failure code.
pub fn notification(code: &FailureCode, vm_name: &str) -> Notification {
    let body = match code {
        FailureCode::FailStart => format!("The VM '{vm_name}' could not be started."),
        FailureCode::FailResume => format!("The VM '{vm_name}' could not be resumed."),
        FailureCode::FailDestroy => {
            format!("The crashed VM '{vm_name}' could not be forcibly powered off.")
        }
        FailureCode::ShutdownTimeout => {
            format!("The VM '{vm_name}' did not finish shutting down in time.")
        }
        FailureCode::DieTimeout => format!("The VM '{vm_name}' did not finish dying in time."),
        FailureCode::NotExist => format!("The VM '{vm_name}' does not exist."),
        FailureCode::NotInGroup(missing) => format!(
            "The current user is not a member of: {}. Add the user and log in again.",
            missing.join(", ")
        ),
        FailureCode::NoIp => NO_IP_MESSAGE.to_string(),
        FailureCode::BadPort => BAD_PORT_MESSAGE.to_string(),
        FailureCode::UnexpectedState(state) => {
            format!("The VM '{vm_name}' is in an unsupported state ({state}).")
        }
    };
    Notification::error(summary(code), body)
}

fn summary(code: &FailureCode) -> &'static str {
    match code {
        FailureCode::NotInGroup(_) => "Insufficient permissions",
        FailureCode::NoIp | FailureCode::BadPort => "VM unreachable",
        _ => "VM unavailable",
    }
}

/// Notify the user about `err` and return the process exit status.
///
/// Exactly one notification is sent for a [`FailureCode`]; internal errors
/// are only logged. The caller is expected to exit with the status right
/// away.
pub fn report<N: Notifier>(err: &LaunchError, notifier: &N, vm_name: &str) -> u8 {
    match err {
        LaunchError::Failure(code) => {
            error!(vm = vm_name, code = ?code, "{code}");
            notifier.notify(&notification(code, vm_name));
            exit_status(code)
        }
        LaunchError::Command(cmd) => {
            error!(vm = vm_name, error = %cmd, "external command failed");
            cmd.native_status()
        }
        LaunchError::Io(e) => {
            error!(error = %e, "system call failed");
            EXIT_OS_ERROR
        }
        LaunchError::Config(e) => {
            error!(error = %format!("{e:#}"), "configuration error");
            EXIT_CONFIG
        }
    }
}
