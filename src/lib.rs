//! vmdesk: bring a libvirt VM to a reachable running state, then open a
//! remote-desktop session into it.
//!
//! The binary (`src/main.rs`) only parses arguments and wires signals; every
//! stage lives here so it can be exercised with scripted collaborators.

pub mod command;
pub mod config;
pub mod error;
pub mod launcher;
pub mod logging;
pub mod notify;
pub mod paths;
pub mod preflight;
pub mod report;
pub mod session;
pub mod vm;

pub use config::LauncherConfig;
pub use error::{CommandError, FailureCode, LaunchError};
pub use launcher::Launcher;
pub use session::{SessionHandle, SessionMode};
