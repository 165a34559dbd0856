//! User-facing desktop notifications.
//!
//! Delivery is fire-and-forget: the `notify-send` child is spawned with its
//! stdio discarded and never awaited. A missing notification daemon must not
//! change the launcher's outcome, so failures are only logged.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

const NOTIFY_SEND: &str = "notify-send";
const APP_NAME: &str = "vmdesk";

/// How important a message is; implies its on-screen lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

impl Severity {
    pub fn expiry(self) -> Duration {
        match self {
            Severity::Info => Duration::from_millis(4000),
            Severity::Error => Duration::from_millis(8000),
        }
    }

    fn urgency(self) -> &'static str {
        match self {
            Severity::Info => "normal",
            Severity::Error => "critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub summary: String,
    pub body: String,
}

impl Notification {
    pub fn info(body: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            summary: APP_NAME.to_string(),
            body: body.into(),
        }
    }

    pub fn error(summary: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            body: body.into(),
        }
    }
}

/// Sink for user notifications.
pub trait Notifier {
    fn notify(&self, notification: &Notification);
}

/// Sends notifications through `notify-send`.
#[derive(Debug, Clone, Default)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, notification: &Notification) {
        let args = notify_send_args(notification);
        debug!(summary = %notification.summary, "sending notification");

        let spawned = Command::new(NOTIFY_SEND)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        if let Err(e) = spawned {
            warn!(error = %e, body = %notification.body, "notification not delivered");
        }
    }
}

/// Argument vector for `notify-send`.
pub fn notify_send_args(n: &Notification) -> Vec<String> {
    vec![
        format!("--app-name={APP_NAME}"),
        format!("--urgency={}", n.severity.urgency()),
        format!("--expire-time={}", n.severity.expiry().as_millis()),
        n.summary.clone(),
        n.body.clone(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_linger_longer_than_info() {
        assert!(Severity::Error.expiry() > Severity::Info.expiry());
    }

    #[test]
    fn args_carry_expiry_and_urgency() {
        let args = notify_send_args(&Notification::error("VM", "could not start"));
        assert_eq!(
            args,
            vec![
                "--app-name=vmdesk",
                "--urgency=critical",
                "--expire-time=8000",
                "VM",
                "could not start",
            ]
        );
    }

    #[test]
    fn info_uses_app_name_as_summary() {
        let n = Notification::info("Booting VM.");
        assert_eq!(n.summary, "vmdesk");
        assert_eq!(notify_send_args(&n)[2], "--expire-time=4000");
    }
}
