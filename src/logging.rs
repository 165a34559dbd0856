//! Tracing setup.
//!
//! stderr always gets compact output filtered by `RUST_LOG` (default
//! `warn`). Setting `VMDESK_LOG=1` adds an append-only `vmdesk.log` under
//! [`AppPaths::logs`] and raises the default filter to `info`, which is the
//! easiest way to see what happened when the launcher runs from a desktop
//! entry with no terminal attached.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::paths::AppPaths;

/// Environment switch for the file log.
pub const LOG_ENV: &str = "VMDESK_LOG";

const LOG_FILE: &str = "vmdesk.log";

/// Keeps the file writer alive; buffered lines are flushed on drop.
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

fn file_log_requested() -> bool {
    std::env::var(LOG_ENV).as_deref() == Ok("1")
}

/// Directory for `vmdesk.log`; `/tmp` when HOME is unset or unwritable.
fn log_dir() -> PathBuf {
    let dir = AppPaths::resolve()
        .map(|p| p.logs)
        .unwrap_or_else(|| PathBuf::from("/tmp"));
    match std::fs::create_dir_all(&dir) {
        Ok(()) => dir,
        Err(_) => PathBuf::from("/tmp"),
    }
}

/// Install the global subscriber. Call once, first thing in `main`.
pub fn init() -> LogGuard {
    let stderr = fmt::layer()
        .compact()
        .with_target(false)
        .with_writer(std::io::stderr);

    if !file_log_requested() {
        tracing_subscriber::registry()
            .with(filter("warn"))
            .with(stderr)
            .init();
        return LogGuard { _file: None };
    }

    let appender = tracing_appender::rolling::never(log_dir(), LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter("info"))
        .with(stderr)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .init();

    LogGuard { _file: Some(guard) }
}
