//! Remote-desktop client launch and the handle that owns it.
//!
//! ```text
//! launch(mode, ip, config)
//!     └─► tokio::process::Command  →  xfreerdp child (stdio discarded)
//!             └─► SessionHandle { child }
//!                     ├─► wait()     (foreground until the client exits)
//!                     └─► release()  (force-kill + reap, at most once)
//!
//! supervise(handle, signal)  →  wait() or signal, then release()
//! ```
//!
//! `Drop` on the handle sends SIGKILL if the child is still held, so every
//! way out of `main` (return, `?`, panic unwind) takes the client down.

use std::future::Future;
use std::net::Ipv4Addr;
use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::config::LauncherConfig;
use crate::error::CommandError;

/// Keyword selecting a full desktop session.
pub const FULL_DESKTOP: &str = "full-desktop";

/// Window class used for full desktop sessions.
const DESKTOP_WM_CLASS: &str = "vmdesk";

/// What to open on the remote side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionMode {
    FullDesktop,
    /// A single remote application; the identifier is both the remote
    /// program name and the local window class.
    SingleApp(String),
}

impl SessionMode {
    /// Interpret the positional CLI argument.
    pub fn from_arg(arg: &str) -> Self {
        if arg == FULL_DESKTOP {
            SessionMode::FullDesktop
        } else {
            SessionMode::SingleApp(arg.to_string())
        }
    }
}

/// Client argument vector for `mode` against `ip`.
///
/// Credentials go on the command line as the client expects them; the
/// vector must therefore never be logged as a whole.
pub fn build_client_args(mode: &SessionMode, ip: Ipv4Addr, config: &LauncherConfig) -> Vec<String> {
    let creds = &config.credentials;
    let mut args = vec![
        format!("/v:{ip}:{}", config.rdp_port),
        format!("/u:{}", creds.user),
        format!("/p:{}", creds.password),
    ];
    if !creds.domain.is_empty() {
        args.push(format!("/d:{}", creds.domain));
    }
    args.extend([
        format!("/scale:{}", config.client.scale),
        "+clipboard".to_string(),
        "+dynamic-resolution".to_string(),
        "-wallpaper".to_string(),
        "+auto-reconnect".to_string(),
        "/cert:ignore".to_string(),
    ]);

    match mode {
        SessionMode::FullDesktop => {
            args.push(format!("/title:Remote Desktop [{ip}]"));
            args.push(format!("/wm-class:{DESKTOP_WM_CLASS}"));
        }
        SessionMode::SingleApp(target) => {
            args.push(format!("/wm-class:{target}"));
            args.push(format!("/app:program:{target}"));
        }
    }

    args.extend(config.client.extra_flags.iter().cloned());
    args
}

/// Spawn the client for `mode`, or do nothing when no mode was given.
///
/// Returns immediately; the child runs detached from our stdio.
pub fn launch(
    mode: Option<&SessionMode>,
    ip: Ipv4Addr,
    config: &LauncherConfig,
) -> Result<SessionHandle, CommandError> {
    let Some(mode) = mode else {
        info!("no session mode given, nothing to launch");
        return Ok(SessionHandle::empty());
    };

    let program = &config.client.program;
    let child = Command::new(program)
        .args(build_client_args(mode, ip, config))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| CommandError::Spawn {
            program: program.clone(),
            source,
        })?;

    info!(program = %program, pid = ?child.id(), ?mode, %ip, "remote-desktop client started");
    Ok(SessionHandle::new(child))
}

/// Run until the client exits or `signal` resolves with a signal number,
/// then release the client.
///
/// Returns the process exit status: 0 when the client ended on its own,
/// 128 + signal number otherwise.
pub async fn supervise<S>(session: &mut SessionHandle, signal: S) -> u8
where
    S: Future<Output = u8>,
{
    let status = tokio::select! {
        result = session.wait() => {
            match result {
                Ok(exit) => info!(status = %exit, "remote-desktop client exited"),
                Err(e) => warn!(error = %e, "lost track of remote-desktop client"),
            }
            0
        }
        signo = signal => {
            info!(signal = signo, "interrupted, closing session");
            128 + signo
        }
    };

    session.release().await;
    status
}

/// Owner of the spawned client process.
#[derive(Debug, Default)]
pub struct SessionHandle {
    child: Option<Child>,
}

impl SessionHandle {
    pub fn new(child: Child) -> Self {
        Self { child: Some(child) }
    }

    /// A handle with nothing to clean up.
    pub fn empty() -> Self {
        Self::default()
    }

    /// PID of the client while it is held.
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    pub fn is_active(&self) -> bool {
        self.child.is_some()
    }

    /// Wait for the client to exit on its own. Pends forever when empty, so
    /// it can sit in a `select!` next to signal handlers.
    pub async fn wait(&mut self) -> std::io::Result<ExitStatus> {
        match self.child.as_mut() {
            Some(child) => {
                let status = child.wait().await;
                // Already reaped; nothing left for release() to kill.
                self.child = None;
                status
            }
            None => std::future::pending().await,
        }
    }

    /// Force-kill and reap the client. Returns `true` if a child was held.
    ///
    /// Safe to call any number of times; only the first call with a live
    /// child does anything.
    pub async fn release(&mut self) -> bool {
        let Some(mut child) = self.child.take() else {
            debug!("no remote-desktop client to release");
            return false;
        };
        let pid = child.id();
        match child.kill().await {
            Ok(()) => info!(?pid, "remote-desktop client terminated"),
            Err(e) => warn!(?pid, error = %e, "failed to terminate remote-desktop client"),
        }
        true
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if let Some(child) = self.child.as_mut() {
            let pid = child.id();
            if let Err(e) = child.start_kill() {
                warn!(?pid, error = %e, "failed to kill remote-desktop client on drop");
            } else {
                debug!(?pid, "remote-desktop client killed on drop");
            }
        }
    }
}
