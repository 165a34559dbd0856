//! vmdesk: open a remote-desktop session into a libvirt VM.
//!
//! Makes sure the VM is running, finds its address, checks the
//! remote-desktop port, then runs the client in the foreground until it
//! exits or we are signalled. Every failure is reported through a desktop
//! notification and a stable exit status.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tokio::signal::unix::{Signal, SignalKind, signal};
use tracing::error;

use vmdesk::config::DEFAULT_VM_NAME;
use vmdesk::notify::DesktopNotifier;
use vmdesk::paths::AppPaths;
use vmdesk::{LaunchError, Launcher, LauncherConfig, SessionMode, logging, report, session};

/// Start the VM if needed and connect to it
#[derive(Parser, Debug)]
#[command(name = "vmdesk", version, about = "Start a libvirt VM if needed and connect to it over remote desktop")]
struct Args {
    /// `full-desktop`, or the name of a remote application to open on its own
    mode: Option<String>,

    /// Config file [default: $XDG_CONFIG_HOME/vmdesk/vmdesk.toml]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only check that the VM is ready and print its address
    #[arg(long)]
    check: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let _log_guard = logging::init();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to create runtime");
            return ExitCode::from(report::EXIT_OS_ERROR);
        }
    };

    ExitCode::from(runtime.block_on(run(args)))
}

async fn run(args: Args) -> u8 {
    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            return report::report(&LaunchError::Config(e), &DesktopNotifier, DEFAULT_VM_NAME);
        }
    };

    let launcher = Launcher::system(config);

    let ip = match launcher.prepare().await {
        Ok(ip) => ip,
        Err(e) => return launcher.report(&e),
    };

    if args.check {
        println!("{ip}");
        return 0;
    }

    // Handlers go in before the client exists so no signal can slip past
    // the cleanup below. Without them the client would outlive us.
    let mut signals = match ShutdownSignals::install() {
        Ok(signals) => signals,
        Err(e) => {
            error!(error = %e, "could not install signal handlers");
            return launcher.report(&LaunchError::Io(e));
        }
    };

    let mode = args.mode.as_deref().map(SessionMode::from_arg);
    let mut session = match session::launch(mode.as_ref(), ip, &launcher.config) {
        Ok(session) => session,
        Err(e) => return launcher.report(&e.into()),
    };

    if !session.is_active() {
        return 0;
    }

    session::supervise(&mut session, signals.recv()).await
}

fn load_config(explicit: Option<&Path>) -> anyhow::Result<LauncherConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => AppPaths::resolve()
            .context("HOME is not set; pass --config")?
            .config_file,
    };
    LauncherConfig::load(&path)
}

/// SIGINT, SIGTERM and SIGHUP streams.
struct ShutdownSignals {
    interrupt: Signal,
    terminate: Signal,
    hangup: Signal,
}

impl ShutdownSignals {
    fn install() -> std::io::Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            hangup: signal(SignalKind::hangup())?,
        })
    }

    /// Signal number of the first shutdown signal received.
    async fn recv(&mut self) -> u8 {
        tokio::select! {
            _ = self.interrupt.recv() => 2,
            _ = self.terminate.recv() => 15,
            _ = self.hangup.recv() => 1,
        }
    }
}
