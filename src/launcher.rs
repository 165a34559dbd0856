//! The readiness pipeline, wired to its collaborators.
//!
//! ```text
//! preflight::ensure_groups
//!     └─► vm::ensure_running
//!             └─► vm::resolve_ip
//!                     └─► vm::check_port  →  Ipv4Addr for the session
//! ```
//!
//! The first stage that fails ends the run; nothing already done (e.g. a
//! VM that was started) is rolled back.

use std::net::Ipv4Addr;
use std::time::Duration;

use tracing::info;

use crate::config::LauncherConfig;
use crate::error::LaunchError;
use crate::notify::{DesktopNotifier, Notifier};
use crate::preflight::{self, GroupMembership, SystemGroups};
use crate::report;
use crate::vm::{self, Hypervisor, IpNeighbor, NeighborTable, PollPolicy, Virsh};

/// Per-run context: config plus the external collaborators.
pub struct Launcher<H, T, N, G> {
    pub config: LauncherConfig,
    pub hypervisor: H,
    pub neighbors: T,
    pub notifier: N,
    pub groups: G,
    pub settle: PollPolicy,
    pub address: PollPolicy,
    pub port_timeout: Duration,
}

impl Launcher<Virsh, IpNeighbor, DesktopNotifier, SystemGroups> {
    /// Launcher backed by virsh, `ip neigh`, notify-send and the group db.
    pub fn system(config: LauncherConfig) -> Self {
        Self::new(config, Virsh, IpNeighbor, DesktopNotifier, SystemGroups)
    }
}

impl<H, T, N, G> Launcher<H, T, N, G>
where
    H: Hypervisor,
    T: NeighborTable,
    N: Notifier,
    G: GroupMembership,
{
    pub fn new(config: LauncherConfig, hypervisor: H, neighbors: T, notifier: N, groups: G) -> Self {
        Self {
            config,
            hypervisor,
            neighbors,
            notifier,
            groups,
            settle: PollPolicy::vm_settle(),
            address: PollPolicy::address(),
            port_timeout: vm::PORT_CHECK_TIMEOUT,
        }
    }

    /// Run every readiness stage and return the address to connect to.
    pub async fn prepare(&self) -> Result<Ipv4Addr, LaunchError> {
        let vm_name = self.config.vm_name.as_str();

        preflight::ensure_groups(&self.groups, &self.config.required_groups)?;

        vm::ensure_running(&self.hypervisor, &self.notifier, vm_name, self.settle).await?;

        let ip = vm::resolve_ip(
            &self.hypervisor,
            &self.neighbors,
            &self.notifier,
            vm_name,
            self.config.rdp_ip,
            self.address,
        )
        .await?;

        vm::check_port(ip, self.config.rdp_port, self.port_timeout).await?;

        info!(vm = vm_name, %ip, port = self.config.rdp_port, "VM ready");
        Ok(ip)
    }

    /// Notify about `err` and return the exit status to leave with.
    pub fn report(&self, err: &LaunchError) -> u8 {
        report::report(err, &self.notifier, &self.config.vm_name)
    }
}
