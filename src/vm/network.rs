//! Address discovery: VM MAC → IPv4 via the host's neighbor table.
//!
//! The guest gets its address from libvirt's DHCP, so the launcher has no
//! record of it. Once the guest has talked on the bridge its MAC shows up in
//! `ip neigh`, which is polled until a matching entry appears.

use std::net::Ipv4Addr;

use tracing::{debug, info};

use crate::command;
use crate::error::{CommandError, FailureCode, LaunchError};
use crate::notify::{Notification, Notifier};
use crate::vm::hypervisor::Hypervisor;
use crate::vm::poll::PollPolicy;

/// Host neighbor/ARP cache.
#[allow(async_fn_in_trait)]
pub trait NeighborTable {
    /// Raw table text, one neighbor per line.
    async fn snapshot(&self) -> Result<String, CommandError>;
}

/// `ip neigh show`.
#[derive(Debug, Clone, Default)]
pub struct IpNeighbor;

impl NeighborTable for IpNeighbor {
    async fn snapshot(&self) -> Result<String, CommandError> {
        command::capture("ip", &["neigh", "show"]).await
    }
}

/// Find the IPv4 address bound to any of `macs` in `ip neigh` output.
///
/// ```text
/// 192.168.122.87 dev virbr0 lladdr 52:54:00:12:34:56 REACHABLE
/// fe80::1 dev virbr0 lladdr 52:54:00:12:34:56 STALE
/// ```
///
/// Entries in `FAILED`/`INCOMPLETE` state carry no `lladdr` and never match.
pub fn find_ipv4(table: &str, macs: &[String]) -> Option<Ipv4Addr> {
    table.lines().find_map(|line| {
        let mut tokens = line.split_whitespace();
        let addr: Ipv4Addr = tokens.next()?.parse().ok()?;
        let lladdr = tokens.skip_while(|t| *t != "lladdr").nth(1)?;
        macs.iter()
            .any(|mac| mac.eq_ignore_ascii_case(lladdr))
            .then_some(addr)
    })
}

/// Discover the VM's address, or use the one supplied in config.
///
/// Polls the neighbor table every interval up to the address budget and
/// returns as soon as an entry appears. The user is told once, after the
/// first interval, that discovery is taking a while.
pub async fn resolve_ip<H, T, N>(
    hypervisor: &H,
    neighbors: &T,
    notifier: &N,
    vm_name: &str,
    supplied: Option<Ipv4Addr>,
    policy: PollPolicy,
) -> Result<Ipv4Addr, LaunchError>
where
    H: Hypervisor,
    T: NeighborTable,
    N: Notifier,
{
    if let Some(ip) = supplied {
        debug!(%ip, "using configured address");
        return Ok(ip);
    }

    let macs = hypervisor.mac_addresses(vm_name).await?;
    if macs.is_empty() {
        return Err(FailureCode::NoIp.into());
    }
    debug!(
        vm = vm_name,
        ?macs,
        max_attempts = policy.max_attempts(),
        "looking up VM address"
    );

    let found = policy
        .run(|elapsed| {
            let macs = &macs;
            async move {
                if elapsed == policy.interval {
                    notifier.notify(&Notification::info("Waiting for the VM to get an address."));
                }
                let table = neighbors.snapshot().await?;
                Ok::<_, CommandError>(find_ipv4(&table, macs))
            }
        })
        .await?;

    match found {
        Some(ip) => {
            info!(vm = vm_name, %ip, "VM address resolved");
            Ok(ip)
        }
        None => Err(FailureCode::NoIp.into()),
    }
}
