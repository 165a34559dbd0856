//! Hypervisor management interface.
//!
//! The launcher only needs a handful of operations, so they are expressed as
//! the [`Hypervisor`] trait and implemented for libvirt by shelling out to
//! `virsh`:
//!
//! ```text
//! virsh --connect qemu:///system list --all --name   → domain_names()
//! virsh --connect qemu:///system domstate <vm>       → domain_state()
//! virsh --connect qemu:///system start|resume|destroy <vm>
//! virsh --connect qemu:///system domiflist <vm>      → mac_addresses()
//! ```

use tracing::info;

use crate::command;
use crate::error::CommandError;
use crate::vm::VmState;

/// Operations the readiness state machine and the address resolver need.
#[allow(async_fn_in_trait)]
pub trait Hypervisor {
    /// Names of every domain the hypervisor knows, running or not.
    async fn domain_names(&self) -> Result<Vec<String>, CommandError>;

    /// Current power state of an existing domain.
    async fn domain_state(&self, name: &str) -> Result<VmState, CommandError>;

    async fn start(&self, name: &str) -> Result<(), CommandError>;

    async fn resume(&self, name: &str) -> Result<(), CommandError>;

    /// Force power-off. Used only to clear a crashed domain.
    async fn destroy(&self, name: &str) -> Result<(), CommandError>;

    /// Hardware addresses of the domain's network interfaces.
    async fn mac_addresses(&self, name: &str) -> Result<Vec<String>, CommandError>;

    /// Live state of `name`, or [`VmState::Absent`] when the hypervisor does
    /// not know it.
    async fn query_state(&self, name: &str) -> Result<VmState, CommandError> {
        if !self.domain_names().await?.iter().any(|n| n == name) {
            return Ok(VmState::Absent);
        }
        self.domain_state(name).await
    }
}

const VIRSH: &str = "virsh";
const LIBVIRT_URI: &str = "qemu:///system";

/// libvirt through the `virsh` CLI.
#[derive(Debug, Clone, Default)]
pub struct Virsh;

impl Virsh {
    async fn run(&self, args: &[&str]) -> Result<String, CommandError> {
        let mut full = vec!["--connect", LIBVIRT_URI];
        full.extend_from_slice(args);
        command::capture(VIRSH, &full).await
    }
}

impl Hypervisor for Virsh {
    async fn domain_names(&self) -> Result<Vec<String>, CommandError> {
        let out = self.run(&["list", "--all", "--name"]).await?;
        Ok(parse_domain_names(&out))
    }

    async fn domain_state(&self, name: &str) -> Result<VmState, CommandError> {
        let out = self.run(&["domstate", name]).await?;
        Ok(VmState::from_domstate(&out))
    }

    async fn start(&self, name: &str) -> Result<(), CommandError> {
        self.run(&["start", name]).await?;
        info!(vm = name, "VM start issued");
        Ok(())
    }

    async fn resume(&self, name: &str) -> Result<(), CommandError> {
        self.run(&["resume", name]).await?;
        info!(vm = name, "VM resume issued");
        Ok(())
    }

    async fn destroy(&self, name: &str) -> Result<(), CommandError> {
        self.run(&["destroy", name]).await?;
        info!(vm = name, "VM destroyed");
        Ok(())
    }

    async fn mac_addresses(&self, name: &str) -> Result<Vec<String>, CommandError> {
        let out = self.run(&["domiflist", name]).await?;
        Ok(parse_domiflist_macs(&out))
    }
}

/// One name per line, blank lines ignored.
pub fn parse_domain_names(out: &str) -> Vec<String> {
    out.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Pull every MAC address out of a `virsh domiflist` table.
///
/// ```text
///  Interface   Type      Source    Model    MAC
/// -------------------------------------------------------------
///  vnet0       network   default   virtio   52:54:00:12:34:56
/// ```
pub fn parse_domiflist_macs(out: &str) -> Vec<String> {
    out.lines()
        .flat_map(str::split_whitespace)
        .filter(|tok| is_mac(tok))
        .map(str::to_ascii_lowercase)
        .collect()
}

pub(crate) fn is_mac(tok: &str) -> bool {
    let parts: Vec<&str> = tok.split(':').collect();
    parts.len() == 6
        && parts
            .iter()
            .all(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOMIFLIST: &str = " Interface   Type      Source    Model    MAC
-------------------------------------------------------------
 vnet3       network   default   e1000e   52:54:00:AB:cd:01

";

    #[test]
    fn domiflist_yields_lowercase_mac() {
        assert_eq!(parse_domiflist_macs(DOMIFLIST), vec!["52:54:00:ab:cd:01"]);
    }

    #[test]
    fn domiflist_without_interfaces_is_empty() {
        let out = " Interface   Type   Source   Model   MAC\n----------------------\n";
        assert!(parse_domiflist_macs(out).is_empty());
    }

    #[test]
    fn domain_names_skip_blank_lines() {
        let names = parse_domain_names("RDPWindows\nubuntu\n\n");
        assert_eq!(names, vec!["RDPWindows", "ubuntu"]);
    }

    #[test]
    fn mac_shape_is_checked() {
        assert!(is_mac("52:54:00:12:34:56"));
        assert!(!is_mac("52:54:00:12:34"));
        assert!(!is_mac("52:54:00:12:34:zz"));
        assert!(!is_mac("-------"));
    }
}
