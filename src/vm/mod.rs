//! VM readiness for vmdesk.
//!
//! Takes the managed libvirt domain from whatever state it is in to
//! "running, has an address, remote-desktop port open":
//!
//! ```text
//! lifecycle::ensure_running  →  network::resolve_ip  →  port::check_port
//! ```

pub mod hypervisor;
pub mod lifecycle;
pub mod network;
pub mod poll;
pub mod port;
pub mod state;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use hypervisor::{Hypervisor, Virsh};
pub use lifecycle::ensure_running;
pub use network::{IpNeighbor, NeighborTable, resolve_ip};
pub use poll::PollPolicy;
pub use port::{PORT_CHECK_TIMEOUT, check_port};
pub use state::VmState;
