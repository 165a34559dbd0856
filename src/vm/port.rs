//! Single-shot TCP check of the remote-desktop port.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio::net::TcpStream;
use tracing::{info, warn};

use crate::error::FailureCode;

/// Upper bound on the one connection attempt.
pub const PORT_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Try one TCP handshake with `ip:port` within `timeout`.
///
/// No retry: by the time this runs the VM is up and has an address, so a
/// closed port means remote access is disabled in the guest.
pub async fn check_port(ip: Ipv4Addr, port: u16, timeout: Duration) -> Result<(), FailureCode> {
    let addr = SocketAddr::from((ip, port));

    match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
        Ok(Ok(_stream)) => {
            info!(%addr, "remote-desktop port is open");
            Ok(())
        }
        Ok(Err(e)) => {
            warn!(%addr, error = %e, "remote-desktop port refused");
            Err(FailureCode::BadPort)
        }
        Err(_) => {
            warn!(%addr, timeout_secs = timeout.as_secs(), "remote-desktop port timed out");
            Err(FailureCode::BadPort)
        }
    }
}
