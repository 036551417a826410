/// Publish side: keep one service record alive until it is withdrawn.

use std::net::Ipv4Addr;

use mdns_sd::{ServiceDaemon, ServiceInfo};
use tracing::{info, warn};

use crate::addr::local_ipv4;
use crate::DiscoveryError;

/// An active service registration. Exactly one should exist per process.
///
/// The record stays discoverable for as long as this handle lives;
/// [`Advertisement::unregister`] (or `Drop`) withdraws it and shuts down the
/// daemon, releasing the underlying multicast sockets.
pub struct Advertisement {
    daemon: Option<ServiceDaemon>,
    fullname: String,
    address: Ipv4Addr,
    port: u16,
}

/// Register `instance` under `service_type` at this host's routable IPv4.
///
/// Fails with [`DiscoveryError::NetworkUnavailable`] when no usable address
/// exists; registration errors from the daemon are surfaced, never swallowed.
pub fn register(
    service_type: &str,
    instance: &str,
    port: u16,
) -> Result<Advertisement, DiscoveryError> {
    let address = local_ipv4()?;
    let daemon = ServiceDaemon::new()?;

    let hostname = gethostname::gethostname().to_string_lossy().into_owned();
    let host_ipv4 = address.to_string();
    let service = ServiceInfo::new(
        service_type,
        instance,
        &format!("{hostname}.local."),
        host_ipv4.as_str(),
        port,
        None,
    )?;
    let fullname = service.get_fullname().to_string();

    daemon.register(service)?;
    info!(%address, port, fullname = %fullname, "service registered");

    Ok(Advertisement {
        daemon: Some(daemon),
        fullname,
        address,
        port,
    })
}

impl Advertisement {
    /// Address the record was registered with.
    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn fullname(&self) -> &str {
        &self.fullname
    }

    /// Withdraw the record and shut the daemon down. Idempotent, and safe to
    /// call even if registration only partially succeeded.
    pub fn unregister(&mut self) {
        if let Some(daemon) = self.daemon.take() {
            if let Err(e) = daemon.unregister(&self.fullname) {
                warn!(fullname = %self.fullname, error = %e, "unregister failed");
            }
            let _ = daemon.shutdown();
            info!(fullname = %self.fullname, "service unregistered");
        }
    }
}

impl Drop for Advertisement {
    fn drop(&mut self) {
        self.unregister();
    }
}
