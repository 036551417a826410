/// Lookup side: browse for a service type and resolve the first peer.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use mdns_sd::{ServiceDaemon, ServiceEvent};
use tracing::{debug, info};

use crate::DiscoveryError;

/// A service record resolved to a concrete endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPeer {
    /// Full instance name, e.g. `MyServer._example._tcp.local.`.
    pub instance: String,
    pub address: Ipv4Addr,
    pub port: u16,
}

/// Browse for `service_type` until one record resolves to an IPv4 endpoint
/// or `wait` elapses. Returns `Ok(None)` on timeout; that is the expected
/// no-peer outcome, not a failure.
///
/// Policy on multiple advertisers: first resolved wins, later records are
/// ignored for this call. The wait blocks on the daemon's event channel, it
/// never polls the clock.
pub async fn find(
    service_type: &str,
    wait: Duration,
) -> Result<Option<ResolvedPeer>, DiscoveryError> {
    let daemon = ServiceDaemon::new()?;
    let events = daemon.browse(service_type)?;
    debug!(service_type, ?wait, "browsing");

    let outcome = tokio::time::timeout(wait, async {
        loop {
            let event = events
                .recv_async()
                .await
                .map_err(|_| DiscoveryError::ChannelClosed)?;
            match event {
                ServiceEvent::ServiceResolved(record) => {
                    let ipv4 = record.get_addresses().iter().find_map(|ip| match ip {
                        IpAddr::V4(a) => Some(*a),
                        IpAddr::V6(_) => None,
                    });
                    // A record without an IPv4 address is not usable for us;
                    // keep waiting for one that is.
                    if let Some(address) = ipv4 {
                        return Ok(ResolvedPeer {
                            instance: record.get_fullname().to_string(),
                            address,
                            port: record.get_port(),
                        });
                    }
                }
                ServiceEvent::ServiceFound(_, fullname) => {
                    debug!(fullname = %fullname, "service found, awaiting resolution");
                }
                _ => {}
            }
        }
    })
    .await;

    let _ = daemon.stop_browse(service_type);
    let _ = daemon.shutdown();

    match outcome {
        Ok(Ok(peer)) => {
            info!(instance = %peer.instance, address = %peer.address, port = peer.port, "peer resolved");
            Ok(Some(peer))
        }
        Ok(Err(e)) => Err(e),
        Err(_elapsed) => {
            info!(service_type, ?wait, "no peer resolved within the wait");
            Ok(None)
        }
    }
}
