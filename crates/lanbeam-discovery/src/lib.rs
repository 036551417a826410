/// mDNS advertisement and discovery for the transfer rendezvous.
///
/// The sending side registers a service record for as long as it is willing
/// to accept a connection; the receiving side browses for that record and
/// resolves it to a concrete address and port within a bounded wait.

pub mod advertise;
pub mod browse;

mod addr;

pub use addr::local_ipv4;
pub use advertise::{register, Advertisement};
pub use browse::{find, ResolvedPeer};

/// Errors raised while advertising or browsing. A discovery timeout is not
/// an error; [`find`] reports it as `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// No routable IPv4 address could be resolved for this host.
    #[error("no routable IPv4 address on any local interface")]
    NetworkUnavailable,

    #[error("mDNS daemon error: {0}")]
    Daemon(#[from] mdns_sd::Error),

    /// The daemon's event channel closed while browsing.
    #[error("mDNS event channel closed")]
    ChannelClosed,
}
