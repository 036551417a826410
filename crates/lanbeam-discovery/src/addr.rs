use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use crate::DiscoveryError;

/// Resolve the IPv4 address a peer on the local segment can reach us at.
///
/// Connecting a UDP socket picks the source address the kernel would route
/// through, without sending any packet. Loopback or unspecified results mean
/// the host has no usable interface.
pub fn local_ipv4() -> Result<Ipv4Addr, DiscoveryError> {
    let socket =
        UdpSocket::bind(("0.0.0.0", 0)).map_err(|_| DiscoveryError::NetworkUnavailable)?;
    socket
        .connect(("8.8.8.8", 80))
        .map_err(|_| DiscoveryError::NetworkUnavailable)?;
    match socket.local_addr() {
        Ok(addr) => match addr.ip() {
            IpAddr::V4(ip) if !ip.is_loopback() && !ip.is_unspecified() => Ok(ip),
            _ => Err(DiscoveryError::NetworkUnavailable),
        },
        Err(_) => Err(DiscoveryError::NetworkUnavailable),
    }
}
