//! Network reachability probes
//!
//! Two checks back the `requires_network` marker:
//! - the local probe binds a pair of throwaway TCP sockets, first on the
//!   unspecified IPv4 address and then, if that fails, on the unspecified IPv6
//!   address;
//! - the external probe connects to a fixed pool of public addresses, one at a
//!   time, with a socket-level connect timeout.
//!
//! Socket errors never propagate: they only mean the feature is absent.

use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tracing::{debug, info};

/// Ports bound by the local probe
pub const DEFAULT_LOCAL_PORTS: [u16; 2] = [18000, 18001];

/// Port the external probe connects to
pub const DEFAULT_EXTERNAL_PORT: u16 = 80;

/// Connect timeout for each external address
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(250);

/// Public addresses tried by the external probe. Numeric so the probe never
/// waits on DNS.
pub const DEFAULT_EXTERNAL_ADDRESSES: [Ipv4Addr; 11] = [
    Ipv4Addr::new(173, 194, 41, 198),
    Ipv4Addr::new(173, 194, 41, 199),
    Ipv4Addr::new(173, 194, 41, 200),
    Ipv4Addr::new(173, 194, 41, 201),
    Ipv4Addr::new(173, 194, 41, 206),
    Ipv4Addr::new(173, 194, 41, 192),
    Ipv4Addr::new(173, 194, 41, 193),
    Ipv4Addr::new(173, 194, 41, 194),
    Ipv4Addr::new(173, 194, 41, 195),
    Ipv4Addr::new(173, 194, 41, 196),
    Ipv4Addr::new(173, 194, 41, 197),
];

/// Parameters of both probes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSettings {
    /// The two ports bound by the local probe
    pub local_ports: [u16; 2],
    /// Addresses tried in order by the external probe
    pub external_addresses: Vec<IpAddr>,
    /// Port used for every external address
    pub external_port: u16,
    /// Connect timeout per external address
    pub connect_timeout: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            local_ports: DEFAULT_LOCAL_PORTS,
            external_addresses: DEFAULT_EXTERNAL_ADDRESSES
                .iter()
                .copied()
                .map(IpAddr::V4)
                .collect(),
            external_port: DEFAULT_EXTERNAL_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl ProbeSettings {
    /// Upper bound on the time the external probe can block
    pub fn external_worst_case(&self) -> Duration {
        let attempts = u32::try_from(self.external_addresses.len()).unwrap_or(u32::MAX);
        self.connect_timeout.saturating_mul(attempts)
    }
}

/// Whether a local network stack is available
pub fn probe_local_network(settings: &ProbeSettings) -> bool {
    // Maybe the host only has IPv6
    let available = bind_pair(IpAddr::V4(Ipv4Addr::UNSPECIFIED), settings.local_ports)
        || bind_pair(IpAddr::V6(Ipv6Addr::UNSPECIFIED), settings.local_ports);
    info!(available, ports = ?settings.local_ports, "local network probe");
    available
}

/// The first external address that accepted a connection, if any
pub fn probe_external_network(settings: &ProbeSettings) -> Option<SocketAddr> {
    for ip in &settings.external_addresses {
        let addr = SocketAddr::new(*ip, settings.external_port);
        match connect(addr, settings.connect_timeout) {
            Ok(()) => {
                info!(%addr, "external probe connected");
                return Some(addr);
            }
            Err(e) => debug!(%addr, error = %e, "external probe failed"),
        }
    }
    info!(
        attempts = settings.external_addresses.len(),
        "no external address was reachable"
    );
    None
}

fn bind_pair(ip: IpAddr, ports: [u16; 2]) -> bool {
    match ports
        .iter()
        .try_for_each(|port| bind_throwaway(SocketAddr::new(ip, *port)))
    {
        Ok(()) => true,
        Err(e) => {
            debug!(%ip, error = %e, "local bind probe failed");
            false
        }
    }
}

// The socket is closed again when it goes out of scope
fn bind_throwaway(addr: SocketAddr) -> io::Result<()> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())
}

fn connect(addr: SocketAddr, timeout: Duration) -> io::Result<()> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.connect_timeout(&addr.into(), timeout)
}
