//! Socket binding: interface resolution, group membership, socket options.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use async_trait::async_trait;
use network_interface::{Addr, NetworkInterface, NetworkInterfaceConfig};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use tokio::net::UdpSocket;
use tracing::debug;

use crate::config::TransportConfig;
use crate::error::TransportError;

/// Outbound multicast TTL. 2 allows forwarding across one multicast router.
const MULTICAST_TTL: u32 = 2;

/// Source of inbound datagrams. Implemented by the bound receive socket;
/// test code substitutes scripted doubles.
#[async_trait]
pub trait GroupReceiver: Send + Sync + 'static {
    /// Receive one datagram, returning its length and sender address.
    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;
}

/// Sink for outbound datagrams, connected to the group address.
#[async_trait]
pub trait GroupSender: Send + Sync + 'static {
    /// Write one payload as a single datagram to the group.
    async fn send(&self, buf: &[u8]) -> io::Result<usize>;
}

#[async_trait]
impl GroupReceiver for UdpSocket {
    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        UdpSocket::recv_from(self, buf).await
    }
}

#[async_trait]
impl GroupSender for UdpSocket {
    async fn send(&self, buf: &[u8]) -> io::Result<usize> {
        UdpSocket::send(self, buf).await
    }
}

/// A local interface selected for multicast.
#[derive(Debug, Clone)]
pub struct ResolvedInterface {
    /// Interface name.
    pub name: String,
    /// Interface index.
    pub index: u32,
    /// IPv4 address used for group membership and egress.
    pub addr: Ipv4Addr,
}

impl ResolvedInterface {
    /// Resolve a named interface, or auto-pick the first multicast-capable
    /// one. Loopback interfaces and interfaces without an IPv4 address are
    /// skipped.
    pub fn resolve(name: Option<&str>) -> Result<ResolvedInterface, TransportError> {
        let interfaces = NetworkInterface::show()
            .map_err(|e| TransportError::InterfaceLookup(e.to_string()))?;

        let mut candidates = interfaces.into_iter().filter_map(|iface| {
            if iface.name.starts_with("lo") {
                return None;
            }
            let addr = iface.addr.iter().find_map(|addr| match addr {
                Addr::V4(v4) if !v4.ip.is_loopback() => Some(v4.ip),
                _ => None,
            })?;
            Some(ResolvedInterface {
                name: iface.name,
                index: iface.index,
                addr,
            })
        });

        match name {
            Some(wanted) => candidates
                .find(|iface| iface.name == wanted)
                .ok_or_else(|| {
                    TransportError::InterfaceLookup(format!(
                        "no multicast-capable interface named {:?}",
                        wanted
                    ))
                }),
            None => candidates.next().ok_or_else(|| {
                TransportError::InterfaceLookup(
                    "no multicast-capable interface available".to_string(),
                )
            }),
        }
    }
}

/// The pair of sockets backing one transport instance.
///
/// Receive and transmit use separate sockets: the receive socket is bound on
/// the service port with the group joined, the transmit socket is bound to an
/// ephemeral port and connected to the group address. The transmit socket's
/// OS-assigned local address identifies this instance's own traffic.
pub(crate) struct GroupSockets {
    pub rx: UdpSocket,
    pub tx: UdpSocket,
    pub local_addr: SocketAddr,
    pub group: SocketAddrV4,
}

impl GroupSockets {
    /// Bind both sockets and join the group on the resolved interface.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn bind(config: &TransportConfig) -> Result<Self, TransportError> {
        let iface = ResolvedInterface::resolve(config.interface.as_deref())?;
        let group = config.group_addr();

        debug!(
            interface = %iface.name,
            addr = %iface.addr,
            group = %group,
            "binding multicast sockets"
        );

        let rx = Self::bind_receive(&group, &iface)?;
        let (tx, local_addr) = Self::bind_transmit(&group, &iface)?;

        Ok(Self {
            rx,
            tx,
            local_addr,
            group,
        })
    }

    fn bind_receive(group: &SocketAddrV4, iface: &ResolvedInterface) -> Result<UdpSocket, TransportError> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
            .map_err(TransportError::Bind)?;
        socket
            .set_reuse_address(true)
            .map_err(TransportError::Bind)?;

        // Binding to the group address itself makes the kernel drop traffic
        // addressed elsewhere on the shared port. Not supported on Windows,
        // which falls back to the wildcard address.
        #[cfg(unix)]
        let bind_addr = *group;
        #[cfg(not(unix))]
        let bind_addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, group.port());

        socket
            .bind(&SockAddr::from(bind_addr))
            .map_err(TransportError::Bind)?;
        socket
            .join_multicast_v4(group.ip(), &iface.addr)
            .map_err(TransportError::JoinGroup)?;
        socket
            .set_nonblocking(true)
            .map_err(TransportError::Bind)?;

        UdpSocket::from_std(socket.into()).map_err(TransportError::Bind)
    }

    fn bind_transmit(
        group: &SocketAddrV4,
        iface: &ResolvedInterface,
    ) -> Result<(UdpSocket, SocketAddr), TransportError> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
            .map_err(TransportError::Bind)?;
        socket
            .bind(&SockAddr::from(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0)))
            .map_err(TransportError::Bind)?;
        socket
            .set_multicast_if_v4(&iface.addr)
            .map_err(TransportError::ControlConfig)?;
        socket
            .set_multicast_ttl_v4(MULTICAST_TTL)
            .map_err(TransportError::ControlConfig)?;
        // Loopback on: our own transmissions come back through the receive
        // socket, and the consumer filters them by address.
        socket
            .set_multicast_loop_v4(true)
            .map_err(TransportError::ControlConfig)?;
        socket
            .connect(&SockAddr::from(*group))
            .map_err(TransportError::Bind)?;
        socket
            .set_nonblocking(true)
            .map_err(TransportError::Bind)?;

        let socket = UdpSocket::from_std(socket.into()).map_err(TransportError::Bind)?;
        let local_addr = socket.local_addr().map_err(TransportError::Bind)?;
        Ok((socket, local_addr))
    }
}
