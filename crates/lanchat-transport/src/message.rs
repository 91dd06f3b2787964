//! Inbound message type.

use std::net::SocketAddr;

/// One datagram received from the multicast group.
///
/// Multicast echoes a sender's own transmissions back to it, so the transport
/// delivers every packet, including this instance's own. The sender address
/// lets the consumer tell the two apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    /// Address the datagram was sent from (peer's transmit socket).
    pub from: SocketAddr,
    /// Payload, decoded as UTF-8 (lossy).
    pub text: String,
}

impl ReceivedMessage {
    /// Whether this message is our own transmission echoed back.
    ///
    /// True only if both IP and port match the local transmit address.
    pub fn is_local_echo(&self, local_addr: SocketAddr) -> bool {
        self.from == local_addr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_echo_requires_ip_and_port() {
        let local: SocketAddr = "192.168.1.10:54321".parse().unwrap();
        let message = ReceivedMessage {
            from: local,
            text: "hello".to_string(),
        };

        assert!(message.is_local_echo(local));
        // Same IP, different port: a different instance on the same host.
        assert!(!message.is_local_echo("192.168.1.10:54322".parse().unwrap()));
        // Same port, different IP.
        assert!(!message.is_local_echo("192.168.1.11:54321".parse().unwrap()));
    }
}
