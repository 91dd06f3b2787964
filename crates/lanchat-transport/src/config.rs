//! Transport configuration.

use std::net::{Ipv4Addr, SocketAddrV4};

use crate::error::TransportError;

/// Fixed UDP service port shared by every instance on the segment.
pub const SERVICE_PORT: u16 = 1024;

/// Default multicast group address.
pub const DEFAULT_GROUP: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 250);

/// Lowest group id accepted by [`TransportConfig::with_group_id`].
pub const GROUP_ID_MIN: u8 = 151;

/// Highest group id accepted by [`TransportConfig::with_group_id`].
pub const GROUP_ID_MAX: u8 = 250;

/// Configuration for one transport instance.
///
/// One group and one interface per instance; all fields are fixed for the
/// process lifetime once the transport has joined the group.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Interface to join the group on. `None` selects the first up,
    /// multicast-capable, non-loopback interface with an IPv4 address.
    pub interface: Option<String>,
    /// IPv4 multicast group address.
    pub group: Ipv4Addr,
    /// UDP service port.
    pub port: u16,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            interface: None,
            group: DEFAULT_GROUP,
            port: SERVICE_PORT,
        }
    }
}

impl TransportConfig {
    /// Build a configuration for group `224.0.0.<id>` on the service port.
    ///
    /// The id must lie in `[GROUP_ID_MIN, GROUP_ID_MAX]`.
    pub fn with_group_id(id: u8) -> Result<Self, TransportError> {
        if !(GROUP_ID_MIN..=GROUP_ID_MAX).contains(&id) {
            return Err(TransportError::InvalidConfig(format!(
                "group id {} outside [{}, {}]",
                id, GROUP_ID_MIN, GROUP_ID_MAX
            )));
        }
        Ok(Self {
            group: Ipv4Addr::new(224, 0, 0, id),
            ..Self::default()
        })
    }

    /// Set the interface name.
    pub fn with_interface(mut self, name: impl Into<String>) -> Self {
        self.interface = Some(name.into());
        self
    }

    /// The full group socket address.
    pub fn group_addr(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.group, self.port)
    }

    /// Check that the group address is actually a multicast address.
    pub fn validate(&self) -> Result<(), TransportError> {
        if !self.group.is_multicast() {
            return Err(TransportError::InvalidConfig(format!(
                "{} is not a multicast address",
                self.group
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TransportConfig::default();
        assert_eq!(config.group, DEFAULT_GROUP);
        assert_eq!(config.port, SERVICE_PORT);
        assert!(config.interface.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_group_id_range() {
        assert!(TransportConfig::with_group_id(150).is_err());
        assert!(TransportConfig::with_group_id(251).is_err());

        let config = TransportConfig::with_group_id(200).unwrap();
        assert_eq!(config.group, Ipv4Addr::new(224, 0, 0, 200));
        assert_eq!(config.group_addr(), "224.0.0.200:1024".parse().unwrap());
    }

    #[test]
    fn test_validate_rejects_unicast() {
        let config = TransportConfig {
            group: Ipv4Addr::new(192, 168, 1, 1),
            ..TransportConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TransportError::InvalidConfig(_))
        ));
    }
}
