//! Error types for the multicast transport.

use std::io;

use thiserror::Error;

/// Errors that can occur while setting up or running the transport.
///
/// The first four variants are setup failures and abort startup before any
/// loop is spawned. `Read` and `Write` are the terminal outcomes of the
/// receive and transmit loops respectively; each loop reports its outcome
/// exactly once.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No usable network interface matched the configuration.
    #[error("interface lookup failed: {0}")]
    InterfaceLookup(String),

    /// Failed to bind or connect a UDP socket.
    #[error("failed to bind socket: {0}")]
    Bind(#[source] io::Error),

    /// Failed to join the multicast group on the selected interface.
    #[error("failed to join multicast group: {0}")]
    JoinGroup(#[source] io::Error),

    /// Failed to set a socket option (egress interface, TTL, loopback).
    #[error("failed to configure socket: {0}")]
    ControlConfig(#[source] io::Error),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The receive loop hit a non-transient read error.
    #[error("read failed: {0}")]
    Read(#[source] io::Error),

    /// The transmit loop failed to write a datagram.
    #[error("write failed: {0}")]
    Write(#[source] io::Error),

    /// The transport loops are no longer running.
    #[error("transport closed")]
    Closed,
}
