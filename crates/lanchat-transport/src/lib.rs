//! Bidirectional UDP multicast transport for lanchat.
//!
//! This crate joins an IPv4 multicast group on a local network interface and
//! runs one task per direction: a receive loop that pushes every datagram
//! arriving for the group onto an inbound queue, and a transmit loop that
//! drains an outbound queue of text payloads into the group. The two queues
//! plus the OS-assigned local sender address are the whole consumer surface;
//! rendering and input belong to the caller.

mod config;
mod error;
mod message;
mod socket;
mod transport;

pub use config::{TransportConfig, DEFAULT_GROUP, GROUP_ID_MAX, GROUP_ID_MIN, SERVICE_PORT};
pub use error::TransportError;
pub use message::ReceivedMessage;
pub use socket::{GroupReceiver, GroupSender, ResolvedInterface};
pub use transport::{Transport, MAX_DATAGRAM_SIZE, READ_DEADLINE};
