//! The transport: one receive loop, one transmit loop, two queues.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

use crate::config::TransportConfig;
use crate::error::TransportError;
use crate::message::ReceivedMessage;
use crate::socket::{GroupReceiver, GroupSender, GroupSockets};

/// Read deadline for the receive loop. Expiry is not an error; it only
/// bounds how long the loop sits in one read so it can log liveness.
pub const READ_DEADLINE: Duration = Duration::from_secs(10);

/// Receive buffer size. Datagrams longer than this are truncated.
pub const MAX_DATAGRAM_SIZE: usize = 2048;

/// A running multicast transport.
///
/// Owns the inbound queue receiver and the outbound queue sender; dropping
/// the transport (or calling [`Transport::shutdown`]) stops both loops. Each
/// loop terminates on its first fatal I/O error and never retries; the
/// error is surfaced through [`Transport::closed`].
pub struct Transport {
    local_addr: SocketAddr,
    inbound: mpsc::UnboundedReceiver<ReceivedMessage>,
    outbound: mpsc::UnboundedSender<String>,
    shutdown: broadcast::Sender<()>,
    recv_task: JoinHandle<Result<(), TransportError>>,
    send_task: JoinHandle<Result<(), TransportError>>,
}

impl Transport {
    /// Bind the sockets, join the group and spawn both loops.
    pub async fn join(config: &TransportConfig) -> Result<Transport, TransportError> {
        config.validate()?;
        let sockets = GroupSockets::bind(config)?;
        info!(
            group = %sockets.group,
            local = %sockets.local_addr,
            "joined multicast group"
        );
        let local_addr = sockets.local_addr;
        Ok(Self::start(
            Arc::new(sockets.rx),
            Arc::new(sockets.tx),
            local_addr,
        ))
    }

    /// Spawn the loops over an already bound socket pair.
    fn start(
        receiver: Arc<dyn GroupReceiver>,
        sender: Arc<dyn GroupSender>,
        local_addr: SocketAddr,
    ) -> Transport {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (shutdown, _) = broadcast::channel(1);

        let recv_task = tokio::spawn(recv_loop(
            receiver,
            inbound_tx,
            shutdown.clone(),
            shutdown.subscribe(),
        ));
        let send_task = tokio::spawn(send_loop(
            sender,
            outbound_rx,
            shutdown.clone(),
            shutdown.subscribe(),
        ));

        Transport {
            local_addr,
            inbound: inbound_rx,
            outbound: outbound_tx,
            shutdown,
            recv_task,
            send_task,
        }
    }

    /// The OS-assigned address of the transmit socket.
    ///
    /// A received message whose sender equals this address is this
    /// instance's own transmission echoed back by multicast.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// A handle to the outbound queue. Each payload sent on it becomes
    /// exactly one datagram, in FIFO order.
    pub fn sender(&self) -> mpsc::UnboundedSender<String> {
        self.outbound.clone()
    }

    /// Enqueue one payload for transmission.
    pub fn send(&self, text: impl Into<String>) -> Result<(), TransportError> {
        self.outbound
            .send(text.into())
            .map_err(|_| TransportError::Closed)
    }

    /// Pop the next inbound message. Returns `None` once the receive loop
    /// has terminated and the queue is drained.
    pub async fn recv(&mut self) -> Option<ReceivedMessage> {
        self.inbound.recv().await
    }

    /// Whether both loops are still running.
    pub fn is_running(&self) -> bool {
        !self.recv_task.is_finished() && !self.send_task.is_finished()
    }

    /// Signal both loops to stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(());
    }

    /// Wait for both loops to terminate and report the first fatal error.
    ///
    /// Call [`Transport::shutdown`] first for an orderly stop; otherwise
    /// this returns only once a loop has failed.
    pub async fn closed(self) -> Result<(), TransportError> {
        // Closing the outbound queue lets the transmit loop drain and exit.
        drop(self.outbound);
        let recv_outcome = finish(self.recv_task).await;
        let send_outcome = finish(self.send_task).await;
        recv_outcome?;
        send_outcome
    }
}

async fn finish(task: JoinHandle<Result<(), TransportError>>) -> Result<(), TransportError> {
    match task.await {
        Ok(outcome) => outcome,
        Err(_) => Err(TransportError::Closed),
    }
}

/// Receive loop: read datagrams until shutdown or a fatal error.
///
/// A read deadline expiry or an OS-level timeout is transient and retried;
/// any other read error stops the loop, broadcasts shutdown to the sibling
/// loop and is reported exactly once.
async fn recv_loop(
    socket: Arc<dyn GroupReceiver>,
    inbound: mpsc::UnboundedSender<ReceivedMessage>,
    shutdown: broadcast::Sender<()>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), TransportError> {
    let mut buf = [0u8; MAX_DATAGRAM_SIZE];

    loop {
        let read = tokio::select! {
            _ = shutdown_rx.recv() => {
                debug!("receive loop stopping");
                return Ok(());
            }
            read = timeout(READ_DEADLINE, socket.recv_from(&mut buf)) => read,
        };

        match read {
            Err(_) => {
                trace!("no datagram within read deadline");
            }
            Ok(Err(e)) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                trace!("read timed out: {}", e);
            }
            Ok(Err(e)) => {
                warn!("receive loop terminating: {}", e);
                let _ = shutdown.send(());
                return Err(TransportError::Read(e));
            }
            Ok(Ok((len, from))) => {
                let text = String::from_utf8_lossy(&buf[..len]).into_owned();
                trace!(%from, len, "received datagram");
                if inbound.send(ReceivedMessage { from, text }).is_err() {
                    debug!("inbound queue closed, stopping receive loop");
                    return Ok(());
                }
            }
        }
    }
}

/// Transmit loop: one write per queued payload, FIFO, at most once.
///
/// A write error stops the loop without retrying or requeueing the failed
/// payload; payloads queued after it are never sent.
async fn send_loop(
    socket: Arc<dyn GroupSender>,
    mut outbound: mpsc::UnboundedReceiver<String>,
    shutdown: broadcast::Sender<()>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), TransportError> {
    loop {
        let text = tokio::select! {
            _ = shutdown_rx.recv() => {
                debug!("transmit loop stopping");
                return Ok(());
            }
            text = outbound.recv() => match text {
                Some(text) => text,
                None => {
                    debug!("outbound queue closed, stopping transmit loop");
                    return Ok(());
                }
            },
        };

        if let Err(e) = socket.send(text.as_bytes()).await {
            warn!("transmit loop terminating: {}", e);
            let _ = shutdown.send(());
            return Err(TransportError::Write(e));
        }
        trace!(len = text.len(), "sent datagram");
    }
}
