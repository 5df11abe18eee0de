//! The coordinator stream contract (§4.8). Real RPC plumbing (the wire
//! encoding, the network transport itself) is out of scope (§1 Non-goals);
//! this module defines the contract [`Runtime`](super::Runtime) drives and
//! ships an in-memory implementation for tests.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::messages::{ClientMessage, FuzzAnnounce, ServerMessage};

/// Errors exchanging messages with the coordinator.
#[derive(Debug, Clone, derive_more::Error, derive_more::Display)]
pub enum TransportError {
    /// The coordinator closed the stream.
    #[display("coordinator stream closed")]
    Closed,
}

/// The bidirectional stream contract between this crate and a remote
/// coordinator. A real implementation would wrap a websocket, gRPC stream,
/// or similar; that wiring is deliberately not built here.
#[async_trait]
pub trait CoordinatorStream: Send + Sync {
    /// Sends one message to the coordinator.
    async fn send(&mut self, message: ClientMessage) -> Result<(), TransportError>;

    /// Waits for the coordinator's next message.
    async fn recv(&mut self) -> Result<ServerMessage, TransportError>;
}

/// An in-memory, channel-backed [`CoordinatorStream`] for tests: the other
/// end of the channel pair plays the coordinator.
pub struct ChannelStream {
    outbound: mpsc::Sender<ClientMessage>,
    inbound: mpsc::Receiver<ServerMessage>,
}

impl ChannelStream {
    /// Builds a connected pair: the first element is the client-facing
    /// [`ChannelStream`], the second is the raw channel halves a test
    /// harness drives to play the coordinator.
    #[must_use]
    pub fn pair() -> (Self, mpsc::Receiver<ClientMessage>, mpsc::Sender<ServerMessage>) {
        let (client_tx, harness_rx) = mpsc::channel(16);
        let (harness_tx, client_rx) = mpsc::channel(16);
        (
            Self {
                outbound: client_tx,
                inbound: client_rx,
            },
            harness_rx,
            harness_tx,
        )
    }
}

#[async_trait]
impl CoordinatorStream for ChannelStream {
    async fn send(&mut self, message: ClientMessage) -> Result<(), TransportError> {
        self.outbound
            .send(message)
            .await
            .map_err(|_| TransportError::Closed)
    }

    async fn recv(&mut self) -> Result<ServerMessage, TransportError> {
        self.inbound.recv().await.ok_or(TransportError::Closed)
    }
}
