//! Client connection handles held by the hub.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::error::HubError;
use crate::watcher::FileChangeEvent;

/// Default buffer size for channel-backed connections.
pub const DEFAULT_CLIENT_BUFFER: usize = 100;

/// Identity of a live client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generate a fresh connection id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Transport-specific half of a client connection.
#[async_trait]
pub trait ClientSink: Send + Sync {
    /// Complete the transport handshake before the client joins the hub.
    async fn accept(&self) -> Result<(), HubError> {
        Ok(())
    }

    /// Deliver one change event to the client.
    async fn send(&self, event: &FileChangeEvent) -> Result<(), HubError>;
}

/// A client connection: a stable id plus the sink that reaches it.
#[derive(Clone)]
pub struct Connection {
    id: ConnectionId,
    sink: Arc<dyn ClientSink>,
}

impl Connection {
    /// Wrap a sink with a fresh id.
    #[must_use]
    pub fn new(sink: impl ClientSink + 'static) -> Self {
        Self::from_arc(Arc::new(sink))
    }

    /// Wrap a shared sink with a fresh id.
    #[must_use]
    pub fn from_arc(sink: Arc<dyn ClientSink>) -> Self {
        Self {
            id: ConnectionId::new(),
            sink,
        }
    }

    /// Identity of this connection.
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub(crate) async fn accept(&self) -> Result<(), HubError> {
        self.sink.accept().await
    }

    pub(crate) async fn send(&self, event: &FileChangeEvent) -> Result<(), HubError> {
        self.sink.send(event).await
    }
}

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Connection {}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Sink that forwards events into a bounded channel.
///
/// The receiving end is drained by a transport writer task. Once that task
/// drops the receiver, every send fails with [`HubError::ConnectionClosed`].
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::Sender<FileChangeEvent>,
}

impl ChannelSink {
    /// Create a sink over an existing sender.
    #[must_use]
    pub fn new(sender: mpsc::Sender<FileChangeEvent>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl ClientSink for ChannelSink {
    async fn send(&self, event: &FileChangeEvent) -> Result<(), HubError> {
        self.sender
            .send(event.clone())
            .await
            .map_err(|_| HubError::ConnectionClosed)
    }
}

/// Create a channel-backed connection and the receiver its writer drains.
#[must_use]
pub fn channel_connection(capacity: usize) -> (Connection, mpsc::Receiver<FileChangeEvent>) {
    let (tx, rx) = mpsc::channel(capacity);
    (Connection::new(ChannelSink::new(tx)), rx)
}
