//! Hub error types.

/// Errors raised while delivering messages to a client connection.
#[derive(thiserror::Error, Debug)]
pub enum HubError {
    /// The client side of the connection is gone.
    #[error("Connection closed")]
    ConnectionClosed,

    /// The send did not complete in time.
    #[error("Send timed out after {0} ms")]
    SendTimeout(u64),

    /// The transport handshake failed.
    #[error("Handshake failed: {0}")]
    Handshake(String),

    /// The transport rejected the message.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Failed to serialize the message.
    #[error("JSON serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
