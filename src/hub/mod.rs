//! Connection hub that broadcasts file changes to subscribed clients.

mod connection;
mod dispatch;
mod error;
mod manager;

pub use connection::{
    channel_connection, ChannelSink, ClientSink, Connection, ConnectionId, DEFAULT_CLIENT_BUFFER,
};
pub use dispatch::spawn_dispatcher;
pub use error::HubError;
pub use manager::{BroadcastReport, ConnectionHub, DEFAULT_SEND_TIMEOUT};
