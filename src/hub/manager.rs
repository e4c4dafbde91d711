//! Broadcast hub fanning change events out to every live connection.

use std::collections::HashMap;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::Mutex;

use super::connection::{Connection, ConnectionId};
use super::error::HubError;
use crate::watcher::FileChangeEvent;

/// Default upper bound on a single client send.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of one broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Connections that accepted the message.
    pub delivered: usize,
    /// Connections whose send failed and that were disconnected.
    pub dropped: Vec<ConnectionId>,
}

/// Thread-safe set of live client connections.
///
/// The lock is held only to copy or mutate the set. Sends run outside the
/// lock and concurrently, so one stalled client cannot hold up the others.
#[derive(Debug)]
pub struct ConnectionHub {
    connections: Mutex<HashMap<ConnectionId, Connection>>,
    send_timeout: Duration,
}

impl ConnectionHub {
    /// Create an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self::with_send_timeout(DEFAULT_SEND_TIMEOUT)
    }

    /// Create an empty hub with a custom per-send timeout.
    #[must_use]
    pub fn with_send_timeout(send_timeout: Duration) -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
            send_timeout,
        }
    }

    /// Perform the connection handshake, then add it to the live set.
    ///
    /// # Errors
    ///
    /// Returns the sink's handshake error; the connection is not added.
    pub async fn connect(&self, connection: Connection) -> Result<(), HubError> {
        connection.accept().await?;

        let id = connection.id();
        let active = {
            let mut connections = self.connections.lock().await;
            connections.insert(id, connection);
            connections.len()
        };

        tracing::info!(connection_id = %id, active, "Client connected");
        Ok(())
    }

    /// Remove a connection from the live set.
    ///
    /// Idempotent: returns `false` if it was not present.
    pub async fn disconnect(&self, id: ConnectionId) -> bool {
        let (removed, active) = {
            let mut connections = self.connections.lock().await;
            let removed = connections.remove(&id).is_some();
            (removed, connections.len())
        };

        if removed {
            tracing::info!(connection_id = %id, active, "Client disconnected");
        }
        removed
    }

    /// Send `event` to every live connection.
    ///
    /// Connections whose send fails or times out are disconnected after all
    /// sends have completed. Failures never propagate to the caller.
    pub async fn broadcast(&self, event: &FileChangeEvent) -> BroadcastReport {
        let snapshot: Vec<Connection> = self.connections.lock().await.values().cloned().collect();
        if snapshot.is_empty() {
            return BroadcastReport::default();
        }

        let send_timeout = self.send_timeout;
        let results = join_all(snapshot.iter().map(|connection| async move {
            let result = match tokio::time::timeout(send_timeout, connection.send(event)).await {
                Ok(result) => result,
                Err(_) => Err(HubError::SendTimeout(
                    u64::try_from(send_timeout.as_millis()).unwrap_or(u64::MAX),
                )),
            };
            (connection.id(), result)
        }))
        .await;

        let mut report = BroadcastReport::default();
        for (id, result) in results {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!(connection_id = %id, error = %e, "Failed to send message");
                    report.dropped.push(id);
                }
            }
        }

        for id in &report.dropped {
            self.disconnect(*id).await;
        }

        report
    }

    /// Number of live connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.lock().await.len()
    }

    /// Whether `id` is in the live set.
    pub async fn is_connected(&self, id: ConnectionId) -> bool {
        self.connections.lock().await.contains_key(&id)
    }

    /// Ids of every live connection.
    pub async fn connection_ids(&self) -> Vec<ConnectionId> {
        let mut ids: Vec<ConnectionId> = self.connections.lock().await.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for ConnectionHub {
    fn default() -> Self {
        Self::new()
    }
}
