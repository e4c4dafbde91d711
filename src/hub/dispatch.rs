//! Dispatch task bridging watcher output to the hub.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::manager::ConnectionHub;
use crate::watcher::FileChangeEvent;

/// Spawn the task that broadcasts every change event in arrival order.
///
/// The task ends when `shutdown` is cancelled or every sender is dropped,
/// and yields the number of events it dispatched.
pub fn spawn_dispatcher(
    hub: Arc<ConnectionHub>,
    mut changes: mpsc::UnboundedReceiver<FileChangeEvent>,
    shutdown: CancellationToken,
) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut dispatched = 0u64;

        loop {
            tokio::select! {
                biased;

                () = shutdown.cancelled() => {
                    tracing::debug!("Dispatch task received shutdown signal");
                    break;
                }

                event = changes.recv() => {
                    let Some(event) = event else {
                        tracing::debug!("Change channel closed");
                        break;
                    };

                    let report = hub.broadcast(&event).await;
                    dispatched += 1;
                    tracing::debug!(
                        folder_id = event.folder_id,
                        event = %event.event,
                        path = %event.path,
                        delivered = report.delivered,
                        dropped = report.dropped.len(),
                        "Dispatched file change"
                    );
                }
            }
        }

        dispatched
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::channel_connection;
    use crate::watcher::ChangeKind;
    use std::path::Path;
    use std::time::Duration;

    #[tokio::test]
    async fn test_dispatcher_broadcasts_in_order() {
        let hub = Arc::new(ConnectionHub::new());
        let (conn, mut rx) = channel_connection(8);
        hub.connect(conn).await.unwrap();

        let (tx, changes) = mpsc::unbounded_channel();
        let handle = spawn_dispatcher(Arc::clone(&hub), changes, CancellationToken::new());

        let first = FileChangeEvent::new(ChangeKind::Created, Path::new("/d/a.md"), 1);
        let second = FileChangeEvent::new(ChangeKind::Deleted, Path::new("/d/a.md"), 1);
        tx.send(first.clone()).unwrap();
        tx.send(second.clone()).unwrap();

        assert_eq!(rx.recv().await.unwrap(), first);
        assert_eq!(rx.recv().await.unwrap(), second);

        drop(tx);
        assert_eq!(handle.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_dispatcher_stops_on_cancel() {
        let hub = Arc::new(ConnectionHub::new());
        let (_tx, changes) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let handle = spawn_dispatcher(hub, changes, shutdown.clone());

        shutdown.cancel();

        let dispatched = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("dispatcher should stop")
            .unwrap();
        assert_eq!(dispatched, 0);
    }
}
