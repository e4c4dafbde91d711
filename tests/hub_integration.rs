//! Integration tests for the broadcast hub and dispatch task.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use docbridge::hub::{
    channel_connection, spawn_dispatcher, ClientSink, Connection, ConnectionHub, HubError,
};
use docbridge::watcher::{ChangeKind, FileChangeEvent};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

/// Sink that fails after a fixed number of successful sends.
struct FlakySink {
    remaining: AtomicUsize,
}

#[async_trait]
impl ClientSink for FlakySink {
    async fn send(&self, _event: &FileChangeEvent) -> Result<(), HubError> {
        let left = self.remaining.load(Ordering::SeqCst);
        if left == 0 {
            return Err(HubError::Transport("peer went away".to_string()));
        }
        self.remaining.store(left - 1, Ordering::SeqCst);
        Ok(())
    }
}

fn change(name: &str) -> FileChangeEvent {
    FileChangeEvent::new(ChangeKind::Modified, Path::new(&format!("/docs/{name}")), 1)
}

#[tokio::test]
async fn test_events_flow_from_channel_to_all_clients() {
    let hub = Arc::new(ConnectionHub::new());
    let (a, mut rx_a) = channel_connection(16);
    let (b, mut rx_b) = channel_connection(16);
    hub.connect(a).await.unwrap();
    hub.connect(b).await.unwrap();

    let (tx, changes) = mpsc::unbounded_channel();
    let shutdown = CancellationToken::new();
    let handle = spawn_dispatcher(Arc::clone(&hub), changes, shutdown.clone());

    for name in ["one.md", "two.md", "three.md"] {
        tx.send(change(name)).unwrap();
    }

    for rx in [&mut rx_a, &mut rx_b] {
        for name in ["one.md", "two.md", "three.md"] {
            let event = timeout(Duration::from_secs(2), rx.recv())
                .await
                .expect("Timed out")
                .expect("Channel closed");
            assert_eq!(event.path, format!("/docs/{name}"));
        }
    }

    shutdown.cancel();
    assert_eq!(handle.await.unwrap(), 3);
}

#[tokio::test]
async fn test_failing_client_is_pruned_and_others_keep_receiving() {
    let hub = Arc::new(ConnectionHub::new());
    let (good, mut rx) = channel_connection(16);
    let flaky = Connection::new(FlakySink {
        remaining: AtomicUsize::new(1),
    });
    let flaky_id = flaky.id();
    hub.connect(good).await.unwrap();
    hub.connect(flaky).await.unwrap();

    let first = hub.broadcast(&change("a.md")).await;
    assert_eq!(first.delivered, 2);

    let second = hub.broadcast(&change("b.md")).await;
    assert_eq!(second.delivered, 1);
    assert_eq!(second.dropped, vec![flaky_id]);
    assert!(!hub.is_connected(flaky_id).await);

    let third = hub.broadcast(&change("c.md")).await;
    assert_eq!(third.delivered, 1);
    assert!(third.dropped.is_empty());

    for name in ["a.md", "b.md", "c.md"] {
        assert_eq!(rx.recv().await.unwrap().path, format!("/docs/{name}"));
    }
}

#[tokio::test]
async fn test_closed_receiver_is_pruned_on_next_broadcast() {
    let hub = ConnectionHub::new();
    let (conn, rx) = channel_connection(4);
    let id = conn.id();
    hub.connect(conn).await.unwrap();
    drop(rx);

    let report = hub.broadcast(&change("gone.md")).await;

    assert_eq!(report.dropped, vec![id]);
    assert_eq!(hub.connection_count().await, 0);
}

#[tokio::test]
async fn test_concurrent_connect_disconnect_during_broadcast() {
    let hub = Arc::new(ConnectionHub::new());
    let (steady, mut steady_rx) = channel_connection(256);
    hub.connect(steady).await.unwrap();

    let churn = {
        let hub = Arc::clone(&hub);
        tokio::spawn(async move {
            for _ in 0..50 {
                let (conn, _rx) = channel_connection(4);
                let id = conn.id();
                hub.connect(conn).await.unwrap();
                tokio::task::yield_now().await;
                hub.disconnect(id).await;
            }
        })
    };

    for i in 0..50 {
        hub.broadcast(&change(&format!("{i}.md"))).await;
        tokio::task::yield_now().await;
    }
    churn.await.unwrap();

    assert_eq!(hub.connection_count().await, 1);
    for i in 0..50 {
        assert_eq!(steady_rx.recv().await.unwrap().path, format!("/docs/{i}.md"));
    }
}

#[tokio::test]
async fn test_dispatcher_ends_when_all_senders_drop() {
    let hub = Arc::new(ConnectionHub::new());
    let (tx, changes) = mpsc::unbounded_channel();
    let handle = spawn_dispatcher(hub, changes, CancellationToken::new());

    tx.send(change("only.md")).unwrap();
    drop(tx);

    let dispatched = timeout(Duration::from_secs(2), handle)
        .await
        .expect("Dispatcher did not stop")
        .unwrap();
    assert_eq!(dispatched, 1);
}
