//! Process-level lifecycle owning the store, watches, hub and dispatch task.

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::DocBridgeConfig;
use crate::folders::{FolderError, FolderService};
use crate::hub::{spawn_dispatcher, ConnectionHub};
use crate::server::{build_router, serve, AppState};
use crate::store::{FolderStore, StoreError};
use crate::watcher::WatchRegistry;

/// Errors raised while starting or running the service.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Failed to open folder store: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to initialize folder watches: {0}")]
    Folders(#[from] FolderError),

    #[error("Invalid listen address {address}: {source}")]
    Address {
        address: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// A running DocBridge instance.
///
/// Exactly one registry, hub and dispatch task exist per instance. Watches
/// feed an unbounded channel that only the dispatch task consumes.
#[derive(Debug)]
pub struct DocBridge {
    config: DocBridgeConfig,
    folders: FolderService,
    hub: Arc<ConnectionHub>,
    shutdown: CancellationToken,
    dispatcher: Option<JoinHandle<u64>>,
}

impl DocBridge {
    /// Open the store, start the dispatch task and watch every stored folder.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened or read.
    pub async fn start(config: DocBridgeConfig) -> Result<Self, AppError> {
        let store = FolderStore::open(config.storage.database_path()).await?;
        Self::start_with_store(config, store).await
    }

    /// Start with an already opened store.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored folders cannot be read.
    pub async fn start_with_store(
        config: DocBridgeConfig,
        store: FolderStore,
    ) -> Result<Self, AppError> {
        let hub = Arc::new(ConnectionHub::new());
        let shutdown = CancellationToken::new();
        let (changes_tx, changes_rx) = mpsc::unbounded_channel();

        let watches = Arc::new(WatchRegistry::with_options(
            changes_tx,
            config.watcher.path_filter(),
            config.watcher.watch_options(),
        ));
        let dispatcher = spawn_dispatcher(Arc::clone(&hub), changes_rx, shutdown.child_token());

        let folders =
            FolderService::with_deny_list(store, watches, config.security.deny_list.clone());
        let watching = folders.initialize_watchers().await?;

        tracing::info!(
            watching,
            polling = config.watcher.use_polling,
            "DocBridge started"
        );

        Ok(Self {
            config,
            folders,
            hub,
            shutdown,
            dispatcher: Some(dispatcher),
        })
    }

    /// Router serving the HTTP and WebSocket API for this instance.
    #[must_use]
    pub fn router(&self) -> Router {
        let state = AppState::new(
            self.folders.clone(),
            Arc::clone(&self.hub),
            self.shutdown.clone(),
        );
        build_router(state, &self.config.server.allowed_origins)
    }

    /// Bind the configured address and serve until [`DocBridge::shutdown_token`]
    /// is cancelled.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid, binding fails or serving fails.
    pub async fn serve(&self) -> Result<(), AppError> {
        let address = format!("{}:{}", self.config.server.host, self.config.server.port);
        let addr = self
            .config
            .server
            .socket_addr()
            .map_err(|source| AppError::Address { address, source })?;
        let listener = TcpListener::bind(addr).await?;
        self.serve_on(listener).await
    }

    /// Serve on an already bound listener.
    ///
    /// # Errors
    ///
    /// Returns an error if serving fails.
    pub async fn serve_on(&self, listener: TcpListener) -> Result<(), AppError> {
        serve(listener, self.router(), self.shutdown.clone()).await?;
        Ok(())
    }

    /// Token that stops the server and dispatch task when cancelled.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Folder service for this instance.
    #[must_use]
    pub fn folders(&self) -> &FolderService {
        &self.folders
    }

    /// Broadcast hub for this instance.
    #[must_use]
    pub fn hub(&self) -> &Arc<ConnectionHub> {
        &self.hub
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &DocBridgeConfig {
        &self.config
    }

    /// Stop every watch, then stop the dispatch task.
    ///
    /// Returns the number of events dispatched during the instance's lifetime.
    pub async fn stop(mut self) -> u64 {
        let watches = Arc::clone(self.folders.watches());
        if tokio::task::spawn_blocking(move || watches.stop_all())
            .await
            .is_err()
        {
            tracing::warn!("Watch teardown task failed");
        }

        self.shutdown.cancel();

        let dispatched = match self.dispatcher.take() {
            Some(handle) => handle.await.unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Dispatch task ended abnormally");
                0
            }),
            None => 0,
        };

        tracing::info!(dispatched, "DocBridge stopped");
        dispatched
    }
}

impl Drop for DocBridge {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
