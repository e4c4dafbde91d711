//! HTTP server with axum router and graceful shutdown.

use axum::http::{HeaderValue, Method};
use axum::routing::{delete, get};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    delete_folder, get_file_content, get_folder_tree, get_health, get_root, list_folders,
    post_folder, AppState,
};
use super::ws::watch_websocket;

/// Build the router with all routes and middleware.
///
/// Origins that are not valid header values are skipped with a warning.
pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(get_root))
        .route("/health", get(get_health))
        .route("/api/folders", get(list_folders).post(post_folder))
        .route("/api/folders/:id", delete(delete_folder))
        .route("/api/folders/:id/tree", get(get_folder_tree))
        .route("/api/files", get(get_file_content))
        .route("/ws/watch", get(watch_websocket))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origins))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
}

/// Serve `router` on `listener` until `shutdown` is cancelled.
///
/// # Errors
///
/// Returns an error if the server fails while serving.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: tokio_util::sync::CancellationToken,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(address = %addr, "Starting DocBridge server");
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            tracing::info!("DocBridge server shutting down gracefully");
        })
        .await
}
