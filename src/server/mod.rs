//! HTTP and WebSocket transport.

mod api;
mod error;
mod handlers;
#[allow(clippy::module_inception)]
mod server;
mod ws;

pub use api::*;
pub use error::ApiError;
pub use handlers::AppState;
pub use server::{build_router, serve};
