//! DocBridge - Watch documentation folders and broadcast markdown changes.

pub mod app;
pub mod config;
pub mod folders;
pub mod hub;
pub mod server;
pub mod store;
pub mod watcher;

pub use app::{AppError, DocBridge};
