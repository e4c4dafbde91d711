//! Configuration types.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::folders::DEFAULT_DENY_LIST;
use crate::store::{default_data_dir, DATABASE_FILE};
use crate::watcher::{PathFilter, WatchOptions, DEFAULT_IGNORED_DIRS};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocBridgeConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub watcher: WatcherConfig,
    pub security: SecurityConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    pub host: String,
    /// Port to bind. `0` picks a free port.
    pub port: u16,
    /// Origins allowed by CORS.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
                "http://localhost:3001".to_string(),
                "http://127.0.0.1:3001".to_string(),
            ],
        }
    }
}

impl ServerConfig {
    /// Parse `host:port` into a socket address.
    ///
    /// # Errors
    ///
    /// Returns the parse error if `host` is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// Persistent storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the registry database.
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl StorageConfig {
    /// Full path of the registry database.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}

/// Folder watch settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Use the polling backend instead of native notifications.
    pub use_polling: bool,
    /// Poll interval in milliseconds.
    pub poll_interval_ms: u64,
    /// Debounce window in milliseconds.
    pub debounce_ms: u64,
    /// Upper bound on waiting for a watch to stop, in milliseconds.
    pub stop_timeout_ms: u64,
    /// Directory names whose contents never produce events.
    pub ignored_dirs: Vec<String>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            use_polling: false,
            poll_interval_ms: 1000,
            debounce_ms: 300,
            stop_timeout_ms: 1000,
            ignored_dirs: DEFAULT_IGNORED_DIRS.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl WatcherConfig {
    /// Watch options derived from this section.
    #[must_use]
    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            debounce: Duration::from_millis(self.debounce_ms),
            use_polling: self.use_polling,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            stop_timeout: Duration::from_millis(self.stop_timeout_ms),
        }
    }

    /// Path filter derived from this section.
    #[must_use]
    pub fn path_filter(&self) -> PathFilter {
        PathFilter::new(self.ignored_dirs.iter().cloned())
    }
}

/// Registration policy settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Paths that can never be registered.
    pub deny_list: Vec<PathBuf>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            deny_list: DEFAULT_DENY_LIST.iter().map(PathBuf::from).collect(),
        }
    }
}
