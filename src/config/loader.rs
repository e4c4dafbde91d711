//! Configuration file loader with environment overrides.

use std::path::{Path, PathBuf};

use super::types::DocBridgeConfig;

/// Environment variable overriding `storage.data_dir`.
pub const ENV_DATA_DIR: &str = "DOCBRIDGE_DATA_DIR";
/// Environment variable overriding `watcher.use_polling`.
pub const ENV_USE_POLLING: &str = "DOCBRIDGE_USE_POLLING";
/// Environment variable overriding `server.allowed_origins`, comma-separated.
pub const ENV_ALLOWED_ORIGINS: &str = "DOCBRIDGE_ALLOWED_ORIGINS";
/// Environment variable overriding `server.host`.
pub const ENV_HOST: &str = "DOCBRIDGE_HOST";
/// Environment variable overriding `server.port`.
pub const ENV_PORT: &str = "DOCBRIDGE_PORT";

/// Configuration loader that searches multiple locations.
#[derive(Debug)]
pub struct ConfigLoader {
    /// Search paths in order of priority.
    search_paths: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default search paths.
    #[must_use]
    pub fn new() -> Self {
        let mut search_paths = vec![PathBuf::from("docbridge.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            search_paths.push(config_dir.join("docbridge").join("config.toml"));
        }

        Self { search_paths }
    }

    /// Create a config loader with a specific config file path.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            search_paths: vec![path],
        }
    }

    /// Load the first available file, or defaults, then apply the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed, or an
    /// override variable holds an invalid value.
    pub fn load(&self) -> Result<DocBridgeConfig, ConfigError> {
        let mut config = self.load_file()?;
        apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Load the first available file without environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed.
    pub fn load_file(&self) -> Result<DocBridgeConfig, ConfigError> {
        match self.find_config_file() {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading config file");
                Self::load_from_path(&path)
            }
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(DocBridgeConfig::default())
            }
        }
    }

    fn load_from_path(path: &Path) -> Result<DocBridgeConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the search paths for debugging.
    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Find the first config file that exists.
    #[must_use]
    pub fn find_config_file(&self) -> Option<PathBuf> {
        self.search_paths.iter().find(|p| p.exists()).cloned()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply `DOCBRIDGE_*` overrides read through `lookup`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnv`] for an unparsable port or boolean.
pub fn apply_env_overrides<F>(config: &mut DocBridgeConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.trim().is_empty()) {
        config.storage.data_dir = PathBuf::from(dir.trim());
    }

    if let Some(value) = lookup(ENV_USE_POLLING) {
        config.watcher.use_polling = parse_bool(ENV_USE_POLLING, &value)?;
    }

    if let Some(origins) = lookup(ENV_ALLOWED_ORIGINS) {
        config.server.allowed_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect();
    }

    if let Some(host) = lookup(ENV_HOST).filter(|v| !v.trim().is_empty()) {
        config.server.host = host.trim().to_string();
    }

    if let Some(port) = lookup(ENV_PORT) {
        config.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
            name: ENV_PORT,
            value: port.clone(),
        })?;
    }

    Ok(())
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            name,
            value: value.to_string(),
        }),
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },
}
