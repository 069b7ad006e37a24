//! Configuration loader for Parley.
//!
//! Reads `config.toml` from the data directory (`~/.parley/` in production)
//! and deserializes it into [`ParleyConfig`]. Falls back to sensible defaults
//! when the file is missing or malformed.

use std::path::{Path, PathBuf};

use parley_types::config::ParleyConfig;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "PARLEY_DATA_DIR";

/// Resolve the data directory.
///
/// Priority: `PARLEY_DATA_DIR`, then `~/.parley`, then `./.parley`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".parley");
    }

    // Last resort: current directory
    PathBuf::from(".parley")
}

/// Default SQLite URL inside the data directory. `mode=rwc` creates the file.
pub fn default_database_url(data_dir: &Path) -> String {
    format!("sqlite://{}?mode=rwc", data_dir.join("parley.db").display())
}

/// The database URL to use: the configured one, else the default location.
pub fn database_url(config: &ParleyConfig, data_dir: &Path) -> String {
    config
        .database_url
        .clone()
        .unwrap_or_else(|| default_database_url(data_dir))
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`ParleyConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_config(data_dir: &Path) -> ParleyConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return ParleyConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ParleyConfig::default();
        }
    };

    match toml::from_str::<ParleyConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ParleyConfig::default()
        }
    }
}
