//! Store configuration loader.
//!
//! Reads a `store.toml` file and deserializes it into [`StoreConfig`]. Falls
//! back to defaults when the file is missing or malformed.

use std::path::Path;

use sqrl_types::config::StoreConfig;

/// Conventional file name inside a deployment's config directory.
pub const CONFIG_FILE_NAME: &str = "store.toml";

/// Load configuration from `path`.
///
/// - If the file does not exist, returns [`StoreConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_store_config(path: &Path) -> StoreConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No store config at {}, using defaults", path.display());
            return StoreConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return StoreConfig::default();
        }
    };

    match toml::from_str::<StoreConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            StoreConfig::default()
        }
    }
}

/// Load `{config_dir}/store.toml`.
pub async fn load_store_config_from_dir(config_dir: &Path) -> StoreConfig {
    load_store_config(&config_dir.join(CONFIG_FILE_NAME)).await
}
