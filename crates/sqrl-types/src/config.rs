//! Configuration types for the identity store.
//!
//! `StoreConfig` represents the `store.toml` file that controls the database
//! location, pool sizing, default operation deadlines, and logging.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration. All fields have sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// sqlx connection URL for the SQLite database file.
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Size of the read-only connection pool.
    #[serde(default = "default_max_read_connections")]
    pub max_read_connections: u32,

    /// How long SQLite waits on a locked database before failing a statement.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Deadline applied to contexts built with `OperationContext::from_config`.
    /// `None` means operations run without a deadline.
    #[serde(default)]
    pub operation_timeout_ms: Option<u64>,

    #[serde(default)]
    pub logging: LogConfig,
}

fn default_database_url() -> String {
    "sqlite://sqrl-identities.db".to_string()
}

fn default_max_read_connections() -> u32 {
    8
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

impl StoreConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            max_read_connections: default_max_read_connections(),
            busy_timeout_ms: default_busy_timeout_ms(),
            operation_timeout_ms: None,
            logging: LogConfig::default(),
        }
    }
}

/// `[logging]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// `EnvFilter` directive string, e.g. `"info,sqrl_infra=debug"`.
    #[serde(default = "default_filter")]
    pub filter: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,

    /// Bridge spans to OpenTelemetry (stdout exporter).
    #[serde(default)]
    pub otel: bool,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: false,
            otel: false,
        }
    }
}
