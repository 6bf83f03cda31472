//! Database pool with split reader/writer connections in WAL mode.
//!
//! SQLite allows only one writer at a time. `DatabasePool` keeps a
//! multi-connection read-only pool for lookups and a single-connection writer
//! pool for upserts, deletes, and schema changes. Both use WAL journal mode.
//! Schema creation is not done here; call `ensure_schema` on the repository.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqrl_types::config::StoreConfig;
use sqrl_types::error::{StorageError, StorageOp};

const DEFAULT_MAX_READERS: u32 = 8;
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Split read/write pool for SQLite with WAL mode.
///
/// - `reader`: Multi-connection read-only pool for concurrent SELECT queries.
/// - `writer`: Single-connection pool for serialized writes.
#[derive(Clone)]
pub struct DatabasePool {
    pub reader: SqlitePool,
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open a pool with default sizing (8 readers, 5-second busy timeout).
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        Self::open(database_url, DEFAULT_MAX_READERS, DEFAULT_BUSY_TIMEOUT).await
    }

    /// Open a pool sized and located according to `config`.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StorageError> {
        Self::open(
            &config.database_url,
            config.max_read_connections.max(1),
            config.busy_timeout(),
        )
        .await
    }

    async fn open(
        database_url: &str,
        max_readers: u32,
        busy_timeout: Duration,
    ) -> Result<Self, StorageError> {
        let connect_err = |e: sqlx::Error| StorageError::new(StorageOp::Connect, e);

        let base_opts = SqliteConnectOptions::from_str(database_url)
            .map_err(connect_err)?
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(busy_timeout)
            .create_if_missing(true);

        let read_opts = base_opts.clone().read_only(true);
        let write_opts = base_opts;

        // The writer creates the file, so it has to be open before the
        // read-only pool connects.
        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(write_opts)
            .await
            .map_err(connect_err)?;

        let reader = SqlitePoolOptions::new()
            .max_connections(max_readers)
            .connect_with(read_opts)
            .await
            .map_err(connect_err)?;

        tracing::debug!(max_readers, "sqlite pool opened");
        Ok(Self { reader, writer })
    }

    /// Close both pools, waiting for checked-out connections to be returned.
    pub async fn close(&self) {
        self.writer.close().await;
        self.reader.close().await;
    }
}
