//! Additive schema management for the `identities` table.
//!
//! [`ensure_schema`] creates the table when absent and adds any column from
//! [`COLUMNS`] that an older table lacks. It never drops, renames, or
//! rewrites anything. Several processes may run it at once: table creation
//! uses `IF NOT EXISTS`, and an `ADD COLUMN` that loses the race to another
//! process fails with "duplicate column name", which is treated as success.

use sqlx::SqlitePool;
use sqrl_types::error::{StorageError, StorageOp};

pub const TABLE: &str = "identities";

pub struct Column {
    pub name: &'static str,
    /// Definition used in `CREATE TABLE`.
    pub create: &'static str,
    /// Definition used in `ALTER TABLE ... ADD COLUMN`, which SQLite only
    /// accepts with a default for NOT NULL columns. `None` for columns that
    /// cannot be added after the fact.
    pub add: Option<&'static str>,
}

pub const COLUMNS: &[Column] = &[
    Column {
        name: "primary_id",
        create: "TEXT PRIMARY KEY NOT NULL",
        add: None,
    },
    Column {
        name: "unlock_key",
        create: "TEXT NOT NULL",
        add: Some("TEXT NOT NULL DEFAULT ''"),
    },
    Column {
        name: "verify_key",
        create: "TEXT NOT NULL",
        add: Some("TEXT NOT NULL DEFAULT ''"),
    },
    Column {
        name: "previous_id",
        create: "TEXT",
        add: Some("TEXT"),
    },
    Column {
        name: "sole_auth_flag",
        create: "BOOLEAN NOT NULL DEFAULT 0",
        add: Some("BOOLEAN NOT NULL DEFAULT 0"),
    },
    Column {
        name: "hard_lock_flag",
        create: "BOOLEAN NOT NULL DEFAULT 0",
        add: Some("BOOLEAN NOT NULL DEFAULT 0"),
    },
    Column {
        name: "disabled_flag",
        create: "BOOLEAN NOT NULL DEFAULT 0",
        add: Some("BOOLEAN NOT NULL DEFAULT 0"),
    },
    Column {
        name: "rotated_to_id",
        create: "TEXT",
        add: Some("TEXT"),
    },
    Column {
        name: "button_response",
        create: "INTEGER NOT NULL DEFAULT 0 CHECK (button_response BETWEEN 0 AND 3)",
        add: Some("INTEGER NOT NULL DEFAULT 0 CHECK (button_response BETWEEN 0 AND 3)"),
    },
];

fn create_table_sql() -> String {
    let columns = COLUMNS
        .iter()
        .map(|c| format!("{} {}", c.name, c.create))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE IF NOT EXISTS {TABLE} ({columns})")
}

async fn existing_columns(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT name FROM pragma_table_info(?)")
        .bind(TABLE)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|(name,)| name).collect())
}

fn is_duplicate_column(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.message().contains("duplicate column name"))
}

/// Create or extend the `identities` table on `pool` (the writer pool).
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), StorageError> {
    let schema_err = |e: sqlx::Error| StorageError::new(StorageOp::EnsureSchema, e);

    sqlx::query(&create_table_sql())
        .execute(pool)
        .await
        .map_err(schema_err)?;

    let existing = existing_columns(pool).await.map_err(schema_err)?;

    for column in COLUMNS {
        if existing.iter().any(|name| name == column.name) {
            continue;
        }
        let Some(definition) = column.add else {
            tracing::warn!(column = column.name, "column missing and cannot be added");
            continue;
        };

        let sql = format!("ALTER TABLE {TABLE} ADD COLUMN {} {definition}", column.name);
        match sqlx::query(&sql).execute(pool).await {
            Ok(_) => tracing::info!(column = column.name, "added column to {TABLE}"),
            Err(err) if is_duplicate_column(&err) => {
                tracing::debug!(column = column.name, "column added concurrently");
            }
            Err(err) => return Err(schema_err(err)),
        }
    }

    Ok(())
}
