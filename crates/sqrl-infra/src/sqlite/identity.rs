//! SQLite identity store implementation.
//!
//! Implements `IdentityStore` from `sqrl-core` using sqlx with split read/write
//! pools. Key material is bound as parameters and never formatted into SQL
//! or log lines.

use sqlx::Row;
use sqrl_core::repository::identity::IdentityStore;
use sqrl_types::error::{StorageError, StorageOp};
use sqrl_types::identity::{ButtonResponse, Identity, SensitiveString};

use super::pool::DatabasePool;
use super::schema;

/// SQLite-backed implementation of `IdentityStore`.
#[derive(Clone)]
pub struct SqliteIdentityStore {
    pool: DatabasePool,
}

impl SqliteIdentityStore {
    /// Create a new store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }
}

// ---------------------------------------------------------------------------
// Private Row type for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct IdentityRow {
    primary_id: String,
    unlock_key: String,
    verify_key: String,
    previous_id: Option<String>,
    sole_auth_flag: bool,
    hard_lock_flag: bool,
    disabled_flag: bool,
    rotated_to_id: Option<String>,
    button_response: i64,
}

impl IdentityRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            primary_id: row.try_get("primary_id")?,
            unlock_key: row.try_get("unlock_key")?,
            verify_key: row.try_get("verify_key")?,
            previous_id: row.try_get("previous_id")?,
            sole_auth_flag: row.try_get("sole_auth_flag")?,
            hard_lock_flag: row.try_get("hard_lock_flag")?,
            disabled_flag: row.try_get("disabled_flag")?,
            rotated_to_id: row.try_get("rotated_to_id")?,
            button_response: row.try_get("button_response")?,
        })
    }

    /// Moves each decoded `String` into its `SensitiveString` without copying.
    fn into_identity(self) -> Result<Identity, StorageError> {
        let button_response = ButtonResponse::try_from(self.button_response)
            .map_err(|e| StorageError::new(StorageOp::Find, e))?;

        Ok(Identity {
            primary_id: SensitiveString::new(self.primary_id),
            unlock_key: SensitiveString::new(self.unlock_key),
            verify_key: SensitiveString::new(self.verify_key),
            previous_id: self.previous_id.map(SensitiveString::new),
            sole_auth: self.sole_auth_flag,
            hard_lock: self.hard_lock_flag,
            disabled: self.disabled_flag,
            rotated_to_id: self.rotated_to_id.map(SensitiveString::new),
            button_response,
        })
    }
}

const SELECT_SQL: &str = "SELECT primary_id, unlock_key, verify_key, previous_id, sole_auth_flag, \
     hard_lock_flag, disabled_flag, rotated_to_id, button_response \
     FROM identities WHERE primary_id = ?";

// Single statement: SQLite applies the insert-or-replace atomically.
const UPSERT_SQL: &str = "INSERT INTO identities (primary_id, unlock_key, verify_key, previous_id, \
     sole_auth_flag, hard_lock_flag, disabled_flag, rotated_to_id, button_response) \
     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
     ON CONFLICT(primary_id) DO UPDATE SET \
     unlock_key = excluded.unlock_key, \
     verify_key = excluded.verify_key, \
     previous_id = excluded.previous_id, \
     sole_auth_flag = excluded.sole_auth_flag, \
     hard_lock_flag = excluded.hard_lock_flag, \
     disabled_flag = excluded.disabled_flag, \
     rotated_to_id = excluded.rotated_to_id, \
     button_response = excluded.button_response";

const DELETE_SQL: &str = "DELETE FROM identities WHERE primary_id = ?";

// ---------------------------------------------------------------------------
// IdentityStore implementation
// ---------------------------------------------------------------------------

impl IdentityStore for SqliteIdentityStore {
    async fn fetch(&self, primary_id: &str) -> Result<Option<Identity>, StorageError> {
        let row = sqlx::query(SELECT_SQL)
            .bind(primary_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| StorageError::new(StorageOp::Find, e))?;

        match row {
            Some(row) => {
                let identity_row = IdentityRow::from_row(&row)
                    .map_err(|e| StorageError::new(StorageOp::Find, e))?;
                Ok(Some(identity_row.into_identity()?))
            }
            None => Ok(None),
        }
    }

    async fn upsert(&self, identity: &Identity) -> Result<(), StorageError> {
        sqlx::query(UPSERT_SQL)
            .bind(identity.primary_id.as_str())
            .bind(identity.unlock_key.as_str())
            .bind(identity.verify_key.as_str())
            .bind(identity.previous_id.as_ref().map(SensitiveString::as_str))
            .bind(identity.sole_auth)
            .bind(identity.hard_lock)
            .bind(identity.disabled)
            .bind(identity.rotated_to_id.as_ref().map(SensitiveString::as_str))
            .bind(i64::from(identity.button_response.get()))
            .execute(&self.pool.writer)
            .await
            .map_err(|e| StorageError::new(StorageOp::Save, e))?;

        Ok(())
    }

    async fn remove(&self, primary_id: &str) -> Result<(), StorageError> {
        sqlx::query(DELETE_SQL)
            .bind(primary_id)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| StorageError::new(StorageOp::Delete, e))?;

        Ok(())
    }

    async fn ensure_schema(&self) -> Result<(), StorageError> {
        schema::ensure_schema(&self.pool.writer).await
    }
}
