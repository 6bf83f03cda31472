//! Identity store trait definition.

use std::future::Future;
use std::sync::Arc;

use sqrl_types::error::StorageError;
use sqrl_types::identity::Identity;

/// Raw persistence for identity records.
///
/// Implementations perform exactly one round trip per call (schema setup
/// excepted) and do no validation of their own: the
/// [`IdentityRepository`](crate::service::identity::IdentityRepository)
/// validates before calling in. Implementations live in sqrl-infra (e.g.
/// `SqliteIdentityStore`, `MemoryIdentityStore`) and use native async fn in
/// traits.
pub trait IdentityStore: Send + Sync {
    /// Load the record keyed by `primary_id`. A missing row is `Ok(None)`.
    fn fetch(
        &self,
        primary_id: &str,
    ) -> impl Future<Output = Result<Option<Identity>, StorageError>> + Send;

    /// Insert the record, or replace every field of the existing record with
    /// the same `primary_id`, in one atomic statement.
    fn upsert(&self, identity: &Identity) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Delete the record if present. Deleting a missing record succeeds.
    fn remove(&self, primary_id: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Create the backing structure or add missing columns. Never drops or
    /// renames anything and never deletes data.
    fn ensure_schema(&self) -> impl Future<Output = Result<(), StorageError>> + Send;
}

impl<S: IdentityStore> IdentityStore for Arc<S> {
    fn fetch(
        &self,
        primary_id: &str,
    ) -> impl Future<Output = Result<Option<Identity>, StorageError>> + Send {
        (**self).fetch(primary_id)
    }

    fn upsert(&self, identity: &Identity) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).upsert(identity)
    }

    fn remove(&self, primary_id: &str) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).remove(primary_id)
    }

    fn ensure_schema(&self) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).ensure_schema()
    }
}
