//! In-memory identity store.
//!
//! Backed by a [`DashMap`] keyed on the identity's `SensitiveString`, so both
//! keys and records are zeroed when they leave the map. Useful for tests and
//! for embedding the repository where persistence is not wanted.

use dashmap::DashMap;
use sqrl_core::repository::identity::IdentityStore;
use sqrl_types::error::StorageError;
use sqrl_types::identity::{Identity, SensitiveString};

#[derive(Default)]
pub struct MemoryIdentityStore {
    records: DashMap<SensitiveString, Identity>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl IdentityStore for MemoryIdentityStore {
    async fn fetch(&self, primary_id: &str) -> Result<Option<Identity>, StorageError> {
        Ok(self
            .records
            .get(primary_id.as_bytes())
            .map(|entry| entry.value().clone()))
    }

    async fn upsert(&self, identity: &Identity) -> Result<(), StorageError> {
        self.records
            .insert(identity.primary_id.clone(), identity.clone());
        Ok(())
    }

    async fn remove(&self, primary_id: &str) -> Result<(), StorageError> {
        self.records.remove(primary_id.as_bytes());
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
