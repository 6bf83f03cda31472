//! In-crate store double that counts calls and can be made slow or failing.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use sqrl_types::error::{StorageError, StorageOp};
use sqrl_types::identity::Identity;

use crate::repository::identity::IdentityStore;

pub(crate) const IDK: &str = "m6ZgJ0Syl9wdJ6Kl4HI5jmczUBzB8bB7GsA1wsmpbIU";

#[derive(Default)]
pub(crate) struct CountingStore {
    records: Mutex<HashMap<String, Identity>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
    failing: bool,
}

impl CountingStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Number of store calls that were started.
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    async fn enter(&self, op: StorageOp) -> Result<(), StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing {
            return Err(StorageError::new(op, "backend unavailable"));
        }
        Ok(())
    }
}

impl IdentityStore for CountingStore {
    async fn fetch(&self, primary_id: &str) -> Result<Option<Identity>, StorageError> {
        self.enter(StorageOp::Find).await?;
        Ok(self.records.lock().unwrap().get(primary_id).cloned())
    }

    async fn upsert(&self, identity: &Identity) -> Result<(), StorageError> {
        self.enter(StorageOp::Save).await?;
        self.records
            .lock()
            .unwrap()
            .insert(identity.primary_id.as_str().to_owned(), identity.clone());
        Ok(())
    }

    async fn remove(&self, primary_id: &str) -> Result<(), StorageError> {
        self.enter(StorageOp::Delete).await?;
        self.records.lock().unwrap().remove(primary_id);
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<(), StorageError> {
        self.enter(StorageOp::EnsureSchema).await
    }
}
