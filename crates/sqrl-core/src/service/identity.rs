//! Validating identity repository.
//!
//! `IdentityRepository` is the operation surface the protocol handler calls.
//! Every operation has exactly one implementation, the `*_with` form taking
//! an [`OperationContext`]; the plain form runs it under
//! [`OperationContext::background`]. Each `*_with` call goes through the same
//! steps:
//!
//! 1. fail with `Cancelled` / `DeadlineExceeded` if the context already fired
//! 2. reject absent or malformed input
//! 3. one store round trip, raced against the context
//!
//! A context that fires before step 3 guarantees the store was never
//! touched. One that fires during step 3 only abandons the wait: a write may
//! still have been applied, and the caller has to re-read to find out.

use sqrl_types::error::IdentityError;
use sqrl_types::identity::Identity;

use crate::context::OperationContext;
use crate::repository::identity::IdentityStore;
use crate::secure::SecureIdentity;
use crate::validation::{validate_identifier, validate_key_material};

/// CRUD contract over identity records, generic over the storage port.
///
/// Holds nothing but the store handle, so it is `Send + Sync` whenever the
/// store is and can be shared behind an `Arc`.
pub struct IdentityRepository<S: IdentityStore> {
    store: S,
}

fn log_failure(op: &'static str, err: &IdentityError) {
    match err {
        IdentityError::Storage(cause) => tracing::warn!(op, error = %cause, "identity store call failed"),
        IdentityError::NotFound => tracing::debug!(op, "identity not found"),
        other => tracing::debug!(op, error = %other, "identity operation rejected"),
    }
}

impl<S: IdentityStore> IdentityRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Look up an identity. A missing record is `NotFound`.
    pub async fn find(&self, id: &str) -> Result<Identity, IdentityError> {
        let ctx = OperationContext::background();
        self.find_with(&ctx, id).await
    }

    #[tracing::instrument(name = "identity.find", skip_all, fields(id_len = id.len()))]
    pub async fn find_with(
        &self,
        ctx: &OperationContext,
        id: &str,
    ) -> Result<Identity, IdentityError> {
        let result = async {
            ctx.check()?;
            validate_identifier(id)?;
            ctx.run(async { self.store.fetch(id).await.map_err(IdentityError::from) })
                .await?
                .ok_or(IdentityError::NotFound)
        }
        .await;

        match &result {
            Ok(_) => tracing::debug!(op = "find", "identity loaded"),
            Err(err) => log_failure("find", err),
        }
        result
    }

    /// Look up an identity and hand it back inside a [`SecureIdentity`].
    pub async fn find_secure(&self, id: &str) -> Result<SecureIdentity, IdentityError> {
        let ctx = OperationContext::background();
        self.find_secure_with(&ctx, id).await
    }

    pub async fn find_secure_with(
        &self,
        ctx: &OperationContext,
        id: &str,
    ) -> Result<SecureIdentity, IdentityError> {
        self.find_with(ctx, id).await.map(SecureIdentity::new)
    }

    /// Insert or fully replace the record keyed by `identity.primary_id`.
    ///
    /// Accepts `&Identity` or `Option<&Identity>`; `None` is `NilInput`.
    pub async fn save<'a>(
        &self,
        identity: impl Into<Option<&'a Identity>>,
    ) -> Result<(), IdentityError> {
        let ctx = OperationContext::background();
        self.save_with(&ctx, identity).await
    }

    /// Context-aware [`save`](Self::save).
    ///
    /// `Cancelled` or `DeadlineExceeded` raised before the store call means
    /// nothing was written. Raised mid-flight, the upsert may or may not have
    /// committed; re-read with [`find`](Self::find) before acting on it.
    #[tracing::instrument(name = "identity.save", skip_all)]
    pub async fn save_with<'a>(
        &self,
        ctx: &OperationContext,
        identity: impl Into<Option<&'a Identity>>,
    ) -> Result<(), IdentityError> {
        let identity: Option<&Identity> = identity.into();

        let result = async {
            ctx.check()?;
            let identity = identity.ok_or(IdentityError::NilInput)?;
            validate_identifier(identity.primary_id.as_str())?;
            validate_key_material(identity)?;
            ctx.run(async { self.store.upsert(identity).await.map_err(IdentityError::from) })
                .await
        }
        .await;

        match &result {
            Ok(()) => tracing::debug!(op = "save", "identity saved"),
            Err(err) => log_failure("save", err),
        }
        result
    }

    /// Delete the record. Deleting an unknown identifier succeeds, so callers
    /// may retry freely.
    pub async fn delete(&self, id: &str) -> Result<(), IdentityError> {
        let ctx = OperationContext::background();
        self.delete_with(&ctx, id).await
    }

    /// Context-aware [`delete`](Self::delete). As with
    /// [`save_with`](Self::save_with), a mid-flight cancellation leaves the
    /// outcome unknown; since delete is idempotent, retrying is safe.
    #[tracing::instrument(name = "identity.delete", skip_all, fields(id_len = id.len()))]
    pub async fn delete_with(&self, ctx: &OperationContext, id: &str) -> Result<(), IdentityError> {
        let result = async {
            ctx.check()?;
            validate_identifier(id)?;
            ctx.run(async { self.store.remove(id).await.map_err(IdentityError::from) })
                .await
        }
        .await;

        match &result {
            Ok(()) => tracing::debug!(op = "delete", "identity deleted"),
            Err(err) => log_failure("delete", err),
        }
        result
    }

    /// Create or extend the backing schema. Safe to call on every start.
    pub async fn ensure_schema(&self) -> Result<(), IdentityError> {
        let ctx = OperationContext::background();
        self.ensure_schema_with(&ctx).await
    }

    #[tracing::instrument(name = "identity.ensure_schema", skip_all)]
    pub async fn ensure_schema_with(&self, ctx: &OperationContext) -> Result<(), IdentityError> {
        let result = ctx
            .run(async { self.store.ensure_schema().await.map_err(IdentityError::from) })
            .await;

        match &result {
            Ok(()) => tracing::info!(op = "ensure_schema", "identity schema ready"),
            Err(err) => log_failure("ensure_schema", err),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use sqrl_types::error::{StorageOp, ValidationError};
    use sqrl_types::identity::ButtonResponse;

    use super::*;
    use crate::testutil::{CountingStore, IDK};

    fn repo() -> IdentityRepository<CountingStore> {
        IdentityRepository::new(CountingStore::new())
    }

    fn full_identity() -> Identity {
        let mut identity = Identity::new(IDK, "U1", "V1");
        identity.previous_id = Some("previous-idk".into());
        identity.rotated_to_id = Some("rotated-idk".into());
        identity.sole_auth = true;
        identity.hard_lock = true;
        identity.disabled = true;
        identity.button_response = ButtonResponse::new(3).unwrap();
        identity
    }

    #[tokio::test]
    async fn test_save_then_find_round_trips_every_field() {
        let repo = repo();
        let identity = full_identity();
        repo.save(&identity).await.unwrap();
        assert_eq!(repo.find(IDK).await.unwrap(), identity);
    }

    #[tokio::test]
    async fn test_save_replaces_instead_of_merging() {
        let repo = repo();
        repo.save(&full_identity()).await.unwrap();

        let replacement = Identity::new(IDK, "U2", "V2");
        repo.save(&replacement).await.unwrap();

        let found = repo.find(IDK).await.unwrap();
        assert_eq!(found, replacement);
        assert!(found.previous_id.is_none());
        assert!(!found.hard_lock);
        assert_eq!(repo.store().len(), 1);
    }

    #[tokio::test]
    async fn test_find_missing_is_not_found() {
        let repo = repo();
        let err = repo.find("never-saved-id").await.unwrap_err();
        assert!(matches!(err, IdentityError::NotFound));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let repo = repo();
        repo.delete(IDK).await.unwrap();
        repo.delete(IDK).await.unwrap();

        repo.save(&full_identity()).await.unwrap();
        repo.delete(IDK).await.unwrap();
        repo.delete(IDK).await.unwrap();
        assert!(matches!(repo.find(IDK).await, Err(IdentityError::NotFound)));
    }

    #[tokio::test]
    async fn test_invalid_identifiers_never_reach_the_store() {
        let repo = repo();

        assert!(matches!(
            repo.find("").await,
            Err(IdentityError::Validation(ValidationError::EmptyKey))
        ));
        assert!(matches!(
            repo.delete(&"A".repeat(257)).await,
            Err(IdentityError::Validation(ValidationError::KeyTooLong))
        ));
        assert!(matches!(
            repo.find_secure("abc def").await,
            Err(IdentityError::Validation(ValidationError::InvalidFormat))
        ));
        let bad = Identity::new("abc\u{200B}def", "U1", "V1");
        assert!(matches!(
            repo.save(&bad).await,
            Err(IdentityError::Validation(ValidationError::InvalidFormat))
        ));

        assert_eq!(repo.store().calls(), 0);
    }

    #[tokio::test]
    async fn test_save_none_is_nil_input() {
        let repo = repo();
        let err = repo.save(None::<&Identity>).await.unwrap_err();
        assert!(matches!(err, IdentityError::NilInput));
        assert_eq!(repo.store().calls(), 0);
    }

    #[tokio::test]
    async fn test_save_without_key_material_never_reaches_the_store() {
        let repo = repo();
        for (unlock, verify) in [("", ""), ("", "V1"), ("U1", "")] {
            let err = repo
                .save(&Identity::new(IDK, unlock, verify))
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                IdentityError::Validation(ValidationError::MissingKeyMaterial)
            ));
        }
        assert_eq!(repo.store().calls(), 0);
        assert_eq!(repo.store().len(), 0);
    }

    #[tokio::test]
    async fn test_storage_failure_is_wrapped() {
        let repo = IdentityRepository::new(CountingStore::failing());
        match repo.save(&full_identity()).await {
            Err(IdentityError::Storage(cause)) => {
                assert_eq!(cause.op(), StorageOp::Save);
                assert!(!cause.to_string().contains("U1"));
            }
            other => panic!("expected storage error, got {other:?}"),
        }
        assert!(matches!(
            repo.find(IDK).await,
            Err(IdentityError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn test_cancelled_context_pre_empts_every_operation() {
        let repo = repo();
        let ctx = OperationContext::background();
        ctx.cancel();

        assert!(matches!(repo.find_with(&ctx, IDK).await, Err(IdentityError::Cancelled)));
        assert!(matches!(
            repo.find_secure_with(&ctx, IDK).await,
            Err(IdentityError::Cancelled)
        ));
        assert!(matches!(
            repo.save_with(&ctx, &full_identity()).await,
            Err(IdentityError::Cancelled)
        ));
        assert!(matches!(repo.delete_with(&ctx, IDK).await, Err(IdentityError::Cancelled)));
        assert!(matches!(
            repo.ensure_schema_with(&ctx).await,
            Err(IdentityError::Cancelled)
        ));

        assert_eq!(repo.store().calls(), 0);
        assert_eq!(repo.store().len(), 0);
    }

    #[tokio::test]
    async fn test_cancellation_is_reported_ahead_of_input_errors() {
        let repo = repo();
        let ctx = OperationContext::background();
        ctx.cancel();
        assert!(matches!(repo.find_with(&ctx, "").await, Err(IdentityError::Cancelled)));
        assert!(matches!(repo.save_with(&ctx, None::<&Identity>).await, Err(IdentityError::Cancelled)));
    }

    #[tokio::test]
    async fn test_expired_deadline_pre_empts_io() {
        let repo = repo();
        let ctx = OperationContext::with_timeout(Duration::ZERO);
        assert!(matches!(
            repo.save_with(&ctx, &full_identity()).await,
            Err(IdentityError::DeadlineExceeded)
        ));
        assert_eq!(repo.store().calls(), 0);
    }

    #[tokio::test]
    async fn test_deadline_mid_flight_abandons_slow_store() {
        let repo = IdentityRepository::new(CountingStore::slow(Duration::from_secs(5)));
        let ctx = OperationContext::with_timeout(Duration::from_millis(20));

        let err = repo.save_with(&ctx, &full_identity()).await.unwrap_err();
        assert!(matches!(err, IdentityError::DeadlineExceeded));
        assert_eq!(repo.store().calls(), 1);
        assert_eq!(repo.store().len(), 0);
    }

    #[tokio::test]
    async fn test_cancel_mid_flight_reports_cancelled() {
        let repo = Arc::new(IdentityRepository::new(CountingStore::slow(
            Duration::from_secs(5),
        )));
        let ctx = OperationContext::background();

        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let err = repo.delete_with(&ctx, IDK).await.unwrap_err();
        assert!(matches!(err, IdentityError::Cancelled));
    }

    #[tokio::test]
    async fn test_find_secure_wraps_and_destroys() {
        let repo = repo();
        repo.save(&full_identity()).await.unwrap();

        let mut secure = repo.find_secure(IDK).await.unwrap();
        assert_eq!(secure.get_identity().unwrap().unlock_key.as_str(), "U1");

        secure.destroy();
        assert!(matches!(secure.get_identity(), Err(IdentityError::Destroyed)));
        secure.destroy();

        // The stored record is untouched by wiping the fetched copy.
        assert_eq!(repo.find(IDK).await.unwrap().unlock_key.as_str(), "U1");
    }

    #[tokio::test]
    async fn test_find_secure_missing_is_not_found() {
        let repo = repo();
        assert!(matches!(
            repo.find_secure(IDK).await,
            Err(IdentityError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_concurrent_saves_for_different_ids() {
        let repo = Arc::new(repo());
        let mut handles = Vec::new();
        for i in 0..16 {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                let identity = Identity::new(format!("id-{i}"), "U", "V");
                repo.save(&identity).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(repo.store().len(), 16);
    }

    #[tokio::test]
    async fn test_concrete_scenario() {
        let repo = repo();
        let id = "A".repeat(44);

        repo.save(&Identity::new(id.as_str(), "U1", "V1")).await.unwrap();
        assert_eq!(repo.find(&id).await.unwrap().unlock_key.as_str(), "U1");
        repo.delete(&id).await.unwrap();
        assert!(matches!(repo.find(&id).await, Err(IdentityError::NotFound)));
    }
}
