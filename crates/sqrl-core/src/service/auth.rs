//! Storage capability consumed by the SQRL protocol handler.
//!
//! The protocol handler depends on [`AuthStore`] alone and exchanges
//! [`ProtocolIdentity`] values. [`IdentityRepository`] implements it by
//! converting at the boundary and delegating to its own operations, so all
//! validation and wiping rules apply unchanged.

use std::future::Future;

use sqrl_types::error::IdentityError;
use sqrl_types::identity::Identity;
use sqrl_types::protocol::ProtocolIdentity;

use crate::repository::identity::IdentityStore;
use crate::service::identity::IdentityRepository;

pub trait AuthStore: Send + Sync {
    /// Load the identity for `idk`, or `NotFound`.
    fn find_identity(
        &self,
        idk: &str,
    ) -> impl Future<Output = Result<ProtocolIdentity, IdentityError>> + Send;

    /// Insert or replace. `None` is `NilInput`.
    fn save_identity(
        &self,
        identity: Option<&ProtocolIdentity>,
    ) -> impl Future<Output = Result<(), IdentityError>> + Send;

    /// Delete; unknown identifiers succeed.
    fn delete_identity(&self, idk: &str) -> impl Future<Output = Result<(), IdentityError>> + Send;
}

impl<S: IdentityStore> AuthStore for IdentityRepository<S> {
    async fn find_identity(&self, idk: &str) -> Result<ProtocolIdentity, IdentityError> {
        let mut secure = self.find_secure(idk).await?;
        let found = ProtocolIdentity::from(secure.get_identity()?);
        secure.destroy();
        Ok(found)
    }

    async fn save_identity(&self, identity: Option<&ProtocolIdentity>) -> Result<(), IdentityError> {
        let Some(identity) = identity else {
            return Err(IdentityError::NilInput);
        };
        let identity = Identity::try_from(identity.clone())?;
        self.save(&identity).await
    }

    async fn delete_identity(&self, idk: &str) -> Result<(), IdentityError> {
        self.delete(idk).await
    }
}
