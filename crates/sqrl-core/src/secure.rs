//! Scoped ownership of a fetched identity.
//!
//! A [`SecureIdentity`] is only handed out by
//! [`IdentityRepository::find_secure`](crate::service::identity::IdentityRepository::find_secure)
//! after a successful fetch. Callers read through [`SecureIdentity::get_identity`]
//! and call [`SecureIdentity::destroy`] on every exit path. If the wrapper is
//! dropped without that call the same wipe runs from `Drop`.

use std::fmt;

use sqrl_types::error::IdentityError;
use sqrl_types::identity::Identity;

use crate::secure_memory::wipe_identity;

pub struct SecureIdentity {
    identity: Identity,
    destroyed: bool,
}

impl SecureIdentity {
    pub(crate) fn new(identity: Identity) -> Self {
        Self {
            identity,
            destroyed: false,
        }
    }

    /// Borrow the wrapped identity, or `Destroyed` once [`destroy`](Self::destroy) has run.
    pub fn get_identity(&self) -> Result<&Identity, IdentityError> {
        if self.destroyed {
            return Err(IdentityError::Destroyed);
        }
        Ok(&self.identity)
    }

    /// Wipe the wrapped identity and block further reads. Idempotent.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        wipe_identity(&mut self.identity);
        self.destroyed = true;
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl Drop for SecureIdentity {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl fmt::Debug for SecureIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureIdentity")
            .field("destroyed", &self.destroyed)
            .finish_non_exhaustive()
    }
}
