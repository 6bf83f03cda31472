//! Identity storage contract for the SQRL identity store.
//!
//! This crate defines the storage port ([`repository::identity::IdentityStore`])
//! that the infrastructure layer implements, and everything layered on top of
//! it: identifier validation, in-place wiping of key material, the
//! [`secure::SecureIdentity`] wrapper, cancellation contexts, and the
//! validating [`service::identity::IdentityRepository`]. It depends only on
//! `sqrl-types` -- never on `sqrl-infra` or any database crate.

pub mod context;
pub mod repository;
pub mod secure;
pub mod secure_memory;
pub mod service;
pub mod validation;

#[cfg(test)]
pub(crate) mod testutil;
