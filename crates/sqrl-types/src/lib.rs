//! Shared domain types for the SQRL identity store.
//!
//! This crate contains the identity record, the sensitive-buffer type its key
//! fields are stored in, the protocol-handler shape of an identity, store
//! configuration, and the closed error taxonomy.
//!
//! Zero infrastructure dependencies -- only serde, thiserror, zeroize.

pub mod config;
pub mod error;
pub mod identity;
pub mod protocol;
