//! Infrastructure layer for the SQRL identity store.
//!
//! Contains implementations of the storage port defined in `sqrl-core`:
//! SQLite storage with split reader/writer pools, an in-memory store, and the
//! `store.toml` configuration loader.

pub mod config;
pub mod memory;
pub mod sqlite;
