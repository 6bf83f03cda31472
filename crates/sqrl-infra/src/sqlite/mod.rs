//! SQLite storage layer.
//!
//! The identity store backed by SQLite with WAL mode and split read/write
//! connection pools.

pub mod identity;
pub mod pool;
pub mod schema;
