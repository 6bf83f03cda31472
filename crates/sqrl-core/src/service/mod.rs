//! Repository services (use cases).
//!
//! Services validate input, apply cancellation contexts, and delegate to the
//! storage port. They depend on traits -- never on concrete infrastructure
//! implementations.

pub mod auth;
pub mod identity;
