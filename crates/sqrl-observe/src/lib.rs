//! Observability setup for processes embedding the SQRL identity store.

pub mod tracing_setup;
