use std::fmt;

use thiserror::Error;

/// Reasons an identifier (or another caller-supplied value) is rejected
/// before any storage access happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("identifier is empty")]
    EmptyKey,

    #[error("identifier exceeds 256 characters")]
    KeyTooLong,

    #[error("identifier contains characters outside the allowed alphabet")]
    InvalidFormat,

    #[error("button response {0} is outside the range 0-3")]
    InvalidButtonResponse(i64),

    #[error("unlock key and verify key must both be present")]
    MissingKeyMaterial,
}

/// The storage operation that failed. Carried by [`StorageError`] so callers
/// can tell which call went wrong without inspecting driver messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOp {
    Connect,
    Find,
    Save,
    Delete,
    EnsureSchema,
}

impl fmt::Display for StorageOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageOp::Connect => write!(f, "connect"),
            StorageOp::Find => write!(f, "find"),
            StorageOp::Save => write!(f, "save"),
            StorageOp::Delete => write!(f, "delete"),
            StorageOp::EnsureSchema => write!(f, "ensure_schema"),
        }
    }
}

/// A failure below the repository surface (connectivity, constraint
/// violation, driver timeout, corrupt row).
///
/// The message is built from the operation name and the underlying cause
/// only. Bound parameter values never reach it.
#[derive(Debug, Error)]
#[error("{op} failed: {source}")]
pub struct StorageError {
    op: StorageOp,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl StorageError {
    pub fn new(op: StorageOp, source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self {
            op,
            source: source.into(),
        }
    }

    pub fn op(&self) -> StorageOp {
        self.op
    }
}

/// Every outcome other than success that the identity repository can return.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("no identity supplied")]
    NilInput,

    #[error("identity not found")]
    NotFound,

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("operation cancelled")]
    Cancelled,

    #[error("operation deadline exceeded")]
    DeadlineExceeded,

    #[error("secure identity has already been destroyed")]
    Destroyed,
}

impl IdentityError {
    /// True for `Cancelled` and `DeadlineExceeded`.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, IdentityError::Cancelled | IdentityError::DeadlineExceeded)
    }
}
