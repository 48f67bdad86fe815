//! Typed error definitions for CloneGPT.
//!
//! All errors are serializable so they can cross the tab boundary or be
//! returned from host-side commands unchanged.

mod operation;
mod status;
mod sync;

pub use operation::{OperationError, RateLimitError};
pub use status::StatusError;
pub use sync::SyncError;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type that wraps all domain-specific errors.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "domain", content = "error")]
pub enum TypedError {
    /// Rate-limit status could not be decoded or was inconsistent
    #[error("Status error: {0}")]
    Status(#[from] StatusError),

    /// Cross-tab channel or provider misuse
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// A server operation failed
    #[error("Operation error: {0}")]
    Operation(#[from] OperationError),
}

/// Standard Result type using TypedError.
pub type Result<T> = std::result::Result<T, TypedError>;
