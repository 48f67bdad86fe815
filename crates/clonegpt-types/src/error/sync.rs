//! Cross-tab sync errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while opening or using a cross-tab channel.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum SyncError {
    /// The runtime has no cross-context messaging primitive
    #[error("Cross-tab messaging is not supported in this runtime")]
    Unsupported,

    /// Posting to a channel that was already closed
    #[error("Channel `{name}` is closed")]
    ChannelClosed { name: String },

    /// A provider-scoped context was accessed after unmount or before mount
    #[error("{context} must be used within its provider")]
    OutsideProvider { context: String },

    /// Outgoing message could not be serialized
    #[error("Failed to encode sync message: {message}")]
    Encode { message: String },

    /// Incoming payload did not match the expected message type
    #[error("Failed to decode sync message: {message}")]
    Decode { message: String },

    /// The platform primitive rejected the operation
    #[error("Platform channel error: {message}")]
    Platform { message: String },
}

impl SyncError {
    /// Whether the error means the runtime can never deliver messages,
    /// as opposed to a transient or per-message failure.
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Unsupported | Self::ChannelClosed { .. })
    }
}
