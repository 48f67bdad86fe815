//! Errors raised while decoding or constructing a rate-limit status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when a rate-limit status is malformed.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum StatusError {
    /// Period end is not strictly after period start
    #[error("Period end {end} is not after period start {start}")]
    InvalidPeriod { start: DateTime<Utc>, end: DateTime<Utc> },

    /// Over-limit status without one of its period fields
    #[error("Over-limit status is missing `{field}`")]
    MissingField { field: String },

    /// Reason outside the closed set
    #[error("Unknown rate-limit reason: {value}")]
    UnknownReason { value: String },
}
