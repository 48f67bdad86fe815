//! Errors surfaced by failed server operations (sending a message, uploading a file).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::StatusError;
use crate::models::{RateLimitCounters, RateLimitPeriod, RateLimitReason, RateLimitStatus};

/// A server-side rejection because a rate-limit period is exhausted.
///
/// Wire shape: `{ "kind": "rate_limit", "reason", "periodStart", "periodEnd" }`.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[error("Rate limit exceeded for {reason} until {period_end}")]
pub struct RateLimitError {
    pub reason: RateLimitReason,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
}

impl RateLimitError {
    pub const KIND: &'static str = "rate_limit";

    pub fn new(
        reason: RateLimitReason,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> Self {
        Self { reason, period_start, period_end }
    }

    /// Recognize a loosely-typed error object. Anything that is not tagged
    /// `rate_limit` or carries an unknown reason is not a rate-limit error.
    pub fn from_value(value: &Value) -> Option<Self> {
        if value.get("kind")?.as_str()? != Self::KIND {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    pub fn period(&self) -> Result<RateLimitPeriod, StatusError> {
        RateLimitPeriod::new(self.period_start, self.period_end)
    }

    /// Build the over-limit status this error implies.
    pub fn to_status(&self, counters: RateLimitCounters) -> Result<RateLimitStatus, StatusError> {
        Ok(RateLimitStatus::OverLimit { reason: self.reason, period: self.period()?, counters })
    }
}

/// Typed error returned by a failed server operation.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationError {
    #[error(transparent)]
    RateLimit(RateLimitError),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },
}

impl OperationError {
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    pub fn as_rate_limit(&self) -> Option<&RateLimitError> {
        match self {
            Self::RateLimit(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RateLimitError> for OperationError {
    fn from(err: RateLimitError) -> Self {
        Self::RateLimit(err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_from_value_recognizes_rate_limit() {
        let value = json!({
            "kind": "rate_limit",
            "reason": "files",
            "periodStart": "2026-01-08T16:00:00Z",
            "periodEnd": "2026-01-08T17:00:00Z"
        });

        let err = RateLimitError::from_value(&value).unwrap();
        assert_eq!(err.reason, RateLimitReason::Files);
        assert_eq!(err.period_end, Utc.with_ymd_and_hms(2026, 1, 8, 17, 0, 0).unwrap());
    }

    #[test]
    fn test_from_value_rejects_other_shapes() {
        assert!(RateLimitError::from_value(&json!({ "kind": "network" })).is_none());
        assert!(RateLimitError::from_value(&json!({ "reason": "files" })).is_none());
        assert!(RateLimitError::from_value(&json!({
            "kind": "rate_limit",
            "reason": "images",
            "periodStart": "2026-01-08T16:00:00Z",
            "periodEnd": "2026-01-08T17:00:00Z"
        }))
        .is_none());
    }

    #[test]
    fn test_operation_error_wire_shape_matches_error_object() {
        let start = Utc.with_ymd_and_hms(2026, 1, 8, 16, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 1, 8, 17, 0, 0).unwrap();
        let err = OperationError::from(RateLimitError::new(RateLimitReason::Messages, start, end));

        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["kind"], "rate_limit");
        assert_eq!(value["reason"], "messages");

        let back = OperationError::from_value(&value).unwrap();
        assert_eq!(back.as_rate_limit().map(|e| e.reason), Some(RateLimitReason::Messages));
        assert!(OperationError::Unauthorized.as_rate_limit().is_none());
    }

    #[test]
    fn test_to_status_rejects_inverted_period() {
        let start = Utc.with_ymd_and_hms(2026, 1, 8, 17, 0, 0).unwrap();
        let err = RateLimitError::new(RateLimitReason::Tokens, start, start);
        assert!(matches!(
            err.to_status(RateLimitCounters::default()),
            Err(StatusError::InvalidPeriod { .. })
        ));
    }
}
