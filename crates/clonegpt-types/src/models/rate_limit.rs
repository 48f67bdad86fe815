//! Rate-limit status as reported by the server's rate-limit check.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::StatusError;

/// Resource whose counter tripped the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitReason {
    Messages,
    Tokens,
    Files,
}

impl RateLimitReason {
    pub const ALL: [Self; 3] = [Self::Messages, Self::Tokens, Self::Files];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Messages => "messages",
            Self::Tokens => "tokens",
            Self::Files => "files",
        }
    }
}

impl fmt::Display for RateLimitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RateLimitReason {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| StatusError::UnknownReason { value: s.to_string() })
    }
}

/// Per-resource usage counters. Present on every status regardless of branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitCounters {
    #[serde(default)]
    pub messages_counter: u64,
    #[serde(default)]
    pub tokens_counter: u64,
    #[serde(default)]
    pub files_counter: u64,
}

impl RateLimitCounters {
    pub fn get(&self, reason: RateLimitReason) -> u64 {
        match reason {
            RateLimitReason::Messages => self.messages_counter,
            RateLimitReason::Tokens => self.tokens_counter,
            RateLimitReason::Files => self.files_counter,
        }
    }
}

/// Limiting window. `end` is strictly after `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPeriod {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl RateLimitPeriod {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, StatusError> {
        if end <= start {
            return Err(StatusError::InvalidPeriod { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Time left until the period ends, or `None` once it has ended.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        (self.end - now).to_std().ok().filter(|d| !d.is_zero())
    }
}

/// Result of a rate-limit check, keyed on whether the limit is exceeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "wire::RateLimitStatusWire", into = "wire::RateLimitStatusWire")]
pub enum RateLimitStatus {
    OverLimit { reason: RateLimitReason, period: RateLimitPeriod, counters: RateLimitCounters },
    WithinLimit { counters: RateLimitCounters },
}

impl RateLimitStatus {
    pub fn within(counters: RateLimitCounters) -> Self {
        Self::WithinLimit { counters }
    }

    pub fn is_over_limit(&self) -> bool {
        matches!(self, Self::OverLimit { .. })
    }

    pub fn counters(&self) -> &RateLimitCounters {
        match self {
            Self::OverLimit { counters, .. } | Self::WithinLimit { counters } => counters,
        }
    }

    pub fn reason(&self) -> Option<RateLimitReason> {
        match self {
            Self::OverLimit { reason, .. } => Some(*reason),
            Self::WithinLimit { .. } => None,
        }
    }

    pub fn period(&self) -> Option<&RateLimitPeriod> {
        match self {
            Self::OverLimit { period, .. } => Some(period),
            Self::WithinLimit { .. } => None,
        }
    }

    /// Delay until the limiting period ends. `None` when within limit or
    /// when the period has already ended.
    pub fn time_until_period_end(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.period().and_then(|p| p.remaining(now))
    }
}

mod wire {
    use super::*;

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RateLimitStatusWire {
        pub is_over_limit: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub reason: Option<RateLimitReason>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub period_start: Option<DateTime<Utc>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub period_end: Option<DateTime<Utc>>,
        #[serde(flatten)]
        pub counters: RateLimitCounters,
    }

    fn missing(field: &str) -> StatusError {
        StatusError::MissingField { field: field.to_string() }
    }

    impl TryFrom<RateLimitStatusWire> for RateLimitStatus {
        type Error = StatusError;

        fn try_from(w: RateLimitStatusWire) -> Result<Self, Self::Error> {
            if !w.is_over_limit {
                return Ok(Self::WithinLimit { counters: w.counters });
            }
            let reason = w.reason.ok_or_else(|| missing("reason"))?;
            let start = w.period_start.ok_or_else(|| missing("periodStart"))?;
            let end = w.period_end.ok_or_else(|| missing("periodEnd"))?;
            Ok(Self::OverLimit {
                reason,
                period: RateLimitPeriod::new(start, end)?,
                counters: w.counters,
            })
        }
    }

    impl From<RateLimitStatus> for RateLimitStatusWire {
        fn from(status: RateLimitStatus) -> Self {
            match status {
                RateLimitStatus::OverLimit { reason, period, counters } => Self {
                    is_over_limit: true,
                    reason: Some(reason),
                    period_start: Some(period.start()),
                    period_end: Some(period.end()),
                    counters,
                },
                RateLimitStatus::WithinLimit { counters } => Self {
                    is_over_limit: false,
                    reason: None,
                    period_start: None,
                    period_end: None,
                    counters,
                },
            }
        }
    }
}
