//! Core domain models for the CloneGPT client sync core.

mod cache_key;
mod config;
mod rate_limit;
mod sync_message;

// Re-export all models
pub use cache_key::{CacheKey, KeyPart};
pub use config::{ClientConfig, RateLimitConfig, SyncConfig};
pub use rate_limit::{RateLimitCounters, RateLimitPeriod, RateLimitReason, RateLimitStatus};
pub use sync_message::SessionSyncMessage;
