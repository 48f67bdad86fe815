//! Rate-limit status monitor for the chat input.
//!
//! The monitor keeps the current `RateLimitStatus` in the shared query
//! cache, notifies a listener when the limit is hit or lifted, and schedules
//! a single reset timer for the end of the limiting period.

mod fetcher;
mod http_fetcher;
mod listener;
mod monitor;
mod timer;


pub use fetcher::{FnFetcher, StatusFetcher};
pub use http_fetcher::HttpStatusFetcher;
pub use listener::{NoopListener, RateLimitListener};
pub use monitor::{MonitorOptions, MonitorState, RateLimitMonitor};
pub use timer::ResetTimer;

/// First segment of every rate-limit cache key.
pub const CACHE_PREFIX: &str = "rate-limit";
