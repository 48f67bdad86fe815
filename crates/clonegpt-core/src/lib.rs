//! # CloneGPT Core
//!
//! Runtime-backed pieces of the CloneGPT client core.
//!
//! ```text
//! clonegpt-core/src/
//! ├── rate_limit/   # RateLimitMonitor, reset timer, status fetchers
//! ├── session/      # SessionProvider + cross-tab logout
//! ├── config.rs     # client_config.json load/save
//! ├── logger.rs     # tracing subscriber setup
//! └── error.rs      # AppError
//! ```
//!
//! The monitor runs on tokio and is `Send + Sync`. The session provider
//! wraps a [`clonegpt_sync::CrossTabSyncBus`] and is confined to its tab.

#![allow(
    clippy::significant_drop_tightening,
    reason = "Mutex guards are released explicitly before callbacks run"
)]
#![allow(clippy::module_name_repetitions, reason = "RateLimitMonitor in rate_limit reads better")]
// Test-only lints: allow panic!, etc. in test code
#![cfg_attr(
    test,
    allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::assertions_on_result_states
    )
)]

pub mod config;
pub mod error;
pub mod logger;
pub mod rate_limit;
pub mod session;

pub use error::{AppError, AppResult};
pub use logger::init_logger;
pub use rate_limit::{
    FnFetcher, HttpStatusFetcher, MonitorOptions, MonitorState, NoopListener, RateLimitListener,
    RateLimitMonitor, ResetTimer, StatusFetcher,
};
pub use session::{SessionProvider, SessionScope, SessionState};
