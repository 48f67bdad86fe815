//! # CloneGPT Types
//!
//! Core types, models, and error definitions for the CloneGPT client sync core.
//!
//! - **`error`** - Typed error hierarchy (status decoding, cross-tab sync, failed operations)
//! - **`models`** - Domain models (rate-limit status, cache keys, sync messages, config)
//!
//! ## Architecture Role
//!
//! `clonegpt-types` sits at the bottom of the dependency graph:
//!
//! ```text
//!                clonegpt-types (this crate)
//!                        │
//!             ┌──────────┴──────────┐
//!             ▼                     ▼
//!       clonegpt-sync          clonegpt-web
//!             │
//!             ▼
//!       clonegpt-core
//! ```
//!
//! Nothing here depends on an async runtime, so the crate builds for browser
//! (wasm) hosts as well as native ones.

// Test-only lints: allow panic!, etc. in test code
#![cfg_attr(
    test,
    allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::assertions_on_result_states
    )
)]

pub mod error;
pub mod models;

// Re-export error types for convenience
pub use error::{OperationError, RateLimitError, Result, StatusError, SyncError, TypedError};

// Re-export core model types
pub use models::{
    CacheKey, ClientConfig, KeyPart, RateLimitConfig, RateLimitCounters, RateLimitPeriod,
    RateLimitReason, RateLimitStatus, SessionSyncMessage, SyncConfig,
};
