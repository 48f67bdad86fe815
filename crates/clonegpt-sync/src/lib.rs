//! # CloneGPT Sync
//!
//! Per-tab client state plumbing that does not need an async runtime:
//!
//! - **`cache`** - keyed JSON query cache and the optimistic [`CacheReconciler`]
//! - **`channel`** - cross-context messaging abstraction plus the in-process hub
//! - **`bus`** - typed [`CrossTabSyncBus`] with a re-entrancy latch
//! - **`scope`** - [`TabScope`] dispatch helper
//!
//! Everything here assumes one cooperative thread per tab. Channel ports are
//! not required to be `Send` so that browser-backed ports can implement them.

// Test-only lints: allow panic!, etc. in test code
#![cfg_attr(
    test,
    allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::assertions_on_result_states
    )
)]

pub mod bus;
pub mod cache;
pub mod channel;
pub mod scope;

pub use bus::{CrossTabSyncBus, SyncBusOptions};
pub use cache::{CacheItem, CacheReconciler, CacheSnapshot, CacheStore, CacheStoreExt, QueryCache};
pub use channel::{
    ChannelBackend, ChannelListener, ChannelPort, MemoryChannelHub, UnsupportedChannel,
};
pub use scope::{tab_scope, TabScope, TabScopeHandlers};
