//! # CloneGPT Web
//!
//! Browser host glue: a [`ChannelBackend`] over the platform
//! `BroadcastChannel` and console logging.

mod broadcast;

use std::sync::Arc;

use clonegpt_sync::{ChannelBackend, UnsupportedChannel};

pub use broadcast::WebBroadcastChannel;

/// Route `log` (and `tracing`, via its `log` feature) to the browser console.
/// Safe to call more than once.
pub fn init_console_logger() {
    console_error_panic_hook::set_once();
    // Ignore error if already initialized
    drop(console_log::init_with_level(log::Level::Debug));
}

/// `BroadcastChannel` when the host has it, otherwise a backend whose
/// buses degrade to no-ops.
pub fn default_backend() -> Arc<dyn ChannelBackend> {
    if WebBroadcastChannel::is_supported() {
        Arc::new(WebBroadcastChannel)
    } else {
        log::warn!("BroadcastChannel unavailable, cross-tab sync disabled");
        Arc::new(UnsupportedChannel)
    }
}
