//! Cross-context messaging primitive, addressed by channel name.
//!
//! A backend opens ports; a port posts JSON payloads to every *other* port
//! open on the same name and delivers incoming payloads to its listener.
//! Implementations: [`MemoryChannelHub`] for same-process tabs and tests,
//! [`UnsupportedChannel`] for runtimes without the primitive, and the
//! browser `BroadcastChannel` backend in `clonegpt-web`.

mod memory;
mod unsupported;

pub use memory::MemoryChannelHub;
pub use unsupported::UnsupportedChannel;

use clonegpt_types::SyncError;
use serde_json::Value;
use std::sync::Arc;

/// Callback invoked with each payload received on a port.
pub type ChannelListener = Arc<dyn Fn(Value) + Send + Sync>;

/// Factory for channel ports.
pub trait ChannelBackend {
    fn open(&self, name: &str) -> Result<Box<dyn ChannelPort>, SyncError>;
}

/// One open subscription to a named channel.
pub trait ChannelPort {
    fn name(&self) -> &str;

    /// Deliver `payload` to every other port on this channel. The sender
    /// never receives its own message.
    fn post(&self, payload: Value) -> Result<(), SyncError>;

    /// Install the listener. Replaces any previous listener.
    fn subscribe(&mut self, listener: ChannelListener) -> Result<(), SyncError>;

    /// Stop receiving. Idempotent.
    fn close(&mut self);

    fn is_closed(&self) -> bool;
}
