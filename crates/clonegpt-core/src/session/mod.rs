//! Per-tab session context and its cross-tab synchronization.

mod provider;
mod state;


pub use provider::{SessionProvider, SessionScope};
pub use state::SessionState;
