use clonegpt_types::RateLimitStatus;

/// Callbacks fired by [`RateLimitMonitor`](super::RateLimitMonitor).
///
/// Invoked from whichever task observed the change, so implementations
/// must not block.
pub trait RateLimitListener: Send + Sync {
    /// The observed status changed to over-limit.
    fn on_exceeded(&self, _status: &RateLimitStatus) {}

    /// The observed status changed to within-limit.
    fn on_available(&self, _status: &RateLimitStatus) {}

    /// The limiting period ended. A re-fetch follows immediately.
    fn on_period_reset(&self) {}
}

/// Listener that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl RateLimitListener for NoopListener {}
