//! RAII latch for cancellation-safe "handler is running" tracking.

use std::sync::atomic::{AtomicBool, Ordering};

/// Holds the processing latch for the duration of one handler call.
/// Releases on drop, including during unwinding.
pub(crate) struct ProcessingGuard<'a> {
    latch: &'a AtomicBool,
}

impl<'a> ProcessingGuard<'a> {
    /// Returns `None` if the latch is already held.
    pub(crate) fn try_acquire(latch: &'a AtomicBool) -> Option<Self> {
        latch
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { latch })
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.latch.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails_until_release() {
        let latch = AtomicBool::new(false);
        let guard = ProcessingGuard::try_acquire(&latch);
        assert!(guard.is_some());
        assert!(ProcessingGuard::try_acquire(&latch).is_none());
        drop(guard);
        assert!(ProcessingGuard::try_acquire(&latch).is_some());
    }
}
