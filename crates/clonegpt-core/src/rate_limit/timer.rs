//! Single-slot cancellable timer.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

struct Armed {
    generation: u64,
    deadline: Instant,
    handle: JoinHandle<()>,
}

/// Holds at most one pending timer. Arming cancels the previous one.
///
/// Each armed task carries a generation number; when it fires it clears the
/// slot only if it still owns it, so a superseded task can never run its
/// callback or clobber a newer timer.
#[derive(Default)]
pub struct ResetTimer {
    slot: Arc<Mutex<Option<Armed>>>,
    generation: AtomicU64,
}

impl ResetTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel any pending timer, then run `on_fire` after `delay`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn arm<F>(&self, delay: Duration, on_fire: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst).wrapping_add(1);
        let deadline = Instant::now() + delay;
        let slot = Arc::clone(&self.slot);

        let mut guard = self.slot.lock();
        if let Some(previous) = guard.take() {
            previous.handle.abort();
        }

        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if !release(&slot, generation) {
                return;
            }
            on_fire.await;
        });
        *guard = Some(Armed { generation, deadline, handle });
    }

    /// Abort the pending timer. Returns whether one was armed.
    pub fn cancel(&self) -> bool {
        match self.slot.lock().take() {
            Some(armed) => {
                armed.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.slot.lock().as_ref().is_some_and(|armed| !armed.handle.is_finished())
    }

    /// When the pending timer fires, if one is armed.
    pub fn deadline(&self) -> Option<Instant> {
        self.slot
            .lock()
            .as_ref()
            .filter(|armed| !armed.handle.is_finished())
            .map(|armed| armed.deadline)
    }
}

impl Drop for ResetTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn release(slot: &Mutex<Option<Armed>>, generation: u64) -> bool {
    let mut guard = slot.lock();
    match guard.as_ref() {
        Some(armed) if armed.generation == generation => {
            *guard = None;
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use std::sync::atomic::AtomicU32;

    fn counter() -> (Arc<AtomicU32>, impl Fn() -> BoxFuture<'static, ()>) {
        let count = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&count);
        let make = move || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
            .boxed()
        };
        (count, make)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once() {
        let timer = ResetTimer::new();
        let (count, make) = counter();

        let start = Instant::now();
        timer.arm(Duration::from_secs(10), make());
        assert!(timer.is_armed());
        assert_eq!(timer.deadline(), Some(start + Duration::from_secs(10)));

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!timer.is_armed());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_cancels_previous() {
        let timer = ResetTimer::new();
        let (count, make) = counter();

        timer.arm(Duration::from_secs(10), make());
        timer.arm(Duration::from_secs(30), make());

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(timer.is_armed());

        tokio::time::sleep(Duration::from_secs(15)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_and_drop() {
        let (count, make) = counter();

        let timer = ResetTimer::new();
        timer.arm(Duration::from_secs(5), make());
        assert!(timer.cancel());
        assert!(!timer.cancel());

        let dropped = ResetTimer::new();
        dropped.arm(Duration::from_secs(5), make());
        drop(dropped);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
