//! Rate-limit monitor.

use std::sync::{Arc, Weak};

use chrono::Utc;
use clonegpt_sync::{CacheStore, CacheStoreExt};
use clonegpt_types::{CacheKey, OperationError, RateLimitConfig, RateLimitReason, RateLimitStatus};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::Instant;

use super::{RateLimitListener, ResetTimer, StatusFetcher, CACHE_PREFIX};
use crate::error::AppResult;

/// Everything a monitor needs. `listener` defaults to a no-op.
pub struct MonitorOptions {
    pub key: CacheKey,
    pub reasons: Vec<RateLimitReason>,
    pub cache: Arc<dyn CacheStore>,
    pub fetcher: Arc<dyn StatusFetcher>,
    pub listener: Arc<dyn RateLimitListener>,
}

impl MonitorOptions {
    pub fn new(key: CacheKey, cache: Arc<dyn CacheStore>, fetcher: Arc<dyn StatusFetcher>) -> Self {
        Self {
            key,
            reasons: RateLimitReason::ALL.to_vec(),
            cache,
            fetcher,
            listener: Arc::new(super::NoopListener),
        }
    }

    /// Options watching the reasons listed in `config.watched_reasons`.
    pub fn from_config(
        key: CacheKey,
        config: &RateLimitConfig,
        cache: Arc<dyn CacheStore>,
        fetcher: Arc<dyn StatusFetcher>,
    ) -> Self {
        Self::new(key, cache, fetcher).reasons(config.watched_reasons.clone())
    }

    pub fn reasons(mut self, reasons: impl Into<Vec<RateLimitReason>>) -> Self {
        self.reasons = reasons.into();
        self
    }

    pub fn listener(mut self, listener: Arc<dyn RateLimitListener>) -> Self {
        self.listener = listener;
        self
    }
}

/// Snapshot of the monitor's query state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonitorState {
    pub status: Option<RateLimitStatus>,
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Default)]
struct QueryFlags {
    is_loading: bool,
    error: Option<String>,
}

/// What a commit does to the cache entry before classifying it.
enum Write {
    Keep,
    Set(Option<RateLimitStatus>),
}

struct Inner {
    key: CacheKey,
    reasons: Vec<RateLimitReason>,
    cache: Arc<dyn CacheStore>,
    fetcher: Arc<dyn StatusFetcher>,
    listener: Arc<dyn RateLimitListener>,
    timer: ResetTimer,
    /// Last status the classify step ran for. Held for the whole
    /// write-classify-arm sequence.
    observed: Mutex<Option<RateLimitStatus>>,
    query: Mutex<QueryFlags>,
}

/// Watches one rate-limit cache entry.
///
/// The cache is the source of truth: fetches and absorbed errors both write
/// into it, and every change of the observed value runs the classify step
/// (cancel-and-rearm the reset timer, then the listener callback). Writes
/// and classification are serialized, so the armed timer always belongs to
/// the status currently in the cache.
pub struct RateLimitMonitor {
    inner: Arc<Inner>,
}

impl RateLimitMonitor {
    pub fn new(options: MonitorOptions) -> Self {
        let MonitorOptions { key, reasons, cache, fetcher, listener } = options;
        tracing::debug!("[RateLimit] Monitor created for {} (reasons: {:?})", key, reasons);
        Self {
            inner: Arc::new(Inner {
                key,
                reasons,
                cache,
                fetcher,
                listener,
                timer: ResetTimer::new(),
                observed: Mutex::new(None),
                query: Mutex::new(QueryFlags::default()),
            }),
        }
    }

    /// Cache key for a resource's status, scoped to a user.
    pub fn cache_key(resource: &str, user_id: &str) -> CacheKey {
        CacheKey::new([CACHE_PREFIX, resource, user_id])
    }

    pub fn key(&self) -> &CacheKey {
        &self.inner.key
    }

    /// Fetch the authoritative status and store it.
    ///
    /// A failed fetch is recorded in [`state`](Self::state) and returned; the
    /// cached status is left as it was.
    pub async fn refresh(&self) -> AppResult<RateLimitStatus> {
        self.inner.refresh().await
    }

    /// Cached status, or a fresh fetch when nothing is cached.
    pub async fn status(&self) -> AppResult<RateLimitStatus> {
        if let Some(status) = self.inner.commit(|_| Write::Keep) {
            return Ok(status);
        }
        self.inner.refresh().await
    }

    /// Feed the error from a failed operation into the cache.
    ///
    /// A rate-limit error for a watched reason becomes the cached status
    /// without a round-trip. Any other error means the status is unknown and
    /// the entry is cleared.
    pub fn absorb_error(&self, error: Option<&OperationError>) {
        let Some(error) = error else {
            return;
        };
        let key = &self.inner.key;
        let matching = error.as_rate_limit().filter(|e| self.inner.reasons.contains(&e.reason));

        self.inner.commit(|cached| {
            let Some(limit) = matching else {
                tracing::debug!("[RateLimit] {} cleared after error: {}", key, error);
                return Write::Set(None);
            };
            let counters = cached.map(|s| *s.counters()).unwrap_or_default();
            match limit.to_status(counters) {
                Ok(status) => {
                    tracing::info!(
                        "[RateLimit] {} over limit ({}) from operation error",
                        key,
                        limit.reason
                    );
                    Write::Set(Some(status))
                }
                Err(e) => {
                    tracing::warn!("[RateLimit] Ignoring malformed rate-limit error: {}", e);
                    Write::Set(None)
                }
            }
        });
    }

    /// Re-read the cache entry and classify it if it changed.
    pub fn reconcile(&self) {
        self.inner.commit(|_| Write::Keep);
    }

    pub fn state(&self) -> MonitorState {
        let query = self.inner.query.lock();
        MonitorState {
            status: self.inner.cached(),
            is_loading: query.is_loading,
            error: query.error.clone(),
        }
    }

    pub fn is_over_limit(&self) -> bool {
        self.inner.cached().is_some_and(|s| s.is_over_limit())
    }

    pub fn has_pending_reset(&self) -> bool {
        self.inner.timer.is_armed()
    }

    /// When the pending reset timer fires.
    pub fn reset_deadline(&self) -> Option<Instant> {
        self.inner.timer.deadline()
    }

    /// Cancel the pending reset timer.
    pub fn shutdown(&self) {
        if self.inner.timer.cancel() {
            tracing::debug!("[RateLimit] Reset timer for {} cancelled", self.inner.key);
        }
    }
}

impl Drop for RateLimitMonitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Inner {
    fn cached(&self) -> Option<RateLimitStatus> {
        self.cache.get_as(&self.key)
    }

    async fn refresh(self: &Arc<Self>) -> AppResult<RateLimitStatus> {
        self.query.lock().is_loading = true;
        let result = self.fetcher.fetch_status().await;
        {
            let mut query = self.query.lock();
            query.is_loading = false;
            query.error = result.as_ref().err().map(ToString::to_string);
        }

        match result {
            Ok(status) => {
                self.commit(|_| Write::Set(Some(status.clone())));
                Ok(status)
            }
            Err(e) => {
                tracing::warn!("[RateLimit] Failed to fetch status for {}: {}", self.key, e);
                Err(e)
            }
        }
    }

    /// Apply `write` to the cache entry and run the classify step on the
    /// result, all under the `observed` lock. Returns the resulting status.
    ///
    /// Classification only happens when the status differs from the last
    /// one seen. The listener is called after the lock is released.
    fn commit<F>(self: &Arc<Self>, write: F) -> Option<RateLimitStatus>
    where
        F: FnOnce(Option<RateLimitStatus>) -> Write,
    {
        let (status, changed) = {
            let mut observed = self.observed.lock();
            let cached = self.cached();
            let status = match write(cached.clone()) {
                Write::Keep => cached,
                Write::Set(next) => {
                    self.cache.set_as(&self.key, next.as_ref());
                    next
                }
            };

            let changed = *observed != status;
            if changed {
                *observed = status.clone();
                self.timer.cancel();
                if let Some(current) = &status {
                    self.schedule_reset(current);
                }
            }
            (status, changed)
        };

        match &status {
            Some(current) if changed && current.is_over_limit() => {
                self.listener.on_exceeded(current);
            }
            Some(current) if changed => self.listener.on_available(current),
            _ => {}
        }
        status
    }

    /// Arm the reset timer for `status`. Caller holds the `observed` lock.
    fn schedule_reset(self: &Arc<Self>, status: &RateLimitStatus) {
        let Some(delay) = status.time_until_period_end(Utc::now()) else {
            if status.is_over_limit() {
                tracing::debug!("[RateLimit] {} period already ended, no timer", self.key);
            }
            return;
        };
        if tokio::runtime::Handle::try_current().is_err() {
            tracing::warn!("[RateLimit] No runtime available, reset timer for {} not armed", self.key);
            return;
        }

        let weak: Weak<Self> = Arc::downgrade(self);
        let armed_for = status.clone();
        self.timer.arm(delay, async move {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let current = inner.observed.lock().as_ref() == Some(&armed_for);
            if !current {
                tracing::debug!("[RateLimit] Stale reset timer for {} ignored", inner.key);
                return;
            }
            tracing::info!("[RateLimit] Period for {} ended, refreshing", inner.key);
            inner.listener.on_period_reset();
            // Failure is already recorded in the query state.
            let _ = inner.refresh().await;
        });
        tracing::debug!("[RateLimit] Reset timer for {} armed ({:?})", self.key, delay);
    }
}
