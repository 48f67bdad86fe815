use std::future::Future;

use async_trait::async_trait;
use clonegpt_types::RateLimitStatus;

use crate::error::AppResult;

/// Source of the authoritative rate-limit status.
#[async_trait]
pub trait StatusFetcher: Send + Sync {
    async fn fetch_status(&self) -> AppResult<RateLimitStatus>;
}

/// Adapts an async closure into a [`StatusFetcher`].
pub struct FnFetcher<F>(F);

impl<F> FnFetcher<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F, Fut> StatusFetcher for FnFetcher<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = AppResult<RateLimitStatus>> + Send,
{
    async fn fetch_status(&self) -> AppResult<RateLimitStatus> {
        (self.0)().await
    }
}
