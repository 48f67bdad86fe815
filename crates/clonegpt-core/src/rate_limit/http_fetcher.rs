use std::time::Duration;

use async_trait::async_trait;
use clonegpt_types::{RateLimitConfig, RateLimitCounters, RateLimitError, RateLimitStatus};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use url::Url;

use super::StatusFetcher;
use crate::error::{AppError, AppResult};

/// Fetches the status of one resource from the server's rate-limit endpoint.
pub struct HttpStatusFetcher {
    client: Client,
    url: Url,
    resource: String,
    bearer_token: Option<String>,
}

impl HttpStatusFetcher {
    pub fn new(config: &RateLimitConfig, resource: impl Into<String>) -> AppResult<Self> {
        let url = status_url(&config.base_url, &config.status_path)?;
        let client = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Self { client, url, resource: resource.into(), bearer_token: None })
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl StatusFetcher for HttpStatusFetcher {
    async fn fetch_status(&self) -> AppResult<RateLimitStatus> {
        let mut request =
            self.client.get(self.url.clone()).query(&[("resource", self.resource.as_str())]);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if status.is_success() {
            return Ok(serde_json::from_str(&body)?);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            if let Some(status) = over_limit_from_body(&body)? {
                tracing::debug!("[RateLimit] {} is over limit (429)", self.resource);
                return Ok(status);
            }
        }

        Err(AppError::Fetch { status: status.as_u16(), message: body })
    }
}

/// Resolve `status_path` under the path of `base_url`, so a base of
/// `https://host/app` keeps its `/app` prefix.
fn status_url(base_url: &str, status_path: &str) -> AppResult<Url> {
    let mut base = Url::parse(base_url)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join(status_path.trim_start_matches('/'))?)
}

/// A 429 whose body is a typed rate-limit error becomes an over-limit status.
fn over_limit_from_body(body: &str) -> AppResult<Option<RateLimitStatus>> {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return Ok(None);
    };
    let Some(error) = RateLimitError::from_value(&value) else {
        return Ok(None);
    };
    let counters: RateLimitCounters = serde_json::from_value(value).unwrap_or_default();
    Ok(Some(error.to_status(counters)?))
}
