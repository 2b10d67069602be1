//! HTTP client used for archive pages and media streams.

mod response;
mod user_agent;

pub use response::HttpResponse;
pub use user_agent::{resolve_user_agent, USER_AGENT};

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;

use super::retry::RetryPolicy;
use super::PageSource;
use crate::config::Settings;
use crate::error::{DownloadError, Result};

/// HTTP client with timeouts, a politeness delay and bounded retries.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    request_delay: Duration,
    retry: RetryPolicy,
}

impl HttpClient {
    /// Create a client from resolved settings.
    ///
    /// Only connect and per-read timeouts are set; a total request timeout
    /// would cut off long media transfers.
    pub fn new(settings: &Settings) -> std::result::Result<Self, reqwest::Error> {
        let user_agent = resolve_user_agent(settings.user_agent.as_deref());
        let client = Client::builder()
            .user_agent(&user_agent)
            .connect_timeout(settings.connect_timeout)
            .read_timeout(settings.read_timeout)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            request_delay: settings.request_delay,
            retry: RetryPolicy::new(settings.retries, settings.retry_delay),
        })
    }

    /// Retry policy applied to page fetches, shared with media transfers.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Send a GET request. The status is not checked.
    pub async fn get(&self, url: &str) -> Result<HttpResponse> {
        let start = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::from_reqwest(url, e))?;

        tracing::debug!(
            "GET {} -> {} in {}ms",
            url,
            response.status(),
            start.elapsed().as_millis()
        );

        Ok(HttpResponse::from_reqwest(url, response))
    }

    /// Get page content as text, failing on a non-success status.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let text = self.get(url).await?.error_for_status()?.text().await?;

        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }

        Ok(text)
    }
}

#[async_trait]
impl PageSource for HttpClient {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        self.retry.run(url, || self.get_text(url)).await
    }
}
