//! HTTP response wrapper.

use std::collections::HashMap;

use bytes::Bytes;
use reqwest::{Response, StatusCode};

use crate::error::{DownloadError, Result};

/// Response whose body has not been read yet.
#[derive(Debug)]
pub struct HttpResponse {
    pub url: String,
    pub status: StatusCode,
    pub headers: HashMap<String, String>,
    pub(crate) response: Response,
}

impl HttpResponse {
    pub(crate) fn from_reqwest(url: &str, response: Response) -> Self {
        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(name.to_string(), v.to_string());
            }
        }

        Self {
            url: url.to_string(),
            status: response.status(),
            headers,
            response,
        }
    }

    /// Check if the response is successful.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Turn a non-success status into a network error.
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(DownloadError::network(
                &self.url,
                format!("HTTP {}", self.status),
            ))
        }
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(|s| s.as_str())
    }

    /// Get the Content-Length header.
    pub fn content_length(&self) -> Option<u64> {
        self.headers
            .get("content-length")
            .and_then(|s| s.parse().ok())
    }

    /// Read the next body chunk; `None` once the body is exhausted.
    pub async fn chunk(&mut self) -> Result<Option<Bytes>> {
        self.response
            .chunk()
            .await
            .map_err(|e| DownloadError::from_reqwest(&self.url, e))
    }

    /// Get response body as text.
    pub async fn text(self) -> Result<String> {
        let url = self.url;
        self.response
            .text()
            .await
            .map_err(|e| DownloadError::from_reqwest(&url, e))
    }
}
