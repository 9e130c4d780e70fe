//! HTTP fetching for mirror runs
//!
//! Every fetch streams the body with a size ceiling: the declared
//! Content-Length is checked before reading, and the running total is checked
//! again for each chunk. The whole exchange runs under one deadline.

use std::time::Duration;

use futures::StreamExt;
use reqwest::Client;
use url::Url;

use crate::config::MirrorConfig;
use crate::errors::SkipReason;

const SEED_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ASSET_ACCEPT: &str = "text/css,image/avif,image/webp,image/*,font/*,*/*;q=0.5";

/// A successfully fetched body
#[derive(Debug, Clone)]
pub struct Fetched {
    /// URL after redirects
    pub final_url: Url,
    /// Raw `Content-Type` header, if any
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Why a fetch produced no body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    Timeout,
    Status(u16),
    TooLarge(u64),
    Network(String),
}

impl From<FetchFailure> for SkipReason {
    fn from(failure: FetchFailure) -> Self {
        match failure {
            FetchFailure::Timeout => SkipReason::Timeout,
            FetchFailure::Status(status) => SkipReason::HttpStatus(status),
            FetchFailure::TooLarge(bytes) => SkipReason::TooLarge(bytes),
            FetchFailure::Network(message) => SkipReason::Fetch(message),
        }
    }
}

/// Shared HTTP client with the run's size ceiling
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    max_bytes: usize,
}

impl Fetcher {
    /// Build a client presenting the configured user agent.
    ///
    /// Redirects are followed with reqwest's default policy (up to 10 hops).
    pub fn new(config: &MirrorConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent())
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;
        Ok(Self {
            client,
            max_bytes: config.max_asset_bytes(),
        })
    }

    /// Fetch the seed document
    pub async fn fetch_page(&self, url: &Url, timeout: Duration) -> Result<Fetched, FetchFailure> {
        self.fetch(url, SEED_ACCEPT, timeout).await
    }

    /// Fetch one dependent resource
    pub async fn fetch_asset(&self, url: &Url, timeout: Duration) -> Result<Fetched, FetchFailure> {
        self.fetch(url, ASSET_ACCEPT, timeout).await
    }

    async fn fetch(&self, url: &Url, accept: &str, timeout: Duration) -> Result<Fetched, FetchFailure> {
        match tokio::time::timeout(timeout, self.fetch_inner(url, accept, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(FetchFailure::Timeout),
        }
    }

    async fn fetch_inner(
        &self,
        url: &Url,
        accept: &str,
        timeout: Duration,
    ) -> Result<Fetched, FetchFailure> {
        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .header("Accept", accept)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Status(status.as_u16()));
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        // Enforce the limit on the declared size before downloading
        let expected_size = response.content_length().unwrap_or(0);
        if expected_size > self.max_bytes as u64 {
            return Err(FetchFailure::TooLarge(expected_size));
        }

        let mut buffer = if expected_size > 0 {
            Vec::with_capacity(expected_size as usize)
        } else {
            Vec::new()
        };

        // Servers can lie about Content-Length or omit it
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(classify_reqwest_error)?;
            let new_total = buffer.len() + chunk.len();
            if new_total > self.max_bytes {
                return Err(FetchFailure::TooLarge(new_total as u64));
            }
            buffer.extend_from_slice(&chunk);
        }

        Ok(Fetched {
            final_url,
            content_type,
            bytes: buffer,
        })
    }
}

fn classify_reqwest_error(error: reqwest::Error) -> FetchFailure {
    if error.is_timeout() {
        FetchFailure::Timeout
    } else {
        FetchFailure::Network(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher(max_bytes: usize) -> Fetcher {
        let config = MirrorConfig::builder()
            .max_asset_bytes(max_bytes)
            .build()
            .unwrap();
        Fetcher::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_success_reports_content_type() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/a.css")
            .with_status(200)
            .with_header("content-type", "text/css")
            .with_body("body{}")
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/a.css", server.url())).unwrap();
        let fetched = fetcher(1024)
            .fetch_asset(&url, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(fetched.bytes, b"body{}");
        assert_eq!(fetched.content_type.as_deref(), Some("text/css"));
    }

    #[tokio::test]
    async fn test_fetch_rejects_oversize_body() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/big.png")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body(vec![0u8; 64])
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/big.png", server.url())).unwrap();
        let result = fetcher(16).fetch_asset(&url, Duration::from_secs(5)).await;
        assert!(matches!(result, Err(FetchFailure::TooLarge(_))));
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/missing.js")
            .with_status(404)
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/missing.js", server.url())).unwrap();
        let result = fetcher(1024).fetch_asset(&url, Duration::from_secs(5)).await;
        assert_eq!(result.unwrap_err(), FetchFailure::Status(404));
    }
}
