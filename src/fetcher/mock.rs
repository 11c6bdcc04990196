/// Mock fetcher for testing purposes.
///
/// Serves scripted bodies from memory and counts calls per URL, so tests can
/// assert exactly how much "network" traffic an operation caused.
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{FetchError, Fetcher};

/// A fetcher that answers from a table of canned responses.
///
/// Unknown URLs answer with `FetchError::Status(404)`.
#[derive(Default)]
pub struct MockFetcher {
    responses: Mutex<HashMap<String, Result<String, FetchError>>>,
    calls: Mutex<HashMap<String, usize>>,
    latency: Duration,
}

impl MockFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Serve `body` for `url`, replacing any previous response.
    pub fn respond(&self, url: &str, body: &str) {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(url.to_string(), Ok(body.to_string()));
    }

    /// Answer `url` with `err`.
    pub fn fail(&self, url: &str, err: FetchError) {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(url.to_string(), Err(err));
    }

    /// Number of times `url` was requested.
    #[must_use]
    pub fn calls(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(url)
            .copied()
            .unwrap_or(0)
    }

    /// Number of requests across all URLs.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .sum()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        *self
            .calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(url.to_string())
            .or_default() += 1;

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(url)
            .cloned()
            .unwrap_or(Err(FetchError::Status(404)))
    }
}
