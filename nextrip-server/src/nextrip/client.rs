//! NexTrip HTTP client.
//!
//! Issues GET requests against the live NexTrip API and returns the raw
//! response body. Parsing and caching happen in the layer above.

use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::debug;

use super::endpoint::Endpoint;
use super::error::NexTripError;
use super::source::NexTripSource;

/// Default base URL for the NexTrip API.
pub const DEFAULT_BASE_URL: &str = "http://svc.metrotransit.org/NexTrip/";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the NexTrip client.
#[derive(Debug, Clone)]
pub struct NexTripConfig {
    /// Base URL for the API (defaults to production NexTrip)
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl NexTripConfig {
    /// Create a config pointing at the production API.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for NexTripConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// NexTrip API client.
#[derive(Debug, Clone)]
pub struct NexTripClient {
    http: reqwest::Client,
    base_url: Url,
}

impl NexTripClient {
    /// Create a new NexTrip client with the given configuration.
    pub fn new(config: NexTripConfig) -> Result<Self, NexTripError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            NexTripError::Config(format!("invalid base URL {}: {e}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(NexTripError::Config(format!(
                "base URL {} cannot have a path",
                config.base_url
            )));
        }

        let mut headers = HeaderMap::new();

        // NexTrip serves XML unless JSON is asked for explicitly
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { http, base_url })
    }

    /// Full URL for an endpoint.
    ///
    /// Each segment is percent-encoded on its own, so a parameter can never
    /// add path segments, a query or a fragment.
    pub fn url(&self, endpoint: &Endpoint) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejects cannot-be-a-base URLs
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(endpoint.segments());
        }
        url
    }
}

#[async_trait]
impl NexTripSource for NexTripClient {
    async fn fetch(&self, endpoint: &Endpoint) -> Result<String, NexTripError> {
        let url = self.url(endpoint);
        debug!(%url, "requesting");

        let response = self.http.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NexTripError::Api {
                status: status.as_u16(),
                message: body.chars().take(500).collect(),
            });
        }

        Ok(response.text().await?)
    }
}
