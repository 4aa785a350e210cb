//! Data transfer objects for web requests and responses.

use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::nextrip::RawJson;

/// Query parameters accepted by every data route.
#[derive(Debug, Default, Deserialize)]
pub struct CacheParams {
    /// Present (with any value, or none) to bypass the cache
    pub cache_bust: Option<String>,
}

impl CacheParams {
    pub fn cache_bust(&self) -> bool {
        self.cache_bust.is_some()
    }
}

/// Query parameters for `/routes`.
#[derive(Debug, Deserialize)]
pub struct RoutesRequest {
    /// Only return routes run by this provider ID
    pub provider: Option<String>,

    pub cache_bust: Option<String>,
}

/// Query parameters for `/demo`.
///
/// All three names are required; they are optional here so a missing one
/// can be reported by name.
#[derive(Debug, Deserialize)]
pub struct DemoRequest {
    /// Route name, e.g. "METRO Blue Line"
    pub route: Option<String>,

    /// Stop name, e.g. "Target Field Station Platform 1"
    pub stop: Option<String>,

    /// Direction name, e.g. "south"
    pub direction: Option<String>,

    pub cache_bust: Option<String>,
}

/// Response for `/demo`.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct DemoResponse {
    /// Minutes until the next departure; null when no bus is coming
    pub minutes: Option<i64>,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Upstream bodies are served as received, labelled as JSON.
impl IntoResponse for RawJson {
    fn into_response(self) -> Response {
        (
            [(header::CONTENT_TYPE, "application/json")],
            self.as_str().to_string(),
        )
            .into_response()
    }
}
