//! NexTrip client error types.

/// Errors from the NexTrip client and the caching layer above it.
#[derive(Debug, thiserror::Error)]
pub enum NexTripError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// JSON deserialization failed
    #[error("JSON parse error: {message}{}", body_suffix(.body))]
    Json {
        message: String,
        body: Option<String>,
    },

    /// A `/Date(...)/` timestamp could not be parsed
    #[error("invalid NexTrip time: {0}")]
    InvalidTime(String),

    /// A name or identifier did not resolve to anything upstream
    #[error("{0}")]
    NotFound(String),

    /// A request parameter can never name a NexTrip resource
    #[error("{0}")]
    InvalidRequest(String),

    /// Client configuration is unusable, e.g. a malformed base URL
    #[error("configuration error: {0}")]
    Config(String),

    /// Mock fixture data could not be loaded
    #[error("fixture error: {0}")]
    Fixture(String),
}

fn body_suffix(body: &Option<String>) -> String {
    body.as_ref()
        .map(|b| format!(" (body: {b})"))
        .unwrap_or_default()
}

impl NexTripError {
    /// Whether this error is a failed lookup rather than an upstream failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, NexTripError::NotFound(_))
    }
}
