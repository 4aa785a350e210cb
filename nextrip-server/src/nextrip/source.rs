//! Abstraction over where NexTrip responses come from.

use async_trait::async_trait;

use super::endpoint::Endpoint;
use super::error::NexTripError;

/// Something that can answer a NexTrip request with a raw JSON body.
///
/// Implemented by the live HTTP client and by the fixture-backed mock.
#[async_trait]
pub trait NexTripSource: Send + Sync {
    /// Fetch the response body for an endpoint.
    async fn fetch(&self, endpoint: &Endpoint) -> Result<String, NexTripError>;
}
