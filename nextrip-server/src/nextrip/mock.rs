//! Mock NexTrip source for testing without API access.
//!
//! Serves response bodies from JSON files as if they were live API
//! responses, and counts the requests it receives.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use tracing::debug;

use super::endpoint::Endpoint;
use super::error::NexTripError;
use super::source::NexTripSource;

/// Mock NexTrip source that serves data from JSON fixtures.
///
/// Fixtures are keyed by endpoint path (`Stops/901/1`). On disk the path
/// separators become underscores: `Stops_901_1.json`. No endpoint path
/// contains an underscore of its own (stop codes are alphanumeric, see
/// [`Endpoint::timepoint_departures`]), so the mapping is unambiguous.
/// Fixtures for arbitrary paths can still be added with
/// [`MockNexTrip::from_fixtures`].
#[derive(Clone, Default)]
pub struct MockNexTrip {
    fixtures: Arc<RwLock<HashMap<String, String>>>,
    requests: Arc<Mutex<HashMap<String, usize>>>,
}

impl MockNexTrip {
    /// Create a new mock source by loading JSON files from a directory.
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self, NexTripError> {
        let data_dir = data_dir.as_ref();
        let mut fixtures = HashMap::new();

        let entries = std::fs::read_dir(data_dir).map_err(|e| {
            NexTripError::Fixture(format!("failed to read {}: {e}", data_dir.display()))
        })?;

        for entry in entries {
            let path = entry
                .map_err(|e| NexTripError::Fixture(format!("failed to read entry: {e}")))?
                .path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| NexTripError::Fixture(format!("invalid filename: {path:?}")))?;

            let body = std::fs::read_to_string(&path)
                .map_err(|e| NexTripError::Fixture(format!("failed to read {path:?}: {e}")))?;

            fixtures.insert(stem.replace('_', "/"), body);
        }

        if fixtures.is_empty() {
            return Err(NexTripError::Fixture(format!(
                "no fixture files found in {}",
                data_dir.display()
            )));
        }

        Ok(Self::from_fixtures(fixtures))
    }

    /// Create a mock source from `(path, body)` pairs.
    pub fn from_fixtures<P, B>(fixtures: impl IntoIterator<Item = (P, B)>) -> Self
    where
        P: Into<String>,
        B: Into<String>,
    {
        let fixtures = fixtures
            .into_iter()
            .map(|(p, b)| (p.into(), b.into()))
            .collect();
        Self {
            fixtures: Arc::new(RwLock::new(fixtures)),
            requests: Arc::default(),
        }
    }

    /// Replace (or add) the body served for an endpoint.
    pub fn set_fixture(&self, endpoint: &Endpoint, body: impl Into<String>) {
        self.fixtures
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(endpoint.path(), body.into());
    }

    /// Number of requests received for an endpoint.
    pub fn requests_for(&self, endpoint: &Endpoint) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&endpoint.path())
            .copied()
            .unwrap_or(0)
    }

    /// Total number of requests received.
    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .sum()
    }
}

#[async_trait]
impl NexTripSource for MockNexTrip {
    async fn fetch(&self, endpoint: &Endpoint) -> Result<String, NexTripError> {
        let path = endpoint.path();
        debug!(%path, "mock request");

        // The maps stay consistent even if a holder panicked
        *self
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(path.clone())
            .or_default() += 1;

        self.fixtures
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&path)
            .cloned()
            .ok_or_else(|| NexTripError::Api {
                status: 404,
                message: format!("no mock data for {path}"),
            })
    }
}
