//! Application state for the web layer.

use std::sync::Arc;

use crate::cache::CachedNexTrip;

/// Shared application state.
///
/// One cached client (and so one cache) serves every request.
#[derive(Clone)]
pub struct AppState {
    /// Cached NexTrip API client
    pub nextrip: Arc<CachedNexTrip>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(nextrip: CachedNexTrip) -> Self {
        Self {
            nextrip: Arc::new(nextrip),
        }
    }
}
