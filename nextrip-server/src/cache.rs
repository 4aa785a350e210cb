//! Caching layer for NexTrip API responses.
//!
//! NexTrip asks clients to cache semi-static data (providers, routes,
//! directions, stops) for an hour and departure boards for 30 seconds.
//! Entries are keyed by [`Endpoint`], so each distinct request has its own
//! expiry, set from the endpoint's [`CacheCategory`].
//!
//! Bodies are stored as received, and only if they hold a JSON array. A
//! malformed response is returned as an error and the previous entry (if
//! any) is left alone. The proxy routes serve stored bodies unchanged; the
//! typed operations parse them on every call.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache as MokaCache;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::Value;
use tracing::debug;

use crate::nextrip::{
    CacheCategory, Departure, Direction, Endpoint, NexTripError, NexTripSource, Provider,
    RawJson, Route, Stop, VehicleLocation,
};

/// A cached response body and the number of records in it.
#[derive(Debug, Clone)]
pub struct BodyEntry {
    body: Arc<str>,
    len: usize,
}

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for providers, routes, directions and stops.
    pub general_ttl: Duration,

    /// TTL for departures and timepoint departures.
    pub departures_ttl: Duration,

    /// TTL for vehicle locations. Zero disables caching them.
    pub vehicle_locations_ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl CacheConfig {
    /// TTL for an endpoint category.
    pub fn ttl(&self, category: CacheCategory) -> Duration {
        match category {
            CacheCategory::General => self.general_ttl,
            CacheCategory::Departures => self.departures_ttl,
            CacheCategory::VehicleLocations => self.vehicle_locations_ttl,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            general_ttl: Duration::from_secs(3600),
            departures_ttl: Duration::from_secs(30),
            vehicle_locations_ttl: Duration::ZERO,
            max_capacity: 10_000,
        }
    }
}

/// Per-entry expiry driven by the endpoint's category.
struct CategoryExpiry {
    config: CacheConfig,
}

impl Expiry<Endpoint, BodyEntry> for CategoryExpiry {
    fn expire_after_create(
        &self,
        key: &Endpoint,
        _value: &BodyEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(self.config.ttl(key.category()))
    }

    // A cache-busting refetch restarts the window
    fn expire_after_update(
        &self,
        key: &Endpoint,
        _value: &BodyEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(self.config.ttl(key.category()))
    }
}

/// Cache for NexTrip API responses.
pub struct NexTripCache {
    bodies: MokaCache<Endpoint, BodyEntry>,
    config: CacheConfig,
}

impl NexTripCache {
    /// Create a new cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let bodies = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(CategoryExpiry {
                config: config.clone(),
            })
            .build();

        Self {
            bodies,
            config: config.clone(),
        }
    }

    /// Whether responses for this endpoint are cached at all.
    pub fn caches(&self, endpoint: &Endpoint) -> bool {
        !self.config.ttl(endpoint.category()).is_zero()
    }

    /// Get a cached body, if present and unexpired.
    pub async fn get(&self, endpoint: &Endpoint) -> Option<BodyEntry> {
        self.bodies.get(endpoint).await
    }

    /// Store a body, replacing any previous entry.
    pub async fn insert(&self, endpoint: Endpoint, body: BodyEntry) {
        if self.caches(&endpoint) {
            self.bodies.insert(endpoint, body).await;
        }
    }

    /// Get cache statistics (for monitoring).
    pub async fn entry_count(&self) -> u64 {
        self.bodies.run_pending_tasks().await;
        self.bodies.entry_count()
    }
}

/// NexTrip source with caching.
///
/// This is the API client the rest of the crate talks to. Every operation
/// takes a `cache_bust` flag that skips the lookup and forces a fetch; the
/// fresh response still replaces the cached one.
pub struct CachedNexTrip {
    source: Arc<dyn NexTripSource>,
    cache: NexTripCache,
}

impl CachedNexTrip {
    /// Create a new cached client.
    pub fn new(source: Arc<dyn NexTripSource>, cache_config: &CacheConfig) -> Self {
        Self {
            source,
            cache: NexTripCache::new(cache_config),
        }
    }

    /// Fetch an endpoint's body, consulting the cache unless busted.
    async fn body(
        &self,
        endpoint: &Endpoint,
        cache_bust: bool,
    ) -> Result<BodyEntry, NexTripError> {
        if !cache_bust && let Some(entry) = self.cache.get(endpoint).await {
            debug!(%endpoint, "cache hit");
            require_records(endpoint, entry.len)?;
            return Ok(entry);
        }

        debug!(%endpoint, cache_bust, "fetching from upstream");
        let body = self.source.fetch(endpoint).await?;
        let records: Vec<IgnoredAny> = parse_body(&body)?;
        let entry = BodyEntry {
            body: body.into(),
            len: records.len(),
        };
        self.cache.insert(endpoint.clone(), entry.clone()).await;

        require_records(endpoint, entry.len)?;
        Ok(entry)
    }

    /// Fetch and parse an endpoint into typed records.
    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        cache_bust: bool,
    ) -> Result<T, NexTripError> {
        let entry = self.body(&endpoint, cache_bust).await?;
        parse_body(&entry.body)
    }

    /// An endpoint's response body exactly as the upstream sent it.
    pub async fn raw(
        &self,
        endpoint: Endpoint,
        cache_bust: bool,
    ) -> Result<RawJson, NexTripError> {
        Ok(self.body(&endpoint, cache_bust).await?.body.into())
    }

    /// The routes body, optionally restricted to one provider ID.
    ///
    /// Unfiltered, this is the upstream body as sent. Filtering keeps every
    /// field of the matching records, including ones not modelled by [`Route`].
    pub async fn routes_raw(
        &self,
        provider: Option<&str>,
        cache_bust: bool,
    ) -> Result<RawJson, NexTripError> {
        let entry = self.body(&Endpoint::Routes, cache_bust).await?;
        let Some(provider) = provider else {
            return Ok(entry.body.into());
        };

        let routes: Vec<Value> = parse_body(&entry.body)?;
        let matching: Vec<Value> = routes
            .into_iter()
            .filter(|route| provider_matches(route, provider))
            .collect();
        serde_json::to_string(&matching)
            .map(RawJson::from)
            .map_err(|e| NexTripError::Json {
                message: e.to_string(),
                body: None,
            })
    }

    /// All transit providers.
    pub async fn providers(&self, cache_bust: bool) -> Result<Vec<Provider>, NexTripError> {
        self.get(Endpoint::Providers, cache_bust).await
    }

    /// All routes, optionally restricted to one provider ID.
    ///
    /// The upstream has no per-provider endpoint, so filtering happens after
    /// the (cached) full list is fetched.
    pub async fn routes(
        &self,
        provider: Option<&str>,
        cache_bust: bool,
    ) -> Result<Vec<Route>, NexTripError> {
        let routes: Vec<Route> = self.get(Endpoint::Routes, cache_bust).await?;
        Ok(match provider {
            Some(provider) => routes
                .into_iter()
                .filter(|r| r.provider_id == provider)
                .collect(),
            None => routes,
        })
    }

    /// The directions a route runs in.
    ///
    /// An empty answer means the route does not exist.
    pub async fn directions(
        &self,
        route: u32,
        cache_bust: bool,
    ) -> Result<Vec<Direction>, NexTripError> {
        self.get(Endpoint::Directions { route }, cache_bust).await
    }

    /// Stops along a route in one direction.
    ///
    /// An empty answer means the route does not run in that direction.
    pub async fn stops(
        &self,
        route: u32,
        direction: u32,
        cache_bust: bool,
    ) -> Result<Vec<Stop>, NexTripError> {
        self.get(Endpoint::Stops { route, direction }, cache_bust)
            .await
    }

    /// Departures from a stop, by numeric stop ID.
    pub async fn departures(
        &self,
        stop_id: u32,
        cache_bust: bool,
    ) -> Result<Vec<Departure>, NexTripError> {
        self.get(Endpoint::Departures { stop_id }, cache_bust).await
    }

    /// Departures for a route and direction from a stop, by stop code.
    pub async fn timepoint_departures(
        &self,
        route: u32,
        direction: u32,
        stop_code: &str,
        cache_bust: bool,
    ) -> Result<Vec<Departure>, NexTripError> {
        let endpoint = Endpoint::timepoint_departures(route, direction, stop_code)?;
        self.get(endpoint, cache_bust).await
    }

    /// Current positions of vehicles on a route.
    pub async fn vehicle_locations(
        &self,
        route: u32,
        cache_bust: bool,
    ) -> Result<Vec<VehicleLocation>, NexTripError> {
        self.get(Endpoint::VehicleLocations { route }, cache_bust)
            .await
    }

    /// Get cache statistics.
    pub async fn cache_entry_count(&self) -> u64 {
        self.cache.entry_count().await
    }
}

/// Empty directions and stops lists mean the route or direction is unknown.
fn require_records(endpoint: &Endpoint, len: usize) -> Result<(), NexTripError> {
    if len > 0 {
        return Ok(());
    }
    match endpoint {
        Endpoint::Directions { route } => {
            Err(NexTripError::NotFound(format!("Route {route} not found")))
        }
        Endpoint::Stops { route, direction } => Err(NexTripError::NotFound(format!(
            "Direction {direction} not found for route {route}"
        ))),
        _ => Ok(()),
    }
}

/// NexTrip sends `ProviderID` as a string, but accept a bare number too.
fn provider_matches(route: &Value, provider: &str) -> bool {
    match route.get("ProviderID") {
        Some(Value::String(id)) => id == provider,
        Some(Value::Number(id)) => id.to_string() == provider,
        _ => false,
    }
}

/// Parse a response body, keeping a short excerpt on failure.
fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, NexTripError> {
    serde_json::from_str(body).map_err(|e| NexTripError::Json {
        message: e.to_string(),
        body: Some(body.chars().take(500).collect()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nextrip::MockNexTrip;

    fn fixture_dir() -> &'static str {
        concat!(env!("CARGO_MANIFEST_DIR"), "/data/mock_nextrip")
    }

    fn client_with(config: &CacheConfig) -> (MockNexTrip, CachedNexTrip) {
        let mock = MockNexTrip::new(fixture_dir()).unwrap();
        let client = CachedNexTrip::new(Arc::new(mock.clone()), config);
        (mock, client)
    }

    fn client() -> (MockNexTrip, CachedNexTrip) {
        client_with(&CacheConfig::default())
    }

    #[test]
    fn default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl(CacheCategory::General), Duration::from_secs(3600));
        assert_eq!(config.ttl(CacheCategory::Departures), Duration::from_secs(30));
        assert!(config.ttl(CacheCategory::VehicleLocations).is_zero());
    }

    #[tokio::test]
    async fn repeated_calls_hit_upstream_once() {
        let (mock, client) = client();

        let first = client.routes(None, false).await.unwrap();
        let second = client.routes(None, false).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(mock.requests_for(&Endpoint::Routes), 1);
    }

    #[tokio::test]
    async fn cache_bust_always_fetches() {
        let (mock, client) = client();
        let endpoint = Endpoint::Stops {
            route: 901,
            direction: 1,
        };

        client.stops(901, 1, true).await.unwrap();
        client.stops(901, 1, true).await.unwrap();
        assert_eq!(mock.requests_for(&endpoint), 2);

        // The busted fetch still populated the cache
        client.stops(901, 1, false).await.unwrap();
        assert_eq!(mock.requests_for(&endpoint), 2);
    }

    #[tokio::test]
    async fn cache_bust_replaces_entry() {
        let (mock, client) = client();

        let before = client.providers(false).await.unwrap();
        assert_eq!(before.len(), 4);

        mock.set_fixture(
            &Endpoint::Providers,
            r#"[{"Text": "Metro Transit", "Value": "8"}]"#,
        );

        // Still within the window: stale but cached
        assert_eq!(client.providers(false).await.unwrap().len(), 4);

        assert_eq!(client.providers(true).await.unwrap().len(), 1);
        assert_eq!(client.providers(false).await.unwrap().len(), 1);
        assert_eq!(mock.requests_for(&Endpoint::Providers), 2);
    }

    #[tokio::test]
    async fn keys_include_parameters() {
        let (mock, client) = client();

        client.departures(56334, false).await.unwrap();
        client
            .timepoint_departures(901, 1, "TF1", false)
            .await
            .unwrap();
        client.departures(56334, false).await.unwrap();
        client
            .timepoint_departures(901, 1, "TF1", false)
            .await
            .unwrap();

        assert_eq!(mock.request_count(), 2);
        assert_eq!(client.cache_entry_count().await, 2);
    }

    #[tokio::test]
    async fn vehicle_locations_not_cached_by_default() {
        let (mock, client) = client();
        let endpoint = Endpoint::VehicleLocations { route: 901 };

        let vehicles = client.vehicle_locations(901, false).await.unwrap();
        assert_eq!(vehicles.len(), 2);
        client.vehicle_locations(901, false).await.unwrap();

        assert_eq!(mock.requests_for(&endpoint), 2);
    }

    #[tokio::test]
    async fn expired_entries_are_refetched() {
        let config = CacheConfig {
            departures_ttl: Duration::from_millis(50),
            ..CacheConfig::default()
        };
        let (mock, client) = client_with(&config);
        let endpoint = Endpoint::Departures { stop_id: 56334 };

        client.departures(56334, false).await.unwrap();
        client.departures(56334, false).await.unwrap();
        assert_eq!(mock.requests_for(&endpoint), 1);

        tokio::time::sleep(Duration::from_millis(120)).await;

        client.departures(56334, false).await.unwrap();
        assert_eq!(mock.requests_for(&endpoint), 2);
    }

    #[tokio::test]
    async fn routes_filter_by_provider() {
        let (mock, client) = client();

        let metro = client.routes(Some("8"), false).await.unwrap();
        assert_eq!(metro.len(), 3);
        assert!(metro.iter().all(|r| r.provider_id == "8"));

        let none = client.routes(Some("999"), false).await.unwrap();
        assert!(none.is_empty());

        assert_eq!(mock.requests_for(&Endpoint::Routes), 1);
    }

    #[tokio::test]
    async fn unknown_route_directions_is_not_found() {
        let (mock, client) = client();
        mock.set_fixture(&Endpoint::Directions { route: 999 }, "[]");

        let err = client.directions(999, false).await.unwrap_err();
        assert!(err.is_not_found(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn invalid_direction_stops_is_not_found() {
        let (_mock, client) = client();

        let err = client.stops(901, 99, false).await.unwrap_err();
        assert!(err.is_not_found(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn malformed_body_is_not_cached() {
        let (mock, client) = client();
        mock.set_fixture(&Endpoint::Directions { route: 902 }, "<html>oops</html>");

        let err = client.directions(902, false).await.unwrap_err();
        assert!(matches!(err, NexTripError::Json { .. }));

        mock.set_fixture(
            &Endpoint::Directions { route: 902 },
            r#"[{"Text": "EASTBOUND", "Value": "2"}]"#,
        );
        let directions = client.directions(902, false).await.unwrap();
        assert_eq!(directions[0].text, "EASTBOUND");
        assert_eq!(mock.requests_for(&Endpoint::Directions { route: 902 }), 2);
    }

    #[tokio::test]
    async fn raw_body_is_served_as_received() {
        let (mock, client) = client();
        let body = r#"[{"DepartureTime":"/Date(1760634000000-0500)/","Gate":null,"VehicleLatitude":0,"Extra":"kept"}]"#;
        mock.set_fixture(&Endpoint::Departures { stop_id: 1 }, body);

        let raw = client
            .raw(Endpoint::Departures { stop_id: 1 }, false)
            .await
            .unwrap();
        assert_eq!(raw.as_str(), body);

        // The typed view of the same cached body still parses
        let departures = client.departures(1, false).await.unwrap();
        assert_eq!(departures[0].gate, None);
        assert_eq!(mock.requests_for(&Endpoint::Departures { stop_id: 1 }), 1);
    }

    #[tokio::test]
    async fn raw_empty_directions_is_not_found() {
        let (mock, client) = client();
        mock.set_fixture(&Endpoint::Directions { route: 999 }, "[]");

        let err = client
            .raw(Endpoint::Directions { route: 999 }, false)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Route 999 not found");

        // Cached, and still reported as missing on a hit
        let err = client.directions(999, false).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(mock.requests_for(&Endpoint::Directions { route: 999 }), 1);
    }

    #[tokio::test]
    async fn filtered_routes_keep_every_field() {
        let (mock, client) = client();
        mock.set_fixture(
            &Endpoint::Routes,
            r#"[
                {"Description": "METRO Red Line", "ProviderID": "9", "Route": "903", "Color": "red"},
                {"Description": "METRO Blue Line", "ProviderID": "8", "Route": "901"},
                {"Description": "Night Owl", "ProviderID": 9, "Route": "94"}
            ]"#,
        );

        let raw = client.routes_raw(Some("9"), false).await.unwrap();
        let routes: Vec<Value> = serde_json::from_str(raw.as_str()).unwrap();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0]["Color"], "red");
        assert_eq!(routes[1]["ProviderID"], 9);
    }

    #[tokio::test]
    async fn invalid_stop_code_is_never_fetched() {
        let (mock, client) = client();

        let err = client
            .timepoint_departures(901, 1, "../../Providers", false)
            .await
            .unwrap_err();
        assert!(matches!(err, NexTripError::InvalidRequest(_)));
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn upstream_status_errors_propagate() {
        let (_mock, client) = client();

        let err = client.vehicle_locations(5, false).await.unwrap_err();
        assert!(matches!(err, NexTripError::Api { status: 404, .. }));
    }
}
