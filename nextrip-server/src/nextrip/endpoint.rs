//! NexTrip endpoints and their request signatures.

use std::fmt;

use super::error::NexTripError;

/// How long responses from an endpoint may be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheCategory {
    /// Semi-static data: providers, routes, directions, stops
    General,
    /// Departure boards
    Departures,
    /// Live vehicle positions
    VehicleLocations,
}

/// A single NexTrip request, identified by endpoint and parameters.
///
/// Doubles as the cache key: two equal endpoints fetch the same resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Providers,
    Routes,
    Directions {
        route: u32,
    },
    Stops {
        route: u32,
        direction: u32,
    },
    Departures {
        stop_id: u32,
    },
    TimepointDepartures {
        route: u32,
        direction: u32,
        stop_code: String,
    },
    VehicleLocations {
        route: u32,
    },
}

impl Endpoint {
    /// Timepoint departures for a stop code such as `TF1`.
    ///
    /// Stop codes are short alphanumeric identifiers. Anything else is
    /// rejected here so it never reaches an upstream URL or a cache key.
    pub fn timepoint_departures(
        route: u32,
        direction: u32,
        stop_code: &str,
    ) -> Result<Self, NexTripError> {
        if stop_code.is_empty() || !stop_code.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(NexTripError::InvalidRequest(format!(
                "Invalid stop code '{stop_code}'"
            )));
        }

        Ok(Endpoint::TimepointDepartures {
            route,
            direction,
            stop_code: stop_code.to_string(),
        })
    }

    /// Path segments relative to the API base URL, unencoded.
    pub fn segments(&self) -> Vec<String> {
        match self {
            Endpoint::Providers => vec!["Providers".to_string()],
            Endpoint::Routes => vec!["Routes".to_string()],
            Endpoint::Directions { route } => vec!["Directions".to_string(), route.to_string()],
            Endpoint::Stops { route, direction } => {
                vec!["Stops".to_string(), route.to_string(), direction.to_string()]
            }
            Endpoint::Departures { stop_id } => {
                vec!["Departures".to_string(), stop_id.to_string()]
            }
            Endpoint::TimepointDepartures {
                route,
                direction,
                stop_code,
            } => vec![route.to_string(), direction.to_string(), stop_code.clone()],
            Endpoint::VehicleLocations { route } => {
                vec!["VehicleLocations".to_string(), route.to_string()]
            }
        }
    }

    /// Path relative to the API base URL, e.g. `Stops/901/1`.
    pub fn path(&self) -> String {
        self.segments().join("/")
    }

    pub fn category(&self) -> CacheCategory {
        match self {
            Endpoint::Providers
            | Endpoint::Routes
            | Endpoint::Directions { .. }
            | Endpoint::Stops { .. } => CacheCategory::General,
            Endpoint::Departures { .. } | Endpoint::TimepointDepartures { .. } => {
                CacheCategory::Departures
            }
            Endpoint::VehicleLocations { .. } => CacheCategory::VehicleLocations,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
