//! NexTrip (Metro Transit real-time departures) client.
//!
//! This module provides an HTTP client for the NexTrip API, which serves
//! providers, routes, stops and live departure information as JSON.
//!
//! Key characteristics of NexTrip:
//! - Responses are plain JSON arrays with PascalCase field names
//! - Stops are identified by a short stop code (e.g. "TF1") per route and
//!   direction, or by a numeric stop ID for the departures board
//! - Timestamps use the `"/Date(1565114820000-0500)/"` format

mod client;
mod endpoint;
mod error;
mod mock;
mod source;
mod types;

pub use client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, NexTripClient, NexTripConfig};
pub use endpoint::{CacheCategory, Endpoint};
pub use error::NexTripError;
pub use mock::MockNexTrip;
pub use source::NexTripSource;
pub use types::{
    CardinalDirection, Departure, Direction, Provider, RawJson, Route, Stop, TextValuePair,
    VehicleLocation, parse_nextrip_time,
};
