//! NexTrip API response types.
//!
//! The proxy routes serve upstream bodies as [`RawJson`], byte for byte.
//! The typed records below mirror that JSON (PascalCase field names) for the
//! code that reads fields, so only the fields it needs are required.
//! Timestamps stay in their wire form and are parsed on demand.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::NexTripError;

/// An upstream response body holding a JSON array, kept exactly as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawJson(Arc<str>);

impl RawJson {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Arc<str>> for RawJson {
    fn from(body: Arc<str>) -> Self {
        Self(body)
    }
}

impl From<String> for RawJson {
    fn from(body: String) -> Self {
        Self(body.into())
    }
}

/// A `{Text, Value}` pair, used by several endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TextValuePair {
    /// Human-readable label
    pub text: String,
    /// Identifier to pass back to the API
    pub value: String,
}

/// A transit provider, e.g. `{"Text": "Metro Transit", "Value": "8"}`.
pub type Provider = TextValuePair;

/// A direction of travel for a route, e.g. `{"Text": "SOUTHBOUND", "Value": "1"}`.
pub type Direction = TextValuePair;

/// A stop along a route, e.g. `{"Text": "Target Field Station Platform 1", "Value": "TF1"}`.
///
/// `Value` is the short stop code used by timepoint departures.
pub type Stop = TextValuePair;

/// A transit route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "ProviderID")]
    pub provider_id: String,
    #[serde(rename = "Route")]
    pub route: String,
}

impl Route {
    /// The numeric route ID used in request paths.
    pub fn id(&self) -> Result<u32, NexTripError> {
        self.route.trim().parse().map_err(|_| NexTripError::Json {
            message: format!("non-numeric route ID: {}", self.route),
            body: None,
        })
    }
}

/// A scheduled or real-time departure.
///
/// Only the departure time is required; NexTrip sends `null` for fields
/// that do not apply, such as `Gate` away from rail platforms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Departure {
    /// True if the time is a real-time estimate rather than the schedule
    pub actual: Option<bool>,
    pub block_number: Option<i64>,
    /// Display text, e.g. "5 Min" or "10:42"
    pub departure_text: Option<String>,
    /// Wire-format timestamp, see [`parse_nextrip_time`]
    pub departure_time: String,
    pub description: Option<String>,
    pub gate: Option<String>,
    pub route: Option<String>,
    pub route_direction: Option<String>,
    pub terminal: Option<String>,
    pub vehicle_heading: Option<i64>,
    pub vehicle_latitude: Option<f64>,
    pub vehicle_longitude: Option<f64>,
}

impl Departure {
    /// Parse the departure timestamp.
    pub fn departs_at(&self) -> Result<DateTime<Utc>, NexTripError> {
        parse_nextrip_time(&self.departure_time)
    }
}

/// A vehicle's last reported position on a route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct VehicleLocation {
    pub bearing: Option<i64>,
    pub block_number: Option<i64>,
    pub direction: Option<i64>,
    pub location_time: String,
    pub odometer: Option<i64>,
    pub speed: Option<f64>,
    pub vehicle_latitude: Option<f64>,
    pub vehicle_longitude: Option<f64>,
}

impl VehicleLocation {
    /// Parse the time the location was reported.
    pub fn reported_at(&self) -> Result<DateTime<Utc>, NexTripError> {
        parse_nextrip_time(&self.location_time)
    }
}

/// NexTrip's numbering of cardinal directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardinalDirection {
    South = 1,
    East = 2,
    West = 3,
    North = 4,
}

impl CardinalDirection {
    /// Parse a direction name such as "south" or "Southbound".
    pub fn parse(name: &str) -> Option<Self> {
        let lower = name.trim().to_ascii_lowercase();
        let base = lower.strip_suffix("bound").unwrap_or(&lower);
        match base {
            "south" => Some(Self::South),
            "east" => Some(Self::East),
            "west" => Some(Self::West),
            "north" => Some(Self::North),
            _ => None,
        }
    }

    /// The direction's value in API requests.
    pub fn value(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for CardinalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Parse a NexTrip timestamp of the form `"/Date(1565114820000-0500)/"`.
///
/// The millisecond count is UTC epoch time; the trailing offset only records
/// the local zone and does not shift the instant.
pub fn parse_nextrip_time(raw: &str) -> Result<DateTime<Utc>, NexTripError> {
    let invalid = || NexTripError::InvalidTime(raw.to_string());

    let inner = raw
        .strip_prefix("/Date(")
        .and_then(|s| s.strip_suffix(")/"))
        .ok_or_else(invalid)?;

    // Skip the first char so a leading minus stays with the millis
    let split = inner
        .get(1..)
        .and_then(|rest| rest.find(['+', '-']))
        .map(|i| i + 1)
        .unwrap_or(inner.len());
    let (millis, offset) = inner.split_at(split);

    if !offset.is_empty()
        && (offset.len() != 5 || !offset[1..].bytes().all(|b| b.is_ascii_digit()))
    {
        return Err(invalid());
    }

    let millis: i64 = millis.parse().map_err(|_| invalid())?;
    DateTime::from_timestamp_millis(millis).ok_or_else(invalid)
}
