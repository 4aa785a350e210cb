//! Next-departure lookup by human-readable names.
//!
//! Resolves a route name, stop name and direction name to NexTrip
//! identifiers, then reports how many minutes until the next departure.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::cache::CachedNexTrip;
use crate::nextrip::{CardinalDirection, Departure, Direction, NexTripError};

/// Find the first item whose label matches `name`.
///
/// An exact case-insensitive match wins; otherwise the first label that
/// contains `name` (case-insensitively) is used.
fn find_by_name<'a, T>(items: &'a [T], name: &str, label: impl Fn(&T) -> &str) -> Option<&'a T> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    items
        .iter()
        .find(|item| label(item).to_lowercase() == needle)
        .or_else(|| {
            items
                .iter()
                .find(|item| label(item).to_lowercase().contains(&needle))
        })
}

/// Find the direction matching `name`, either by its text ("SOUTHBOUND")
/// or by cardinal name ("south").
fn find_direction<'a>(directions: &'a [Direction], name: &str) -> Option<&'a Direction> {
    let cardinal = CardinalDirection::parse(name).map(|d| d.value().to_string());

    directions.iter().find(|d| {
        d.text.eq_ignore_ascii_case(name.trim()) || cardinal.as_deref() == Some(d.value.trim())
    })
}

/// Whole minutes until the earliest departure after `now`.
///
/// Returns `None` if no departure is still to come.
pub fn minutes_until_next(
    departures: &[Departure],
    now: DateTime<Utc>,
) -> Result<Option<i64>, NexTripError> {
    let mut next: Option<DateTime<Utc>> = None;
    for departure in departures {
        let time = departure.departs_at()?;
        if time > now && next.is_none_or(|n| time < n) {
            next = Some(time);
        }
    }

    Ok(next.map(|t| (t - now).num_minutes().max(0)))
}

impl CachedNexTrip {
    /// Minutes until the next departure of `route_name` from `stop_name`
    /// heading `direction_name`, or `None` if no bus is coming.
    pub async fn demo(
        &self,
        route_name: &str,
        stop_name: &str,
        direction_name: &str,
        cache_bust: bool,
    ) -> Result<Option<i64>, NexTripError> {
        self.demo_at(route_name, stop_name, direction_name, cache_bust, Utc::now())
            .await
    }

    /// As [`CachedNexTrip::demo`], measured from a given instant.
    pub async fn demo_at(
        &self,
        route_name: &str,
        stop_name: &str,
        direction_name: &str,
        cache_bust: bool,
        now: DateTime<Utc>,
    ) -> Result<Option<i64>, NexTripError> {
        debug!(route_name, "resolving route");
        let routes = self.routes(None, cache_bust).await?;
        let route = find_by_name(&routes, route_name, |r| r.description.as_str())
            .ok_or_else(|| NexTripError::NotFound("Route not found".to_string()))?
            .id()?;
        debug!(route, "found route");

        debug!(direction_name, "resolving direction");
        let directions = self.directions(route, cache_bust).await?;
        let direction: u32 = find_direction(&directions, direction_name)
            .and_then(|d| d.value.trim().parse().ok())
            .ok_or_else(|| NexTripError::NotFound("Direction not found".to_string()))?;
        debug!(direction, "found direction");

        debug!(stop_name, "resolving stop");
        let stops = self.stops(route, direction, cache_bust).await?;
        let stop = find_by_name(&stops, stop_name, |s| s.text.as_str())
            .ok_or_else(|| NexTripError::NotFound("Stop not found".to_string()))?;
        debug!(stop = %stop.value, "found stop");

        let departures = self
            .timepoint_departures(route, direction, &stop.value, cache_bust)
            .await?;
        let minutes = minutes_until_next(&departures, now)?;
        debug!(?minutes, "next departure");

        Ok(minutes)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cache::CacheConfig;
    use crate::nextrip::{Endpoint, MockNexTrip, parse_nextrip_time};
    use chrono::Duration;
    use proptest::prelude::*;

    fn fixture_dir() -> &'static str {
        concat!(env!("CARGO_MANIFEST_DIR"), "/data/mock_nextrip")
    }

    fn client() -> (MockNexTrip, CachedNexTrip) {
        let mock = MockNexTrip::new(fixture_dir()).unwrap();
        let client = CachedNexTrip::new(Arc::new(mock.clone()), &CacheConfig::default());
        (mock, client)
    }

    /// The 12:00 Blue Line departure in the fixtures.
    fn fixture_departure() -> DateTime<Utc> {
        parse_nextrip_time("/Date(1760634000000-0500)/").unwrap()
    }

    fn departure_at(time: DateTime<Utc>) -> Departure {
        Departure {
            departure_time: format!("/Date({}-0500)/", time.timestamp_millis()),
            ..Departure::default()
        }
    }

    #[tokio::test]
    async fn next_departure_in_minutes() {
        let (_mock, client) = client();
        let now = fixture_departure() - Duration::minutes(57) - Duration::seconds(20);

        let minutes = client
            .demo_at(
                "METRO Blue Line",
                "Target Field Station Platform 1",
                "south",
                false,
                now,
            )
            .await
            .unwrap();

        assert_eq!(minutes, Some(57));
    }

    #[tokio::test]
    async fn names_match_case_insensitively_and_by_substring() {
        let (_mock, client) = client();
        let now = fixture_departure() - Duration::minutes(10);

        let minutes = client
            .demo_at("blue line", "target field station", "SOUTHBOUND", false, now)
            .await
            .unwrap();

        assert_eq!(minutes, Some(10));
    }

    #[tokio::test]
    async fn unknown_route() {
        let (_mock, client) = client();

        let err = client
            .demo(
                "Nonexistent Route",
                "Target Field Station Platform 1",
                "south",
                false,
            )
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Route not found");
    }

    #[tokio::test]
    async fn unknown_direction() {
        let (_mock, client) = client();

        let err = client
            .demo("METRO Blue Line", "Target Field Station Platform 1", "east", false)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Direction not found");
    }

    #[tokio::test]
    async fn unknown_stop() {
        let (_mock, client) = client();

        let err = client
            .demo("METRO Blue Line", "Union Depot", "south", false)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Stop not found");
    }

    #[tokio::test]
    async fn no_bus_when_all_departures_passed() {
        let (_mock, client) = client();
        let now = parse_nextrip_time("/Date(4102488000000-0600)/").unwrap();

        let minutes = client
            .demo_at(
                "METRO Blue Line",
                "Target Field Station Platform 1",
                "south",
                false,
                now,
            )
            .await
            .unwrap();

        assert_eq!(minutes, None);
    }

    #[tokio::test]
    async fn no_bus_when_board_empty() {
        let (mock, client) = client();
        mock.set_fixture(
            &Endpoint::TimepointDepartures {
                route: 901,
                direction: 1,
                stop_code: "TF1".into(),
            },
            "[]",
        );

        let minutes = client
            .demo("METRO Blue Line", "Target Field Station Platform 1", "south", false)
            .await
            .unwrap();

        assert_eq!(minutes, None);
    }

    #[tokio::test]
    async fn repeated_lookups_use_cache() {
        let (mock, client) = client();
        let now = fixture_departure() - Duration::minutes(5);

        for _ in 0..3 {
            client
                .demo_at(
                    "METRO Blue Line",
                    "Target Field Station Platform 1",
                    "south",
                    false,
                    now,
                )
                .await
                .unwrap();
        }

        // routes, directions, stops, timepoint departures
        assert_eq!(mock.request_count(), 4);
    }

    #[test]
    fn earliest_upcoming_departure_wins() {
        let now = fixture_departure();
        let departures = vec![
            departure_at(now + Duration::minutes(30)),
            departure_at(now - Duration::minutes(5)),
            departure_at(now + Duration::minutes(12)),
        ];

        assert_eq!(minutes_until_next(&departures, now).unwrap(), Some(12));
    }

    #[test]
    fn departure_under_a_minute_away_is_zero() {
        let now = fixture_departure();
        let departures = vec![departure_at(now + Duration::seconds(40))];

        assert_eq!(minutes_until_next(&departures, now).unwrap(), Some(0));
    }

    #[test]
    fn malformed_departure_time_is_an_error() {
        let mut departure = departure_at(fixture_departure());
        departure.departure_time = "soon".into();

        assert!(matches!(
            minutes_until_next(&[departure], fixture_departure()),
            Err(NexTripError::InvalidTime(_))
        ));
    }

    #[test]
    fn direction_matches_text_or_cardinal_name() {
        let directions = vec![
            Direction {
                text: "NORTHBOUND".into(),
                value: "4".into(),
            },
            Direction {
                text: "SOUTHBOUND".into(),
                value: "1".into(),
            },
        ];

        assert_eq!(find_direction(&directions, "south").unwrap().value, "1");
        assert_eq!(find_direction(&directions, "northbound").unwrap().value, "4");
        assert!(find_direction(&directions, "west").is_none());
        assert!(find_direction(&directions, "sideways").is_none());
    }

    #[test]
    fn exact_name_preferred_over_substring() {
        let names = vec!["Route 2 - Franklin Av", "Route 2"];
        let found = find_by_name(&names, "route 2", |s| *s).unwrap();
        assert_eq!(*found, "Route 2");

        assert!(find_by_name(&names, "", |s| *s).is_none());
    }

    proptest! {
        #[test]
        fn minutes_never_negative_and_never_overstated(
            offsets in prop::collection::vec(-7_200i64..7_200, 0..10),
        ) {
            let now = fixture_departure();
            let departures: Vec<Departure> = offsets
                .iter()
                .map(|s| departure_at(now + Duration::seconds(*s)))
                .collect();

            let minutes = minutes_until_next(&departures, now).unwrap();
            let soonest = offsets.iter().copied().filter(|s| *s > 0).min();

            match (minutes, soonest) {
                (Some(m), Some(s)) => {
                    prop_assert!(m >= 0);
                    prop_assert_eq!(m, s / 60);
                }
                (None, None) => {}
                other => prop_assert!(false, "mismatch: {:?}", other),
            }
        }
    }
}
