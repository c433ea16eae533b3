//! Mapbox routing collaborator.
//!
//! Chains the departure transition, outbound transits, range entry/fix/exit,
//! inbound transits, and approach transition into a waypoint list, renders it
//! as a coordinate block, and plots it through the Mapbox static-images API.
//! Elevation for ATO ground targets comes from the terrain tilequery API.

use crate::config::refdata::{Coords, RangeData};
use crate::core::collaborators::{RouteArtifact, RoutePlanner};
use crate::errors::{Error, Result};
use async_trait::async_trait;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::debug;

const STATIC_IMAGE_SIZE: &str = "800x500";
const FEET_PER_METER: f64 = 3.28084;

/// Builds the ordered waypoint chain for a plan from the reference dataset.
///
/// # Errors
/// [`Error::UnknownRange`] for an unknown range id, [`Error::Routing`] when a
/// procedure or transit referenced by the plan is missing or the procedure
/// has no routing to the range.
pub fn waypoints_for(
    data: &RangeData,
    range_id: &str,
    departure_id: &str,
    approach_id: &str,
) -> Result<Vec<Coords>> {
    let range = data.range(range_id)?;
    let departure = data.departure(departure_id).ok_or_else(|| Error::Routing {
        message: format!("unknown departure '{departure_id}'"),
    })?;
    let approach = data.approach(approach_id).ok_or_else(|| Error::Routing {
        message: format!("unknown approach '{approach_id}'"),
    })?;

    let leg = |procedure: &crate::config::refdata::Procedure| -> Result<Vec<Coords>> {
        let routing = procedure
            .routings
            .iter()
            .find(|r| r.range == range.id)
            .ok_or_else(|| Error::Routing {
                message: format!("'{}' has no routing to {}", procedure.id, range.id),
            })?;
        routing
            .route
            .iter()
            .map(|id| {
                data.transit(id)
                    .map(|t| Coords { lat: t.lat, lon: t.lon })
                    .ok_or_else(|| Error::Routing {
                        message: format!("unknown transit '{id}'"),
                    })
            })
            .collect()
    };

    let entry = range.entries.first().ok_or_else(|| Error::Routing {
        message: format!("{} has no entry point", range.id),
    })?;
    let exit = range.exits.first().ok_or_else(|| Error::Routing {
        message: format!("{} has no exit point", range.id),
    })?;

    let mut waypoints = vec![departure.transition];
    waypoints.extend(leg(departure)?);
    waypoints.push(Coords { lat: entry.lat, lon: entry.lon });
    waypoints.push(range.navfix);
    waypoints.push(Coords { lat: exit.lat, lon: exit.lon });
    waypoints.extend(leg(approach)?);
    waypoints.push(approach.transition);
    Ok(waypoints)
}

fn describe(waypoints: &[Coords]) -> String {
    let mut block = String::new();
    for point in waypoints {
        let _ = writeln!(block, "{:.4} {:.4}", point.lat, point.lon);
    }
    block
}

/// Percent-encodes everything outside the unreserved set, as the static-image
/// API requires for inline GeoJSON overlays.
fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len() * 3);
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char);
            }
            _ => {
                let _ = write!(out, "%{byte:02X}");
            }
        }
    }
    out
}

/// [`RoutePlanner`] backed by the Mapbox HTTP APIs.
pub struct MapboxRouter {
    data: Arc<RangeData>,
    token: String,
    client: reqwest::Client,
}

impl MapboxRouter {
    /// Creates a router over the injected dataset and access token.
    #[must_use]
    pub fn new(data: Arc<RangeData>, token: String) -> Self {
        Self {
            data,
            token,
            client: reqwest::Client::new(),
        }
    }

    fn plot_url(&self, waypoints: &[Coords]) -> String {
        let coordinates: Vec<[f64; 2]> = waypoints.iter().map(|c| [c.lon, c.lat]).collect();
        let overlay = serde_json::json!({
            "type": "Feature",
            "properties": { "stroke": "#ff4400", "stroke-width": 3 },
            "geometry": { "type": "LineString", "coordinates": coordinates },
        });
        format!(
            "https://api.mapbox.com/styles/v1/mapbox/dark-v11/static/geojson({})/auto/{STATIC_IMAGE_SIZE}?access_token={}",
            percent_encode(&overlay.to_string()),
            self.token
        )
    }

    async fn fetch_plot(&self, waypoints: &[Coords]) -> Result<Vec<u8>> {
        let url = self.plot_url(waypoints);
        debug!(points = waypoints.len(), "fetching route plot");
        let response = self.client.get(&url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl RoutePlanner for MapboxRouter {
    async fn plan_route(
        &self,
        serial: &str,
        _flight: &str,
        range: &str,
        departure: &str,
        approach: &str,
    ) -> Result<RouteArtifact> {
        let waypoints = waypoints_for(&self.data, range, departure, approach)?;
        let image = self.fetch_plot(&waypoints).await?;
        Ok(RouteArtifact {
            serial: serial.to_string(),
            description: describe(&waypoints),
            waypoints,
            image,
        })
    }

    #[allow(clippy::cast_possible_truncation)]
    async fn elevation(&self, coords: Coords) -> Result<i64> {
        let url = format!(
            "https://api.mapbox.com/v4/mapbox.mapbox-terrain-v2/tilequery/{},{}.json?layers=contour&limit=50&access_token={}",
            coords.lon, coords.lat, self.token
        );
        let body: serde_json::Value = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let meters = body["features"]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|f| f["properties"]["ele"].as_i64())
            .max()
            .ok_or_else(|| Error::Routing {
                message: "no contour data at target".to_string(),
            })?;

        Ok((meters as f64 * FEET_PER_METER).round() as i64)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::sample_refdata;

    #[test]
    fn test_waypoint_chain_order() {
        let data = sample_refdata();
        let waypoints = waypoints_for(&data, "RANGE7", "KUT-E", "KUT-W").unwrap();

        // transition, T1, entry, navfix, exit, T2, transition
        assert_eq!(waypoints.len(), 7);
        let range = data.range("RANGE7").unwrap();
        assert_eq!(waypoints[0], data.departure("KUT-E").unwrap().transition);
        assert_eq!(waypoints[2].lat, range.entries[0].lat);
        assert_eq!(waypoints[3], range.navfix);
        assert_eq!(waypoints[4].lon, range.exits[0].lon);
        assert_eq!(waypoints[6], data.approach("KUT-W").unwrap().transition);
    }

    #[test]
    fn test_missing_routing_is_a_routing_error() {
        let data = sample_refdata();
        // SEN-N only serves RANGE12
        let result = waypoints_for(&data, "RANGE7", "SEN-N", "KUT-W");
        assert!(matches!(result, Err(Error::Routing { .. })));

        let result = waypoints_for(&data, "RANGE99", "KUT-E", "KUT-W");
        assert!(matches!(result, Err(Error::UnknownRange { .. })));
    }

    #[test]
    fn test_description_lists_each_point() {
        let data = sample_refdata();
        let waypoints = waypoints_for(&data, "RANGE7", "KUT-E", "KUT-W").unwrap();
        let block = describe(&waypoints);
        assert_eq!(block.lines().count(), waypoints.len());
        assert!(block.starts_with("42.1800 42.4800"));
    }

    #[test]
    fn test_percent_encoding_covers_geojson_delimiters() {
        let encoded = percent_encode(r#"{"a":[1,2]}"#);
        assert_eq!(encoded, "%7B%22a%22%3A%5B1%2C2%5D%7D");
    }
}
