//! Ordered coordinate sequence handed to a map renderer.
//!
//! Fixes which point is the origin, which is the destination and which are
//! waypoints, and can encode that as a Google Maps directions link.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::location::Location;

/// Directions endpoint of the Maps URLs API.
pub const NAVIGATION_BASE_URL: &str = "https://www.google.com/maps/dir/";

/// A day's route as decoded (lat, lng) points, in visiting order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<(f64, f64)>,
}

impl Polyline {
    /// Wrap (lat, lng) points already in visiting order.
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    /// Points for `stops` in order, closed back to the first stop when
    /// `round_trip` is set.
    pub fn from_stops(stops: &[Location], round_trip: bool) -> Self {
        let mut points: Vec<(f64, f64)> = stops.iter().map(Location::coordinates).collect();
        if round_trip && stops.len() > 1 {
            points.push(stops[0].coordinates());
        }
        Self { points }
    }

    /// All points, origin first.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn into_points(self) -> Vec<(f64, f64)> {
        self.points
    }

    /// First point; `None` when empty.
    pub fn origin(&self) -> Option<(f64, f64)> {
        self.points.first().copied()
    }

    /// Last point, which is the origin again on a closed route.
    pub fn destination(&self) -> Option<(f64, f64)> {
        self.points.last().copied()
    }

    /// Points strictly between origin and destination.
    pub fn waypoints(&self) -> &[(f64, f64)] {
        if self.points.len() <= 2 {
            &[]
        } else {
            &self.points[1..self.points.len() - 1]
        }
    }

    /// Shareable directions link: `origin`, `destination` and `|`-separated
    /// `waypoints` query parameters. `None` with fewer than two points.
    pub fn navigation_link(&self) -> Option<String> {
        let (origin, destination) = match (self.origin(), self.destination()) {
            (Some(origin), Some(destination)) if self.points.len() >= 2 => (origin, destination),
            _ => return None,
        };

        let mut url = Url::parse(NAVIGATION_BASE_URL).ok()?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("api", "1")
                .append_pair("origin", &format_point(origin))
                .append_pair("destination", &format_point(destination));
            if !self.waypoints().is_empty() {
                let waypoints = self
                    .waypoints()
                    .iter()
                    .map(|&point| format_point(point))
                    .collect::<Vec<_>>()
                    .join("|");
                query.append_pair("waypoints", &waypoints);
            }
        }
        Some(url.into())
    }
}

fn format_point((lat, lng): (f64, f64)) -> String {
    format!("{lat},{lng}")
}
