//! Geographic locations forming a trip's reference frame.

use serde::{Deserialize, Serialize};

/// A point to visit (or the depot), identified by its position in the
/// caller's input list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// Stable index into the input location list.
    pub id: usize,
}

impl Location {
    pub fn new(id: usize, latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            id,
        }
    }

    /// Coordinates as (lat, lng).
    pub fn coordinates(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }

    /// Finite, with latitude in [-90, 90] and longitude in [-180, 180].
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Build locations from (lat, lng) pairs, numbering them by position.
    pub fn from_coordinates(coordinates: &[(f64, f64)]) -> Vec<Self> {
        coordinates
            .iter()
            .enumerate()
            .map(|(id, &(lat, lng))| Self::new(id, lat, lng))
            .collect()
    }
}
