//! Haversine distance matrix provider (fallback when OSRM unavailable).
//!
//! Uses great-circle distance in meters, optionally inflated by a detour
//! factor to approximate road distance. Less accurate than OSRM (ignores
//! roads) but always available.

use crate::error::ProviderError;
use crate::matrix::DistanceMatrix;
use crate::traits::DistanceMatrixProvider;

/// Mean earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_008.8;

#[derive(Debug, Clone)]
pub struct HaversineMatrix {
    /// Multiplier applied to straight-line distance.
    pub detour_factor: f64,
}

impl Default for HaversineMatrix {
    fn default() -> Self {
        Self { detour_factor: 1.0 }
    }
}

impl HaversineMatrix {
    pub fn new(detour_factor: f64) -> Self {
        Self { detour_factor }
    }

    /// Great-circle distance between two (lat, lng) points in meters.
    pub fn haversine_m(from: (f64, f64), to: (f64, f64)) -> f64 {
        let (lat1, lng1) = from;
        let (lat2, lng2) = to;

        let lat1_rad = lat1.to_radians();
        let lat2_rad = lat2.to_radians();
        let delta_lat = (lat2 - lat1).to_radians();
        let delta_lng = (lng2 - lng1).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_M * c
    }
}

impl DistanceMatrixProvider for HaversineMatrix {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> Result<DistanceMatrix, ProviderError> {
        if locations.is_empty() {
            return Err(ProviderError::Malformed {
                reason: "no coordinates requested".to_string(),
            });
        }

        Ok(DistanceMatrix::from_fn(locations.len(), |i, j| {
            (Self::haversine_m(locations[i], locations[j]) * self.detour_factor).round() as u64
        }))
    }
}
