//! Seams to the planner's external collaborators.
//!
//! The core needs a matrix for an ordered coordinate list and, for address
//! input, coordinates for free-form strings.

use crate::error::{GeocodingError, ProviderError};
use crate::matrix::DistanceMatrix;

/// Provides a distance matrix for a set of locations.
///
/// The matrix is indexed by the provided location order. Implementations
/// must be shareable across worker threads; the orchestrator calls them
/// concurrently, once per cluster.
pub trait DistanceMatrixProvider: Sync {
    /// Locations are (lat, lng).
    fn matrix_for(&self, locations: &[(f64, f64)]) -> Result<DistanceMatrix, ProviderError>;
}

impl<T: DistanceMatrixProvider + ?Sized> DistanceMatrixProvider for &T {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> Result<DistanceMatrix, ProviderError> {
        (**self).matrix_for(locations)
    }
}

/// Resolves an address string into (lat, lng).
pub trait Geocoder {
    fn geocode(&self, address: &str) -> Result<(f64, f64), GeocodingError>;
}
