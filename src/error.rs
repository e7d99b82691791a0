//! Error taxonomy for the planner pipeline.
//!
//! Per-cluster faults ([`ProviderError`], [`SolverFailure`]) are recorded on
//! the failed day and never abort the trip. [`ClusteringError`] and
//! [`GeocodingError`] are fatal and surface through [`PlanError`] before any
//! network or solver work starts.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatrixError {
    #[error("distance matrix has no rows")]
    Empty,

    #[error("row {row} has {actual} entries, expected {expected}")]
    NotSquare {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("diagonal entry {index} is {value}, expected 0")]
    NonZeroDiagonal { index: usize, value: u64 },
}

/// Failures of the distance-matrix oracle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    #[error("oracle returned HTTP {status}")]
    Status { status: u16 },

    #[error("oracle rejected the request ({code}): {message}")]
    Oracle { code: String, message: String },

    #[error("malformed matrix: {reason}")]
    Malformed { reason: String },

    #[error("matrix has {actual} rows, requested {expected} locations")]
    SizeMismatch { expected: usize, actual: usize },
}

impl ProviderError {
    /// Whether fetching the same coordinates again could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Request { .. } | Self::Timeout { .. } | Self::Status { .. }
        )
    }
}

impl From<MatrixError> for ProviderError {
    fn from(err: MatrixError) -> Self {
        ProviderError::Malformed {
            reason: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClusteringError {
    #[error("cannot split {locations} destinations into {days} days")]
    InvalidDayCount { days: usize, locations: usize },

    #[error("location {id} has no valid coordinates")]
    InvalidCoordinate { id: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverFailure {
    #[error("distance matrix is empty")]
    EmptyMatrix,

    #[error("start node {start} is outside a matrix of size {size}")]
    StartOutOfRange { start: usize, size: usize },

    #[error("matrix covers {actual} nodes, cluster has {expected}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("distance {max_entry} exceeds the per-leg limit {limit} for this matrix")]
    CostOverflow { max_entry: u64, limit: u64 },

    #[error("construction placed {placed} of {expected} nodes")]
    Incomplete { placed: usize, expected: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeocodingError {
    #[error("could not resolve {address:?}: {reason}")]
    Unresolved { address: String, reason: String },

    #[error("not a directions link {url:?}: {reason}")]
    InvalidMapLink { url: String, reason: String },
}

/// Fatal errors that prevent a plan from being produced at all.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error(transparent)]
    Clustering(#[from] ClusteringError),

    #[error(transparent)]
    Geocoding(#[from] GeocodingError),

    #[error("depot index {depot} is outside {locations} locations")]
    UnknownDepot { depot: usize, locations: usize },

    #[error("location {id} has no valid coordinates")]
    InvalidLocation { id: usize },

    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),
}

/// Why a single day ended up without a route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error("distance fetch failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("solver failed: {0}")]
    Solver(#[from] SolverFailure),

    #[error("cancelled before completion")]
    Cancelled,
}
