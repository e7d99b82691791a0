//! Distance providers with scripted behaviour.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use trip_planner::error::ProviderError;
use trip_planner::haversine::HaversineMatrix;
use trip_planner::matrix::DistanceMatrix;
use trip_planner::traits::DistanceMatrixProvider;

fn contains(locations: &[(f64, f64)], target: (f64, f64)) -> bool {
    locations.iter().any(|&location| location == target)
}

/// Haversine provider that counts calls.
#[derive(Debug, Default)]
pub struct CountingMatrix {
    pub calls: AtomicUsize,
}

impl CountingMatrix {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DistanceMatrixProvider for CountingMatrix {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> Result<DistanceMatrix, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        HaversineMatrix::default().matrix_for(locations)
    }
}

/// Fails with `error` for any request that includes `poisoned`.
#[derive(Debug)]
pub struct FailingFor {
    pub poisoned: (f64, f64),
    pub error: ProviderError,
    pub calls: AtomicUsize,
}

impl FailingFor {
    pub fn new(poisoned: (f64, f64), error: ProviderError) -> Self {
        Self {
            poisoned,
            error,
            calls: AtomicUsize::new(0),
        }
    }
}

impl DistanceMatrixProvider for FailingFor {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> Result<DistanceMatrix, ProviderError> {
        if contains(locations, self.poisoned) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            return Err(self.error.clone());
        }
        HaversineMatrix::default().matrix_for(locations)
    }
}

/// Returns a matrix one node short for requests that include `poisoned`.
#[derive(Debug)]
pub struct UndersizedFor {
    pub poisoned: (f64, f64),
}

impl DistanceMatrixProvider for UndersizedFor {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> Result<DistanceMatrix, ProviderError> {
        if contains(locations, self.poisoned) {
            return HaversineMatrix::default().matrix_for(&locations[..locations.len() - 1]);
        }
        HaversineMatrix::default().matrix_for(locations)
    }
}

/// Fails the first `failures` calls with a transient error.
#[derive(Debug)]
pub struct Flaky {
    pub failures: AtomicUsize,
    pub calls: AtomicUsize,
}

impl Flaky {
    pub fn new(failures: usize) -> Self {
        Self {
            failures: AtomicUsize::new(failures),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DistanceMatrixProvider for Flaky {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> Result<DistanceMatrix, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(ProviderError::Status { status: 503 });
        }
        HaversineMatrix::default().matrix_for(locations)
    }
}

/// Raises `cancel` while serving the `trigger`-th call (1-based).
#[derive(Debug)]
pub struct CancelOnCall<'a> {
    pub cancel: &'a AtomicBool,
    pub trigger: usize,
    pub calls: AtomicUsize,
}

impl<'a> CancelOnCall<'a> {
    pub fn new(cancel: &'a AtomicBool, trigger: usize) -> Self {
        Self {
            cancel,
            trigger,
            calls: AtomicUsize::new(0),
        }
    }
}

impl DistanceMatrixProvider for CancelOnCall<'_> {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> Result<DistanceMatrix, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.trigger {
            self.cancel.store(true, Ordering::SeqCst);
        }
        HaversineMatrix::default().matrix_for(locations)
    }
}
