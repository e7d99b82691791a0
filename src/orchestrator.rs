//! Multi-day trip planning.
//!
//! Clusters destinations into days, then fetches a distance matrix and
//! solves a route for every day on a bounded rayon pool. Days fail
//! independently: a provider or solver failure is recorded on that day and
//! the others carry on.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::aggregate::{DayOutcome, FailedDay, RouteAssignment, TripPlan, assemble};
use crate::cluster::{Cluster, ClusterOptions, SpatialClusterer};
use crate::error::{FailureReason, PlanError, SolverFailure};
use crate::geocode::{map_link_addresses, resolve_all};
use crate::location::Location;
use crate::matrix::DistanceMatrix;
use crate::solver::{RouteSolver, SolveOptions};
use crate::traits::{DistanceMatrixProvider, Geocoder};

#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Worker threads; `None` uses the available parallelism.
    pub workers: Option<usize>,
    /// Extra attempts for a distance fetch that failed transiently.
    pub fetch_retries: usize,
    pub solve: SolveOptions,
    pub cluster: ClusterOptions,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            workers: None,
            fetch_retries: 1,
            solve: SolveOptions::default(),
            cluster: ClusterOptions::default(),
        }
    }
}

/// Self-contained unit of work for one day.
#[derive(Debug, Clone)]
pub struct ClusterTask {
    pub cluster_index: usize,
    /// (lat, lng) per local node, depot first.
    pub coordinates: Vec<(f64, f64)>,
    pub start: usize,
    pub round_trip: bool,
    pub options: SolveOptions,
}

impl ClusterTask {
    pub fn new(
        cluster_index: usize,
        cluster: &Cluster,
        round_trip: bool,
        options: SolveOptions,
    ) -> Self {
        Self {
            cluster_index,
            coordinates: cluster.coordinates(),
            start: 0,
            round_trip,
            options,
        }
    }

    /// Fetch the matrix and solve, recording any failure against this day.
    pub fn run<M>(&self, provider: &M, fetch_retries: usize, cancel: &AtomicBool) -> DayOutcome
    where
        M: DistanceMatrixProvider + ?Sized,
    {
        self.try_run(provider, fetch_retries, cancel)
            .map_err(|reason| {
                tracing::warn!(cluster = self.cluster_index, %reason, "day failed");
                FailedDay {
                    cluster_index: self.cluster_index,
                    reason,
                }
            })
    }

    fn try_run<M>(
        &self,
        provider: &M,
        fetch_retries: usize,
        cancel: &AtomicBool,
    ) -> Result<RouteAssignment, FailureReason>
    where
        M: DistanceMatrixProvider + ?Sized,
    {
        if cancel.load(Ordering::Relaxed) {
            return Err(FailureReason::Cancelled);
        }

        tracing::debug!(
            cluster = self.cluster_index,
            nodes = self.coordinates.len(),
            "fetching matrix"
        );
        let matrix = self.fetch(provider, fetch_retries, cancel)?;

        if cancel.load(Ordering::Relaxed) {
            return Err(FailureReason::Cancelled);
        }
        if matrix.size() != self.coordinates.len() {
            return Err(SolverFailure::SizeMismatch {
                expected: self.coordinates.len(),
                actual: matrix.size(),
            }
            .into());
        }

        let route = RouteSolver::new(&matrix, self.start, self.round_trip, self.options.clone())
            .with_cancel(cancel)
            .solve()?;

        Ok(RouteAssignment {
            cluster_index: self.cluster_index,
            order: route.order,
            total_distance: route.total_distance,
        })
    }

    fn fetch<M>(
        &self,
        provider: &M,
        fetch_retries: usize,
        cancel: &AtomicBool,
    ) -> Result<DistanceMatrix, FailureReason>
    where
        M: DistanceMatrixProvider + ?Sized,
    {
        let mut attempt = 0;
        loop {
            match provider.matrix_for(&self.coordinates) {
                Ok(matrix) => return Ok(matrix),
                Err(err)
                    if err.is_transient()
                        && attempt < fetch_retries
                        && !cancel.load(Ordering::Relaxed) =>
                {
                    attempt += 1;
                    tracing::warn!(
                        cluster = self.cluster_index,
                        attempt,
                        error = %err,
                        "retrying distance fetch"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

/// Plans trips against one distance provider.
///
/// Owns its worker pool; the pool's threads stop when the orchestrator is
/// dropped or [`shutdown`](Self::shutdown).
pub struct TripOrchestrator<M> {
    provider: M,
    clusterer: SpatialClusterer,
    config: PlannerConfig,
    pool: rayon::ThreadPool,
}

impl<M: DistanceMatrixProvider> TripOrchestrator<M> {
    pub fn new(provider: M, config: PlannerConfig) -> Result<Self, PlanError> {
        let workers = config.workers.filter(|&n| n > 0).unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        });
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("trip-planner-{index}"))
            .build()
            .map_err(|err| PlanError::WorkerPool(err.to_string()))?;

        Ok(Self {
            provider,
            clusterer: SpatialClusterer::new(config.cluster.clone()),
            config,
            pool,
        })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Plan `days` routes from `locations[depot]` over every other location.
    pub fn plan(
        &self,
        locations: &[Location],
        depot: usize,
        days: usize,
        round_trip: bool,
    ) -> Result<TripPlan, PlanError> {
        self.plan_with_cancel(locations, depot, days, round_trip, &AtomicBool::new(false))
    }

    /// Like [`plan`](Self::plan), abandoning unfinished days once `cancel`
    /// is raised. Days already solved are kept.
    ///
    /// Every location must have finite, in-range coordinates; the first one
    /// that does not fails the plan before clustering.
    pub fn plan_with_cancel(
        &self,
        locations: &[Location],
        depot: usize,
        days: usize,
        round_trip: bool,
        cancel: &AtomicBool,
    ) -> Result<TripPlan, PlanError> {
        let depot_location = *locations.get(depot).ok_or(PlanError::UnknownDepot {
            depot,
            locations: locations.len(),
        })?;
        if let Some(invalid) = locations.iter().find(|location| !location.is_valid()) {
            return Err(PlanError::InvalidLocation { id: invalid.id });
        }

        let destinations: Vec<Location> = locations
            .iter()
            .enumerate()
            .filter(|&(index, _)| index != depot)
            .map(|(_, location)| *location)
            .collect();

        tracing::info!(destinations = destinations.len(), days, round_trip, "planning trip");
        let clusters = self.clusterer.clusters(depot_location, &destinations, days)?;

        let tasks: Vec<ClusterTask> = clusters
            .iter()
            .enumerate()
            .map(|(index, cluster)| {
                ClusterTask::new(index, cluster, round_trip, self.config.solve.clone())
            })
            .collect();

        let provider = &self.provider;
        let retries = self.config.fetch_retries;
        let outcomes: Vec<DayOutcome> = self.pool.install(|| {
            tasks
                .par_iter()
                .map(|task| task.run(provider, retries, cancel))
                .collect()
        });

        let plan = assemble(&clusters, &outcomes, round_trip);
        tracing::info!(
            routed = plan.routes().count(),
            failed = plan.failed_days().len(),
            total_distance = plan.total_distance(),
            "trip planned"
        );
        Ok(plan)
    }

    /// Resolve `addresses` first, then plan with the first address as depot.
    ///
    /// Any unresolved address fails the whole plan before clustering.
    pub fn plan_addresses<G, S>(
        &self,
        geocoder: &G,
        addresses: &[S],
        days: usize,
        round_trip: bool,
    ) -> Result<TripPlan, PlanError>
    where
        G: Geocoder + ?Sized,
        S: AsRef<str>,
    {
        let locations = resolve_all(geocoder, addresses)?;
        if locations.is_empty() {
            return Err(PlanError::UnknownDepot {
                depot: 0,
                locations: 0,
            });
        }
        self.plan(&locations, 0, days, round_trip)
    }

    /// Plan the stops of a shared directions link; its first stop is the depot.
    pub fn plan_map_link<G>(
        &self,
        geocoder: &G,
        link: &str,
        days: usize,
        round_trip: bool,
    ) -> Result<TripPlan, PlanError>
    where
        G: Geocoder + ?Sized,
    {
        let addresses = map_link_addresses(link)?;
        self.plan_addresses(geocoder, &addresses, days, round_trip)
    }

    /// Stop the worker pool and hand back the provider.
    pub fn shutdown(self) -> M {
        tracing::debug!(workers = self.pool.current_num_threads(), "shutting down planner pool");
        drop(self.pool);
        self.provider
    }
}
