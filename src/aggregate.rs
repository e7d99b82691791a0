//! Assembly of per-cluster results into the final trip plan.

use serde::Serialize;

use crate::cluster::Cluster;
use crate::error::FailureReason;
use crate::location::Location;
use crate::polyline::Polyline;

/// A solved day in the cluster's local index space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteAssignment {
    pub cluster_index: usize,
    /// Local node indices; `order[0] == 0` is the depot.
    pub order: Vec<usize>,
    pub total_distance: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDay {
    pub cluster_index: usize,
    pub reason: FailureReason,
}

pub type DayOutcome = Result<RouteAssignment, FailedDay>;

/// A solved day resolved to real locations.
#[derive(Debug, Clone, PartialEq)]
pub struct DayRoute {
    pub assignment: RouteAssignment,
    /// Stops in visiting order, depot first.
    pub stops: Vec<Location>,
    pub round_trip: bool,
}

impl DayRoute {
    pub fn day(&self) -> usize {
        self.assignment.cluster_index
    }

    pub fn total_distance(&self) -> u64 {
        self.assignment.total_distance
    }

    /// Handoff for a map renderer; closes back to the depot on round trips.
    pub fn polyline(&self) -> Polyline {
        Polyline::from_stops(&self.stops, self.round_trip)
    }

    pub fn navigation_link(&self) -> Option<String> {
        self.polyline().navigation_link()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DayPlan {
    Routed(DayRoute),
    Failed(FailedDay),
}

/// Multi-day plan, one entry per requested day in cluster order.
#[derive(Debug, Clone, PartialEq)]
pub struct TripPlan {
    days: Vec<DayPlan>,
    total_distance: u64,
    round_trip: bool,
}

impl TripPlan {
    pub fn days(&self) -> &[DayPlan] {
        &self.days
    }

    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    pub fn routes(&self) -> impl Iterator<Item = &DayRoute> {
        self.days.iter().filter_map(|day| match day {
            DayPlan::Routed(route) => Some(route),
            DayPlan::Failed(_) => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = &FailedDay> {
        self.days.iter().filter_map(|day| match day {
            DayPlan::Failed(failed) => Some(failed),
            DayPlan::Routed(_) => None,
        })
    }

    /// Cluster indices of days without a route.
    pub fn failed_days(&self) -> Vec<usize> {
        self.failures().map(|failed| failed.cluster_index).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Sum over routed days.
    pub fn total_distance(&self) -> u64 {
        self.total_distance
    }

    pub fn round_trip(&self) -> bool {
        self.round_trip
    }

    pub fn polylines(&self) -> Vec<Polyline> {
        self.routes().map(DayRoute::polyline).collect()
    }
}

/// Resolve each outcome against its cluster and total the distances.
///
/// # Panics
///
/// When `outcomes` does not line up with `clusters` (count, cluster index,
/// or an order that is not a depot-first permutation of the cluster). These
/// are programming errors in the caller.
pub fn assemble(clusters: &[Cluster], outcomes: &[DayOutcome], round_trip: bool) -> TripPlan {
    assert_eq!(
        clusters.len(),
        outcomes.len(),
        "one outcome is required per cluster"
    );

    let mut total_distance = 0;
    let days = clusters
        .iter()
        .zip(outcomes)
        .enumerate()
        .map(|(index, (cluster, outcome))| match outcome {
            Ok(assignment) => {
                assert_eq!(assignment.cluster_index, index, "outcome out of cluster order");
                total_distance += assignment.total_distance;
                DayPlan::Routed(DayRoute {
                    stops: resolve_stops(cluster, &assignment.order),
                    assignment: assignment.clone(),
                    round_trip,
                })
            }
            Err(failed) => {
                assert_eq!(failed.cluster_index, index, "outcome out of cluster order");
                DayPlan::Failed(failed.clone())
            }
        })
        .collect();

    TripPlan {
        days,
        total_distance,
        round_trip,
    }
}

fn resolve_stops(cluster: &Cluster, order: &[usize]) -> Vec<Location> {
    assert_eq!(order.len(), cluster.node_count(), "order must cover every node");
    assert_eq!(order.first(), Some(&0), "order must start at the depot");

    let mut seen = vec![false; cluster.node_count()];
    order
        .iter()
        .map(|&index| {
            let location = cluster.node(index);
            assert!(
                location.is_some() && !seen[index],
                "order is not a permutation of the cluster"
            );
            seen[index] = true;
            *location.unwrap_or(&cluster.depot)
        })
        .collect()
}
