//! Spatial partitioning of destinations into per-day clusters.
//!
//! Lloyd-style k-means over an equirectangular projection of the input.
//! Centroids are seeded by farthest-point selection starting from the first
//! location, so results are fully deterministic for a given input order.

use serde::Serialize;

use crate::error::ClusteringError;
use crate::location::Location;

#[derive(Debug, Clone)]
pub struct ClusterOptions {
    /// Cap on assign/recompute rounds.
    pub max_iterations: usize,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            max_iterations: 100,
        }
    }
}

/// One day's sub-problem: the depot plus the destinations assigned to it.
///
/// Local node index 0 is the depot, index `i + 1` is `members[i]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    pub depot: Location,
    pub members: Vec<Location>,
}

impl Cluster {
    /// Members must not include the depot.
    pub fn new(depot: Location, members: Vec<Location>) -> Self {
        Self { depot, members }
    }

    /// Number of local nodes, depot included.
    pub fn node_count(&self) -> usize {
        self.members.len() + 1
    }

    /// Location for a local node index.
    pub fn node(&self, index: usize) -> Option<&Location> {
        match index {
            0 => Some(&self.depot),
            i => self.members.get(i - 1),
        }
    }

    /// (lat, lng) of every local node, depot first.
    pub fn coordinates(&self) -> Vec<(f64, f64)> {
        std::iter::once(&self.depot)
            .chain(&self.members)
            .map(Location::coordinates)
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SpatialClusterer {
    options: ClusterOptions,
}

impl SpatialClusterer {
    /// Clusterer with explicit iteration limits.
    pub fn new(options: ClusterOptions) -> Self {
        Self { options }
    }

    /// Split `locations` (depot excluded) into exactly `k` non-empty groups.
    ///
    /// Groups are ordered by the input position of their first member and
    /// members keep their input order. Every location needs finite, in-range
    /// coordinates.
    pub fn partition(
        &self,
        locations: &[Location],
        k: usize,
    ) -> Result<Vec<Vec<Location>>, ClusteringError> {
        let n = locations.len();
        if k < 1 || k > n {
            return Err(ClusteringError::InvalidDayCount {
                days: k,
                locations: n,
            });
        }

        if let Some(invalid) = locations.iter().find(|location| !location.is_valid()) {
            return Err(ClusteringError::InvalidCoordinate { id: invalid.id });
        }

        if k == n {
            return Ok(locations.iter().map(|location| vec![*location]).collect());
        }

        let points = project(locations);
        let assignments = self.assign(&points, k);

        let mut groups: Vec<Vec<Location>> = vec![Vec::new(); k];
        for (location, &cluster) in locations.iter().zip(&assignments) {
            groups[cluster].push(*location);
        }

        // Every group is non-empty after repair; order them by first member.
        let mut firsts: Vec<(usize, usize)> = Vec::with_capacity(k);
        for cluster in 0..k {
            if let Some(position) = assignments.iter().position(|&a| a == cluster) {
                firsts.push((position, cluster));
            }
        }
        firsts.sort_unstable();
        debug_assert_eq!(firsts.len(), k, "a cluster was left empty");

        Ok(firsts
            .into_iter()
            .map(|(_, cluster)| std::mem::take(&mut groups[cluster]))
            .collect())
    }

    /// Partition and prefix every group with the depot.
    pub fn clusters(
        &self,
        depot: Location,
        locations: &[Location],
        k: usize,
    ) -> Result<Vec<Cluster>, ClusteringError> {
        Ok(self
            .partition(locations, k)?
            .into_iter()
            .map(|members| Cluster::new(depot, members))
            .collect())
    }

    fn assign(&self, points: &[[f64; 2]], k: usize) -> Vec<usize> {
        let mut centers = seed_centers(points, k);
        let mut assignments = vec![usize::MAX; points.len()];

        let mut iterations = 0;
        while iterations < self.options.max_iterations.max(1) {
            iterations += 1;

            let mut next: Vec<usize> = points
                .iter()
                .map(|point| nearest(point, &centers))
                .collect();
            repair_empty(points, &mut next, &mut centers);

            let changed = next != assignments;
            assignments = next;
            if !changed {
                break;
            }

            centers = recompute_centers(points, &assignments, &centers);
        }

        tracing::debug!(points = points.len(), k, iterations, "clustering converged");
        assignments
    }
}

/// Equirectangular projection around the mean latitude.
fn project(locations: &[Location]) -> Vec<[f64; 2]> {
    let mean_lat = locations.iter().map(|l| l.latitude).sum::<f64>() / locations.len() as f64;
    let scale = mean_lat.to_radians().cos();
    locations
        .iter()
        .map(|l| [l.longitude * scale, l.latitude])
        .collect()
}

fn squared_distance(a: &[f64; 2], b: &[f64; 2]) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)
}

/// Index of the closest center; ties go to the lowest index.
fn nearest(point: &[f64; 2], centers: &[[f64; 2]]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (j, center) in centers.iter().enumerate() {
        let dist = squared_distance(point, center);
        if dist < best_dist {
            best_dist = dist;
            best = j;
        }
    }
    best
}

fn seed_centers(points: &[[f64; 2]], k: usize) -> Vec<[f64; 2]> {
    let mut centers = Vec::with_capacity(k);
    centers.push(points[0]);

    for _ in 1..k {
        let mut best_idx = 0;
        let mut best_dist = -1.0;
        for (i, point) in points.iter().enumerate() {
            let min_dist = centers
                .iter()
                .map(|center| squared_distance(point, center))
                .fold(f64::INFINITY, f64::min);
            if min_dist > best_dist {
                best_dist = min_dist;
                best_idx = i;
            }
        }
        centers.push(points[best_idx]);
    }

    centers
}

/// Give every empty cluster the member of the largest cluster that lies
/// farthest from its center.
fn repair_empty(points: &[[f64; 2]], assignments: &mut [usize], centers: &mut [[f64; 2]]) {
    let k = centers.len();
    loop {
        let mut counts = vec![0usize; k];
        for &cluster in assignments.iter() {
            counts[cluster] += 1;
        }

        let Some(empty) = counts.iter().position(|&count| count == 0) else {
            return;
        };

        let mut donor = 0;
        for (cluster, &count) in counts.iter().enumerate() {
            if count > counts[donor] {
                donor = cluster;
            }
        }
        if counts[donor] < 2 {
            return;
        }

        let mut moved = None;
        let mut moved_dist = -1.0;
        for (i, point) in points.iter().enumerate() {
            if assignments[i] != donor {
                continue;
            }
            let dist = squared_distance(point, &centers[donor]);
            if dist > moved_dist {
                moved_dist = dist;
                moved = Some(i);
            }
        }

        match moved {
            Some(i) => {
                assignments[i] = empty;
                centers[empty] = points[i];
            }
            None => return,
        }
    }
}

fn recompute_centers(
    points: &[[f64; 2]],
    assignments: &[usize],
    previous: &[[f64; 2]],
) -> Vec<[f64; 2]> {
    let k = previous.len();
    let mut sums = vec![[0.0, 0.0]; k];
    let mut counts = vec![0usize; k];
    for (point, &cluster) in points.iter().zip(assignments) {
        sums[cluster][0] += point[0];
        sums[cluster][1] += point[1];
        counts[cluster] += 1;
    }

    (0..k)
        .map(|j| {
            if counts[j] > 0 {
                [sums[j][0] / counts[j] as f64, sums[j][1] / counts[j] as f64]
            } else {
                previous[j]
            }
        })
        .collect()
}
