//! Single-route TSP solver.
//!
//! Two phases: a nearest-neighbour construction from the start node, then
//! first-improvement local search over 2-opt (segment reversal) and Or-opt
//! (chain relocation) moves until no move improves the tour or the time
//! budget runs out. Open paths ignore the closing edge back to the start.
//!
//! Works on asymmetric matrices: reversal moves account for the direction of
//! every edge inside the reversed segment.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::SolverFailure;
use crate::matrix::DistanceMatrix;

#[derive(Debug, Clone)]
pub struct SolveOptions {
    /// Wall-clock allowance for the improvement phase.
    pub time_budget: Duration,
    /// Longest chain of consecutive nodes an Or-opt move relocates.
    pub or_opt_max_segment: usize,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            time_budget: Duration::from_secs(5),
            or_opt_max_segment: 3,
        }
    }
}

/// How the improvement phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The tour is too small for any move to apply.
    Success,
    /// The time budget elapsed first.
    Budget,
    /// No improving move exists.
    LocalOptimum,
    /// The caller's cancellation flag was raised.
    Cancelled,
}

/// Lifecycle of a [`RouteSolver`]; only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverState {
    NotStarted,
    Constructing,
    Improving,
    Terminated(Termination),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolvedRoute {
    /// Permutation of `0..size`, starting at the start node.
    pub order: Vec<usize>,
    /// Cost of `order`, closing edge included only for round trips.
    pub total_distance: u64,
    /// Cost of the constructed tour before improvement.
    pub initial_distance: u64,
    pub termination: Termination,
    /// Improving moves applied.
    pub moves: usize,
    /// Route cost after each applied move, in application order.
    pub cost_history: Vec<u64>,
    pub elapsed: Duration,
}

/// Solve with default options and the given improvement budget.
pub fn solve(
    matrix: &DistanceMatrix,
    start: usize,
    round_trip: bool,
    time_budget: Duration,
) -> Result<SolvedRoute, SolverFailure> {
    let options = SolveOptions {
        time_budget,
        ..SolveOptions::default()
    };
    RouteSolver::new(matrix, start, round_trip, options).solve()
}

/// Total cost of visiting `order`; the closing edge counts for round trips.
///
/// Saturates at `u64::MAX`.
pub fn route_cost(matrix: &DistanceMatrix, order: &[usize], round_trip: bool) -> u64 {
    let path = order
        .windows(2)
        .fold(0u64, |acc, pair| acc.saturating_add(matrix.get(pair[0], pair[1])));
    match (round_trip, order.first(), order.last()) {
        (true, Some(&first), Some(&last)) if order.len() > 1 => {
            path.saturating_add(matrix.get(last, first))
        }
        _ => path,
    }
}

/// Largest edge weight for which every tour cost and move delta on `size`
/// nodes fits in an `i64`.
pub fn max_edge_cost(size: usize) -> u64 {
    i64::MAX as u64 / (2 * (size as u64).saturating_add(2))
}

enum Step {
    Improved(i64),
    Exhausted,
    Interrupted(Termination),
}

/// One solve invocation. Owns its tour exclusively.
#[derive(Debug)]
pub struct RouteSolver<'a> {
    matrix: &'a DistanceMatrix,
    start: usize,
    round_trip: bool,
    options: SolveOptions,
    cancel: Option<&'a AtomicBool>,
    symmetric: bool,
    state: SolverState,
}

impl<'a> RouteSolver<'a> {
    /// Solver over `matrix` starting at node `start`. Inputs are checked
    /// when [`solve`](Self::solve) runs.
    pub fn new(
        matrix: &'a DistanceMatrix,
        start: usize,
        round_trip: bool,
        options: SolveOptions,
    ) -> Self {
        Self {
            matrix,
            start,
            round_trip,
            options,
            cancel: None,
            symmetric: matrix.is_symmetric(),
            state: SolverState::NotStarted,
        }
    }

    /// Stop improving as soon as `cancel` is raised.
    pub fn with_cancel(mut self, cancel: &'a AtomicBool) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SolverState {
        self.state
    }

    /// Construct and improve a route.
    ///
    /// Fails before construction on an empty matrix, an out-of-range start,
    /// or an edge above [`max_edge_cost`].
    pub fn solve(mut self) -> Result<SolvedRoute, SolverFailure> {
        let started = Instant::now();
        let size = self.matrix.size();
        if size == 0 {
            return Err(SolverFailure::EmptyMatrix);
        }
        if self.start >= size {
            return Err(SolverFailure::StartOutOfRange {
                start: self.start,
                size,
            });
        }

        let limit = max_edge_cost(size);
        let max_entry = self.matrix.max_entry();
        if max_entry > limit {
            return Err(SolverFailure::CostOverflow { max_entry, limit });
        }

        self.transition(SolverState::Constructing);
        let mut tour = self.construct()?;
        let initial_distance = route_cost(self.matrix, &tour, self.round_trip);

        let (termination, cost_history, total_distance) = if size <= 2 {
            (Termination::Success, Vec::new(), initial_distance)
        } else {
            self.transition(SolverState::Improving);
            self.improve(&mut tour, initial_distance)
        };
        self.transition(SolverState::Terminated(termination));

        let moves = cost_history.len();
        let elapsed = started.elapsed();
        tracing::debug!(
            nodes = size,
            round_trip = self.round_trip,
            initial = initial_distance,
            cost = total_distance,
            moves,
            ?termination,
            elapsed_ms = elapsed.as_millis() as u64,
            "route solved"
        );

        Ok(SolvedRoute {
            order: tour,
            total_distance,
            initial_distance,
            termination,
            moves,
            cost_history,
            elapsed,
        })
    }

    fn transition(&mut self, next: SolverState) {
        tracing::trace!(from = ?self.state, to = ?next, "solver state");
        self.state = next;
    }

    /// Greedy nearest-unvisited construction.
    ///
    /// Ties go to the lowest node index; on round trips a node nearer the
    /// start wins a tie first.
    fn construct(&self) -> Result<Vec<usize>, SolverFailure> {
        let size = self.matrix.size();
        let mut visited = vec![false; size];
        let mut tour = Vec::with_capacity(size);
        tour.push(self.start);
        visited[self.start] = true;

        while tour.len() < size {
            let last = tour[tour.len() - 1];
            let next = (0..size)
                .filter(|&node| !visited[node])
                .min_by_key(|&node| {
                    let home = if self.round_trip {
                        self.matrix.get(node, self.start)
                    } else {
                        0
                    };
                    (self.matrix.get(last, node), home, node)
                });

            match next {
                Some(node) => {
                    visited[node] = true;
                    tour.push(node);
                }
                None => break,
            }
        }

        if tour.len() != size {
            return Err(SolverFailure::Incomplete {
                placed: tour.len(),
                expected: size,
            });
        }
        Ok(tour)
    }

    fn improve(&self, tour: &mut Vec<usize>, initial: u64) -> (Termination, Vec<u64>, u64) {
        let deadline = Instant::now().checked_add(self.options.time_budget);
        let mut cost = initial as i64;
        let mut history = Vec::new();

        let termination = loop {
            if let Some(reason) = self.interrupted(deadline) {
                break reason;
            }

            let step = match self.two_opt(tour, deadline) {
                Step::Exhausted => self.or_opt(tour, deadline),
                other => other,
            };

            match step {
                Step::Improved(gain) => {
                    cost -= gain;
                    history.push(cost as u64);
                    debug_assert_eq!(
                        cost as u64,
                        route_cost(self.matrix, tour, self.round_trip)
                    );
                }
                Step::Exhausted => break Termination::LocalOptimum,
                Step::Interrupted(reason) => break reason,
            }
        };

        (termination, history, cost as u64)
    }

    fn interrupted(&self, deadline: Option<Instant>) -> Option<Termination> {
        if self.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            return Some(Termination::Cancelled);
        }
        match deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Termination::Budget),
            _ => None,
        }
    }

    #[inline]
    fn dist(&self, from: usize, to: Option<usize>) -> i64 {
        to.map_or(0, |to| self.matrix.get(from, to) as i64)
    }

    /// Node after position `pos`, wrapping to the start on round trips.
    #[inline]
    fn successor(&self, tour: &[usize], pos: usize) -> Option<usize> {
        if pos + 1 < tour.len() {
            Some(tour[pos + 1])
        } else if self.round_trip {
            Some(tour[0])
        } else {
            None
        }
    }

    /// Reverse `tour[i..=j]` when that shortens the route.
    fn two_opt(&self, tour: &mut [usize], deadline: Option<Instant>) -> Step {
        let n = tour.len();
        for i in 1..n - 1 {
            if let Some(reason) = self.interrupted(deadline) {
                return Step::Interrupted(reason);
            }

            let a = tour[i - 1];
            let first = tour[i];
            let mut forward = 0i64;
            let mut backward = 0i64;

            for j in i + 1..n {
                if !self.symmetric {
                    forward += self.dist(tour[j - 1], Some(tour[j]));
                    backward += self.dist(tour[j], Some(tour[j - 1]));
                }
                let last = tour[j];
                let b = self.successor(tour, j);

                let before = self.dist(a, Some(first)) + forward + self.dist(last, b);
                let after = self.dist(a, Some(last)) + backward + self.dist(first, b);

                if after < before {
                    tour[i..=j].reverse();
                    return Step::Improved(before - after);
                }
            }
        }
        Step::Exhausted
    }

    /// Move a chain `tour[i..=e]` to sit after another node, keeping its
    /// orientation.
    fn or_opt(&self, tour: &mut Vec<usize>, deadline: Option<Instant>) -> Step {
        let n = tour.len();
        let max_len = self.options.or_opt_max_segment.max(1);

        for len in 1..=max_len {
            if len + 1 >= n {
                break;
            }
            for i in 1..=n - len {
                if let Some(reason) = self.interrupted(deadline) {
                    return Step::Interrupted(reason);
                }

                let e = i + len - 1;
                let p = tour[i - 1];
                let q = self.successor(tour, e);
                let s0 = tour[i];
                let s1 = tour[e];
                let removal = self.dist(p, Some(s0)) + self.dist(s1, q) - self.dist(p, q);

                for k in (0..n).filter(|&k| k + 1 < i || k > e) {
                    let u = tour[k];
                    let v = self.successor(tour, k);
                    let insertion = self.dist(u, Some(s0)) + self.dist(s1, v) - self.dist(u, v);

                    if insertion < removal {
                        let chain: Vec<usize> = tour.drain(i..=e).collect();
                        let at = if k < i { k + 1 } else { k + 1 - len };
                        tour.splice(at..at, chain);
                        return Step::Improved(removal - insertion);
                    }
                }
            }
        }
        Step::Exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(points: &[i64]) -> DistanceMatrix {
        DistanceMatrix::from_fn(points.len(), |i, j| (points[i] - points[j]).unsigned_abs())
    }

    #[test]
    fn test_state_starts_not_started() {
        let matrix = line(&[0, 1]);
        let solver = RouteSolver::new(&matrix, 0, false, SolveOptions::default());
        assert_eq!(solver.state(), SolverState::NotStarted);
    }

    #[test]
    fn test_nearest_neighbour_tie_lowest_index() {
        // Nodes 1 and 2 are equidistant from 0.
        let matrix = line(&[0, 5, -5]);
        let route = solve(&matrix, 0, false, Duration::ZERO).unwrap();
        assert_eq!(route.order[1], 1);
    }

    #[test]
    fn test_two_node_route_is_trivial() {
        let matrix = line(&[0, 4]);
        let route = solve(&matrix, 0, true, Duration::from_secs(1)).unwrap();
        assert_eq!(route.order, vec![0, 1]);
        assert_eq!(route.total_distance, 8);
        assert_eq!(route.termination, Termination::Success);
    }

    #[test]
    fn test_single_node() {
        let matrix = line(&[0]);
        let route = solve(&matrix, 0, true, Duration::ZERO).unwrap();
        assert_eq!(route.order, vec![0]);
        assert_eq!(route.total_distance, 0);
    }

    #[test]
    fn test_zero_budget_stops_after_construction() {
        let matrix = line(&[0, 3, 1, 7, 2, 9]);
        let route = solve(&matrix, 0, false, Duration::ZERO).unwrap();
        assert_eq!(route.termination, Termination::Budget);
        assert_eq!(route.moves, 0);
        assert_eq!(route.total_distance, route.initial_distance);
    }

    #[test]
    fn test_open_line_reaches_optimum() {
        let matrix = line(&[0, 3, 1, 7, 2, 9]);
        let route = solve(&matrix, 0, false, Duration::from_secs(5)).unwrap();
        assert_eq!(route.termination, Termination::LocalOptimum);
        assert_eq!(route.total_distance, 9);
        assert_eq!(route.order, vec![0, 2, 4, 1, 3, 5]);
    }

    #[test]
    fn test_start_out_of_range() {
        let matrix = line(&[0, 1]);
        let err = solve(&matrix, 2, false, Duration::ZERO).unwrap_err();
        assert_eq!(err, SolverFailure::StartOutOfRange { start: 2, size: 2 });
    }

    #[test]
    fn test_empty_matrix() {
        let matrix = DistanceMatrix::from_fn(0, |_, _| 0);
        assert_eq!(
            solve(&matrix, 0, false, Duration::ZERO).unwrap_err(),
            SolverFailure::EmptyMatrix
        );
    }

    #[test]
    fn test_cancelled_flag_stops_improvement() {
        let matrix = line(&[0, 3, 1, 7, 2, 9]);
        let cancel = AtomicBool::new(true);
        let route = RouteSolver::new(&matrix, 0, false, SolveOptions::default())
            .with_cancel(&cancel)
            .solve()
            .unwrap();
        assert_eq!(route.termination, Termination::Cancelled);
        assert_eq!(route.order.len(), 6);
    }

    #[test]
    fn test_two_opt_fixes_greedy_order() {
        // Greedy goes 0 -> 1 -> -2 -> 4 (10); reversing the middle gives 8.
        let matrix = line(&[0, 1, -2, 4]);
        let route = solve(&matrix, 0, false, Duration::from_secs(1)).unwrap();
        assert_eq!(route.initial_distance, 10);
        assert_eq!(route.total_distance, 8);
        assert_eq!(route.order, vec![0, 2, 1, 3]);
        assert!(route.moves >= 1);
    }

    #[test]
    fn test_or_opt_relocates_single_node() {
        // Asymmetric: reversals are expensive, moving node 1 to the end is not.
        let rows = vec![
            vec![0, 1, 2, 9],
            vec![9, 0, 5, 9],
            vec![9, 9, 0, 1],
            vec![9, 1, 9, 0],
        ];
        let matrix = DistanceMatrix::from_rows(rows).unwrap();
        let route = solve(&matrix, 0, false, Duration::from_secs(1)).unwrap();
        assert_eq!(route.initial_distance, 7);
        assert_eq!(route.total_distance, 4);
        assert_eq!(route.order, vec![0, 2, 3, 1]);
        assert_eq!(route.total_distance, route_cost(&matrix, &route.order, false));
    }

    #[test]
    fn test_route_cost_closing_edge() {
        let matrix = line(&[0, 2, 5]);
        assert_eq!(route_cost(&matrix, &[0, 1, 2], false), 5);
        assert_eq!(route_cost(&matrix, &[0, 1, 2], true), 10);
        assert_eq!(route_cost(&matrix, &[0], true), 0);
    }
}
