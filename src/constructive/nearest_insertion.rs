//! Nearest-insertion tour construction.
//!
//! Starts from the depot and the customer closest to it, then repeatedly
//! picks the unrouted customer nearest to any routed vertex and inserts it
//! where it lengthens the cycle least.
//!
//! # Complexity
//!
//! O(n²) per insertion scan, O(n³) overall for n customers.
//!
//! # Reference
//!
//! Rosenkrantz, D.J., Stearns, R.E., Lewis, P.M. (1977). "An analysis of
//! several heuristics for the traveling salesman problem", *SIAM Journal on
//! Computing* 6(3), 563-581.

use crate::distance::DistanceMatrix;
use crate::local_search::two_opt_improve;
use crate::models::Tour;

/// Orders `customers` into a single depot cycle by nearest insertion.
///
/// Returns the customer sequence without the depot. Ties are broken by the
/// order of `customers`, so equal inputs give equal outputs.
///
/// # Examples
///
/// ```
/// use fair_mtsp::models::Coords;
/// use fair_mtsp::distance::{DistanceMatrix, Metric};
/// use fair_mtsp::constructive::nearest_insertion;
///
/// let coords = vec![
///     Coords::new(0.0, 0.0),
///     Coords::new(1.0, 0.0),
///     Coords::new(2.0, 0.0),
///     Coords::new(3.0, 0.0),
/// ];
/// let dm = DistanceMatrix::from_coords(&coords, Metric::Euclidean);
/// let order = nearest_insertion(&[3, 1, 2], 0, &dm);
/// assert_eq!(order.len(), 3);
/// ```
pub fn nearest_insertion(customers: &[usize], depot: usize, distances: &DistanceMatrix) -> Vec<usize> {
    let Some(first) = distances.nearest_neighbor(depot, customers) else {
        return Vec::new();
    };

    let mut route = vec![first];
    let mut remaining: Vec<usize> = customers.iter().copied().filter(|&c| c != first).collect();

    while !remaining.is_empty() {
        // customer closest to the partial cycle
        let mut pick = 0;
        let mut pick_dist = f64::INFINITY;
        for (idx, &c) in remaining.iter().enumerate() {
            let d = route
                .iter()
                .map(|&r| distances.get(r, c))
                .fold(distances.get(depot, c), f64::min);
            if d < pick_dist {
                pick = idx;
                pick_dist = d;
            }
        }
        let next = remaining.remove(pick);

        // cheapest insertion position in depot → route → depot
        let mut best_pos = 0;
        let mut best_delta = f64::INFINITY;
        for pos in 0..=route.len() {
            let prev = if pos == 0 { depot } else { route[pos - 1] };
            let succ = if pos == route.len() { depot } else { route[pos] };
            let delta =
                distances.get(prev, next) + distances.get(next, succ) - distances.get(prev, succ);
            if delta < best_delta {
                best_pos = pos;
                best_delta = delta;
            }
        }
        route.insert(best_pos, next);
    }

    route
}

/// Builds a closed tour for one vehicle: nearest insertion followed by at
/// most `passes` rounds of 2-opt.
///
/// No customers yields the idle tour `[depot]`; one customer yields
/// `[depot, c, depot]` whose length counts the edge twice.
pub fn construct_tour(
    vehicle: usize,
    customers: &[usize],
    depot: usize,
    distances: &DistanceMatrix,
    passes: usize,
) -> Tour {
    if customers.is_empty() {
        return Tour::idle(vehicle, depot);
    }

    let initial = nearest_insertion(customers, depot, distances);
    let (order, length) = two_opt_improve(&initial, depot, distances, passes);

    let mut vertices = Vec::with_capacity(order.len() + 2);
    vertices.push(depot);
    vertices.extend_from_slice(&order);
    vertices.push(depot);
    Tour::new(vehicle, vertices, length)
}
