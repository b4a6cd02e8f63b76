//! Closed vehicle tours.

use serde::{Deserialize, Serialize};

/// A closed walk of one vehicle, stored as `[depot, c1, …, ck, depot]`.
///
/// An idle vehicle (no customers) is stored as `[depot]` with length zero.
///
/// # Examples
///
/// ```
/// use fair_mtsp::models::Tour;
///
/// let tour = Tour::new(0, vec![0, 2, 1, 0], 12.0);
/// assert_eq!(tour.customers(), &[2, 1]);
/// assert_eq!(tour.edges().count(), 3);
/// assert!(!tour.is_idle());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tour {
    vehicle: usize,
    vertices: Vec<usize>,
    length: f64,
}

impl Tour {
    /// Creates a tour from a closed vertex sequence.
    pub fn new(vehicle: usize, vertices: Vec<usize>, length: f64) -> Self {
        Self {
            vehicle,
            vertices,
            length,
        }
    }

    /// The tour of a vehicle that serves nobody.
    pub fn idle(vehicle: usize, depot: usize) -> Self {
        Self::new(vehicle, vec![depot], 0.0)
    }

    pub fn vehicle(&self) -> usize {
        self.vehicle
    }

    /// Relabels the vehicle serving this tour.
    pub fn set_vehicle(&mut self, vehicle: usize) {
        self.vehicle = vehicle;
    }

    /// The full closed sequence including both depot visits.
    pub fn vertices(&self) -> &[usize] {
        &self.vertices
    }

    /// The visited customers in order, without the depot.
    pub fn customers(&self) -> &[usize] {
        if self.vertices.len() < 2 {
            &[]
        } else {
            &self.vertices[1..self.vertices.len() - 1]
        }
    }

    /// Number of customers served.
    pub fn len(&self) -> usize {
        self.customers().len()
    }

    pub fn is_idle(&self) -> bool {
        self.customers().is_empty()
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    /// Consecutive vertex pairs along the walk.
    ///
    /// A single-customer tour yields the same physical edge twice.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.vertices.windows(2).map(|w| (w[0], w[1]))
    }
}
