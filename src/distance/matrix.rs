//! Dense distance matrix.

use serde::{Deserialize, Serialize};

use crate::models::Coords;

/// How coordinate distances are turned into edge weights.
///
/// The rounding modes follow the TSPLIB conventions so that benchmark
/// instances reproduce their published tour lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    /// Plain Euclidean distance, no rounding.
    Euclidean,
    /// Euclidean distance rounded to the nearest integer (`EUC_2D`).
    Euc2d,
    /// Euclidean distance rounded up (`CEIL_2D`).
    Ceil2d,
    /// Pseudo-Euclidean distance (`ATT`).
    Att,
}

impl Metric {
    /// Edge weight between two points under this metric.
    pub fn distance(self, a: &Coords, b: &Coords) -> f64 {
        let dx = a.x - b.x;
        let dy = a.y - b.y;
        let euclid = (dx * dx + dy * dy).sqrt();
        match self {
            Metric::Euclidean => euclid,
            Metric::Euc2d => euclid.round(),
            Metric::Ceil2d => euclid.ceil(),
            Metric::Att => {
                let r = ((dx * dx + dy * dy) / 10.0).sqrt();
                let t = r.round();
                if t < r {
                    t + 1.0
                } else {
                    t
                }
            }
        }
    }
}

/// A dense n×n distance matrix stored in row-major order.
///
/// # Examples
///
/// ```
/// use fair_mtsp::models::Coords;
/// use fair_mtsp::distance::{DistanceMatrix, Metric};
///
/// let coords = vec![Coords::new(0.0, 0.0), Coords::new(3.0, 4.0), Coords::new(6.0, 8.0)];
/// let dm = DistanceMatrix::from_coords(&coords, Metric::Euclidean);
/// assert!((dm.get(0, 1) - 5.0).abs() < 1e-10);
/// assert_eq!(dm.size(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    data: Vec<f64>,
    size: usize,
}

impl DistanceMatrix {
    /// Creates a distance matrix of the given size, initialized to zero.
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0.0; size * size],
            size,
        }
    }

    /// Computes a symmetric distance matrix from planar coordinates.
    pub fn from_coords(coords: &[Coords], metric: Metric) -> Self {
        let n = coords.len();
        let mut dm = Self::new(n);
        for i in 0..n {
            for j in (i + 1)..n {
                let d = metric.distance(&coords[i], &coords[j]);
                dm.set(i, j, d);
                dm.set(j, i, d);
            }
        }
        dm
    }

    /// Creates a distance matrix from an explicit n×n grid.
    ///
    /// Returns `None` if the data length doesn't match `size * size`.
    pub fn from_data(size: usize, data: Vec<f64>) -> Option<Self> {
        if data.len() != size * size {
            return None;
        }
        Some(Self { data, size })
    }

    /// Returns the distance from location `from` to location `to`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.data[from * self.size + to]
    }

    /// Sets the distance from location `from` to location `to`.
    pub fn set(&mut self, from: usize, to: usize, distance: f64) {
        self.data[from * self.size + to] = distance;
    }

    /// Number of locations in this matrix.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns `true` if the matrix is symmetric within the given tolerance.
    pub fn is_symmetric(&self, tol: f64) -> bool {
        for i in 0..self.size {
            for j in (i + 1)..self.size {
                if (self.get(i, j) - self.get(j, i)).abs() > tol {
                    return false;
                }
            }
        }
        true
    }

    /// Returns the nearest neighbor of `from` among the given candidates.
    ///
    /// Ties resolve to the earliest candidate. Returns `None` if `candidates`
    /// is empty.
    pub fn nearest_neighbor(&self, from: usize, candidates: &[usize]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for &c in candidates {
            let d = self.get(from, c);
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some((c, d));
            }
        }
        best.map(|(c, _)| c)
    }
}
