//! Problem instance: graph, fleet size, and depot.

use serde::{Deserialize, Serialize};

use crate::distance::{DistanceMatrix, Metric};
use crate::error::ConfigError;
use crate::graph::CompleteGraph;

/// Planar coordinates of a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coords {
    pub x: f64,
    pub y: f64,
}

impl Coords {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Arithmetic mean of a non-empty point set.
    pub fn centroid(points: &[Coords]) -> Option<Coords> {
        if points.is_empty() {
            return None;
        }
        let n = points.len() as f64;
        let (sx, sy) = points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Some(Coords::new(sx / n, sy / n))
    }
}

/// An immutable multiple-TSP instance.
///
/// Vehicles are identical; every vehicle starts and ends its tour at the
/// depot, and the tours jointly partition the remaining vertices.
///
/// # Examples
///
/// ```
/// use fair_mtsp::distance::Metric;
/// use fair_mtsp::models::{Coords, Instance};
///
/// let coords = vec![Coords::new(0.0, 0.0), Coords::new(1.0, 0.0), Coords::new(0.0, 1.0)];
/// let inst = Instance::from_coords("tiny", coords, Metric::Euclidean, 2, 0).unwrap();
/// assert_eq!(inst.num_vertices(), 3);
/// assert_eq!(inst.customers().collect::<Vec<_>>(), vec![1, 2]);
/// ```
#[derive(Debug, Clone)]
pub struct Instance {
    name: String,
    graph: CompleteGraph,
    num_vehicles: usize,
    depot: usize,
    coords: Option<Vec<Coords>>,
}

impl Instance {
    /// Creates an instance over an existing graph.
    pub fn new(
        name: impl Into<String>,
        graph: CompleteGraph,
        num_vehicles: usize,
        depot: usize,
    ) -> Result<Self, ConfigError> {
        let n = graph.num_vertices();
        if num_vehicles < 1 {
            return Err(ConfigError::NoVehicles);
        }
        if n < 2 {
            return Err(ConfigError::TooFewVertices(n));
        }
        if depot >= n {
            return Err(ConfigError::DepotOutOfRange {
                depot,
                num_vertices: n,
            });
        }
        Ok(Self {
            name: name.into(),
            graph,
            num_vehicles,
            depot,
            coords: None,
        })
    }

    /// Creates an instance from planar coordinates under the given metric.
    pub fn from_coords(
        name: impl Into<String>,
        coords: Vec<Coords>,
        metric: Metric,
        num_vehicles: usize,
        depot: usize,
    ) -> Result<Self, ConfigError> {
        let graph = CompleteGraph::new(DistanceMatrix::from_coords(&coords, metric))?;
        Ok(Self::new(name, graph, num_vehicles, depot)?.with_coords(coords))
    }

    /// Attaches vertex coordinates (kept for reporting only).
    pub fn with_coords(mut self, coords: Vec<Coords>) -> Self {
        self.coords = Some(coords);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn graph(&self) -> &CompleteGraph {
        &self.graph
    }

    pub fn num_vehicles(&self) -> usize {
        self.num_vehicles
    }

    pub fn num_vertices(&self) -> usize {
        self.graph.num_vertices()
    }

    pub fn depot(&self) -> usize {
        self.depot
    }

    pub fn coords(&self) -> Option<&[Coords]> {
        self.coords.as_deref()
    }

    /// All vertices except the depot, ascending.
    pub fn customers(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.num_vertices()).filter(move |&v| v != self.depot)
    }

    /// Edge weight between two vertices.
    pub fn distance(&self, u: usize, v: usize) -> f64 {
        self.graph.distances().get(u, v)
    }
}
