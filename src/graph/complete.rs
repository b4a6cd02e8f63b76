//! Complete undirected weighted graph with an edge arena.

use crate::distance::DistanceMatrix;
use crate::error::ConfigError;

/// An undirected edge `{u, v}` with `u < v`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub u: usize,
    pub v: usize,
}

impl Edge {
    /// Returns `true` if `vertex` is an endpoint of this edge.
    pub fn touches(&self, vertex: usize) -> bool {
        self.u == vertex || self.v == vertex
    }

    /// Returns the endpoint opposite to `vertex`.
    pub fn other(&self, vertex: usize) -> usize {
        if self.u == vertex {
            self.v
        } else {
            self.u
        }
    }
}

/// The complete graph over vertices `0..n`, one edge per unordered pair.
///
/// Edges are stored in an arena and addressed by a dense id, so per-edge
/// decision variables can live in flat arrays indexed by that id.
///
/// # Examples
///
/// ```
/// use fair_mtsp::distance::{DistanceMatrix, Metric};
/// use fair_mtsp::graph::CompleteGraph;
/// use fair_mtsp::models::Coords;
///
/// let coords = vec![Coords::new(0.0, 0.0), Coords::new(3.0, 0.0), Coords::new(0.0, 4.0)];
/// let graph = CompleteGraph::new(DistanceMatrix::from_coords(&coords, Metric::Euclidean)).unwrap();
/// assert_eq!(graph.num_edges(), 3);
/// let e = graph.edge_between(2, 1).unwrap();
/// assert!((graph.weight(e) - 5.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct CompleteGraph {
    distances: DistanceMatrix,
    edges: Vec<Edge>,
    index: Vec<usize>,
    incident: Vec<Vec<usize>>,
}

impl CompleteGraph {
    const NO_EDGE: usize = usize::MAX;

    /// Builds the complete graph from a distance matrix.
    ///
    /// Fails if the matrix is not symmetric or holds negative or non-finite
    /// weights.
    pub fn new(distances: DistanceMatrix) -> Result<Self, ConfigError> {
        let n = distances.size();
        if !distances.is_symmetric(1e-9) {
            return Err(ConfigError::AsymmetricWeights);
        }

        let mut edges = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        let mut index = vec![Self::NO_EDGE; n * n];
        let mut incident = vec![Vec::with_capacity(n.saturating_sub(1)); n];
        for u in 0..n {
            for v in (u + 1)..n {
                let w = distances.get(u, v);
                if !w.is_finite() || w < 0.0 {
                    return Err(ConfigError::AsymmetricWeights);
                }
                let id = edges.len();
                edges.push(Edge { u, v });
                index[u * n + v] = id;
                index[v * n + u] = id;
                incident[u].push(id);
                incident[v].push(id);
            }
        }

        Ok(Self {
            distances,
            edges,
            index,
            incident,
        })
    }

    pub fn num_vertices(&self) -> usize {
        self.distances.size()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, id: usize) -> Edge {
        self.edges[id]
    }

    /// Id of the edge joining `u` and `v`, or `None` for a loop.
    pub fn edge_between(&self, u: usize, v: usize) -> Option<usize> {
        let id = self.index[u * self.num_vertices() + v];
        (id != Self::NO_EDGE).then_some(id)
    }

    pub fn weight(&self, id: usize) -> f64 {
        let e = self.edges[id];
        self.distances.get(e.u, e.v)
    }

    /// Ids of all edges incident to `vertex`.
    pub fn incident(&self, vertex: usize) -> &[usize] {
        &self.incident[vertex]
    }

    /// Ids of all edges with both endpoints in `vertices`.
    pub fn edges_within(&self, vertices: &[usize]) -> Vec<usize> {
        let mut out = Vec::new();
        for (a, &u) in vertices.iter().enumerate() {
            for &v in &vertices[a + 1..] {
                if let Some(id) = self.edge_between(u, v) {
                    out.push(id);
                }
            }
        }
        out
    }

    pub fn distances(&self) -> &DistanceMatrix {
        &self.distances
    }
}
