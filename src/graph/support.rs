//! Support graphs of relaxation and candidate points.
//!
//! A support graph holds the vertices and edges whose variable values are
//! active for one vehicle. Connectivity and minimum cuts are delegated to
//! `rustworkx-core` on top of a `petgraph` undirected graph.

use std::collections::HashMap;
use std::convert::Infallible;

use ordered_float::OrderedFloat;
use petgraph::graph::{NodeIndex, UnGraph};
use rustworkx_core::connectivity::{connected_components, stoer_wagner_min_cut};

/// A global minimum cut of a support graph.
#[derive(Debug, Clone, PartialEq)]
pub struct MinCut {
    /// Total weight of the edges crossing the cut.
    pub value: f64,
    /// Vertices on one side of the cut.
    pub side: Vec<usize>,
    /// Vertices on the other side.
    pub rest: Vec<usize>,
}

impl MinCut {
    /// Returns the side of the cut that does not contain `vertex`.
    pub fn side_without(&self, vertex: usize) -> &[usize] {
        if self.side.contains(&vertex) {
            &self.rest
        } else {
            &self.side
        }
    }
}

/// An undirected weighted graph built incrementally over original vertex ids.
///
/// # Examples
///
/// ```
/// use fair_mtsp::graph::SupportGraph;
///
/// let mut g = SupportGraph::new();
/// g.add_edge(0, 1, 1.0);
/// g.add_edge(2, 3, 1.0);
/// assert_eq!(g.components().len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SupportGraph {
    graph: UnGraph<usize, f64>,
    nodes: HashMap<usize, NodeIndex>,
}

impl SupportGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `vertex` if not yet present.
    pub fn add_vertex(&mut self, vertex: usize) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(&vertex) {
            return idx;
        }
        let idx = self.graph.add_node(vertex);
        self.nodes.insert(vertex, idx);
        idx
    }

    /// Adds an edge, inserting missing endpoints.
    pub fn add_edge(&mut self, u: usize, v: usize, weight: f64) {
        let a = self.add_vertex(u);
        let b = self.add_vertex(v);
        self.graph.add_edge(a, b, weight);
    }

    pub fn num_vertices(&self) -> usize {
        self.graph.node_count()
    }

    pub fn contains(&self, vertex: usize) -> bool {
        self.nodes.contains_key(&vertex)
    }

    /// Connected components as sorted vertex lists, ordered by smallest member.
    pub fn components(&self) -> Vec<Vec<usize>> {
        let mut out: Vec<Vec<usize>> = connected_components(&self.graph)
            .into_iter()
            .map(|set| {
                let mut vertices: Vec<usize> = set.into_iter().map(|n| self.graph[n]).collect();
                vertices.sort_unstable();
                vertices
            })
            .collect();
        out.sort_unstable_by_key(|c| c[0]);
        out
    }

    /// Stoer-Wagner global minimum cut, or `None` with fewer than two vertices.
    pub fn min_cut(&self) -> Option<MinCut> {
        let cut: Result<Option<(OrderedFloat<f64>, Vec<NodeIndex>)>, Infallible> =
            stoer_wagner_min_cut(&self.graph, |edge| Ok(OrderedFloat(*edge.weight())));
        let (value, partition) = match cut {
            Ok(Some(found)) => found,
            Ok(None) => return None,
            Err(never) => match never {},
        };

        let mut side: Vec<usize> = partition.iter().map(|&n| self.graph[n]).collect();
        side.sort_unstable();
        let mut rest: Vec<usize> = self
            .graph
            .node_indices()
            .map(|n| self.graph[n])
            .filter(|v| side.binary_search(v).is_err())
            .collect();
        rest.sort_unstable();

        Some(MinCut {
            value: value.into_inner(),
            side,
            rest,
        })
    }
}
