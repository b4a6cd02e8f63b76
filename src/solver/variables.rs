//! Decision variables stored as dense per-vehicle arrays.

use crate::mip::{Model, Var, VarType};
use crate::models::{Instance, Objective};

/// Branching priority of vertex-assignment variables.
pub const VERTEX_PRIORITY: i32 = 2;
/// Branching priority of edge variables.
pub const EDGE_PRIORITY: i32 = 1;

/// Handles of every decision variable of the formulation.
///
/// Edge and vertex variables are laid out row-major by vehicle:
/// `edge[v * num_edges + e]` and `vertex[v * num_vertices + i]`.
#[derive(Debug, Clone)]
pub struct Variables {
    num_vehicles: usize,
    num_vertices: usize,
    num_edges: usize,
    edge: Vec<Var>,
    vertex: Vec<Var>,
    length: Vec<Var>,
    minmax: Option<Var>,
    fairness_factor: Option<Var>,
    conic: Vec<Var>,
    pnorm: Option<Var>,
}

impl Variables {
    /// Creates the variables needed by `objective` in `model`.
    ///
    /// Edge variables touching the depot are integers in `[0, 2]` so that a
    /// single-customer tour can use its depot edge twice; all other edge
    /// variables are binary.
    pub fn create(model: &mut Model, instance: &Instance, objective: Objective) -> Self {
        let graph = instance.graph();
        let depot = instance.depot();
        let k = instance.num_vehicles();
        let n = instance.num_vertices();

        let mut edge = Vec::with_capacity(k * graph.num_edges());
        for v in 0..k {
            for e in graph.edges() {
                let name = format!("x_{v}_{}_{}", e.u, e.v);
                let var = if e.touches(depot) {
                    model.add_var(name, 0.0, 2.0, VarType::Integer)
                } else {
                    model.add_var(name, 0.0, 1.0, VarType::Binary)
                };
                model.set_priority(var, EDGE_PRIORITY);
                edge.push(var);
            }
        }

        let mut vertex = Vec::with_capacity(k * n);
        for v in 0..k {
            for i in 0..n {
                let var = model.add_var(format!("y_{v}_{i}"), 0.0, 1.0, VarType::Binary);
                model.set_priority(var, VERTEX_PRIORITY);
                vertex.push(var);
            }
        }

        let mut nonneg = |name: String| model.add_var(name, 0.0, f64::INFINITY, VarType::Continuous);

        let length = (0..k).map(|v| nonneg(format!("l_{v}"))).collect();
        let minmax = matches!(objective, Objective::MinMax).then(|| nonneg("z".into()));
        let fairness_factor =
            matches!(objective, Objective::EpsFair { .. }).then(|| nonneg("leps".into()));
        let conic = if matches!(objective, Objective::EpsFair { .. } | Objective::PNorm { .. }) {
            (0..k).map(|v| nonneg(format!("k_{v}"))).collect()
        } else {
            Vec::new()
        };
        let pnorm = objective
            .p_norm()
            .map(|p| nonneg(format!("pnorm_{p}")));

        Self {
            num_vehicles: k,
            num_vertices: n,
            num_edges: graph.num_edges(),
            edge,
            vertex,
            length,
            minmax,
            fairness_factor,
            conic,
            pnorm,
        }
    }

    pub fn num_vehicles(&self) -> usize {
        self.num_vehicles
    }

    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    /// `x[vehicle][edge]`: how often `vehicle` traverses `edge`.
    pub fn edge(&self, vehicle: usize, edge: usize) -> Var {
        self.edge[vehicle * self.num_edges + edge]
    }

    /// `y[vehicle][vertex]`: whether `vertex` belongs to `vehicle`'s tour.
    pub fn vertex(&self, vehicle: usize, vertex: usize) -> Var {
        self.vertex[vehicle * self.num_vertices + vertex]
    }

    /// `length[vehicle]`.
    pub fn length(&self, vehicle: usize) -> Var {
        self.length[vehicle]
    }

    pub fn lengths(&self) -> &[Var] {
        &self.length
    }

    /// Epigraph variable of the longest tour (min-max only).
    pub fn minmax(&self) -> Option<Var> {
        self.minmax
    }

    /// `‖l‖₁ / ε̄` (eps-fair only).
    pub fn fairness_factor(&self) -> Option<Var> {
        self.fairness_factor
    }

    /// Per-vehicle cone auxiliary (eps-fair and p-norm).
    pub fn conic(&self, vehicle: usize) -> Option<Var> {
        self.conic.get(vehicle).copied()
    }

    /// Objective variable of the p-norm formulation.
    pub fn pnorm(&self) -> Option<Var> {
        self.pnorm
    }
}
