//! Subtour elimination.
//!
//! For a vehicle `v`, a vertex set `S` that excludes the depot, and an anchor
//! `i ∈ S`, the connectivity cut reads
//!
//! ```text
//! Σ_{e ⊆ S} x[v][e] − Σ_{j ∈ S, j ≠ i} y[v][j] ≤ 0
//! ```
//!
//! A cycle on `S` has `|S|` internal edges and violates it by one. Relaxation
//! points are separated with Stoer-Wagner minimum cuts on the fractional
//! support graph; integral candidates only need connected components.

use log::debug;

use crate::graph::SupportGraph;
use crate::mip::{Constraint, LinExpr};
use crate::models::Instance;

use super::variables::Variables;

/// Values above this count as active at relaxation points.
pub const FRACTIONAL_ACTIVE: f64 = 1e-5;
/// Values above this count as active at integral candidates.
pub const INTEGRAL_ACTIVE: f64 = 0.9;

const CUT_TOLERANCE: f64 = 1e-6;

/// The connectivity cut of `vehicle` for `subset` anchored at `anchor`.
pub fn subtour_cut(
    instance: &Instance,
    vars: &Variables,
    vehicle: usize,
    subset: &[usize],
    anchor: usize,
) -> Constraint {
    let graph = instance.graph();
    let mut expr: LinExpr = graph
        .edges_within(subset)
        .into_iter()
        .map(|e| (vars.edge(vehicle, e), 1.0))
        .collect();
    for &j in subset {
        if j != anchor {
            expr.add(vars.vertex(vehicle, j), -1.0);
        }
    }
    Constraint::le(format!("sec_{vehicle}_{anchor}_{}", subset.len()), expr, 0.0)
}

/// Active support graph of one vehicle.
///
/// Edge weights are the variable values when `weighted`, otherwise 1.
fn support_graph(
    instance: &Instance,
    vars: &Variables,
    vehicle: usize,
    values: &[f64],
    threshold: f64,
    weighted: bool,
) -> SupportGraph {
    let mut graph = SupportGraph::new();
    for i in 0..instance.num_vertices() {
        if values[vars.vertex(vehicle, i).index()] > threshold {
            graph.add_vertex(i);
        }
    }
    for (id, e) in instance.graph().edges().iter().enumerate() {
        let x = values[vars.edge(vehicle, id).index()];
        if x > threshold {
            graph.add_edge(e.u, e.v, if weighted { x } else { 1.0 });
        }
    }
    graph
}

fn cuts_for_subset(
    instance: &Instance,
    vars: &Variables,
    vehicle: usize,
    subset: &[usize],
    mut keep: impl FnMut(usize) -> bool,
    out: &mut Vec<Constraint>,
) {
    // a single vertex gives the trivial 0 <= 0
    if subset.len() < 2 {
        return;
    }
    debug!("subtour cut for vehicle {vehicle} on {subset:?}");
    for &i in subset {
        if keep(i) {
            out.push(subtour_cut(instance, vars, vehicle, subset, i));
        }
    }
}

/// Separates connectivity cuts at a fractional relaxation point.
///
/// A connected support graph is cut with its global minimum cut: when the
/// cut is lighter than 2, each vertex `i` on the side away from the depot
/// with `cut < 2·y[v][i]` anchors one cut. A disconnected support graph
/// yields cuts for every component without the depot and every anchor in it.
pub fn separate_fractional(instance: &Instance, vars: &Variables, values: &[f64]) -> Vec<Constraint> {
    let depot = instance.depot();
    let mut cuts = Vec::new();

    for v in 0..instance.num_vehicles() {
        let support = support_graph(instance, vars, v, values, FRACTIONAL_ACTIVE, true);
        let components = support.components();

        if components.len() == 1 && support.num_vertices() > 1 {
            let Some(min_cut) = support.min_cut() else {
                continue;
            };
            if min_cut.value >= 2.0 - CUT_TOLERANCE {
                continue;
            }
            let side = min_cut.side_without(depot);
            let y = |i: usize| values[vars.vertex(v, i).index()];
            cuts_for_subset(
                instance,
                vars,
                v,
                side,
                |i| min_cut.value < 2.0 * y(i) - CUT_TOLERANCE,
                &mut cuts,
            );
        } else {
            for component in components.iter().filter(|c| !c.contains(&depot)) {
                cuts_for_subset(instance, vars, v, component, |_| true, &mut cuts);
            }
        }
    }
    cuts
}

/// Separates connectivity cuts at an integral candidate.
///
/// Every component of a vehicle's active subgraph that misses the depot is
/// a subtour; each of its vertices anchors one lazy cut for that vehicle.
pub fn separate_integral(instance: &Instance, vars: &Variables, values: &[f64]) -> Vec<Constraint> {
    let depot = instance.depot();
    let mut cuts = Vec::new();
    for v in 0..instance.num_vehicles() {
        let support = support_graph(instance, vars, v, values, INTEGRAL_ACTIVE, false);
        for component in support.components().iter().filter(|c| !c.contains(&depot)) {
            cuts_for_subset(instance, vars, v, component, |_| true, &mut cuts);
        }
    }
    cuts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::Metric;
    use crate::models::{Coords, Objective};
    use crate::mip::Model;

    /// Depot at the origin and two triangles of customers far apart.
    fn setup() -> (Instance, Variables, usize) {
        let coords = vec![
            Coords::new(0.0, 0.0),
            Coords::new(10.0, 0.0),
            Coords::new(11.0, 0.0),
            Coords::new(10.0, 1.0),
            Coords::new(-10.0, 0.0),
            Coords::new(-11.0, 0.0),
            Coords::new(-10.0, 1.0),
        ];
        let inst = Instance::from_coords("two", coords, Metric::Euclidean, 1, 0).unwrap();
        let mut model = Model::new();
        let vars = Variables::create(&mut model, &inst, Objective::Min);
        (inst, vars, model.num_vars())
    }

    fn set_cycle(inst: &Instance, vars: &Variables, values: &mut [f64], cycle: &[usize], x: f64) {
        for w in 0..cycle.len() {
            let (a, b) = (cycle[w], cycle[(w + 1) % cycle.len()]);
            let e = inst.graph().edge_between(a, b).unwrap();
            values[vars.edge(0, e).index()] = x;
        }
    }

    #[test]
    fn test_integral_subtour_is_flagged() {
        let (inst, vars, n) = setup();
        let mut values = vec![0.0; n];
        for i in 0..7 {
            values[vars.vertex(0, i).index()] = 1.0;
        }
        // depot -> 1 -> 2 -> 3 -> depot, plus a detached cycle 4 -> 5 -> 6
        set_cycle(&inst, &vars, &mut values, &[0, 1, 2, 3], 1.0);
        set_cycle(&inst, &vars, &mut values, &[4, 5, 6], 1.0);

        let cuts = separate_integral(&inst, &vars, &values);
        assert_eq!(cuts.len(), 3);
        for cut in &cuts {
            // three internal edges against two other vertices
            assert!((cut.violation(&values) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_connected_tour_passes() {
        let (inst, vars, n) = setup();
        let mut values = vec![0.0; n];
        for i in 0..7 {
            values[vars.vertex(0, i).index()] = 1.0;
        }
        set_cycle(&inst, &vars, &mut values, &[0, 1, 2, 3, 4, 5, 6], 1.0);
        assert!(separate_integral(&inst, &vars, &values).is_empty());
        assert!(separate_fractional(&inst, &vars, &values).is_empty());
    }

    #[test]
    fn test_fractional_min_cut() {
        let (inst, vars, n) = setup();
        let mut values = vec![0.0; n];
        for i in 0..7 {
            values[vars.vertex(0, i).index()] = 1.0;
        }
        // full tour on the left, right triangle hangs on two half edges
        set_cycle(&inst, &vars, &mut values, &[0, 4, 5, 6], 1.0);
        set_cycle(&inst, &vars, &mut values, &[1, 2, 3], 1.0);
        values[vars.edge(0, inst.graph().edge_between(0, 1).unwrap()).index()] = 0.25;
        values[vars.edge(0, inst.graph().edge_between(0, 3).unwrap()).index()] = 0.25;

        let cuts = separate_fractional(&inst, &vars, &values);
        assert_eq!(cuts.len(), 3);
        for cut in &cuts {
            assert!(cut.violation(&values) > 0.5);
            let touches_left = cut.expr().terms().iter().any(|&(var, _)| {
                (4..7).any(|i| var == vars.vertex(0, i))
            });
            assert!(!touches_left);
        }
    }

    #[test]
    fn test_fractional_disconnected_components() {
        let (inst, vars, n) = setup();
        let mut values = vec![0.0; n];
        for i in 0..7 {
            values[vars.vertex(0, i).index()] = 0.5;
        }
        values[vars.vertex(0, 0).index()] = 1.0;
        set_cycle(&inst, &vars, &mut values, &[4, 5, 6], 0.5);
        let cuts = separate_fractional(&inst, &vars, &values);
        // {4, 5, 6} anchors three cuts; 1, 2, 3 are isolated singletons
        assert_eq!(cuts.len(), 3);
        for cut in &cuts {
            assert!((cut.violation(&values) - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_subtour_cut_shape() {
        let (inst, vars, _) = setup();
        let cut = subtour_cut(&inst, &vars, 0, &[1, 2, 3], 2);
        // three edges and two vertex terms
        assert_eq!(cut.expr().terms().len(), 5);
        assert_eq!(cut.rhs(), 0.0);
    }
}
