//! Primal heuristic: rounds a relaxation point into a full solution.
//!
//! Each customer goes to the vehicle with the largest assignment value, each
//! vehicle's customers are toured by nearest insertion plus bounded 2-opt,
//! and every auxiliary variable is set consistently with the tour lengths.

use crate::constructive::construct_tour;
use crate::models::{eps_bar, Instance, Objective, SolverConfig, Tour};

use super::variables::Variables;

/// A complete variable assignment produced by [`round_solution`].
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicSolution {
    /// Dense values for every model variable.
    pub values: Vec<f64>,
    /// Objective value implied by the tour lengths.
    pub objective: f64,
    /// Tours indexed by vehicle.
    pub tours: Vec<Tour>,
}

/// Assigns each customer to `argmax_v y[v][i]`, the first vehicle on ties.
///
/// Returns the customers of every vehicle in ascending order.
pub fn assign_customers(instance: &Instance, vars: &Variables, values: &[f64]) -> Vec<Vec<usize>> {
    let mut assigned = vec![Vec::new(); instance.num_vehicles()];
    for i in instance.customers() {
        let mut best = 0;
        let mut best_value = f64::NEG_INFINITY;
        for v in 0..instance.num_vehicles() {
            let value = values[vars.vertex(v, i).index()];
            if value > best_value {
                best = v;
                best_value = value;
            }
        }
        assigned[best].push(i);
    }
    assigned
}

/// Builds a full solution from the relaxation point `values`.
///
/// With symmetry breaking on, vehicles are relabelled by non-increasing tour
/// length so that `l[v] ≥ l[v+1]` holds.
pub fn round_solution(
    instance: &Instance,
    vars: &Variables,
    config: &SolverConfig,
    values: &[f64],
) -> HeuristicSolution {
    let depot = instance.depot();
    let graph = instance.graph();
    let distances = graph.distances();

    let mut tours: Vec<Tour> = assign_customers(instance, vars, values)
        .iter()
        .enumerate()
        .map(|(v, customers)| {
            construct_tour(v, customers, depot, distances, config.tour_improvement_passes())
        })
        .collect();

    if config.symmetry_breaking() {
        tours.sort_by(|a, b| b.length().total_cmp(&a.length()));
        for (v, tour) in tours.iter_mut().enumerate() {
            tour.set_vehicle(v);
        }
    }

    let mut out = vec![0.0; values.len()];
    for tour in &tours {
        let v = tour.vehicle();
        out[vars.vertex(v, depot).index()] = 1.0;
        for &c in tour.customers() {
            out[vars.vertex(v, c).index()] = 1.0;
        }
        // depot -> c -> depot collapses onto one edge used twice
        let reuse = if tour.len() == 1 { 2.0 } else { 1.0 };
        for (a, b) in tour.edges() {
            if let Some(e) = graph.edge_between(a, b) {
                out[vars.edge(v, e).index()] = reuse;
            }
        }
        out[vars.length(v).index()] = tour.length();
    }

    let lengths: Vec<f64> = tours.iter().map(Tour::length).collect();
    let objective = set_auxiliaries(instance, vars, config.objective(), &lengths, &mut out);

    HeuristicSolution {
        values: out,
        objective,
        tours,
    }
}

/// Fills the objective auxiliaries for `lengths` and returns the objective.
fn set_auxiliaries(
    instance: &Instance,
    vars: &Variables,
    objective: Objective,
    lengths: &[f64],
    out: &mut [f64],
) -> f64 {
    let total: f64 = lengths.iter().sum();
    match objective {
        Objective::Min | Objective::DeltaFair { .. } => total,
        Objective::MinMax => {
            let longest = lengths.iter().copied().fold(0.0, f64::max);
            if let Some(z) = vars.minmax() {
                out[z.index()] = longest;
            }
            longest
        }
        Objective::EpsFair { epsilon } => {
            let factor = total / eps_bar(instance.num_vehicles(), epsilon);
            if let Some(f) = vars.fairness_factor() {
                out[f.index()] = factor;
            }
            for (v, &l) in lengths.iter().enumerate() {
                if let Some(k) = vars.conic(v) {
                    out[k.index()] = if factor > 0.0 { l * l / factor } else { 0.0 };
                }
            }
            total
        }
        Objective::PNorm { p } => {
            let pf = f64::from(p);
            let norm = p_norm(lengths, pf);
            if let Some(z) = vars.pnorm() {
                out[z.index()] = norm;
            }
            for (v, &l) in lengths.iter().enumerate() {
                if let Some(k) = vars.conic(v) {
                    // l^p / norm^(p-1)
                    out[k.index()] = if norm > 0.0 { norm * (l / norm).powf(pf) } else { 0.0 };
                }
            }
            norm
        }
    }
}

/// `‖lengths‖_p`, scaled by the largest entry so large `p` does not overflow.
fn p_norm(lengths: &[f64], p: f64) -> f64 {
    let largest = lengths.iter().copied().fold(0.0, f64::max);
    if largest <= 0.0 {
        return 0.0;
    }
    largest * lengths.iter().map(|l| (l / largest).powf(p)).sum::<f64>().powf(1.0 / p)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::distance::Metric;
    use crate::mip::Model;
    use crate::models::Coords;
    use crate::solver::builder::{build_model, BuiltModel};

    fn ring(n: usize, k: usize) -> Instance {
        let mut coords = vec![Coords::new(0.0, 0.0)];
        for i in 0..n {
            let angle = i as f64 * std::f64::consts::TAU / n as f64;
            coords.push(Coords::new(10.0 * angle.cos(), 10.0 * angle.sin()));
        }
        Instance::from_coords("ring", coords, Metric::Euclidean, k, 0).unwrap()
    }

    fn setup(inst: &Instance, objective: Objective) -> (Variables, Model) {
        let mut model = Model::new();
        let vars = Variables::create(&mut model, inst, objective);
        (vars, model)
    }

    fn assert_partition_and_degree(inst: &Instance, vars: &Variables, values: &[f64]) {
        for i in inst.customers() {
            let served: f64 = (0..inst.num_vehicles())
                .map(|v| values[vars.vertex(v, i).index()])
                .sum();
            assert_eq!(served, 1.0, "customer {i}");
        }
        for v in 0..inst.num_vehicles() {
            assert_eq!(values[vars.vertex(v, inst.depot()).index()], 1.0);
            for i in inst.customers() {
                let degree: f64 = inst
                    .graph()
                    .incident(i)
                    .iter()
                    .map(|&e| values[vars.edge(v, e).index()])
                    .sum();
                assert_eq!(degree, 2.0 * values[vars.vertex(v, i).index()]);
            }
            let length: f64 = (0..inst.graph().num_edges())
                .map(|e| inst.graph().weight(e) * values[vars.edge(v, e).index()])
                .sum();
            assert!((length - values[vars.length(v).index()]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_argmax_ties_go_to_first_vehicle() {
        let inst = ring(3, 2);
        let (vars, model) = setup(&inst, Objective::Min);
        let mut values = vec![0.0; model.num_vars()];
        values[vars.vertex(0, 1).index()] = 0.5;
        values[vars.vertex(1, 1).index()] = 0.5;
        values[vars.vertex(1, 2).index()] = 0.7;
        let assigned = assign_customers(&inst, &vars, &values);
        assert_eq!(assigned, vec![vec![1, 3], vec![2]]);
    }

    #[test]
    fn test_single_customer_uses_edge_twice() {
        let inst = ring(3, 2);
        let config = SolverConfig::new(Objective::Min);
        let (vars, model) = setup(&inst, Objective::Min);
        let mut values = vec![0.0; model.num_vars()];
        values[vars.vertex(1, 2).index()] = 1.0;
        let sol = round_solution(&inst, &vars, &config, &values);

        // vehicle 0 keeps {1, 3}, the single customer tour is the shorter one
        let single = sol.tours.iter().find(|t| t.len() == 1).unwrap();
        let e = inst.graph().edge_between(0, 2).unwrap();
        assert_eq!(sol.values[vars.edge(single.vehicle(), e).index()], 2.0);
        assert!((single.length() - 20.0).abs() < 1e-9);
        assert_partition_and_degree(&inst, &vars, &sol.values);
    }

    #[test]
    fn test_relabels_by_length() {
        let inst = ring(6, 3);
        let config = SolverConfig::new(Objective::MinMax);
        let (vars, model) = setup(&inst, Objective::MinMax);
        let mut values = vec![0.0; model.num_vars()];
        // vehicle 2 gets most customers, vehicle 1 none
        for i in 1..=5 {
            values[vars.vertex(2, i).index()] = 1.0;
        }
        let sol = round_solution(&inst, &vars, &config, &values);

        let lengths: Vec<f64> = (0..3).map(|v| sol.values[vars.length(v).index()]).collect();
        assert!(lengths.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(sol.values[vars.minmax().unwrap().index()], lengths[0]);
        assert_eq!(sol.objective, lengths[0]);
        assert_eq!(sol.tours[0].len(), 5);
        assert!(sol.tours[2].is_idle());
    }

    #[test]
    fn test_eps_fair_auxiliaries_on_cone() {
        let inst = ring(4, 2);
        let objective = Objective::EpsFair { epsilon: 0.5 };
        let (vars, model) = setup(&inst, objective);
        let mut values = vec![0.0; model.num_vars()];
        values[vars.vertex(1, 3).index()] = 1.0;
        let sol = round_solution(&inst, &vars, &SolverConfig::new(objective), &values);

        let f = sol.values[vars.fairness_factor().unwrap().index()];
        let total: f64 = sol.tours.iter().map(Tour::length).sum();
        assert!((f * eps_bar(2, 0.5) - total).abs() < 1e-9);
        for v in 0..2 {
            let l = sol.values[vars.length(v).index()];
            let k = sol.values[vars.conic(v).unwrap().index()];
            assert!((l * l - k * f).abs() < 1e-6);
        }
        assert!((sol.objective - total).abs() < 1e-9);
    }

    #[test]
    fn test_pnorm_auxiliaries_sum_to_norm() {
        let inst = ring(5, 2);
        let objective = Objective::PNorm { p: 3 };
        let (vars, model) = setup(&inst, objective);
        let mut values = vec![0.0; model.num_vars()];
        values[vars.vertex(1, 1).index()] = 1.0;
        let sol = round_solution(&inst, &vars, &SolverConfig::new(objective), &values);

        let z = sol.values[vars.pnorm().unwrap().index()];
        let sum_k: f64 = (0..2)
            .map(|v| sol.values[vars.conic(v).unwrap().index()])
            .sum();
        assert!((sum_k - z).abs() < 1e-6 * z.max(1.0));
        let expected = sol
            .tours
            .iter()
            .map(|t| t.length().powi(3))
            .sum::<f64>()
            .cbrt();
        assert!((z - expected).abs() < 1e-9 * expected);
        assert_eq!(sol.objective, z);
    }

    #[test]
    fn test_p_norm_handles_large_orders() {
        assert!((p_norm(&[3.0, 4.0], 2.0) - 5.0).abs() < 1e-12);
        assert_eq!(p_norm(&[0.0, 0.0], 3.0), 0.0);
        // orders beyond i32 approach the maximum without overflowing
        let norm = p_norm(&[120.0, 80.0, 119.0], f64::from(3_000_000_000u32));
        assert!((norm - 120.0).abs() < 1e-6);
        let tiny = p_norm(&[0.5, 0.5], f64::from(u32::MAX));
        assert!((tiny - 0.5).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_rounding_satisfies_partition_and_degree(
            raw in proptest::collection::vec(0.0f64..1.0, 3 * 8),
            symmetry in any::<bool>(),
        ) {
            let inst = ring(7, 3);
            let config = SolverConfig::new(Objective::Min).with_symmetry_breaking(symmetry);
            let BuiltModel { model, vars } = build_model(&inst, &config).unwrap();
            let mut values = vec![0.0; model.num_vars()];
            for v in 0..3 {
                for i in 0..8 {
                    values[vars.vertex(v, i).index()] = raw[v * 8 + i];
                }
            }
            let sol = round_solution(&inst, &vars, &config, &values);
            assert_partition_and_degree(&inst, &vars, &sol.values);
            prop_assert!(model.first_violation(&sol.values, 1e-6).is_none());
        }
    }
}
