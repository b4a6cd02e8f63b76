//! Branch-and-cut solver for the fair multiple TSP.
//!
//! [`BranchAndCutSolver`] builds the integer model once, then runs a
//! [`MipEngine`] with the problem callback attached:
//!
//! - at relaxation nodes the rounded primal heuristic is posted and subtour
//!   cuts are separated on the fractional support graph
//! - at integral candidates subtours and violated fairness cones are
//!   rejected with lazy constraints
//!
//! # Examples
//!
//! ```
//! use fair_mtsp::distance::Metric;
//! use fair_mtsp::models::{Coords, Instance, Objective, SolverConfig};
//! use fair_mtsp::solver::BranchAndCutSolver;
//!
//! let coords = vec![
//!     Coords::new(0.0, 0.0),
//!     Coords::new(3.0, 0.0),
//!     Coords::new(0.0, 4.0),
//! ];
//! let instance = Instance::from_coords("tiny", coords, Metric::Euclidean, 2, 0).unwrap();
//! let solver = BranchAndCutSolver::with_default_engine(instance, SolverConfig::new(Objective::MinMax)).unwrap();
//! let result = solver.solve().unwrap();
//! assert!(result.has_solution());
//! assert!((result.objective_value.unwrap() - 8.0).abs() < 1e-6);
//! ```

mod builder;
mod callback;
mod extract;
mod heuristic;
mod oa;
mod separator;
mod variables;

pub use builder::{build_model, BuiltModel};
pub use callback::FairMtspCallback;
pub use extract::extract_tours;
pub use heuristic::{assign_customers, round_solution, HeuristicSolution};
pub use oa::{eps_fair_cut, p_norm_cuts, separate_cones, VIOLATION_TOLERANCE};
pub use separator::{
    separate_fractional, separate_integral, subtour_cut, FRACTIONAL_ACTIVE, INTEGRAL_ACTIVE,
};
pub use variables::{Variables, EDGE_PRIORITY, VERTEX_PRIORITY};

use std::time::Duration;

use log::info;

use crate::error::Result;
use crate::mip::{BranchAndBound, EngineOutcome, EngineStatus, MipEngine, Model, SearchLimits};
use crate::models::{FairnessIndices, Instance, SolveResult, SolverConfig, Termination};

/// Solves one instance under one fairness objective.
pub struct BranchAndCutSolver<E: MipEngine = BranchAndBound> {
    instance: Instance,
    config: SolverConfig,
    engine: E,
    built: BuiltModel,
}

impl BranchAndCutSolver<BranchAndBound> {
    /// Uses the reference branch-and-bound engine with default options.
    pub fn with_default_engine(instance: Instance, config: SolverConfig) -> Result<Self> {
        Self::new(instance, config, BranchAndBound::default())
    }
}

impl<E: MipEngine> BranchAndCutSolver<E> {
    /// Validates the configuration and builds the model.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] before any search starts when the
    /// configuration does not fit the instance.
    pub fn new(instance: Instance, config: SolverConfig, engine: E) -> Result<Self> {
        let built = build_model(&instance, &config)?;
        Ok(Self {
            instance,
            config,
            engine,
            built,
        })
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn model(&self) -> &Model {
        &self.built.model
    }

    pub fn variables(&self) -> &Variables {
        &self.built.vars
    }

    /// Runs the search and extracts the result.
    ///
    /// Proven infeasibility and a time limit without incumbent both produce
    /// a metadata-only result; use [`SolveResult::ensure_feasible`] to turn
    /// the former into an error.
    pub fn solve(&self) -> Result<SolveResult> {
        let callback = FairMtspCallback::new(&self.instance, &self.config, &self.built.vars);
        let limits = SearchLimits::new(self.config.time_limit());
        let outcome = self.engine.solve(&self.built.model, &callback, &limits)?;
        Ok(self.extract(outcome))
    }

    fn extract(&self, outcome: EngineOutcome) -> SolveResult {
        let mut result = self.metadata(outcome.elapsed);

        let values = match (outcome.status, outcome.values) {
            (EngineStatus::Infeasible, _) => {
                info!("{}: no feasible solution for {}", self.instance.name(), self.config.objective());
                result.termination = Termination::Infeasible;
                return result;
            }
            (_, None) => {
                info!("{}: search stopped without a solution", self.instance.name());
                return result;
            }
            (_, Some(values)) => values,
        };

        let tours = extract_tours(&self.instance, &self.built.vars, &values);
        let costs: Vec<f64> = self
            .built
            .vars
            .lengths()
            .iter()
            .map(|l| values[l.index()])
            .collect();

        info!("tour lengths: {costs:?}, total {:.3}", costs.iter().sum::<f64>());
        info!("objective value: {:?}", outcome.objective);

        result.termination = if outcome.status == EngineStatus::Optimal {
            Termination::Optimal
        } else {
            Termination::TimeLimit
        };
        result.fairness = Some(FairnessIndices::from_costs(&costs));
        result.tours = tours;
        result.tour_costs = costs;
        result.objective_value = outcome.objective;
        result.optimality_gap = outcome.gap;
        result
    }

    fn metadata(&self, elapsed: Duration) -> SolveResult {
        SolveResult {
            instance_name: self.instance.name().to_string(),
            num_vertices: self.instance.num_vertices(),
            depot: self.instance.depot(),
            num_vehicles: self.instance.num_vehicles(),
            objective: self.config.objective(),
            termination: Termination::TimeLimit,
            vertex_coords: self.instance.coords().map(<[_]>::to_vec),
            tours: Vec::new(),
            tour_costs: Vec::new(),
            objective_value: None,
            optimality_gap: None,
            computation_time_secs: (elapsed.as_secs_f64() * 100.0).round() / 100.0,
            fairness: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::distance::Metric;
    use crate::error::{ConfigError, Error};
    use crate::models::{Coords, Objective};

    fn instance(coords: Vec<Coords>, k: usize) -> Instance {
        Instance::from_coords("test", coords, Metric::Euclidean, k, 0).unwrap()
    }

    fn config(objective: Objective) -> SolverConfig {
        SolverConfig::new(objective).with_time_limit(Duration::from_secs(120))
    }

    /// Shortest closed walk from the depot through every vertex of `set`.
    fn best_tour(inst: &Instance, set: &[usize]) -> f64 {
        fn permute(inst: &Instance, rest: &mut Vec<usize>, last: usize, acc: f64, best: &mut f64) {
            if rest.is_empty() {
                *best = best.min(acc + inst.distance(last, inst.depot()));
                return;
            }
            for i in 0..rest.len() {
                let next = rest.remove(i);
                permute(inst, rest, next, acc + inst.distance(last, next), best);
                rest.insert(i, next);
            }
        }
        if set.is_empty() {
            return 0.0;
        }
        let mut best = f64::INFINITY;
        permute(inst, &mut set.to_vec(), inst.depot(), 0.0, &mut best);
        best
    }

    /// Optimum over every assignment of customers to vehicles.
    fn brute_force(inst: &Instance, score: impl Fn(&[f64]) -> f64) -> f64 {
        let customers: Vec<usize> = inst.customers().collect();
        let k = inst.num_vehicles();
        let total = k.pow(customers.len() as u32);
        let mut best = f64::INFINITY;
        for code in 0..total {
            let mut groups = vec![Vec::new(); k];
            let mut rest = code;
            for &c in &customers {
                groups[rest % k].push(c);
                rest /= k;
            }
            let lengths: Vec<f64> = groups.iter().map(|g| best_tour(inst, g)).collect();
            best = best.min(score(&lengths));
        }
        best
    }

    fn assert_valid(inst: &Instance, solver: &BranchAndCutSolver, result: &SolveResult) {
        assert!(result.has_solution());
        assert_eq!(result.tours.len(), inst.num_vehicles());
        let mut served = Vec::new();
        for (v, tour) in result.tours.iter().enumerate() {
            let vertices = tour.vertices();
            let depot_visits = vertices.iter().filter(|&&i| i == inst.depot()).count();
            if tour.is_idle() {
                assert_eq!(vertices, &[inst.depot()]);
            } else {
                assert_eq!(vertices[0], inst.depot());
                assert_eq!(vertices[vertices.len() - 1], inst.depot());
                assert_eq!(depot_visits, 2);
            }
            served.extend_from_slice(tour.customers());
            let walked: f64 = if tour.is_idle() {
                0.0
            } else {
                vertices.windows(2).map(|w| inst.distance(w[0], w[1])).sum()
            };
            assert!((walked - result.tour_costs[v]).abs() < 1e-6, "vehicle {v}");
        }
        served.sort_unstable();
        assert_eq!(served, inst.customers().collect::<Vec<_>>());
        assert!(solver.model().num_constraints() > 0);
    }

    #[test]
    fn test_right_triangle_min() {
        // customers form a 3-4-5 right triangle
        let inst = instance(
            vec![
                Coords::new(0.0, 0.0),
                Coords::new(3.0, 0.0),
                Coords::new(3.0, 4.0),
                Coords::new(0.0, 4.0),
            ],
            2,
        );
        let oracle = brute_force(&inst, |l| l.iter().sum());
        let solver = BranchAndCutSolver::with_default_engine(inst.clone(), config(Objective::Min)).unwrap();
        let result = solver.solve().unwrap();

        assert_eq!(result.termination, Termination::Optimal);
        assert!((result.objective_value.unwrap() - oracle).abs() < 1e-6);
        assert!((result.total_length() - 14.0).abs() < 1e-6);
        assert_valid(&inst, &solver, &result);
    }

    #[test]
    fn test_min_max_three_clusters() {
        let mut coords = vec![Coords::new(0.0, 0.0)];
        for i in 0..3 {
            let angle = i as f64 * std::f64::consts::TAU / 3.0;
            let (x, y) = (10.0 * angle.cos(), 10.0 * angle.sin());
            coords.push(Coords::new(x, y));
            coords.push(Coords::new(x * 1.1, y * 1.1));
        }
        let inst = instance(coords, 3);
        let oracle = brute_force(&inst, |l| l.iter().copied().fold(0.0, f64::max));
        let solver = BranchAndCutSolver::with_default_engine(inst.clone(), config(Objective::MinMax)).unwrap();
        let result = solver.solve().unwrap();

        assert_eq!(result.termination, Termination::Optimal);
        let z = result.objective_value.unwrap();
        assert!((z - oracle).abs() < 1e-6);
        let longest = result.tour_costs.iter().copied().fold(0.0, f64::max);
        assert!((z - longest).abs() < 1e-6);
        let zvar = solver.variables().minmax().unwrap();
        assert!(solver.model().var(zvar).name == "z");
        assert_valid(&inst, &solver, &result);
    }

    #[test]
    fn test_eps_fair_symmetric_instance_is_balanced() {
        let inst = instance(
            vec![
                Coords::new(0.0, 0.0),
                Coords::new(10.0, 0.0),
                Coords::new(0.0, 10.0),
                Coords::new(-10.0, 0.0),
                Coords::new(0.0, -10.0),
            ],
            2,
        );
        let solver = BranchAndCutSolver::with_default_engine(
            inst.clone(),
            config(Objective::EpsFair { epsilon: 1.0 }),
        )
        .unwrap();
        let result = solver.solve().unwrap();

        assert!(result.has_solution());
        let costs = &result.tour_costs;
        assert!((costs[0] - costs[1]).abs() < 1e-4 * costs[0]);
        assert!((result.fairness.unwrap().jain - 1.0).abs() < 1e-6);
        assert!(result.tours.iter().all(|t| t.len() == 2));
        assert_valid(&inst, &solver, &result);
    }

    #[test]
    fn test_random_instances_match_brute_force() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..3 {
            let coords: Vec<Coords> = (0..5)
                .map(|_| Coords::new(rng.random_range(0.0..100.0), rng.random_range(0.0..100.0)))
                .collect();
            let inst = instance(coords, 2);
            let oracle = brute_force(&inst, |l| l.iter().sum());
            let solver = BranchAndCutSolver::with_default_engine(inst.clone(), config(Objective::Min)).unwrap();
            let result = solver.solve().unwrap();
            assert_eq!(result.termination, Termination::Optimal);
            assert!((result.objective_value.unwrap() - oracle).abs() < 1e-5 * oracle.max(1.0));
            assert_valid(&inst, &solver, &result);
        }
    }

    fn random_instance(rng: &mut StdRng, points: usize, k: usize) -> Instance {
        let coords: Vec<Coords> = (0..points)
            .map(|_| Coords::new(rng.random_range(0.0..100.0), rng.random_range(0.0..100.0)))
            .collect();
        instance(coords, k)
    }

    /// Solves `inst` and checks the objective against the brute-force optimum
    /// over assignments accepted by `feasible`, with and without slack.
    fn assert_matches_oracle(
        inst: &Instance,
        objective: Objective,
        score: impl Fn(&[f64]) -> f64,
        feasible: impl Fn(&[f64], f64) -> bool,
    ) {
        let strict = brute_force(inst, |l| if feasible(l, 1e-9) { score(l) } else { f64::INFINITY });
        let loose = brute_force(inst, |l| if feasible(l, 1e-4) { score(l) } else { f64::INFINITY });
        let solver = BranchAndCutSolver::with_default_engine(inst.clone(), config(objective)).unwrap();
        let result = solver.solve().unwrap();

        if loose.is_infinite() {
            assert_eq!(result.termination, Termination::Infeasible, "{objective}");
            return;
        }
        assert_eq!(result.termination, Termination::Optimal, "{objective}");
        let value = result.objective_value.unwrap();
        let tol = 1e-5 * strict.max(1.0);
        assert!(value >= loose - tol, "{objective}: {value} below {loose}");
        assert!(value <= strict + tol, "{objective}: {value} above {strict}");
        assert!(feasible(&result.tour_costs, 1e-4), "{objective}: {:?}", result.tour_costs);
        assert!((score(&result.tour_costs) - value).abs() < 1e-4 * value.max(1.0));
        assert_valid(inst, &solver, &result);
    }

    fn norm(lengths: &[f64], p: u32) -> f64 {
        lengths
            .iter()
            .map(|l| l.powf(f64::from(p)))
            .sum::<f64>()
            .powf(1.0 / f64::from(p))
    }

    fn sum(lengths: &[f64]) -> f64 {
        lengths.iter().sum()
    }

    #[test]
    fn test_p_norm_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(11);
        for p in [2, 3] {
            for _ in 0..2 {
                let inst = random_instance(&mut rng, 5, 2);
                assert_matches_oracle(&inst, Objective::PNorm { p }, |l| norm(l, p), |_, _| true);
            }
        }
    }

    #[test]
    fn test_delta_fair_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(13);
        let epsilon = 0.5;
        for _ in 0..2 {
            let inst = random_instance(&mut rng, 6, 3);
            let k = inst.num_vehicles() as f64;
            // Gini inequality over lengths ranked longest first
            let gini = |l: &[f64], slack: f64| {
                let mut ranked = l.to_vec();
                ranked.sort_by(|a, b| b.total_cmp(a));
                let lhs: f64 = ranked
                    .iter()
                    .enumerate()
                    .map(|(v, l)| ((1.0 - epsilon) * k + 1.0 + epsilon - 2.0 * (v as f64 + 1.0)) * l)
                    .sum();
                lhs <= slack * sum(l).max(1.0)
            };
            assert_matches_oracle(&inst, Objective::DeltaFair { epsilon }, sum, gini);
        }
    }

    #[test]
    fn test_eps_fair_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(17);
        let epsilon = 0.5;
        for _ in 0..3 {
            let inst = random_instance(&mut rng, 5, 2);
            let bar = crate::models::eps_bar(inst.num_vehicles(), epsilon);
            let cone = |l: &[f64], slack: f64| norm(l, 2) * bar <= sum(l) * (1.0 + slack);
            assert_matches_oracle(&inst, Objective::EpsFair { epsilon }, sum, cone);
        }
    }

    #[test]
    fn test_unbalanceable_instance_is_infeasible() {
        // one customer cannot give two vehicles equal lengths
        let inst = instance(vec![Coords::new(0.0, 0.0), Coords::new(1.0, 0.0)], 2);
        let objective = Objective::EpsFair { epsilon: 1.0 };
        let solver = BranchAndCutSolver::with_default_engine(inst, config(objective)).unwrap();
        let result = solver.solve().unwrap();

        assert_eq!(result.termination, Termination::Infeasible);
        assert!(result.tours.is_empty());
        assert!(result.tour_costs.is_empty());
        assert_eq!(result.objective_value, None);
        assert_eq!(result.fairness, None);
        assert_eq!(result.instance_name, "test");
        assert_eq!(result.num_vertices, 2);
        assert_eq!(result.num_vehicles, 2);
        assert_eq!(result.objective, objective);
        assert_eq!(result.vertex_coords.as_ref().map(Vec::len), Some(2));
        assert!(matches!(result.ensure_feasible(), Err(Error::Infeasible { .. })));
    }

    #[test]
    fn test_zero_time_limit_reports_metadata() {
        let inst = instance(
            vec![Coords::new(0.0, 0.0), Coords::new(1.0, 0.0), Coords::new(0.0, 1.0)],
            2,
        );
        let config = SolverConfig::new(Objective::Min).with_time_limit(Duration::ZERO);
        let solver = BranchAndCutSolver::with_default_engine(inst, config).unwrap();
        let result = solver.solve().unwrap();
        assert_eq!(result.termination, Termination::TimeLimit);
        assert!(!result.has_solution());
        assert_eq!(result.num_vehicles, 2);
        assert_eq!(result.vertex_coords.as_ref().map(Vec::len), Some(3));
    }

    #[test]
    fn test_invalid_config_fails_before_search() {
        let inst = instance(
            vec![Coords::new(0.0, 0.0), Coords::new(1.0, 0.0), Coords::new(0.0, 1.0)],
            2,
        );
        let config = SolverConfig::new(Objective::EpsFair { epsilon: 1.5 });
        let err = BranchAndCutSolver::with_default_engine(inst, config).err().unwrap();
        assert!(matches!(err, Error::Config(ConfigError::FairnessOutOfRange(_))));
    }
}
