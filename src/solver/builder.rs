//! The integer-programming formulation.
//!
//! Shared by every objective:
//!
//! - degree: `Σ_{e ∋ i} x[v][e] = 2·y[v][i]` for every customer `i`
//! - assignment: `Σ_v y[v][i] = 1` for every customer `i`
//! - depot visit: `y[v][depot] = 1`
//! - length: `l[v] = Σ_e w(e)·x[v][e]`
//! - two-vertex subtours: `x[v][ij] ≤ y[v][i]` and `x[v][ij] ≤ y[v][j]` for
//!   edges away from the depot
//! - symmetry (optional): `l[v] ≥ l[v+1]`
//!
//! The cones of eps-fair and p-norm start with a single tangent each at
//! `(1, 1, 1)` and are refined lazily by the outer-approximation cuts.

use log::info;

use crate::error::ConfigError;
use crate::mip::{Constraint, LinExpr, Model};
use crate::models::{eps_bar, Instance, Objective, SolverConfig};

use super::variables::Variables;

/// A formulation ready to hand to an engine.
#[derive(Debug, Clone)]
pub struct BuiltModel {
    pub model: Model,
    pub vars: Variables,
}

/// Builds the formulation of `instance` for the configured objective.
///
/// Fails fast on invalid configurations; nothing is built in that case.
pub fn build_model(instance: &Instance, config: &SolverConfig) -> Result<BuiltModel, ConfigError> {
    config.validate(instance)?;

    let mut model = Model::new();
    let vars = Variables::create(&mut model, instance, config.objective());
    let mut builder = ModelBuilder {
        instance,
        vars: &vars,
        model: &mut model,
    };

    builder.add_degree_constraints();
    builder.add_assignment_constraints();
    builder.add_depot_visits();
    builder.add_length_definitions();
    builder.add_two_vertex_secs();
    if config.symmetry_breaking() {
        builder.add_symmetry_constraints();
    }
    match config.objective() {
        Objective::Min => {}
        Objective::MinMax => builder.add_minmax_constraints(),
        Objective::EpsFair { epsilon } => builder.add_eps_fair_constraints(epsilon),
        Objective::DeltaFair { epsilon } => builder.add_delta_fair_constraint(epsilon),
        Objective::PNorm { p } => builder.add_pnorm_constraints(p),
    }
    builder.set_objective(config.objective());

    info!(
        "built {} model for {}: {} variables, {} constraints",
        config.objective(),
        instance.name(),
        model.num_vars(),
        model.num_constraints()
    );
    Ok(BuiltModel { model, vars })
}

struct ModelBuilder<'a> {
    instance: &'a Instance,
    vars: &'a Variables,
    model: &'a mut Model,
}

impl ModelBuilder<'_> {
    fn vehicles(&self) -> std::ops::Range<usize> {
        0..self.instance.num_vehicles()
    }

    fn length_sum(&self) -> LinExpr {
        self.vars.lengths().iter().map(|&l| (l, 1.0)).collect()
    }

    fn add_degree_constraints(&mut self) {
        let graph = self.instance.graph();
        for v in self.vehicles() {
            for i in self.instance.customers() {
                let mut expr: LinExpr = graph
                    .incident(i)
                    .iter()
                    .map(|&e| (self.vars.edge(v, e), 1.0))
                    .collect();
                expr.add(self.vars.vertex(v, i), -2.0);
                self.model
                    .add_constraint(Constraint::equals(format!("deg_{v}_{i}"), expr, 0.0));
            }
        }
    }

    fn add_assignment_constraints(&mut self) {
        for i in self.instance.customers() {
            let expr: LinExpr = self.vehicles().map(|v| (self.vars.vertex(v, i), 1.0)).collect();
            self.model
                .add_constraint(Constraint::equals(format!("visit_{i}"), expr, 1.0));
        }
    }

    fn add_depot_visits(&mut self) {
        let depot = self.instance.depot();
        for v in self.vehicles() {
            let expr = LinExpr::new().with(self.vars.vertex(v, depot), 1.0);
            self.model
                .add_constraint(Constraint::equals(format!("depot_visit_{v}"), expr, 1.0));
        }
    }

    fn add_length_definitions(&mut self) {
        let graph = self.instance.graph();
        for v in self.vehicles() {
            let mut expr: LinExpr = (0..graph.num_edges())
                .map(|e| (self.vars.edge(v, e), -graph.weight(e)))
                .collect();
            expr.add(self.vars.length(v), 1.0);
            self.model
                .add_constraint(Constraint::equals(format!("len_{v}"), expr, 0.0));
        }
    }

    fn add_two_vertex_secs(&mut self) {
        let graph = self.instance.graph();
        let depot = self.instance.depot();
        for v in self.vehicles() {
            for (id, e) in graph.edges().iter().enumerate() {
                if e.touches(depot) {
                    continue;
                }
                for end in [e.u, e.v] {
                    let expr = LinExpr::new()
                        .with(self.vars.edge(v, id), 1.0)
                        .with(self.vars.vertex(v, end), -1.0);
                    self.model.add_constraint(Constraint::le(
                        format!("sec2_{v}_{}_{}_{end}", e.u, e.v),
                        expr,
                        0.0,
                    ));
                }
            }
        }
    }

    fn add_symmetry_constraints(&mut self) {
        for v in 1..self.instance.num_vehicles() {
            let expr = LinExpr::new()
                .with(self.vars.length(v - 1), 1.0)
                .with(self.vars.length(v), -1.0);
            self.model
                .add_constraint(Constraint::ge(format!("sym_{}_{v}", v - 1), expr, 0.0));
        }
    }

    fn add_minmax_constraints(&mut self) {
        let Some(z) = self.vars.minmax() else {
            return;
        };
        for v in self.vehicles() {
            let expr = LinExpr::new().with(z, 1.0).with(self.vars.length(v), -1.0);
            self.model
                .add_constraint(Constraint::ge(format!("minmax_{v}"), expr, 0.0));
        }
    }

    /// `‖l‖₂ ≤ F` with `F·ε̄ = ‖l‖₁`, split into `l_v² ≤ k_v·F` and `Σ k_v ≤ F`.
    fn add_eps_fair_constraints(&mut self, epsilon: f64) {
        let (Some(f), Some(_)) = (self.vars.fairness_factor(), self.vars.conic(0)) else {
            return;
        };
        let bar = eps_bar(self.instance.num_vehicles(), epsilon);

        let mut def = self.length_sum();
        def.add(f, -bar);
        self.model
            .add_constraint(Constraint::equals("leps_def", def, 0.0));

        let mut sum: LinExpr = self
            .vehicles()
            .filter_map(|v| self.vars.conic(v))
            .map(|k| (k, 1.0))
            .collect();
        sum.add(f, -1.0);
        self.model.add_constraint(Constraint::le("conic_sum", sum, 0.0));

        for v in self.vehicles() {
            let Some(k) = self.vars.conic(v) else {
                continue;
            };
            let tangent = LinExpr::new()
                .with(self.vars.length(v), 2.0)
                .with(k, -1.0)
                .with(f, -1.0);
            self.model
                .add_constraint(Constraint::le(format!("tangent_{v}"), tangent, 0.0));
        }
    }

    /// `Σ_v ((1−ε)K + 1 + ε − 2(v+1))·l_v ≤ 0` over ranked lengths.
    fn add_delta_fair_constraint(&mut self, epsilon: f64) {
        let k = self.instance.num_vehicles() as f64;
        let expr: LinExpr = self
            .vehicles()
            .map(|v| {
                let coef = (1.0 - epsilon) * k + 1.0 + epsilon - 2.0 * (v as f64 + 1.0);
                (self.vars.length(v), coef)
            })
            .collect();
        self.model.add_constraint(Constraint::le("gini", expr, 0.0));
    }

    /// `l_v ≤ k_v^α · z^(1−α)` with `Σ k_v = z` and `α = 1/p`.
    fn add_pnorm_constraints(&mut self, p: u32) {
        let Some(z) = self.vars.pnorm() else {
            return;
        };
        let alpha = 1.0 / f64::from(p);

        let mut sum: LinExpr = self
            .vehicles()
            .filter_map(|v| self.vars.conic(v))
            .map(|k| (k, 1.0))
            .collect();
        sum.add(z, -1.0);
        self.model.add_constraint(Constraint::equals("pnorm_sum", sum, 0.0));

        for v in self.vehicles() {
            let Some(k) = self.vars.conic(v) else {
                continue;
            };
            let tangent = LinExpr::new()
                .with(k, alpha)
                .with(z, 1.0 - alpha)
                .with(self.vars.length(v), -1.0);
            self.model
                .add_constraint(Constraint::ge(format!("pnorm_tangent_{v}"), tangent, 0.0));
        }
    }

    fn set_objective(&mut self, objective: Objective) {
        let expr = match objective {
            Objective::Min | Objective::EpsFair { .. } | Objective::DeltaFair { .. } => {
                self.length_sum()
            }
            Objective::MinMax => self
                .vars
                .minmax()
                .map(|z| LinExpr::new().with(z, 1.0))
                .unwrap_or_default(),
            Objective::PNorm { .. } => self
                .vars
                .pnorm()
                .map(|z| LinExpr::new().with(z, 1.0))
                .unwrap_or_default(),
        };
        self.model.set_objective(expr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::Metric;
    use crate::models::Coords;

    fn instance(k: usize) -> Instance {
        let coords = vec![
            Coords::new(0.0, 0.0),
            Coords::new(3.0, 0.0),
            Coords::new(0.0, 4.0),
            Coords::new(3.0, 4.0),
        ];
        Instance::from_coords("rect", coords, Metric::Euclidean, k, 0).unwrap()
    }

    fn names(built: &BuiltModel) -> Vec<&str> {
        built.model.constraints().iter().map(|c| c.name()).collect()
    }

    #[test]
    fn test_common_constraint_counts() {
        let inst = instance(2);
        let built = build_model(&inst, &SolverConfig::new(Objective::Min)).unwrap();
        let names = names(&built);
        let count = |prefix: &str| names.iter().filter(|n| n.starts_with(prefix)).count();
        // 3 customers * 2 vehicles
        assert_eq!(count("deg_"), 6);
        assert_eq!(count("visit_"), 3);
        assert_eq!(count("depot_visit_"), 2);
        assert_eq!(count("len_"), 2);
        // 3 non-depot edges * 2 endpoints * 2 vehicles
        assert_eq!(count("sec2_"), 12);
        assert_eq!(count("sym_"), 1);
    }

    #[test]
    fn test_symmetry_can_be_disabled() {
        let inst = instance(3);
        let config = SolverConfig::new(Objective::Min).with_symmetry_breaking(false);
        let built = build_model(&inst, &config).unwrap();
        assert!(!names(&built).iter().any(|n| n.starts_with("sym_")));
    }

    #[test]
    fn test_length_definition_uses_weights() {
        let inst = instance(1);
        let built = build_model(&inst, &SolverConfig::new(Objective::Min)).unwrap();
        let len = built
            .model
            .constraints()
            .iter()
            .find(|c| c.name() == "len_0")
            .unwrap();
        let diagonal = inst.graph().edge_between(0, 3).unwrap();
        let x = built.vars.edge(0, diagonal);
        let coef = len
            .expr()
            .terms()
            .iter()
            .find(|&&(var, _)| var == x)
            .map(|&(_, c)| c);
        assert_eq!(coef, Some(-5.0));
    }

    #[test]
    fn test_delta_fair_coefficients() {
        let inst = instance(3);
        let built =
            build_model(&inst, &SolverConfig::new(Objective::DeltaFair { epsilon: 0.0 })).unwrap();
        let gini = built
            .model
            .constraints()
            .iter()
            .find(|c| c.name() == "gini")
            .unwrap();
        // (1 - 0) * 3 + 1 + 0 - 2(v + 1) = 2, 0, -2; the zero term is dropped
        let coefs: Vec<f64> = gini.expr().terms().iter().map(|&(_, c)| c).collect();
        assert_eq!(coefs, vec![2.0, -2.0]);
    }

    #[test]
    fn test_eps_fair_tangents() {
        let inst = instance(2);
        let built =
            build_model(&inst, &SolverConfig::new(Objective::EpsFair { epsilon: 1.0 })).unwrap();
        let names = names(&built);
        assert!(names.contains(&"leps_def"));
        assert!(names.contains(&"conic_sum"));
        assert!(names.contains(&"tangent_1"));
        // (1, 1, 1) lies on the tangent plane 2l - k - F = 0
        let tangent = built
            .model
            .constraints()
            .iter()
            .find(|c| c.name() == "tangent_0")
            .unwrap();
        let mut point = vec![0.0; built.model.num_vars()];
        point[built.vars.length(0).index()] = 1.0;
        point[built.vars.conic(0).unwrap().index()] = 1.0;
        point[built.vars.fairness_factor().unwrap().index()] = 1.0;
        assert!(tangent.violation(&point).abs() < 1e-12);
    }

    #[test]
    fn test_pnorm_objective() {
        let inst = instance(2);
        let built = build_model(&inst, &SolverConfig::new(Objective::PNorm { p: 2 })).unwrap();
        let z = built.vars.pnorm().unwrap();
        assert_eq!(built.model.objective().terms(), &[(z, 1.0)]);
        assert!(names(&built).contains(&"pnorm_tangent_1"));
    }

    #[test]
    fn test_invalid_configuration_fails_fast() {
        let inst = instance(2);
        let err = build_model(&inst, &SolverConfig::new(Objective::EpsFair { epsilon: 2.0 }))
            .unwrap_err();
        assert_eq!(err, ConfigError::FairnessOutOfRange(2.0));

        let config = SolverConfig::new(Objective::DeltaFair { epsilon: 0.5 })
            .with_symmetry_breaking(false);
        assert_eq!(
            build_model(&inst, &config).unwrap_err(),
            ConfigError::OrderingRequired
        );
    }
}
