//! Reference engine: depth-first branch-and-bound over LP relaxations.
//!
//! # Algorithm
//!
//! Each node carries its own variable bounds. Its LP (model constraints plus
//! every cut collected so far) is solved with `microlp`, then refined in a
//! loop:
//!
//! 1. Integral point: the candidate handler may reject it with lazy
//!    constraints, which are appended and the LP re-solved. An unrejected
//!    point becomes the incumbent if it improves.
//! 2. Fractional point: the relaxation handler may add user cuts and post
//!    heuristic solutions. Violated cuts are appended and the LP re-solved,
//!    up to a round cap; otherwise the node branches on the integer variable
//!    with the highest priority, most fractional first.
//!
//! Nodes whose bound cannot beat the incumbent are pruned. The time limit
//! is checked between nodes and between cut rounds. A node whose candidate
//! keeps being rejected past the lazy round cap is dropped; the search is
//! then incomplete and reports [`EngineStatus::Interrupted`] with the
//! dropped bound folded into the best bound.

use std::collections::HashSet;
use std::time::Instant;

use log::{debug, info, trace, warn};
use microlp::{ComparisonOp, OptimizationDirection, Problem, Variable};

use super::callback::{Callback, CandidateContext, CheckMode, RelaxationContext};
use super::engine::{EngineError, EngineOutcome, EngineStatus, MipEngine, SearchLimits};
use super::model::{Constraint, Model, Sense, Var};

/// Tuning knobs of [`BranchAndBound`].
#[derive(Debug, Clone, PartialEq)]
pub struct BnbOptions {
    /// A value within this distance of an integer counts as integral.
    pub integrality_tolerance: f64,
    /// Constraint violations up to this amount are ignored.
    pub feasibility_tolerance: f64,
    /// User-cut rounds per node before branching.
    pub max_cut_rounds: usize,
    /// Lazy-constraint rounds per node before the node is dropped.
    pub max_lazy_rounds: usize,
    /// Stop after evaluating this many nodes.
    pub node_limit: Option<usize>,
}

impl Default for BnbOptions {
    fn default() -> Self {
        Self {
            integrality_tolerance: 1e-6,
            feasibility_tolerance: 1e-6,
            max_cut_rounds: 20,
            max_lazy_rounds: 200,
            node_limit: None,
        }
    }
}

impl BnbOptions {
    pub fn with_node_limit(mut self, limit: usize) -> Self {
        self.node_limit = Some(limit);
        self
    }

    pub fn with_max_cut_rounds(mut self, rounds: usize) -> Self {
        self.max_cut_rounds = rounds;
        self
    }

    pub fn with_max_lazy_rounds(mut self, rounds: usize) -> Self {
        self.max_lazy_rounds = rounds;
        self
    }
}

/// Single-threaded branch-and-bound engine.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use fair_mtsp::mip::{
///     BranchAndBound, Constraint, EngineStatus, LinExpr, MipEngine, Model, NoCallback,
///     SearchLimits, VarType,
/// };
///
/// // min -x subject to 2x <= 3, x integer
/// let mut model = Model::new();
/// let x = model.add_var("x", 0.0, 10.0, VarType::Integer);
/// model.add_constraint(Constraint::le("cap", LinExpr::new().with(x, 2.0), 3.0));
/// model.set_objective(LinExpr::new().with(x, -1.0));
///
/// let limits = SearchLimits::new(Duration::from_secs(10));
/// let outcome = BranchAndBound::default().solve(&model, &NoCallback, &limits).unwrap();
/// assert_eq!(outcome.status, EngineStatus::Optimal);
/// assert_eq!(outcome.objective, Some(-1.0));
/// ```
#[derive(Debug, Clone, Default)]
pub struct BranchAndBound {
    options: BnbOptions,
}

impl BranchAndBound {
    pub fn new(options: BnbOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BnbOptions {
        &self.options
    }
}

impl MipEngine for BranchAndBound {
    fn solve(
        &self,
        model: &Model,
        callback: &dyn Callback,
        limits: &SearchLimits,
    ) -> Result<EngineOutcome, EngineError> {
        info!(
            "branch-and-bound: {} variables, {} constraints, time limit {:?}",
            model.num_vars(),
            model.num_constraints(),
            limits.time_limit
        );
        Search::new(model, callback, &self.options, limits).run()
    }
}

struct Node {
    lower: Vec<f64>,
    upper: Vec<f64>,
    /// Lower bound inherited from the parent LP.
    bound: f64,
    depth: usize,
}

enum NodeResult {
    Pruned,
    Branch { var: Var, value: f64, bound: f64 },
    /// Left unexplored; `bound` is its last LP objective.
    Dropped { bound: f64 },
    Interrupted,
}

struct Incumbent {
    values: Vec<f64>,
    objective: f64,
}

type CutKey = (Vec<(usize, u64)>, Sense, u64);

/// Globally valid cuts, deduplicated by exact coefficients.
#[derive(Default)]
struct CutPool {
    cuts: Vec<Constraint>,
    keys: HashSet<CutKey>,
}

impl CutPool {
    /// Stores `cut` unless an identical one is pooled already.
    fn insert(&mut self, cut: Constraint) -> Option<&Constraint> {
        let key = (
            cut.expr()
                .terms()
                .iter()
                .map(|&(var, coef)| (var.index(), coef.to_bits()))
                .collect(),
            cut.sense(),
            cut.rhs().to_bits(),
        );
        if !self.keys.insert(key) {
            return None;
        }
        self.cuts.push(cut);
        self.cuts.last()
    }
}

struct PostedSolution {
    values: Vec<f64>,
    estimate: f64,
    mode: CheckMode,
}

struct RelaxationPoint<'a> {
    values: &'a [f64],
    cuts: Vec<Constraint>,
    solutions: Vec<PostedSolution>,
}

impl RelaxationContext for RelaxationPoint<'_> {
    fn values(&self) -> &[f64] {
        self.values
    }

    fn add_user_cut(&mut self, cut: Constraint) {
        self.cuts.push(cut);
    }

    fn post_heuristic_solution(&mut self, values: Vec<f64>, objective_estimate: f64, mode: CheckMode) {
        self.solutions.push(PostedSolution {
            values,
            estimate: objective_estimate,
            mode,
        });
    }
}

struct CandidatePoint<'a> {
    values: &'a [f64],
    rejections: Vec<Constraint>,
}

impl CandidateContext for CandidatePoint<'_> {
    fn values(&self) -> &[f64] {
        self.values
    }

    fn reject(&mut self, cut: Constraint) {
        self.rejections.push(cut);
    }
}

struct Search<'a> {
    model: &'a Model,
    callback: &'a dyn Callback,
    options: &'a BnbOptions,
    limits: &'a SearchLimits,
    start: Instant,
    pool: CutPool,
    incumbent: Option<Incumbent>,
    nodes: usize,
    /// Lowest bound among dropped nodes.
    dropped: Option<f64>,
}

impl<'a> Search<'a> {
    fn new(
        model: &'a Model,
        callback: &'a dyn Callback,
        options: &'a BnbOptions,
        limits: &'a SearchLimits,
    ) -> Self {
        Self {
            model,
            callback,
            options,
            limits,
            start: Instant::now(),
            pool: CutPool::default(),
            incumbent: None,
            nodes: 0,
            dropped: None,
        }
    }

    fn run(mut self) -> Result<EngineOutcome, EngineError> {
        let root = Node {
            lower: self.model.vars().iter().map(|def| def.lb).collect(),
            upper: self.model.vars().iter().map(|def| def.ub).collect(),
            bound: f64::NEG_INFINITY,
            depth: 0,
        };
        let mut stack = vec![root];
        let mut interrupted = false;

        while let Some(node) = stack.pop() {
            if self.limit_reached() {
                stack.push(node);
                interrupted = true;
                break;
            }
            if self.dominated(node.bound) {
                continue;
            }
            self.nodes += 1;

            match self.process(&node)? {
                NodeResult::Pruned => {}
                NodeResult::Dropped { bound } => {
                    self.dropped = Some(self.dropped.map_or(bound, |b| b.min(bound)));
                }
                NodeResult::Interrupted => {
                    stack.push(node);
                    interrupted = true;
                    break;
                }
                NodeResult::Branch { var, value, bound } => {
                    trace!(
                        "node {} depth {}: branch on {} = {value:.4}, bound {bound:.4}",
                        self.nodes,
                        node.depth,
                        self.model.var(var).name
                    );
                    let mut down = Node {
                        lower: node.lower.clone(),
                        upper: node.upper.clone(),
                        bound,
                        depth: node.depth + 1,
                    };
                    down.upper[var.index()] = value.floor();
                    let mut up = Node {
                        lower: node.lower,
                        upper: node.upper,
                        bound,
                        depth: node.depth + 1,
                    };
                    up.lower[var.index()] = value.ceil();
                    // the up child is explored first
                    stack.push(down);
                    stack.push(up);
                }
            }
        }

        Ok(self.finish(interrupted, &stack))
    }

    fn finish(self, interrupted: bool, open: &[Node]) -> EngineOutcome {
        let elapsed = self.start.elapsed();
        let (values, objective) = match self.incumbent {
            Some(inc) => (Some(inc.values), Some(inc.objective)),
            None => (None, None),
        };

        let incomplete = interrupted || self.dropped.is_some();
        if let Some(bound) = self.dropped {
            warn!("search incomplete: nodes were dropped, lowest dropped bound {bound}");
        }

        let status = if incomplete {
            EngineStatus::Interrupted
        } else if objective.is_some() {
            EngineStatus::Optimal
        } else {
            EngineStatus::Infeasible
        };

        let best_bound = if incomplete {
            let open_bound = open
                .iter()
                .map(|n| n.bound)
                .chain(self.dropped)
                .fold(f64::INFINITY, f64::min);
            objective.map_or(open_bound, |obj| open_bound.min(obj))
        } else {
            objective.unwrap_or(f64::INFINITY)
        };

        let gap = objective.and_then(|obj| {
            best_bound
                .is_finite()
                .then(|| ((obj - best_bound) / obj.abs().max(1e-10)).max(0.0))
        });

        info!(
            "branch-and-bound finished: {status:?} after {} nodes in {:.2?}, objective {objective:?}, bound {best_bound}",
            self.nodes, elapsed
        );

        EngineOutcome {
            status,
            values,
            objective,
            best_bound,
            gap,
            elapsed,
            nodes: self.nodes,
        }
    }

    fn limit_reached(&self) -> bool {
        self.start.elapsed() >= self.limits.time_limit
            || self
                .options
                .node_limit
                .is_some_and(|limit| self.nodes >= limit)
    }

    fn dominated(&self, bound: f64) -> bool {
        self.incumbent.as_ref().is_some_and(|inc| {
            bound >= inc.objective - self.options.feasibility_tolerance * inc.objective.abs().max(1.0)
        })
    }

    fn process(&mut self, node: &Node) -> Result<NodeResult, EngineError> {
        let (problem, lp_vars) = self.build_lp(node);
        let mut solution = match problem.solve() {
            Ok(solution) => solution,
            Err(err) => return lp_failure(err).map(|()| NodeResult::Pruned),
        };

        let mut cut_rounds = 0;
        let mut lazy_rounds = 0;
        loop {
            let values: Vec<f64> = lp_vars.iter().map(|&v| *solution.var_value(v)).collect();
            let bound = solution.objective();
            if self.dominated(bound) {
                return Ok(NodeResult::Pruned);
            }

            let branch = self.branching_candidate(&values);
            let cuts = match branch {
                None => {
                    let rejections = self.check_candidate(&values);
                    if rejections.is_empty() {
                        self.accept(values, "LP");
                        return Ok(NodeResult::Pruned);
                    }
                    lazy_rounds += 1;
                    if lazy_rounds > self.options.max_lazy_rounds {
                        warn!(
                            "node at depth {} still rejected after {} lazy rounds, dropping it",
                            node.depth, self.options.max_lazy_rounds
                        );
                        return Ok(NodeResult::Dropped { bound });
                    }
                    rejections
                }
                Some((var, value)) => {
                    let cuts = self.run_relaxation_callback(&values);
                    if self.dominated(bound) {
                        return Ok(NodeResult::Pruned);
                    }
                    if cuts.is_empty() || cut_rounds >= self.options.max_cut_rounds {
                        return Ok(NodeResult::Branch { var, value, bound });
                    }
                    cut_rounds += 1;
                    cuts
                }
            };

            let mut added = 0;
            for cut in cuts {
                let Some(cut) = self.pool.insert(cut) else {
                    continue;
                };
                added += 1;
                solution = match solution.add_constraint(
                    lp_expr(cut, &lp_vars),
                    lp_op(cut.sense()),
                    cut.rhs(),
                ) {
                    Ok(solution) => solution,
                    Err(err) => return lp_failure(err).map(|()| NodeResult::Pruned),
                };
            }
            trace!("node {}: added {added} cuts", self.nodes);

            if added == 0 {
                // violated cuts were all pooled already, so the LP did not move
                return Ok(match branch {
                    Some((var, value)) => NodeResult::Branch { var, value, bound },
                    None => {
                        warn!("repeated lazy constraint at depth {}, dropping node", node.depth);
                        NodeResult::Dropped { bound }
                    }
                });
            }
            if self.limit_reached() {
                return Ok(NodeResult::Interrupted);
            }
        }
    }

    fn build_lp(&self, node: &Node) -> (Problem, Vec<Variable>) {
        let mut problem = Problem::new(OptimizationDirection::Minimize);
        let mut costs = vec![0.0; self.model.num_vars()];
        for &(var, coef) in self.model.objective().terms() {
            costs[var.index()] = coef;
        }
        let lp_vars: Vec<Variable> = costs
            .iter()
            .zip(node.lower.iter().zip(&node.upper))
            .map(|(&cost, (&lb, &ub))| problem.add_var(cost, (lb, ub)))
            .collect();
        for constraint in self.model.constraints().iter().chain(&self.pool.cuts) {
            problem.add_constraint(
                lp_expr(constraint, &lp_vars),
                lp_op(constraint.sense()),
                constraint.rhs(),
            );
        }
        (problem, lp_vars)
    }

    /// Highest-priority integer variable with a fractional value, most
    /// fractional first.
    fn branching_candidate(&self, values: &[f64]) -> Option<(Var, f64)> {
        let tol = self.options.integrality_tolerance;
        let mut best: Option<(i32, f64, Var)> = None;
        for (var, def) in self.model.var_handles().zip(self.model.vars()) {
            if !def.ty.is_integral() {
                continue;
            }
            let value = values[var.index()];
            let frac = (value - value.floor()).min(value.ceil() - value);
            if frac <= tol {
                continue;
            }
            let better = match best {
                None => true,
                Some((priority, best_frac, _)) => {
                    def.priority > priority || (def.priority == priority && frac > best_frac)
                }
            };
            if better {
                best = Some((def.priority, frac, var));
            }
        }
        best.map(|(_, _, var)| (var, values[var.index()]))
    }

    /// Runs the candidate handler and returns the rejections the point violates.
    fn check_candidate(&self, values: &[f64]) -> Vec<Constraint> {
        let mut ctx = CandidatePoint {
            values,
            rejections: Vec::new(),
        };
        self.callback.on_candidate(&mut ctx);
        self.violated(ctx.rejections, values)
    }

    fn run_relaxation_callback(&mut self, values: &[f64]) -> Vec<Constraint> {
        let mut ctx = RelaxationPoint {
            values,
            cuts: Vec::new(),
            solutions: Vec::new(),
        };
        self.callback.on_relaxation(&mut ctx);
        let RelaxationPoint { cuts, solutions, .. } = ctx;
        for posted in solutions {
            self.try_heuristic(posted);
        }
        self.violated(cuts, values)
    }

    fn violated(&self, cuts: Vec<Constraint>, values: &[f64]) -> Vec<Constraint> {
        let tol = self.options.feasibility_tolerance;
        cuts.into_iter()
            .filter(|cut| {
                if !cut.is_finite() {
                    warn!("dropping cut {} with non-finite coefficients", cut.name());
                    return false;
                }
                !cut.expr().is_empty() && cut.violation(values) > tol
            })
            .collect()
    }

    fn try_heuristic(&mut self, posted: PostedSolution) {
        if posted.values.len() != self.model.num_vars() {
            warn!(
                "heuristic solution has {} values, model has {} variables",
                posted.values.len(),
                self.model.num_vars()
            );
            return;
        }
        if posted.mode == CheckMode::CheckFeasible {
            let tol = self
                .options
                .feasibility_tolerance
                .max(self.options.integrality_tolerance);
            if let Some(what) = self.model.first_violation(&posted.values, tol) {
                debug!("heuristic solution rejected: violates {what}");
                return;
            }
            if let Some(cut) = self.pool.cuts.iter().find(|c| c.violation(&posted.values) > tol) {
                debug!("heuristic solution rejected: violates cut {}", cut.name());
                return;
            }
            if !self.check_candidate(&posted.values).is_empty() {
                debug!("heuristic solution rejected by candidate handler");
                return;
            }
        }

        let objective = self.model.objective_value(&posted.values);
        if (objective - posted.estimate).abs() > 1e-6 * objective.abs().max(1.0) {
            debug!(
                "heuristic estimate {} differs from objective {objective}",
                posted.estimate
            );
        }
        self.accept(posted.values, "heuristic");
    }

    fn accept(&mut self, mut values: Vec<f64>, source: &str) {
        for (value, def) in values.iter_mut().zip(self.model.vars()) {
            if def.ty.is_integral() {
                *value = value.round();
            }
        }
        let objective = self.model.objective_value(&values);
        let improves = self.incumbent.as_ref().map_or(true, |inc| {
            objective < inc.objective - 1e-9 * inc.objective.abs().max(1.0)
        });
        if improves {
            info!(
                "new incumbent {objective:.4} from {source} at node {} ({:.2?})",
                self.nodes,
                self.start.elapsed()
            );
            self.incumbent = Some(Incumbent { values, objective });
        }
    }
}

fn lp_expr(constraint: &Constraint, lp_vars: &[Variable]) -> Vec<(Variable, f64)> {
    constraint
        .expr()
        .terms()
        .iter()
        .map(|&(var, coef)| (lp_vars[var.index()], coef))
        .collect()
}

fn lp_op(sense: Sense) -> ComparisonOp {
    match sense {
        Sense::Le => ComparisonOp::Le,
        Sense::Ge => ComparisonOp::Ge,
        Sense::Eq => ComparisonOp::Eq,
    }
}

/// Infeasible LPs prune the node; every other failure aborts the search.
fn lp_failure(err: microlp::Error) -> Result<(), EngineError> {
    match err {
        microlp::Error::Infeasible => Ok(()),
        microlp::Error::Unbounded => Err(EngineError::Unbounded),
        other => Err(EngineError::Lp(other.to_string())),
    }
}
