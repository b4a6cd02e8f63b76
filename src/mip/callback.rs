//! Callback contract between an engine and the problem-specific code.
//!
//! The engine calls [`Callback::on_relaxation`] at nodes whose LP point is
//! fractional and [`Callback::on_candidate`] whenever it finds an integral
//! point it would otherwise accept. Handlers read the point through the
//! context and write cuts or heuristic solutions back through it; they keep
//! no state of their own between calls.

use super::model::{Constraint, Var};

/// How the engine treats a posted heuristic solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMode {
    /// Verify bounds, integrality, all constraints and lazy cuts, and run the
    /// candidate handler before accepting.
    CheckFeasible,
    /// Accept as-is. Only for solutions feasible by construction.
    Trusted,
}

/// View of a fractional relaxation point.
pub trait RelaxationContext {
    /// Dense LP values indexed by [`Var::index`].
    fn values(&self) -> &[f64];

    fn value(&self, var: Var) -> f64 {
        self.values()[var.index()]
    }

    /// Adds a cut that tightens the relaxation without removing integral
    /// feasible points.
    fn add_user_cut(&mut self, cut: Constraint);

    /// Offers a complete assignment as a new incumbent.
    fn post_heuristic_solution(&mut self, values: Vec<f64>, objective_estimate: f64, mode: CheckMode);
}

/// View of an integral candidate point.
pub trait CandidateContext {
    fn values(&self) -> &[f64];

    fn value(&self, var: Var) -> f64 {
        self.values()[var.index()]
    }

    /// Rejects the candidate by adding a lazy constraint it violates.
    fn reject(&mut self, cut: Constraint);
}

/// Problem-specific hooks invoked by a [`MipEngine`](super::MipEngine).
///
/// Engines may call handlers from several threads at once.
pub trait Callback: Send + Sync {
    fn on_relaxation(&self, ctx: &mut dyn RelaxationContext);

    fn on_candidate(&self, ctx: &mut dyn CandidateContext);
}

/// A callback that accepts every candidate and adds nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCallback;

impl Callback for NoCallback {
    fn on_relaxation(&self, _ctx: &mut dyn RelaxationContext) {}

    fn on_candidate(&self, _ctx: &mut dyn CandidateContext) {}
}
