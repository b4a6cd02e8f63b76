//! Engine callback wiring the separator, heuristic, and OA cuts together.

use log::trace;

use crate::mip::{Callback, CandidateContext, CheckMode, RelaxationContext};
use crate::models::{Instance, SolverConfig};

use super::heuristic::round_solution;
use super::oa::separate_cones;
use super::separator::{separate_fractional, separate_integral};
use super::variables::Variables;

/// Callback of the fair M-TSP formulation.
///
/// Holds only shared references to immutable data, so the engine may call
/// it from several threads at once.
pub struct FairMtspCallback<'a> {
    instance: &'a Instance,
    config: &'a SolverConfig,
    vars: &'a Variables,
}

impl<'a> FairMtspCallback<'a> {
    pub fn new(instance: &'a Instance, config: &'a SolverConfig, vars: &'a Variables) -> Self {
        Self {
            instance,
            config,
            vars,
        }
    }
}

impl Callback for FairMtspCallback<'_> {
    /// Posts a rounded heuristic solution, then adds fractional subtour cuts.
    fn on_relaxation(&self, ctx: &mut dyn RelaxationContext) {
        let values = ctx.values();
        let solution = round_solution(self.instance, self.vars, self.config, values);
        let cuts = separate_fractional(self.instance, self.vars, values);
        trace!(
            "relaxation: heuristic objective {:.3}, {} user cuts",
            solution.objective,
            cuts.len()
        );

        ctx.post_heuristic_solution(solution.values, solution.objective, CheckMode::CheckFeasible);
        for cut in cuts {
            ctx.add_user_cut(cut);
        }
    }

    /// Rejects candidates with subtours or violated cones.
    fn on_candidate(&self, ctx: &mut dyn CandidateContext) {
        let values = ctx.values();
        let mut cuts = separate_integral(self.instance, self.vars, values);
        cuts.extend(separate_cones(
            self.instance,
            self.vars,
            self.config.objective(),
            values,
        ));
        trace!("candidate: {} lazy constraints", cuts.len());

        for cut in cuts {
            ctx.reject(cut);
        }
    }
}
