//! The engine contract.

use std::time::Duration;

use thiserror::Error;

use super::callback::Callback;
use super::model::Model;

/// Limits applied to one search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchLimits {
    /// Wall-clock budget, checked between node evaluations.
    pub time_limit: Duration,
}

impl SearchLimits {
    pub fn new(time_limit: Duration) -> Self {
        Self { time_limit }
    }
}

/// How the search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    /// The incumbent is optimal.
    Optimal,
    /// The model has no feasible point.
    Infeasible,
    /// A time or node limit stopped the search, or nodes were left
    /// unexplored; an incumbent may exist.
    Interrupted,
}

/// Report produced by [`MipEngine::solve`].
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOutcome {
    pub status: EngineStatus,
    /// Incumbent values indexed by variable, if one was found.
    pub values: Option<Vec<f64>>,
    pub objective: Option<f64>,
    /// Best proven lower bound.
    pub best_bound: f64,
    /// Relative gap `(objective − bound) / |objective|`.
    pub gap: Option<f64>,
    pub elapsed: Duration,
    pub nodes: usize,
}

impl EngineOutcome {
    pub fn has_incumbent(&self) -> bool {
        self.values.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("LP relaxation failed: {0}")]
    Lp(String),
    #[error("LP relaxation is unbounded")]
    Unbounded,
}

/// A mixed-integer engine that minimizes a [`Model`] while calling back into
/// problem-specific code at relaxation and candidate nodes.
pub trait MipEngine {
    fn solve(
        &self,
        model: &Model,
        callback: &dyn Callback,
        limits: &SearchLimits,
    ) -> Result<EngineOutcome, EngineError>;
}
