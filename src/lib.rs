//! # fair-mtsp
//!
//! Fairness-aware multiple TSP solved by branch-and-cut: a fleet of identical
//! vehicles jointly visits every customer once and returns to a shared depot
//! while minimizing the sum, the maximum, or a fairness-aware function of the
//! per-vehicle tour lengths.
//!
//! ## Modules
//!
//! - [`models`] — Instance, objective and solver configuration, tours, results
//! - [`distance`] — Distance matrix and TSPLIB metrics
//! - [`graph`] — Complete instance graph and support-graph min cuts
//! - [`constructive`] — Nearest-insertion tour construction
//! - [`local_search`] — 2-opt improvement
//! - [`mip`] — Engine-neutral MIP model, callbacks, and a branch-and-bound engine
//! - [`solver`] — Model builder, separators, heuristic, and the solver facade
//! - [`io`] — TSPLIB loader
//!
//! ## Objectives
//!
//! | objective | minimizes | extra constraints |
//! |---|---|---|
//! | `min` | `Σ l` | none |
//! | `min-max` | `max l` | `z ≥ l_v` |
//! | `eps-fair` | `Σ l` | second-order cone on `l`, linearized lazily |
//! | `delta-fair` | `Σ l` | Gini inequality on ranked lengths |
//! | `p-norm` | `‖l‖_p` | power cones, linearized lazily |

pub mod constructive;
pub mod distance;
pub mod error;
pub mod graph;
pub mod io;
pub mod local_search;
pub mod mip;
pub mod models;
pub mod solver;

pub use error::{ConfigError, Error, Result};
pub use models::{Instance, Objective, SolveResult, SolverConfig, Termination};
pub use solver::BranchAndCutSolver;
