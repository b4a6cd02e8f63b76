//! Domain model types for the fair multiple TSP.
//!
//! Provides the immutable instance (graph, fleet size, depot), the fairness
//! objective and solver configuration, closed vehicle tours, and the result
//! produced after the search terminates.

mod instance;
mod objective;
mod result;
mod tour;

pub use instance::{Coords, Instance};
pub use objective::{eps_bar, Objective, SolverConfig};
pub use result::{FairnessIndices, SolveResult, Termination};
pub use tour::Tour;
