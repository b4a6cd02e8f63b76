//! Mixed-integer engine abstraction.
//!
//! The solver core talks to any engine through three pieces:
//!
//! - [`Model`] — variables with bounds, domains and branching priorities,
//!   named linear constraints, and a linear minimization objective
//! - [`Callback`] — two handlers, one for fractional relaxation points and
//!   one for integral candidates, with [`RelaxationContext`] and
//!   [`CandidateContext`] as their only way to talk back
//! - [`MipEngine`] — runs the search under [`SearchLimits`] and reports an
//!   [`EngineOutcome`]
//!
//! [`BranchAndBound`] is a self-contained engine built on `microlp`.

mod bnb;
mod callback;
mod engine;
mod model;

pub use bnb::{BnbOptions, BranchAndBound};
pub use callback::{Callback, CandidateContext, CheckMode, NoCallback, RelaxationContext};
pub use engine::{EngineError, EngineOutcome, EngineStatus, MipEngine, SearchLimits};
pub use model::{Constraint, LinExpr, Model, Sense, Var, VarDef, VarType};
