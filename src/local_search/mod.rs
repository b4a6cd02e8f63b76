//! Local search operators for improving single tours.
//!
//! - [`two_opt_improve`] — Intra-route 2-opt edge reversal with a pass budget

mod two_opt;

pub use two_opt::{route_distance, two_opt_improve};
