//! Constructive heuristics for single-vehicle tours.
//!
//! - [`nearest_insertion`] — Nearest insertion (Rosenkrantz et al., 1977), O(n³)
//! - [`construct_tour`] — Nearest insertion improved by bounded 2-opt

mod nearest_insertion;

pub use nearest_insertion::{construct_tour, nearest_insertion};
