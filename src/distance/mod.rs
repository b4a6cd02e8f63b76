//! Distance matrices.
//!
//! Provides a dense distance matrix and the TSPLIB coordinate metrics used to
//! fill it.

mod matrix;

pub use matrix::{DistanceMatrix, Metric};
