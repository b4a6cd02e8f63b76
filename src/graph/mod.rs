//! Graph model and support-graph algorithms.
//!
//! - [`CompleteGraph`] — the instance graph with a dense edge arena
//! - [`SupportGraph`] — active-variable subgraphs with connectivity and min-cut queries

mod complete;
mod support;

pub use complete::{CompleteGraph, Edge};
pub use support::{MinCut, SupportGraph};
