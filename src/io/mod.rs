//! Instance loading.

mod tsplib;

pub use tsplib::{load_tsplib, parse_tsplib, DepotPlacement};
