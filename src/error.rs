//! Error taxonomy.

use thiserror::Error as ThisError;

use crate::mip::EngineError;

/// An invalid model configuration, detected before any search starts.
#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum ConfigError {
    #[error("number of vehicles must be at least 1")]
    NoVehicles,
    #[error("depot {depot} is not a vertex of a graph with {num_vertices} vertices")]
    DepotOutOfRange { depot: usize, num_vertices: usize },
    #[error("graph needs at least 2 vertices, got {0}")]
    TooFewVertices(usize),
    #[error("edge weights must be symmetric and non-negative")]
    AsymmetricWeights,
    #[error("fairness coefficient must lie in [0, 1], got {0}")]
    FairnessOutOfRange(f64),
    #[error("p-norm order must be at least 1, got {0}")]
    InvalidNorm(u32),
    #[error("delta-fair needs symmetry breaking to rank tour lengths")]
    OrderingRequired,
}

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("fair M-TSP is infeasible for objective {objective}")]
    Infeasible { objective: String },
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}
