//! Fairness objectives and solver configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

use super::Instance;

/// The objective applied to the vector of per-vehicle tour lengths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Objective {
    /// Minimize the sum of tour lengths.
    Min,
    /// Minimize the longest tour.
    MinMax,
    /// Minimize the sum subject to `‖l‖₂ ≤ ‖l‖₁ / (1 + (√K − 1)·ε)`.
    EpsFair { epsilon: f64 },
    /// Minimize the sum subject to a linear Gini-type bound with coefficient ε.
    DeltaFair { epsilon: f64 },
    /// Minimize `‖l‖_p`.
    PNorm { p: u32 },
}

impl Objective {
    /// Canonical short name (`min`, `min-max`, `eps-fair`, `delta-fair`, `p-norm`).
    pub fn name(&self) -> &'static str {
        match self {
            Objective::Min => "min",
            Objective::MinMax => "min-max",
            Objective::EpsFair { .. } => "eps-fair",
            Objective::DeltaFair { .. } => "delta-fair",
            Objective::PNorm { .. } => "p-norm",
        }
    }

    /// Builds an objective from its canonical name and the shared parameters.
    ///
    /// Parameters that the named objective does not use are ignored.
    pub fn from_name(name: &str, epsilon: f64, p: u32) -> Result<Self, String> {
        match name {
            "min" => Ok(Objective::Min),
            "min-max" => Ok(Objective::MinMax),
            "eps-fair" => Ok(Objective::EpsFair { epsilon }),
            "delta-fair" => Ok(Objective::DeltaFair { epsilon }),
            "p-norm" => Ok(Objective::PNorm { p }),
            other => Err(format!(
                "unknown objective `{other}`, expected min, min-max, eps-fair, delta-fair or p-norm"
            )),
        }
    }

    pub fn fairness_coefficient(&self) -> Option<f64> {
        match *self {
            Objective::EpsFair { epsilon } | Objective::DeltaFair { epsilon } => Some(epsilon),
            _ => None,
        }
    }

    pub fn p_norm(&self) -> Option<u32> {
        match *self {
            Objective::PNorm { p } => Some(p),
            _ => None,
        }
    }

    /// Checks parameter ranges: ε ∈ [0, 1] and p ≥ 1.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Objective::EpsFair { epsilon } | Objective::DeltaFair { epsilon } => {
                if !(0.0..=1.0).contains(&epsilon) {
                    return Err(ConfigError::FairnessOutOfRange(epsilon));
                }
            }
            Objective::PNorm { p } => {
                if p < 1 {
                    return Err(ConfigError::InvalidNorm(p));
                }
            }
            Objective::Min | Objective::MinMax => {}
        }
        Ok(())
    }
}

/// `1 + (√K − 1)·ε`, the ratio between `‖l‖₁` and the fairness factor.
pub fn eps_bar(num_vehicles: usize, epsilon: f64) -> f64 {
    1.0 + ((num_vehicles as f64).sqrt() - 1.0) * epsilon
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Objective::EpsFair { epsilon } | Objective::DeltaFair { epsilon } => {
                write!(f, "{}(eps={epsilon})", self.name())
            }
            Objective::PNorm { p } => write!(f, "{}(p={p})", self.name()),
            Objective::Min | Objective::MinMax => f.write_str(self.name()),
        }
    }
}

impl FromStr for Objective {
    type Err = String;

    /// Parses `name`, `name:eps` for the fairness objectives, or `p-norm:p`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, param) = match s.split_once(':') {
            Some((name, param)) => (name, Some(param)),
            None => (s, None),
        };
        let epsilon = match (name, param) {
            ("eps-fair" | "delta-fair", Some(v)) => v
                .parse::<f64>()
                .map_err(|e| format!("invalid fairness coefficient `{v}`: {e}"))?,
            _ => 0.5,
        };
        let p = match (name, param) {
            ("p-norm", Some(v)) => v
                .parse::<u32>()
                .map_err(|e| format!("invalid norm order `{v}`: {e}"))?,
            _ => 2,
        };
        Objective::from_name(name, epsilon, p)
    }
}

/// Immutable configuration passed to the model builder and callbacks.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use fair_mtsp::models::{Objective, SolverConfig};
///
/// let config = SolverConfig::new(Objective::EpsFair { epsilon: 0.5 })
///     .with_time_limit(Duration::from_secs(60));
/// assert!(config.symmetry_breaking());
/// assert_eq!(config.time_limit(), Duration::from_secs(60));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    objective: Objective,
    time_limit: Duration,
    symmetry_breaking: bool,
    tour_improvement_passes: usize,
}

impl SolverConfig {
    /// Default: one hour time limit, symmetry breaking on, five 2-opt passes.
    pub fn new(objective: Objective) -> Self {
        Self {
            objective,
            time_limit: Duration::from_secs(3600),
            symmetry_breaking: true,
            tour_improvement_passes: 5,
        }
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = limit;
        self
    }

    /// Enables or disables the `length[v] ≥ length[v+1]` ordering constraints.
    pub fn with_symmetry_breaking(mut self, enabled: bool) -> Self {
        self.symmetry_breaking = enabled;
        self
    }

    /// Sets the local-search pass budget of the primal heuristic.
    pub fn with_tour_improvement_passes(mut self, passes: usize) -> Self {
        self.tour_improvement_passes = passes;
        self
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    pub fn time_limit(&self) -> Duration {
        self.time_limit
    }

    pub fn symmetry_breaking(&self) -> bool {
        self.symmetry_breaking
    }

    pub fn tour_improvement_passes(&self) -> usize {
        self.tour_improvement_passes
    }

    /// Validates the configuration against an instance.
    pub fn validate(&self, instance: &Instance) -> Result<(), ConfigError> {
        if instance.num_vehicles() < 1 {
            return Err(ConfigError::NoVehicles);
        }
        if instance.depot() >= instance.num_vertices() {
            return Err(ConfigError::DepotOutOfRange {
                depot: instance.depot(),
                num_vertices: instance.num_vertices(),
            });
        }
        self.objective.validate()?;
        if matches!(self.objective, Objective::DeltaFair { .. }) && !self.symmetry_breaking {
            return Err(ConfigError::OrderingRequired);
        }
        Ok(())
    }
}
