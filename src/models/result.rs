//! Solve results and fairness indices.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::{Coords, Objective, Tour};

/// Why the search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Termination {
    /// The incumbent is proven optimal.
    Optimal,
    /// The time budget ran out; the incumbent (if any) may be suboptimal.
    TimeLimit,
    /// No feasible assignment exists.
    Infeasible,
}

/// Scalar fairness measures of a tour-length vector.
///
/// # Examples
///
/// ```
/// use fair_mtsp::models::FairnessIndices;
///
/// let idx = FairnessIndices::from_costs(&[10.0, 10.0, 10.0]);
/// assert!((idx.jain - 1.0).abs() < 1e-12);
/// assert!(idx.gini.abs() < 1e-12);
/// assert!((idx.norm - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FairnessIndices {
    /// Jain's index `(Σc)² / (K·Σc²)`, 1 for perfectly equal lengths.
    pub jain: f64,
    /// Rank-weighted Gini index over lengths sorted non-increasingly.
    pub gini: f64,
    /// `(‖c‖₁/‖c‖₂ − 1) / (√K − 1)`, 1 for perfectly equal lengths.
    pub norm: f64,
}

impl FairnessIndices {
    pub fn from_costs(costs: &[f64]) -> Self {
        let k = costs.len() as f64;
        let sum: f64 = costs.iter().sum();
        let sum_sq: f64 = costs.iter().map(|c| c * c).sum();

        // a single vehicle or an all-zero vector is trivially fair
        if costs.len() < 2 || sum_sq <= 0.0 {
            return Self {
                jain: 1.0,
                gini: 0.0,
                norm: 1.0,
            };
        }

        let mut sorted = costs.to_vec();
        sorted.sort_unstable_by(|a, b| b.total_cmp(a));
        let weighted: f64 = sorted
            .iter()
            .enumerate()
            .map(|(v, c)| (k + 1.0 - 2.0 * (v as f64 + 1.0)) * c)
            .sum();

        Self {
            jain: sum * sum / (k * sum_sq),
            gini: weighted / (sum * (k - 1.0)),
            norm: (sum / sum_sq.sqrt() - 1.0) / (k.sqrt() - 1.0),
        }
    }
}

/// The outcome of one solve, produced once after the search terminates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveResult {
    pub instance_name: String,
    pub num_vertices: usize,
    pub depot: usize,
    pub num_vehicles: usize,
    pub objective: Objective,
    pub termination: Termination,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertex_coords: Option<Vec<Coords>>,
    /// Tours indexed by vehicle; empty when no solution was found.
    pub tours: Vec<Tour>,
    /// Solved `length[v]` values indexed by vehicle.
    pub tour_costs: Vec<f64>,
    pub objective_value: Option<f64>,
    /// Relative optimality gap (0.05 = 5 %).
    pub optimality_gap: Option<f64>,
    pub computation_time_secs: f64,
    pub fairness: Option<FairnessIndices>,
}

impl SolveResult {
    /// Returns `true` if the result carries tours.
    pub fn has_solution(&self) -> bool {
        !self.tours.is_empty()
    }

    pub fn is_infeasible(&self) -> bool {
        self.termination == Termination::Infeasible
    }

    /// Optimality gap in percent, rounded to two decimals.
    pub fn gap_percent(&self) -> Option<f64> {
        self.optimality_gap
            .map(|gap| (gap * 10000.0).round() / 100.0)
    }

    pub fn total_length(&self) -> f64 {
        self.tour_costs.iter().sum()
    }

    /// Converts an infeasible outcome into [`Error::Infeasible`].
    pub fn ensure_feasible(self) -> Result<Self> {
        if self.is_infeasible() {
            return Err(Error::Infeasible {
                objective: self.objective.to_string(),
            });
        }
        Ok(self)
    }

    /// Pretty-printed JSON of this result.
    #[cfg(feature = "json")]
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
