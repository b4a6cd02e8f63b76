//! Outer approximation of the conic fairness constraints.
//!
//! Both cones are convex, so the tangent plane at any boundary point is a
//! valid inequality. At a candidate that violates a cone, the point is
//! projected onto the boundary and the tangent there is added as a lazy
//! constraint. The tangent holds with equality at the projection and cuts
//! the candidate off.
//!
//! # Cones
//!
//! - eps-fair: `l² ≤ k·F`; tangent at `(l₀, k₀, F₀)` is
//!   `2·l₀·l − F₀·k − k₀·F ≤ 0`
//! - p-norm: `l ≤ k^α · z^(1−α)` with `α = 1/p`; tangent at a boundary
//!   point with ratio `r = k₀/z₀` is
//!   `l − α·r^(α−1)·k − (1−α)·r^α·z ≤ 0`

use log::{debug, warn};

use crate::mip::{Constraint, LinExpr, Var};
use crate::models::{Instance, Objective};

use super::variables::Variables;

/// Cone violations above this trigger a cut.
pub const VIOLATION_TOLERANCE: f64 = 1e-5;

/// Coordinates at or below this are treated as zero.
const DEGENERATE: f64 = 1e-9;

/// Tangent of `l² ≤ k·F` through the violated point `(l, k, f)`.
///
/// Projects `l` onto the boundary when `k` and `f` are positive; with
/// `k ≈ 0` moves `k` instead. Returns `None` when `f ≈ 0` or the point is
/// not violated.
pub fn eps_fair_cut(
    name: String,
    (l_var, k_var, f_var): (Var, Var, Var),
    l: f64,
    k: f64,
    f: f64,
) -> Option<Constraint> {
    let k = k.max(0.0);
    let f = f.max(0.0);
    if l * l - k * f <= VIOLATION_TOLERANCE || f <= DEGENERATE {
        return None;
    }

    let (l0, k0, f0) = if k > DEGENERATE {
        ((k * f).sqrt(), k, f)
    } else {
        (l, l * l / f, f)
    };

    let cut = Constraint::le(
        name,
        LinExpr::new()
            .with(l_var, 2.0 * l0)
            .with(k_var, -f0)
            .with(f_var, -k0),
        0.0,
    );
    finite(cut)
}

/// Tangents of `l ≤ k^α · z^(1−α)` through the violated point `(l, k, z)`.
///
/// Up to two projections: moving `k` onto the boundary (needs `z > 0`) and
/// moving `z` onto it (needs `k > 0` and `p ≥ 2`). `p = 1` is linear and
/// never cut.
pub fn p_norm_cuts(
    name: &str,
    (l_var, k_var, z_var): (Var, Var, Var),
    p: u32,
    l: f64,
    k: f64,
    z: f64,
) -> Vec<Constraint> {
    if p < 2 {
        return Vec::new();
    }
    let pf = f64::from(p);
    let alpha = 1.0 / pf;
    let k = k.max(0.0);
    let z = z.max(0.0);
    if l - k.powf(alpha) * z.powf(1.0 - alpha) <= VIOLATION_TOLERANCE || l <= DEGENERATE {
        return Vec::new();
    }

    let tangent = |suffix: &str, ratio: f64| {
        let cut = Constraint::le(
            format!("{name}_{suffix}"),
            LinExpr::new()
                .with(l_var, 1.0)
                .with(k_var, -alpha * ratio.powf(alpha - 1.0))
                .with(z_var, -(1.0 - alpha) * ratio.powf(alpha)),
            0.0,
        );
        finite(cut)
    };

    let mut cuts = Vec::with_capacity(2);
    if z > DEGENERATE {
        // k₀ = l^p / z^(p−1)
        cuts.extend(tangent("k", (l / z).powf(pf)));
    }
    if k > DEGENERATE {
        // z₀ = (l^p / k)^(1/(p−1))
        let z0 = (l.powf(pf) / k).powf(1.0 / (pf - 1.0));
        if z0 > DEGENERATE {
            cuts.extend(tangent("z", k / z0));
        }
    }
    cuts
}

fn finite(cut: Constraint) -> Option<Constraint> {
    if cut.is_finite() {
        Some(cut)
    } else {
        warn!("skipping outer-approximation cut {} with non-finite coefficients", cut.name());
        None
    }
}

/// Outer-approximation cuts for every vehicle whose cone is violated at the
/// candidate `values`. Empty for objectives without a cone.
pub fn separate_cones(
    instance: &Instance,
    vars: &Variables,
    objective: Objective,
    values: &[f64],
) -> Vec<Constraint> {
    let value = |var: Var| values[var.index()];
    let mut cuts = Vec::new();

    match objective {
        Objective::EpsFair { .. } => {
            let Some(f_var) = vars.fairness_factor() else {
                return cuts;
            };
            for v in 0..instance.num_vehicles() {
                let (l_var, Some(k_var)) = (vars.length(v), vars.conic(v)) else {
                    continue;
                };
                if let Some(cut) = eps_fair_cut(
                    format!("oa_eps_{v}"),
                    (l_var, k_var, f_var),
                    value(l_var),
                    value(k_var),
                    value(f_var),
                ) {
                    debug!("adding OA cut for vehicle {v}");
                    cuts.push(cut);
                }
            }
        }
        Objective::PNorm { p } => {
            let Some(z_var) = vars.pnorm() else {
                return cuts;
            };
            for v in 0..instance.num_vehicles() {
                let (l_var, Some(k_var)) = (vars.length(v), vars.conic(v)) else {
                    continue;
                };
                let found = p_norm_cuts(
                    &format!("oa_pnorm_{v}"),
                    (l_var, k_var, z_var),
                    p,
                    value(l_var),
                    value(k_var),
                    value(z_var),
                );
                if !found.is_empty() {
                    debug!("adding {} OA cuts for vehicle {v}", found.len());
                }
                cuts.extend(found);
            }
        }
        Objective::Min | Objective::MinMax | Objective::DeltaFair { .. } => {}
    }
    cuts
}
