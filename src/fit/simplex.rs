//! Local derivative-free minimization via the Nelder–Mead simplex.
//!
//! Why a simplex method?
//! - The calibration cost involves a nearest-reference-line lookup, so
//!   its gradient is piecewise and unreliable; derivative-free search
//!   sidesteps that entirely.
//! - The parameter dimension is tiny (2 or 4), where Nelder–Mead is
//!   both fast and well understood.
//!
//! The minimizer is fully deterministic given its inputs and may return
//! a local rather than global minimum; global coverage is the
//! multi-start sampler's job (`fit::global`).

use crate::error::Error;
use crate::math::{add, distance, div, norm, scale, sub};

/// Reflection coefficient.
const ALPHA: f64 = 1.0;
/// Expansion coefficient.
const GAMMA: f64 = 2.0;
/// Contraction coefficient.
const RHO: f64 = 0.5;
/// Shrink coefficient.
const SIGMA: f64 = 0.5;

/// Perturbation applied to non-zero start coordinates (+5%).
const PERTURB_FRAC: f64 = 0.05;
/// Absolute perturbation used when a start coordinate is exactly zero.
const PERTURB_ZERO: f64 = 0.00025;

/// Options controlling the local search.
#[derive(Debug, Clone)]
pub struct SimplexOptions {
    /// Iteration cap; `None` means `200 * dimension`.
    pub max_iterations: Option<usize>,
    /// Relative position tolerance for convergence.
    pub tol_x: f64,
    /// Relative cost tolerance for convergence.
    pub tol_fun: f64,
}

impl Default for SimplexOptions {
    fn default() -> Self {
        Self {
            max_iterations: None,
            tol_x: 1e-4,
            tol_fun: 1e-4,
        }
    }
}

/// Outcome of one local minimization.
#[derive(Debug, Clone)]
pub struct SimplexResult {
    pub coefficients: Vec<f64>,
    pub cost: f64,
    pub iterations: usize,
}

/// One simplex vertex: a position and its cost.
#[derive(Debug, Clone)]
struct Vertex {
    x: Vec<f64>,
    cost: f64,
}

/// Minimize `cost` starting from `start`.
///
/// Fails with [`Error::InvalidInitialVector`] when `start` is empty.
pub fn minimize<F>(cost: F, start: &[f64], opts: &SimplexOptions) -> Result<SimplexResult, Error>
where
    F: Fn(&[f64]) -> f64,
{
    let n = start.len();
    if n == 0 {
        return Err(Error::InvalidInitialVector);
    }
    let max_iterations = opts.max_iterations.unwrap_or(200 * n);

    // Initial simplex: the start vector plus one perturbed copy per
    // dimension.
    let mut simplex: Vec<Vertex> = Vec::with_capacity(n + 1);
    simplex.push(Vertex {
        cost: cost(start),
        x: start.to_vec(),
    });
    for i in 0..n {
        let mut x = start.to_vec();
        x[i] = if x[i] == 0.0 {
            PERTURB_ZERO
        } else {
            x[i] * (1.0 + PERTURB_FRAC)
        };
        simplex.push(Vertex { cost: cost(&x), x });
    }

    let mut iterations = 0;
    while iterations < max_iterations {
        iterations += 1;

        simplex.sort_by(|a, b| a.cost.partial_cmp(&b.cost).unwrap_or(std::cmp::Ordering::Equal));
        let best_cost = simplex[0].cost;
        let second_worst_cost = simplex[n - 1].cost;
        let prev_worst = simplex[n].clone();

        // Centroid of the n best vertices.
        let mut centroid = vec![0.0; n];
        for v in &simplex[..n] {
            centroid = add(&centroid, &v.x);
        }
        let centroid = div(&centroid, n as f64);

        // Reflect the worst vertex through the centroid.
        let direction = sub(&centroid, &prev_worst.x);
        let reflected = add(&centroid, &scale(&direction, ALPHA));
        let reflected_cost = cost(&reflected);

        let replacement = if reflected_cost < best_cost {
            // Try to expand further along the same direction.
            let expanded = add(&centroid, &scale(&direction, GAMMA));
            let expanded_cost = cost(&expanded);
            if expanded_cost < reflected_cost {
                Some(Vertex { x: expanded, cost: expanded_cost })
            } else {
                Some(Vertex { x: reflected, cost: reflected_cost })
            }
        } else if reflected_cost < second_worst_cost {
            Some(Vertex { x: reflected, cost: reflected_cost })
        } else if reflected_cost < prev_worst.cost {
            // Outside contraction, between centroid and reflection.
            let contracted = add(&centroid, &scale(&direction, RHO));
            let contracted_cost = cost(&contracted);
            if contracted_cost <= reflected_cost {
                Some(Vertex { x: contracted, cost: contracted_cost })
            } else {
                None
            }
        } else {
            // Inside contraction, between centroid and the worst vertex.
            let contracted = sub(&centroid, &scale(&direction, RHO));
            let contracted_cost = cost(&contracted);
            if contracted_cost < prev_worst.cost {
                Some(Vertex { x: contracted, cost: contracted_cost })
            } else {
                None
            }
        };

        match replacement {
            Some(v) => {
                // Convergence is judged on the accepted replacement of
                // the worst vertex, relative to that vertex's previous
                // position and cost.
                let moved = distance(&v.x, &prev_worst.x);
                let improved = (v.cost - prev_worst.cost).abs();
                let x_ok = moved < opts.tol_x * (1.0 + norm(&prev_worst.x));
                let f_ok = improved < opts.tol_fun * (1.0 + prev_worst.cost.abs());
                simplex[n] = v;
                if x_ok && f_ok {
                    break;
                }
            }
            None => {
                // Contraction failed: shrink every vertex toward the best.
                let best = simplex[0].x.clone();
                for v in simplex.iter_mut().skip(1) {
                    v.x = add(&best, &scale(&sub(&v.x, &best), SIGMA));
                    v.cost = cost(&v.x);
                }
            }
        }
    }

    simplex.sort_by(|a, b| a.cost.partial_cmp(&b.cost).unwrap_or(std::cmp::Ordering::Equal));
    let best = simplex.swap_remove(0);
    Ok(SimplexResult {
        coefficients: best.x,
        cost: best.cost,
        iterations,
    })
}
