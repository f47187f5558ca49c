//! Cost and feasibility for the linear and cubic calibration models.
//!
//! The coefficient layout is:
//!
//! - linear: `[center, half_span]` — wavelength at the detector middle
//!   and half the covered wavelength span
//! - cubic: `[center, half_span, distortion3, distortion4]` — the same
//!   plus two higher-order distortion terms
//!
//! The cost of a coefficient vector is the sum over observed peaks of
//! the squared distance between the basis-projected wavelength and its
//! nearest reference line. Feasibility encodes the physical limits of
//! the instrument: the projected range must sit inside the usable
//! wavelength window, the span inside the optical design's span
//! budget, and (cubic only) the combined distortion inside its budget.

use std::sync::Arc;

use crate::data::distance_to_nearest;
use crate::domain::{Bounds, ModelKind, Observation};
use crate::error::Error;
use crate::fit::{ConstraintFn, CostFn};
use crate::math::project;

/// Physical limits and search resolution for a calibration run.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Smallest wavelength the instrument can register, in nm.
    pub min_range: f64,
    /// Largest wavelength the instrument can register, in nm.
    pub max_range: f64,
    /// Smallest plausible full wavelength span, in nm.
    pub min_span: f64,
    /// Largest plausible full wavelength span, in nm.
    pub max_span: f64,
    /// Lower bound on `|d3| + |d4|` for the cubic model.
    pub min_distortion: f64,
    /// Upper bound on `|d3| + |d4|` for the cubic model.
    pub max_distortion: f64,
    /// Per-axis sampling resolution; the trial budget is
    /// `sampling_factor ^ dimension`.
    pub sampling_factor: usize,
}

/// A model kind bound to observation data: everything the job layer
/// needs to run a search.
pub struct CalibrationProblem {
    pub kind: ModelKind,
    pub cost: Arc<CostFn>,
    pub constraint: Arc<ConstraintFn>,
    pub bounds: Bounds,
    pub sample_budget: usize,
}

/// Build the full problem for one model kind.
pub fn build_problem(
    kind: ModelKind,
    observation: &Observation,
    config: &ModelConfig,
) -> Result<CalibrationProblem, Error> {
    Ok(CalibrationProblem {
        kind,
        cost: cost_fn(observation),
        constraint: constraint_fn(kind, config),
        bounds: search_bounds(kind, config)?,
        sample_budget: kind.sample_budget(config.sampling_factor),
    })
}

/// Cost closure: `Σ distance(project(a, x), nearest reference)²`.
pub fn cost_fn(observation: &Observation) -> Arc<CostFn> {
    let peaks = observation.peak_indices.clone();
    let lines = observation.reference_lines.clone();
    Arc::new(move |a: &[f64]| {
        let mut total = 0.0;
        for &x in &peaks {
            // The basis only fails for misuse of the binomial helper;
            // an infinite cost makes the trial unfeasible either way.
            let Ok(projected) = project(a, x) else {
                return f64::INFINITY;
            };
            let d = distance_to_nearest(&lines, projected);
            total += d * d;
        }
        total
    })
}

/// Feasibility predicate for one model kind.
pub fn constraint_fn(kind: ModelKind, config: &ModelConfig) -> Arc<ConstraintFn> {
    let config = config.clone();
    Arc::new(move |a: &[f64]| is_feasible(kind, &config, a))
}

/// Check a coefficient vector against the model's physical limits.
pub fn is_feasible(kind: ModelKind, config: &ModelConfig, a: &[f64]) -> bool {
    if a.len() != kind.coeff_len() {
        return false;
    }
    let center = a[0];
    let half_span = a[1];

    let range_ok =
        center - half_span >= config.min_range && center + half_span <= config.max_range;
    let span_ok =
        half_span >= 0.5 * config.min_span && half_span <= 0.5 * config.max_span;

    match kind {
        ModelKind::Linear => range_ok && span_ok,
        ModelKind::Cubic => {
            let distortion = a[2].abs() + a[3].abs();
            range_ok
                && span_ok
                && distortion >= config.min_distortion
                && distortion <= config.max_distortion
        }
    }
}

/// Axis-aligned search box the random starts are drawn from.
///
/// The box intentionally over-covers the feasible region (e.g. a start
/// with `center = min_range` and a large span is infeasible); the
/// constraint filters such results after the local search.
pub fn search_bounds(kind: ModelKind, config: &ModelConfig) -> Result<Bounds, Error> {
    let mut min = vec![config.min_range, 0.5 * config.min_span];
    let mut max = vec![config.max_range, 0.5 * config.max_span];
    if kind == ModelKind::Cubic {
        min.extend_from_slice(&[-config.max_distortion, -config.max_distortion]);
        max.extend_from_slice(&[config.max_distortion, config.max_distortion]);
    }
    Bounds::new(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ModelConfig {
        ModelConfig {
            min_range: 400.0,
            max_range: 800.0,
            min_span: 10.0,
            max_span: 300.0,
            min_distortion: 0.0,
            max_distortion: 5.0,
            sampling_factor: 4,
        }
    }

    #[test]
    fn linear_feasibility_checks_range_and_span() {
        let cfg = config();
        assert!(is_feasible(ModelKind::Linear, &cfg, &[600.0, 100.0]));
        // Projected low end below min_range.
        assert!(!is_feasible(ModelKind::Linear, &cfg, &[450.0, 100.0]));
        // Projected high end above max_range.
        assert!(!is_feasible(ModelKind::Linear, &cfg, &[750.0, 100.0]));
        // Span below half of min_span.
        assert!(!is_feasible(ModelKind::Linear, &cfg, &[600.0, 4.0]));
        // Span above half of max_span.
        assert!(!is_feasible(ModelKind::Linear, &cfg, &[600.0, 151.0]));
        // Wrong dimension is never feasible.
        assert!(!is_feasible(ModelKind::Linear, &cfg, &[600.0, 100.0, 0.0]));
    }

    #[test]
    fn cubic_feasibility_adds_distortion_budget() {
        let cfg = ModelConfig {
            min_distortion: 0.5,
            ..config()
        };
        assert!(is_feasible(ModelKind::Cubic, &cfg, &[600.0, 100.0, 0.4, -0.3]));
        // Combined distortion below the minimum.
        assert!(!is_feasible(ModelKind::Cubic, &cfg, &[600.0, 100.0, 0.1, -0.1]));
        // Combined distortion above the maximum.
        assert!(!is_feasible(ModelKind::Cubic, &cfg, &[600.0, 100.0, 4.0, 2.0]));
    }

    #[test]
    fn search_bounds_match_model_dimension() {
        let cfg = config();
        assert_eq!(search_bounds(ModelKind::Linear, &cfg).unwrap().dim(), 2);
        assert_eq!(search_bounds(ModelKind::Cubic, &cfg).unwrap().dim(), 4);
    }

    #[test]
    fn cost_is_zero_for_a_perfect_model() {
        // References generated from the model itself.
        let coeffs = [500.0, 50.0];
        let peaks = vec![-1.0, 0.0, 0.5, 1.0];
        let lines: Vec<f64> = peaks
            .iter()
            .map(|&x| crate::math::project(&coeffs, x).unwrap())
            .collect();
        let observation = Observation {
            peak_indices: peaks,
            reference_lines: lines,
        };
        let cost = cost_fn(&observation);
        assert!(cost(&coeffs) < 1e-18);
        // A perturbed model costs more.
        assert!(cost(&[510.0, 50.0]) > cost(&coeffs));
    }

    #[test]
    fn sample_budget_follows_dimension() {
        let cfg = config();
        let obs = Observation {
            peak_indices: vec![0.0],
            reference_lines: vec![500.0],
        };
        let linear = build_problem(ModelKind::Linear, &obs, &cfg).unwrap();
        let cubic = build_problem(ModelKind::Cubic, &obs, &cfg).unwrap();
        assert_eq!(linear.sample_budget, 16);
        assert_eq!(cubic.sample_budget, 256);
    }
}
