//! Global multi-start search over a bounding box.
//!
//! One *trial* is: draw a uniform random start inside the bounds, run
//! the local simplex minimizer, and keep the result only if it passes
//! the feasibility predicate. The global search simply runs many
//! independent trials and retains the cheapest feasible one.
//!
//! Trials are independent, so the synchronous variant evaluates them in
//! parallel. Each trial derives its RNG from `seed + trial index`,
//! which keeps a run reproducible regardless of how rayon schedules the
//! work; ties on cost are broken by trial index for the same reason.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::domain::{BestSolution, Bounds, Coefficients};
use crate::fit::simplex::{SimplexOptions, minimize};

/// Run a single random-start trial.
///
/// Returns `None` when the trial is infeasible *or* when the local
/// search itself fails; a failed trial is skipped rather than allowed
/// to escape into the caller (important when the caller is a worker
/// thread).
pub fn run_trial<R, F, C>(
    rng: &mut R,
    cost: &F,
    constraint: Option<&C>,
    bounds: &Bounds,
    opts: &SimplexOptions,
) -> Option<BestSolution>
where
    R: Rng + ?Sized,
    F: Fn(&[f64]) -> f64 + ?Sized,
    C: Fn(&[f64]) -> bool + ?Sized,
{
    let start = bounds.sample(rng);
    let result = minimize(cost, &start, opts).ok()?;
    if let Some(feasible) = constraint {
        if !feasible(&result.coefficients) {
            return None;
        }
    }
    if !result.cost.is_finite() {
        return None;
    }
    let coefficients = Coefficients::new(result.coefficients).ok()?;
    Some(BestSolution {
        coefficients,
        cost: result.cost,
    })
}

/// Run `samples` independent trials and return the cheapest feasible
/// result, or `None` when every trial was infeasible.
pub fn multi_start<F, C>(
    cost: &F,
    constraint: Option<&C>,
    bounds: &Bounds,
    samples: usize,
    seed: u64,
    opts: &SimplexOptions,
) -> Option<BestSolution>
where
    F: Fn(&[f64]) -> f64 + Sync + ?Sized,
    C: Fn(&[f64]) -> bool + Sync + ?Sized,
{
    (0..samples)
        .into_par_iter()
        .filter_map(|i| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
            run_trial(&mut rng, cost, constraint, bounds, opts).map(|s| (i, s))
        })
        .min_by(|(ia, a), (ib, b)| {
            a.cost
                .partial_cmp(&b.cost)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(ia.cmp(ib))
        })
        .map(|(_, s)| s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_bounds() -> Bounds {
        Bounds::new(vec![-10.0, -10.0], vec![10.0, 10.0]).unwrap()
    }

    fn bowl(a: &[f64]) -> f64 {
        (a[0] - 1.0).powi(2) + (a[1] + 2.0).powi(2)
    }

    #[test]
    fn finds_unconstrained_minimum() {
        let best = multi_start(
            &bowl,
            None::<&fn(&[f64]) -> bool>,
            &unit_bounds(),
            16,
            42,
            &SimplexOptions::default(),
        )
        .unwrap();
        let c = best.coefficients.values();
        assert!((c[0] - 1.0).abs() < 1e-3);
        assert!((c[1] + 2.0).abs() < 1e-3);
    }

    #[test]
    fn never_returns_infeasible_result() {
        // Only the half-plane x0 >= 2 is feasible; the unconstrained
        // minimum at (1, -2) must be rejected.
        let feasible = |a: &[f64]| a[0] >= 2.0;
        let best = multi_start(
            &bowl,
            Some(&feasible),
            &unit_bounds(),
            64,
            7,
            &SimplexOptions::default(),
        );
        if let Some(best) = best {
            assert!(best.coefficients.values()[0] >= 2.0);
        }
    }

    #[test]
    fn always_false_constraint_yields_none() {
        let never = |_: &[f64]| false;
        let best = multi_start(
            &bowl,
            Some(&never),
            &unit_bounds(),
            32,
            1,
            &SimplexOptions::default(),
        );
        assert!(best.is_none());
    }

    #[test]
    fn deterministic_for_a_fixed_seed() {
        let opts = SimplexOptions::default();
        let none = None::<&fn(&[f64]) -> bool>;
        let a = multi_start(&bowl, none, &unit_bounds(), 8, 99, &opts).unwrap();
        let b = multi_start(&bowl, none, &unit_bounds(), 8, 99, &opts).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn trial_with_failing_local_search_is_skipped() {
        // A cost returning NaN never produces a finite feasible result.
        let nan_cost = |_: &[f64]| f64::NAN;
        let mut rng = StdRng::seed_from_u64(5);
        let out = run_trial(
            &mut rng,
            &nan_cost,
            None::<&fn(&[f64]) -> bool>,
            &unit_bounds(),
            &SimplexOptions::default(),
        );
        assert!(out.is_none());
    }
}
