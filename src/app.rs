//! Shared calibration pipeline.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! problem build -> background job -> solution -> quality metrics.
//! Front-ends (device drivers, notebooks, plot layers) only need to
//! pick a model kind, a reference dataset and the physical limits.

use crate::data::Dataset;
use crate::domain::{FitQuality, ModelKind, Observation};
use crate::error::Error;
use crate::fit::{JobConfig, OptimizationJob, SimplexOptions};
use crate::models::{ModelConfig, build_problem};
use crate::report::fit_quality;
use tracing::debug;

/// Everything a calibration run needs beyond the observation data.
#[derive(Debug, Clone)]
pub struct CalibrationConfig {
    /// Physical limits and sampling resolution.
    pub model: ModelConfig,
    /// RNG seed; `None` draws one from entropy.
    pub seed: Option<u64>,
    /// Local-minimizer options.
    pub simplex: SimplexOptions,
}

/// All computed outputs of a single calibration run.
#[derive(Debug, Clone)]
pub struct CalibrationOutcome {
    pub kind: ModelKind,
    /// Best coefficients, padded to the model's coefficient count.
    pub coefficients: Vec<f64>,
    /// Cost of the best feasible trial.
    pub cost: f64,
    pub quality: FitQuality,
    /// Trials actually executed.
    pub processed_samples: usize,
}

/// Calibrate against a named reference dataset.
pub fn run_calibration(
    kind: ModelKind,
    dataset: Dataset,
    peak_indices: &[f64],
    config: &CalibrationConfig,
) -> Result<CalibrationOutcome, Error> {
    debug!(
        dataset = dataset.display_name(),
        lines = dataset.lines().len(),
        "calibrating against reference dataset"
    );
    let observation = Observation {
        peak_indices: peak_indices.to_vec(),
        reference_lines: dataset.lines().to_vec(),
    };
    run_calibration_with(kind, &observation, config)
}

/// Calibrate against explicit observation data.
///
/// Runs a background job to natural exhaustion and blocks for its
/// solution; fitting two model kinds concurrently is a matter of
/// driving two jobs from two calls on separate threads.
pub fn run_calibration_with(
    kind: ModelKind,
    observation: &Observation,
    config: &CalibrationConfig,
) -> Result<CalibrationOutcome, Error> {
    debug!(
        model = kind.display_name(),
        peaks = observation.peak_indices.len(),
        "starting calibration run"
    );
    let problem = build_problem(kind, observation, &config.model)?;
    let mut job = OptimizationJob::new(
        problem.cost,
        Some(problem.constraint),
        JobConfig {
            bounds: problem.bounds,
            max_samples: problem.sample_budget,
            seed: config.seed,
            simplex: config.simplex.clone(),
        },
    );
    job.start();
    let coefficients = job.solution(kind.coeff_len())?;
    let cost = job.best().map(|b| b.cost).unwrap_or(f64::INFINITY);
    let quality = fit_quality(&coefficients, observation)?;

    Ok(CalibrationOutcome {
        kind,
        coefficients,
        cost,
        quality,
        processed_samples: job.processed_samples(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::project;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand_distr::{Distribution, Normal};

    fn synthetic_observation(coeffs: &[f64], peaks: &[f64]) -> Observation {
        Observation {
            peak_indices: peaks.to_vec(),
            reference_lines: peaks
                .iter()
                .map(|&x| project(coeffs, x).unwrap())
                .collect(),
        }
    }

    fn linear_config() -> CalibrationConfig {
        CalibrationConfig {
            model: ModelConfig {
                min_range: 400.0,
                max_range: 600.0,
                min_span: 1.0,
                max_span: 100.0,
                min_distortion: 0.0,
                max_distortion: 2.0,
                sampling_factor: 6,
            },
            seed: Some(1234),
            // Tighter than the defaults so the recovered coefficients
            // can be checked to 1e-2.
            simplex: SimplexOptions {
                max_iterations: None,
                tol_x: 1e-7,
                tol_fun: 1e-10,
            },
        }
    }

    #[test]
    fn recovers_a_known_linear_model() {
        let truth = [500.0, 50.0];
        let observation = synthetic_observation(&truth, &[0.0, 10.0, 20.0]);
        let outcome =
            run_calibration_with(ModelKind::Linear, &observation, &linear_config()).unwrap();

        assert!(
            (outcome.coefficients[0] - 500.0).abs() < 1e-2,
            "center = {}",
            outcome.coefficients[0]
        );
        assert!(
            (outcome.coefficients[1] - 50.0).abs() < 1e-2,
            "half span = {}",
            outcome.coefficients[1]
        );
        assert!((outcome.quality.r_squared - 1.0).abs() < 1e-6);
        assert!(outcome.quality.rms < 1e-2);
        // Budget of 36 executes 37 trials.
        assert_eq!(outcome.processed_samples, 37);
    }

    #[test]
    fn tolerates_gaussian_noise_on_the_references() {
        let truth = [500.0, 50.0];
        let peaks = [-1.0, -0.5, 0.0, 0.5, 1.0];
        let mut observation = synthetic_observation(&truth, &peaks);

        let mut rng = StdRng::seed_from_u64(9);
        let noise = Normal::new(0.0, 0.05).unwrap();
        for line in &mut observation.reference_lines {
            *line += noise.sample(&mut rng);
        }

        let outcome =
            run_calibration_with(ModelKind::Linear, &observation, &linear_config()).unwrap();
        assert!((outcome.coefficients[0] - 500.0).abs() < 0.5);
        assert!((outcome.coefficients[1] - 50.0).abs() < 0.5);
        assert!(outcome.quality.r_squared > 0.999);
    }

    #[test]
    fn fits_a_cubic_model_within_its_distortion_budget() {
        let truth = [500.0, 50.0, 0.6, -0.4];
        let peaks = [-1.0, -0.5, 0.0, 0.5, 1.0];
        let observation = synthetic_observation(&truth, &peaks);

        let config = CalibrationConfig {
            model: ModelConfig {
                min_range: 400.0,
                max_range: 600.0,
                min_span: 1.0,
                max_span: 150.0,
                min_distortion: 0.1,
                max_distortion: 2.0,
                sampling_factor: 5,
            },
            seed: Some(4321),
            simplex: SimplexOptions {
                max_iterations: None,
                tol_x: 1e-7,
                tol_fun: 1e-10,
            },
        };
        let outcome =
            run_calibration_with(ModelKind::Cubic, &observation, &config).unwrap();

        // Feasibility is guaranteed by construction; the fit itself
        // only needs to be a good one, not a bit-exact recovery.
        let distortion = outcome.coefficients[2].abs() + outcome.coefficients[3].abs();
        assert!((0.1..=2.0).contains(&distortion));
        assert!((outcome.coefficients[0] - 500.0).abs() < 5.0);
        assert!(outcome.quality.r_squared > 0.9);
        assert_eq!(outcome.processed_samples, 626);
    }

    #[test]
    fn named_dataset_pipeline_recovers_a_neon_calibration() {
        // Peaks synthesized from well-separated neon lines through the
        // truth model, so a perfect fit exists on the real table.
        let truth = [620.0, 80.0];
        let targets = [540.056, 585.249, 640.225, 703.241, 743.890];
        // x such that 620 + 80x = line.
        let peaks: Vec<f64> = targets.iter().map(|l| (l - truth[0]) / truth[1]).collect();

        let config = CalibrationConfig {
            model: ModelConfig {
                min_range: 500.0,
                max_range: 760.0,
                min_span: 10.0,
                max_span: 200.0,
                min_distortion: 0.0,
                max_distortion: 2.0,
                // The neon table is dense, so give the search a finer
                // per-axis resolution than the synthetic cases need.
                sampling_factor: 12,
            },
            seed: Some(77),
            simplex: SimplexOptions {
                max_iterations: None,
                tol_x: 1e-7,
                tol_fun: 1e-10,
            },
        };
        let outcome =
            run_calibration(ModelKind::Linear, Dataset::Neon, &peaks, &config).unwrap();
        assert!((outcome.coefficients[0] - 620.0).abs() < 0.1);
        assert!((outcome.coefficients[1] - 80.0).abs() < 0.1);
        assert!(outcome.quality.r_squared > 0.999999);
    }
}
