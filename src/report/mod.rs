//! Fit quality metrics.
//!
//! Quality is judged over the matched (projected, nearest-reference)
//! pairs, the same matching the cost function uses:
//!
//! - `R² = 1 − Σ residual² / Σ (reference − mean reference)²`
//! - `RMS = sqrt(mean residual²)`
//!
//! Both are defined as 0 when either input sequence is empty, so a
//! degenerate run still reports cleanly.

use crate::data::nearest_line;
use crate::domain::{FitQuality, Observation};
use crate::error::Error;
use crate::math::project;

/// Compute R² and RMS for a fitted coefficient vector.
pub fn fit_quality(coefficients: &[f64], observation: &Observation) -> Result<FitQuality, Error> {
    if observation.peak_indices.is_empty() || observation.reference_lines.is_empty() {
        return Ok(FitQuality {
            r_squared: 0.0,
            rms: 0.0,
            n: 0,
        });
    }

    let mut projected = Vec::with_capacity(observation.peak_indices.len());
    let mut matched = Vec::with_capacity(observation.peak_indices.len());
    for &x in &observation.peak_indices {
        let p = project(coefficients, x)?;
        // The table is non-empty here, so a nearest line always exists.
        let Some(line) = nearest_line(&observation.reference_lines, p) else {
            return Ok(FitQuality {
                r_squared: 0.0,
                rms: 0.0,
                n: 0,
            });
        };
        projected.push(p);
        matched.push(line);
    }

    let n = matched.len();
    let mean_ref = matched.iter().sum::<f64>() / n as f64;
    let ss_res: f64 = projected
        .iter()
        .zip(&matched)
        .map(|(p, r)| (p - r) * (p - r))
        .sum();
    let ss_tot: f64 = matched.iter().map(|r| (r - mean_ref) * (r - mean_ref)).sum();

    // All peaks matched to one line leaves no reference variance; a
    // perfect fit is still R² = 1 there.
    let r_squared = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res == 0.0 {
        1.0
    } else {
        0.0
    };

    Ok(FitQuality {
        r_squared,
        rms: (ss_res / n as f64).sqrt(),
        n,
    })
}
