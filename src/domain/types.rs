//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - used in-memory during fitting
//! - handed across the job boundary between worker and caller
//! - reused by reporting/plotting layers outside this crate

use rand::Rng;

use crate::error::Error;

/// Which polynomial model to fit.
///
/// The coefficient layout is fixed per kind:
///
/// - `Linear`: `[center, half_span]`
/// - `Cubic`: `[center, half_span, distortion3, distortion4]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Linear,
    Cubic,
}

impl ModelKind {
    /// Human-readable label for reports.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Linear => "linear",
            ModelKind::Cubic => "cubic",
        }
    }

    /// Number of basis coefficients for this model.
    pub fn coeff_len(self) -> usize {
        match self {
            ModelKind::Linear => 2,
            ModelKind::Cubic => 4,
        }
    }

    /// Total random-start budget for a given per-axis sampling factor.
    ///
    /// The budget grows as `factor^dimension`, so the cubic model pays
    /// quadratically more than the linear one for the same per-axis
    /// resolution. That trade-off is deliberate: coverage of the search
    /// box, not wall-clock time, is what the factor controls.
    pub fn sample_budget(self, sampling_factor: usize) -> usize {
        sampling_factor.pow(self.coeff_len() as u32)
    }
}

/// A validated, fixed-length coefficient vector.
///
/// Index `i` holds the coefficient of basis function `i`. The length is
/// fixed at construction and never changes afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Coefficients {
    values: Vec<f64>,
}

impl Coefficients {
    /// Construct from raw values; fails on an empty vector.
    pub fn new(values: Vec<f64>) -> Result<Self, Error> {
        if values.is_empty() {
            return Err(Error::InvalidInitialVector);
        }
        Ok(Self { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Right-pad with zeros to `len` (no-op when already that long).
    pub fn padded(&self, len: usize) -> Vec<f64> {
        let mut out = self.values.clone();
        while out.len() < len {
            out.push(0.0);
        }
        out
    }
}

impl AsRef<[f64]> for Coefficients {
    fn as_ref(&self) -> &[f64] {
        &self.values
    }
}

/// An axis-aligned search box over coefficient space.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    min: Vec<f64>,
    max: Vec<f64>,
}

impl Bounds {
    /// Construct a box; both corners must agree on length and satisfy
    /// `min[i] <= max[i]` for every axis.
    pub fn new(min: Vec<f64>, max: Vec<f64>) -> Result<Self, Error> {
        if min.is_empty() || min.len() != max.len() {
            return Err(Error::InvalidBounds {
                reason: "corner vectors must be non-empty and equal length",
            });
        }
        if min.iter().zip(&max).any(|(lo, hi)| lo > hi) {
            return Err(Error::InvalidBounds {
                reason: "min exceeds max on at least one axis",
            });
        }
        Ok(Self { min, max })
    }

    pub fn dim(&self) -> usize {
        self.min.len()
    }

    pub fn min(&self) -> &[f64] {
        &self.min
    }

    pub fn max(&self) -> &[f64] {
        &self.max
    }

    /// Draw a uniformly random point inside the box.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        self.min
            .iter()
            .zip(&self.max)
            .map(|(&lo, &hi)| if lo < hi { rng.gen_range(lo..=hi) } else { lo })
            .collect()
    }
}

/// Observed peaks paired with the reference table they are matched to.
///
/// The two sequences are *not* required to have equal length: each
/// projected peak is matched independently to its nearest reference
/// line (nearest-neighbor, not a bijection).
#[derive(Debug, Clone)]
pub struct Observation {
    /// Observed peak positions, in sample-index units.
    pub peak_indices: Vec<f64>,
    /// Known reference line wavelengths, in nm.
    pub reference_lines: Vec<f64>,
}

/// An immutable (coefficients, cost) snapshot.
///
/// The background job publishes these as a unit so a concurrent reader
/// can never observe coefficients from one trial paired with the cost
/// of another.
#[derive(Debug, Clone, PartialEq)]
pub struct BestSolution {
    pub coefficients: Coefficients,
    pub cost: f64,
}

/// Fit quality diagnostics over the matched (projected, reference) pairs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitQuality {
    pub r_squared: f64,
    pub rms: f64,
    pub n: usize,
}
