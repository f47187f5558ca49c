//! Known reference lamp emission lines.
//!
//! The tables are published wavelengths (nm, air) for the calibration
//! lamps commonly used with compact spectrometers. They are immutable
//! compiled-in data: no process-wide mutable state is involved, so any
//! number of concurrent jobs can share them.

use crate::error::Error;

/// Neon lamp emission lines, nm.
const NEON_LINES: &[f64] = &[
    540.056, 585.249, 588.189, 594.483, 597.553, 603.000, 607.434, 609.616,
    614.306, 616.359, 621.728, 626.649, 630.479, 633.443, 638.299, 640.225,
    650.653, 653.288, 659.895, 667.828, 671.704, 692.947, 703.241, 717.394,
    724.517, 743.890,
];

/// Mercury-argon lamp emission lines, nm.
const MERCURY_ARGON_LINES: &[f64] = &[
    253.652, 296.728, 302.150, 313.155, 334.148, 365.015, 404.656, 407.783,
    435.833, 546.074, 576.960, 579.066, 696.543, 706.722, 714.704, 727.294,
    738.393, 750.387, 763.511, 772.376, 794.818, 800.616, 811.531, 826.452,
    842.465, 852.144, 866.794, 912.297, 922.450,
];

/// The closed set of supported reference datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Neon,
    MercuryArgon,
}

impl Dataset {
    /// Resolve a dataset by name (case-insensitive).
    ///
    /// Fails with [`Error::UnknownCalibrationData`] for anything
    /// outside the known set.
    pub fn from_name(name: &str) -> Result<Self, Error> {
        match name.to_ascii_lowercase().as_str() {
            "neon" => Ok(Dataset::Neon),
            "mercury-argon" => Ok(Dataset::MercuryArgon),
            _ => Err(Error::UnknownCalibrationData(name.to_string())),
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Dataset::Neon => "Neon",
            Dataset::MercuryArgon => "Mercury-Argon",
        }
    }

    /// The reference line table, sorted ascending.
    pub fn lines(self) -> &'static [f64] {
        match self {
            Dataset::Neon => NEON_LINES,
            Dataset::MercuryArgon => MERCURY_ARGON_LINES,
        }
    }
}

/// The reference line closest to `wavelength`, or `None` for an empty
/// table.
pub fn nearest_line(lines: &[f64], wavelength: f64) -> Option<f64> {
    lines
        .iter()
        .copied()
        .min_by(|a, b| {
            (a - wavelength)
                .abs()
                .partial_cmp(&(b - wavelength).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}

/// Absolute distance from `wavelength` to its nearest reference line;
/// 0 for an empty table.
pub fn distance_to_nearest(lines: &[f64], wavelength: f64) -> f64 {
    nearest_line(lines, wavelength)
        .map(|line| (line - wavelength).abs())
        .unwrap_or(0.0)
}
