//! `wavecal` — wavelength-calibration fitting core.
//!
//! Maps an instrument's sample index (e.g. a pixel column on a
//! spectrometer detector) to a physical wavelength by fitting a
//! low-degree polynomial model against a table of known reference lamp
//! lines. The crate is a library on purpose so that:
//!
//! - the optimization core is testable without a device attached
//! - acquisition, plotting and CLI front-ends can live elsewhere
//! - multiple models can be fitted concurrently by independent jobs

pub mod app;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod math;
pub mod models;
pub mod report;
