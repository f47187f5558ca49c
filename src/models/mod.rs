//! Calibration model implementations.
//!
//! Cost functions and feasibility constraints are small pure closures
//! over the observation data so the search code stays generic over
//! model kind.

pub mod model;

pub use model::*;
