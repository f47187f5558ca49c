//! Domain types used throughout the calibration core.
//!
//! This module defines:
//!
//! - the model-kind enum and its per-kind dimensions/budgets
//! - validated coefficient vectors and search bounds
//! - observation inputs and fit outputs

pub mod types;

pub use types::*;
