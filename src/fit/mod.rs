//! Fitting and search orchestration.
//!
//! Responsibilities:
//!
//! - local derivative-free minimization (Nelder–Mead simplex)
//! - global multi-start search over a bounding box
//! - cancelable background jobs running trials on a worker thread

pub mod global;
pub mod job;
pub mod simplex;

pub use global::*;
pub use job::*;
pub use simplex::*;
