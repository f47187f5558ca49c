//! Reference calibration datasets and nearest-line lookups.

pub mod reference;

pub use reference::*;
