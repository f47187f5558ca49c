//! Mathematical utilities: the polynomial basis and coefficient-vector
//! arithmetic used by the simplex search.

pub mod basis;
pub mod vector;

pub use basis::*;
pub use vector::*;
