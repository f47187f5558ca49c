//! Elementwise arithmetic over fixed-length coefficient vectors.
//!
//! These are the only vector operations the simplex minimizer needs, so
//! we keep them as small pure functions instead of pulling in a linear
//! algebra crate. All binary operations require equal-length inputs;
//! a mismatch is a caller bug, not a runtime condition.

/// `a + b`, elementwise.
pub fn add(a: &[f64], b: &[f64]) -> Vec<f64> {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x + y).collect()
}

/// `a - b`, elementwise.
pub fn sub(a: &[f64], b: &[f64]) -> Vec<f64> {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

/// `a * s`, elementwise.
pub fn scale(a: &[f64], s: f64) -> Vec<f64> {
    a.iter().map(|x| x * s).collect()
}

/// `a / s`, elementwise.
pub fn div(a: &[f64], s: f64) -> Vec<f64> {
    a.iter().map(|x| x / s).collect()
}

/// Euclidean length of `a`.
pub fn norm(a: &[f64]) -> f64 {
    a.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Euclidean distance between `a` and `b`.
pub fn distance(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}
