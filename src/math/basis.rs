//! Orthogonal polynomial basis for the index → wavelength model.
//!
//! The projected wavelength for a coefficient vector `a` at sample
//! index `x` is `Σ a[i] · P_i(x)` where `P_i` is the degree-`i`
//! Legendre polynomial.
//!
//! Why Legendre rather than raw monomials? The basis functions stay
//! bounded and near-orthogonal over the working interval, which keeps
//! the cost surface well conditioned for the derivative-free search —
//! raw `x^i` columns become nearly collinear long before degree 4.
//!
//! Degrees 0–3 use closed forms; higher degrees fall back to the
//! binomial-sum identity
//!
//! ```text
//! P_n(x) = 2^-n Σ_{k=0}^{n} C(n,k)^2 (x-1)^(n-k) (x+1)^k
//! ```

use crate::error::Error;

/// Binomial coefficient `C(n, k)` via the Pascal identity
/// `C(n,k) = C(n-1,k-1) + C(n-1,k)`.
///
/// Uses the symmetry `C(n,k) = C(n,n-k)` whenever `k > n/2` to keep the
/// recursion shallow. Fails with [`Error::InvalidCoefficients`] when
/// `k > n`.
pub fn binomial(n: usize, k: usize) -> Result<f64, Error> {
    if k > n {
        return Err(Error::InvalidCoefficients { n, k });
    }
    let k = if k > n / 2 { n - k } else { k };
    if k == 0 {
        return Ok(1.0);
    }
    // k >= 1 and k <= n/2 here, so both sub-terms are valid.
    Ok(binomial(n - 1, k - 1)? + binomial(n - 1, k)?)
}

/// Evaluate the degree-`degree` basis polynomial at `x`.
pub fn basis(degree: usize, x: f64) -> Result<f64, Error> {
    match degree {
        0 => Ok(1.0),
        1 => Ok(x),
        2 => Ok(0.5 * (3.0 * x * x - 1.0)),
        3 => Ok(0.5 * (5.0 * x * x * x - 3.0 * x)),
        n => basis_recurrence(n, x),
    }
}

/// Generic binomial-sum form, valid for every degree.
fn basis_recurrence(n: usize, x: f64) -> Result<f64, Error> {
    let mut sum = 0.0;
    for k in 0..=n {
        let c = binomial(n, k)?;
        sum += c * c * (x - 1.0).powi((n - k) as i32) * (x + 1.0).powi(k as i32);
    }
    Ok(sum / 2f64.powi(n as i32))
}

/// Project a sample index to a wavelength: `Σ a[i] · P_i(x)`.
pub fn project(coefficients: &[f64], x: f64) -> Result<f64, Error> {
    let mut out = 0.0;
    for (i, a) in coefficients.iter().enumerate() {
        out += a * basis(i, x)?;
    }
    Ok(out)
}
