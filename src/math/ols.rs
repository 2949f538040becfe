//! Least squares solver and straight-line fits.
//!
//! The normal-resistance reduction fits `V = a + R·I` to the high-bias part of
//! a sweep. Bias values are micro-ampere sized, so the abscissa is rescaled to
//! unit magnitude before the design matrix is built; otherwise the slope
//! column would sit many orders of magnitude below the intercept column and
//! the singular-value cutoff would reject it.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Result of a straight-line fit `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
}

/// Fit a straight line through `(x, y)`.
///
/// Returns `None` when fewer than two points are given, when all `x` are
/// equal, or when the solve fails.
pub fn fit_line(x: &[f64], y: &[f64]) -> Option<LineFit> {
    let n = x.len();
    if n < 2 || y.len() != n {
        return None;
    }

    let scale = x.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    if !(scale.is_finite() && scale > 0.0) {
        return None;
    }
    let first = x[0];
    if x.iter().all(|&v| v == first) {
        return None;
    }

    let mut design = DMatrix::zeros(n, 2);
    for (i, &xi) in x.iter().enumerate() {
        design[(i, 0)] = 1.0;
        design[(i, 1)] = xi / scale;
    }
    let rhs = DVector::from_column_slice(y);

    let beta = solve_least_squares(&design, &rhs)?;
    Some(LineFit {
        slope: beta[1] / scale,
        intercept: beta[0],
    })
}
