//! Discrete derivatives on sampled curves.

/// Forward differences `(y[i+1] - y[i]) / (x[i+1] - x[i])`.
///
/// Returns `Err(i)` with the first index `i` where `x[i+1] == x[i]`.
/// The output has one element fewer than the inputs; callers check lengths.
pub fn finite_differences(x: &[f64], y: &[f64]) -> Result<Vec<f64>, usize> {
    let mut out = Vec::with_capacity(x.len().saturating_sub(1));
    for (i, (xw, yw)) in x.windows(2).zip(y.windows(2)).enumerate() {
        let dx = xw[1] - xw[0];
        if dx == 0.0 {
            return Err(i);
        }
        out.push((yw[1] - yw[0]) / dx);
    }
    Ok(out)
}

/// Midpoints between consecutive abscissae (where forward differences live).
pub fn midpoints(x: &[f64]) -> Vec<f64> {
    x.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
}
