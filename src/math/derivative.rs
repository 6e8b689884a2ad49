//! Moving local-regression slope ("smoothing derivative").
//!
//! For each interior sample the slope of a straight line through the `2w`
//! neighbouring points is recorded. This is not a derivative filter: the edges
//! are left undefined and the result lags/leads by half a sample.

use crate::error::DilError;
use crate::math::linear_slope;

/// Windowed slope of `y` with respect to `x`.
///
/// The output has the same length as the inputs. Positions `0..w` and the last
/// `w - 1` positions are NaN; position `i` in `w..=n-w` holds the slope fitted
/// over `x[i-w..i+w]`.
pub fn smooth_derivative(x: &[f64], y: &[f64], window: usize) -> Result<Vec<f64>, DilError> {
    let n = x.len();
    if n != y.len() {
        return Err(DilError::invalid_argument(format!(
            "lengths of x ({n}) and y ({}) differ",
            y.len()
        )));
    }
    if window < 1 {
        return Err(DilError::invalid_argument("window must be >= 1"));
    }

    let mut out = vec![f64::NAN; n];
    if n < 2 * window {
        return Ok(out);
    }
    for i in window..=(n - window) {
        out[i] = linear_slope(&x[i - window..i + window], &y[i - window..i + window]);
    }
    Ok(out)
}
