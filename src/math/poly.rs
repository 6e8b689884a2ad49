//! Polynomial least-squares fits.
//!
//! Coefficients are stored lowest order first: `c[0] + c[1] x + c[2] x^2 + ...`.
//!
//! Numerical notes:
//! - Columns of the Vandermonde matrix are scaled to unit norm before solving
//!   (temperatures of several hundred degrees make the raw columns differ by
//!   orders of magnitude), and the solution is unscaled afterwards.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::DilError;
use crate::math::solve_least_squares;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polynomial {
    pub coefficients: Vec<f64>,
}

impl Polynomial {
    pub fn new(coefficients: Vec<f64>) -> Self {
        Self { coefficients }
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// Evaluate with Horner's scheme.
    pub fn eval(&self, x: f64) -> f64 {
        self.coefficients.iter().rev().fold(0.0, |acc, &c| acc * x + c)
    }

    pub fn eval_all(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.eval(x)).collect()
    }

    /// Linear coefficient (slope of a straight line).
    pub fn slope(&self) -> f64 {
        self.coefficients.get(1).copied().unwrap_or(0.0)
    }
}

/// Fit a polynomial of degree `deg` to `(x, y)`.
///
/// Fails with `InvalidArgument` on length mismatch or non-finite data, and with
/// `FitDidNotConverge` when fewer than `deg + 1` points are given.
pub fn polyfit(x: &[f64], y: &[f64], deg: usize) -> Result<Polynomial, DilError> {
    if x.len() != y.len() {
        return Err(DilError::invalid_argument(format!(
            "polyfit: x has {} values, y has {}",
            x.len(),
            y.len()
        )));
    }
    let n = x.len();
    let ncoef = deg + 1;
    if n < ncoef {
        return Err(DilError::fit_did_not_converge(format!(
            "degree-{deg} fit needs at least {ncoef} points, got {n}"
        )));
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(DilError::invalid_argument("polyfit: non-finite input value"));
    }

    let mut design = DMatrix::<f64>::zeros(n, ncoef);
    for (i, &xi) in x.iter().enumerate() {
        let mut p = 1.0;
        for j in 0..ncoef {
            design[(i, j)] = p;
            p *= xi;
        }
    }

    let mut scale = vec![1.0; ncoef];
    for (j, s) in scale.iter_mut().enumerate() {
        let norm = design.column(j).norm();
        if norm > 0.0 {
            *s = norm;
            design.column_mut(j).scale_mut(1.0 / norm);
        }
    }

    let rhs = DVector::from_column_slice(y);
    let solution = solve_least_squares(&design, &rhs).ok_or_else(|| {
        DilError::fit_did_not_converge(format!("degree-{deg} least-squares system is singular"))
    })?;

    let coefficients = solution.iter().zip(scale.iter()).map(|(c, s)| c / s).collect();
    Ok(Polynomial { coefficients })
}

/// Ordinary least-squares slope of `y` against `x`.
///
/// Returns NaN when `x` has no spread or any value is non-finite.
pub fn linear_slope(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return f64::NAN;
    }
    let mean_x = x[..n].iter().sum::<f64>() / n as f64;
    let mean_y = y[..n].iter().sum::<f64>() / n as f64;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for i in 0..n {
        let dx = x[i] - mean_x;
        sxy += dx * (y[i] - mean_y);
        sxx += dx * dx;
    }
    if sxx > 0.0 { sxy / sxx } else { f64::NAN }
}
