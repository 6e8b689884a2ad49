//! Levenberg-Marquardt nonlinear least squares.
//!
//! Minimizes `Σ r_i(p)^2` for a small parameter vector `p`. Each iteration
//! solves the damped Gauss-Newton step as an augmented linear least-squares
//! problem
//!
//! ```text
//! [    J     ] δ ≈ [ -r ]
//! [ √λ · D   ]     [  0 ]
//! ```
//!
//! where `D` holds the column norms of the Jacobian (Marquardt scaling), so
//! parameters of very different magnitude (a rate of `~1e-2` next to a
//! temperature of `~1e2`) are damped consistently. The system is solved in
//! the scaled variables `z = D δ` so that the solver's rank cutoff never sees
//! the raw magnitude of `J`.

use nalgebra::{DMatrix, DVector};

use crate::error::DilError;
use crate::math::solve_least_squares;

/// A residual vector and its Jacobian as functions of the parameters.
pub trait LeastSquaresProblem {
    fn residuals(&self, params: &DVector<f64>) -> DVector<f64>;
    /// `J[(i, j)] = ∂r_i / ∂p_j`.
    fn jacobian(&self, params: &DVector<f64>) -> DMatrix<f64>;
}

#[derive(Debug, Clone)]
pub struct LmOptions {
    pub max_iterations: usize,
    /// Stop when an accepted step reduces the SSE by less than this fraction.
    pub ftol: f64,
    /// Stop when the step is this small relative to the parameter norm.
    pub xtol: f64,
    /// Stop when the residual is this close to orthogonal to every Jacobian column.
    pub gtol: f64,
    pub initial_lambda: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            ftol: 1e-12,
            xtol: 1e-12,
            gtol: 1e-15,
            initial_lambda: 1e-3,
        }
    }
}

/// Upper bound on the damping factor before we give up on the current point.
const MAX_LAMBDA: f64 = 1e16;

/// SSE below which a start that never moves still counts as converged.
const NEGLIGIBLE_SSE: f64 = f64::EPSILON;

#[derive(Debug, Clone)]
pub struct LmReport {
    pub params: DVector<f64>,
    /// Sum of squared residuals at `params`.
    pub sse: f64,
    pub iterations: usize,
}

/// Run Levenberg-Marquardt from `initial`.
///
/// A run that never lowers the SSE below its starting value fails with
/// `FitDidNotConverge` unless that SSE is already negligible.
pub fn levenberg_marquardt<P: LeastSquaresProblem>(
    problem: &P,
    initial: DVector<f64>,
    opts: &LmOptions,
) -> Result<LmReport, DilError> {
    let m = initial.len();
    if m == 0 {
        return Err(DilError::invalid_argument("no parameters to fit"));
    }
    if initial.iter().any(|v| !v.is_finite()) {
        return Err(DilError::invalid_argument("initial parameters must be finite"));
    }

    let mut params = initial;
    let mut residuals = problem.residuals(&params);
    let mut sse = residuals.norm_squared();
    if !sse.is_finite() {
        return Err(DilError::fit_did_not_converge(
            "residuals are not finite at the initial guess",
        ));
    }

    let mut lambda = opts.initial_lambda;
    let mut improved = false;

    for iteration in 1..=opts.max_iterations {
        let jac = problem.jacobian(&params);
        let n = jac.nrows();

        // Column norms; all-zero columns are left unscaled.
        let scale: Vec<f64> = (0..m)
            .map(|j| {
                let norm = jac.column(j).norm();
                if norm > 0.0 && norm.is_finite() { norm } else { 1.0 }
            })
            .collect();

        if sse == 0.0 || gradient_cosine(&jac, &residuals, &scale) <= opts.gtol {
            return finish(params, sse, iteration - 1, improved);
        }

        // Increase damping until a step lowers the SSE.
        loop {
            if lambda > MAX_LAMBDA {
                return Err(DilError::fit_did_not_converge(format!(
                    "damping diverged after {iteration} iterations (sse={sse:.6e})"
                )));
            }

            // Solve in scaled variables z = D δ: [J D⁻¹; √λ I] z ≈ [-r; 0].
            let mut a = DMatrix::<f64>::zeros(n + m, m);
            let sqrt_lambda = lambda.sqrt();
            for j in 0..m {
                a.view_mut((0, j), (n, 1)).copy_from(&(jac.column(j) / scale[j]));
                a[(n + j, j)] = sqrt_lambda;
            }
            let mut b = DVector::<f64>::zeros(n + m);
            b.rows_mut(0, n).copy_from(&(-&residuals));

            let Some(z) = solve_least_squares(&a, &b) else {
                lambda *= 10.0;
                continue;
            };
            let step = DVector::from_iterator(m, z.iter().zip(&scale).map(|(zj, dj)| zj / dj));

            let candidate = &params + &step;
            let candidate_residuals = problem.residuals(&candidate);
            let candidate_sse = candidate_residuals.norm_squared();

            if candidate_sse.is_finite() && candidate_sse <= sse {
                let reduction = if sse > 0.0 { (sse - candidate_sse) / sse } else { 0.0 };
                let small_step = step.norm() <= opts.xtol * (candidate.norm() + opts.xtol);
                improved |= candidate_sse < sse;

                params = candidate;
                residuals = candidate_residuals;
                sse = candidate_sse;
                lambda = (lambda / 10.0).max(1e-15);

                if reduction <= opts.ftol || small_step {
                    return finish(params, sse, iteration, improved);
                }
                break;
            }

            // A rejected step that is already negligible means we sit at the minimum.
            if step.norm() <= opts.xtol * (params.norm() + opts.xtol) {
                return finish(params, sse, iteration, improved);
            }
            lambda *= 10.0;
        }
    }

    Err(DilError::fit_did_not_converge(format!(
        "no convergence after {} iterations (sse={sse:.6e})",
        opts.max_iterations
    )))
}

/// Largest `|Jᵀr|_j / (‖r‖ ‖J_j‖)`: the cosine between the residual and each
/// Jacobian column, independent of how the parameters are scaled.
fn gradient_cosine(jac: &DMatrix<f64>, residuals: &DVector<f64>, scale: &[f64]) -> f64 {
    let r_norm = residuals.norm();
    if r_norm == 0.0 {
        return 0.0;
    }
    (0..jac.ncols())
        .map(|j| (jac.column(j).dot(residuals) / (scale[j] * r_norm)).abs())
        .fold(0.0, f64::max)
}

fn finish(params: DVector<f64>, sse: f64, iterations: usize, improved: bool) -> Result<LmReport, DilError> {
    if !improved && sse > NEGLIGIBLE_SSE {
        return Err(DilError::fit_did_not_converge(format!(
            "stalled at the starting point after {iterations} iterations (sse={sse:.6e})"
        )));
    }
    Ok(LmReport {
        params,
        sse,
        iterations,
    })
}
