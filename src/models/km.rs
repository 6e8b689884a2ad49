//! Koistinen-Marburger model for athermal martensite.
//!
//! `f(T) = 1 - exp(-β (Ms - T))`
//!
//! The fitter relies on two primitive operations:
//! - predict `f(T)` given `(β, Ms)` (for residuals/plots)
//! - the partial derivatives with respect to `β` and `Ms` (for the Jacobian)

use crate::domain::KmParams;

/// Predicted transformed fraction at temperature `t`.
pub fn predict(t: f64, params: &KmParams) -> f64 {
    // 1 - exp(-x) computed as -expm1(-x) to keep precision near Ms.
    -(-params.beta * (params.ms - t)).exp_m1()
}

/// `[∂f/∂β, ∂f/∂Ms]` at temperature `t`.
pub fn gradient(t: f64, params: &KmParams) -> [f64; 2] {
    let undercooling = params.ms - t;
    let e = (-params.beta * undercooling).exp();
    [undercooling * e, params.beta * e]
}
