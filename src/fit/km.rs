//! Koistinen-Marburger fit of a transformed-fraction curve.
//!
//! Given `(T, f)`:
//! - keep the points whose fraction lies in a closed window (default `[0.05, 1]`)
//! - fit `f = 1 - exp(-β (Ms - T))` by Levenberg-Marquardt
//!
//! `eval_km_fit` applies exactly the same window so the evaluated curve overlays
//! the fitted points one to one.

use log::{debug, info};
use nalgebra::{DMatrix, DVector};

use crate::domain::{FitQuality, FractionCurve, Interval, KmFit, KmParams};
use crate::error::DilError;
use crate::math::{LeastSquaresProblem, LmOptions, levenberg_marquardt, polyfit};
use crate::models::km::{gradient, predict};

/// Starting point used when the linearised guess is unusable.
const FALLBACK_BETA: f64 = 0.01;

struct KmProblem<'a> {
    t: &'a [f64],
    f: &'a [f64],
}

impl LeastSquaresProblem for KmProblem<'_> {
    fn residuals(&self, p: &DVector<f64>) -> DVector<f64> {
        let params = KmParams { beta: p[0], ms: p[1] };
        DVector::from_iterator(
            self.t.len(),
            self.t.iter().zip(self.f).map(|(&t, &f)| predict(t, &params) - f),
        )
    }

    fn jacobian(&self, p: &DVector<f64>) -> DMatrix<f64> {
        let params = KmParams { beta: p[0], ms: p[1] };
        let mut jac = DMatrix::zeros(self.t.len(), 2);
        for (i, &t) in self.t.iter().enumerate() {
            let g = gradient(t, &params);
            jac[(i, 0)] = g[0];
            jac[(i, 1)] = g[1];
        }
        jac
    }
}

/// Fit with default solver options.
pub fn fit_km(
    temperature: &[f64],
    fraction: &[f64],
    window: Interval,
    initial: Option<KmParams>,
) -> Result<KmFit, DilError> {
    fit_km_with_options(temperature, fraction, window, initial, &LmOptions::default())
}

pub fn fit_km_with_options(
    temperature: &[f64],
    fraction: &[f64],
    window: Interval,
    initial: Option<KmParams>,
    opts: &LmOptions,
) -> Result<KmFit, DilError> {
    let (t, f) = select_window(temperature, fraction, window)?;
    let n = t.len();
    if n < 2 {
        return Err(DilError::fit_did_not_converge(format!(
            "{n} point(s) with fraction in {window}; at least 2 are needed for (beta, Ms)"
        )));
    }

    let initial = initial.unwrap_or_else(|| initial_guess(&t, &f));
    debug!("KM fit: {n} points, start beta={:.5e} Ms={:.2}", initial.beta, initial.ms);

    let problem = KmProblem { t: &t, f: &f };
    let report = levenberg_marquardt(
        &problem,
        DVector::from_row_slice(&[initial.beta, initial.ms]),
        opts,
    )?;

    let params = KmParams {
        beta: report.params[0],
        ms: report.params[1],
    };
    info!(
        "KM fit converged in {} iterations: beta={:.5e} Ms={:.2} sse={:.3e}",
        report.iterations, params.beta, params.ms, report.sse
    );

    Ok(KmFit {
        params,
        initial,
        window,
        quality: FitQuality {
            sse: report.sse,
            rmse: (report.sse / n as f64).sqrt(),
            n,
            iterations: report.iterations,
        },
    })
}

/// Model prediction at every point of `(T, f)` whose fraction lies in `window`.
pub fn eval_km_fit(
    params: &KmParams,
    temperature: &[f64],
    fraction: &[f64],
    window: Interval,
) -> Result<FractionCurve, DilError> {
    let (t, _) = select_window(temperature, fraction, window)?;
    let fraction = t.iter().map(|&ti| predict(ti, params)).collect();
    Ok(FractionCurve {
        temperature: t,
        fraction,
    })
}

fn select_window(temperature: &[f64], fraction: &[f64], window: Interval) -> Result<(Vec<f64>, Vec<f64>), DilError> {
    if temperature.len() != fraction.len() {
        return Err(DilError::invalid_argument(format!(
            "temperature has {} values, fraction has {}",
            temperature.len(),
            fraction.len()
        )));
    }
    Ok(temperature
        .iter()
        .zip(fraction)
        .filter(|(_, f)| window.contains(**f))
        .map(|(&t, &f)| (t, f))
        .unzip())
}

/// Starting point from the linearisation `ln(1 - f) = β T - β Ms`.
fn initial_guess(t: &[f64], f: &[f64]) -> KmParams {
    let (x, y): (Vec<f64>, Vec<f64>) = t
        .iter()
        .zip(f)
        .filter(|(t, f)| t.is_finite() && f.is_finite() && **f < 1.0)
        .map(|(&t, &f)| (t, (-f).ln_1p()))
        .unzip();

    let fallback = KmParams {
        beta: FALLBACK_BETA,
        ms: t.iter().copied().filter(|v| v.is_finite()).fold(f64::NEG_INFINITY, f64::max),
    };

    let Ok(line) = polyfit(&x, &y, 1) else {
        return sanitize(fallback);
    };
    let beta = line.slope();
    let ms = -line.coefficients[0] / beta;
    if beta > 0.0 && beta.is_finite() && ms.is_finite() {
        KmParams { beta, ms }
    } else {
        sanitize(fallback)
    }
}

fn sanitize(p: KmParams) -> KmParams {
    KmParams {
        beta: p.beta,
        ms: if p.ms.is_finite() { p.ms } else { 0.0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic(beta: f64, ms: f64) -> (Vec<f64>, Vec<f64>) {
        let t: Vec<f64> = (200..=349).map(|v| v as f64).collect();
        let f = t.iter().map(|&ti| predict(ti, &KmParams { beta, ms })).collect();
        (t, f)
    }

    #[test]
    fn recovers_known_parameters_without_guess() {
        let (t, f) = synthetic(0.03, 350.0);
        let fit = fit_km(&t, &f, Interval::new(0.0, 1.0).unwrap(), None).unwrap();
        assert!((fit.params.beta - 0.03).abs() / 0.03 < 0.01, "{:?}", fit.params);
        assert!((fit.params.ms - 350.0).abs() / 350.0 < 0.01, "{:?}", fit.params);
        assert_eq!(fit.quality.n, 150);
        assert!(fit.quality.rmse < 1e-8);
    }

    #[test]
    fn recovers_known_parameters_from_explicit_guess() {
        let (t, f) = synthetic(0.03, 350.0);
        let guess = KmParams { beta: 0.033, ms: 357.0 };
        let fit = fit_km(&t, &f, Interval::new(1.0, 0.2).unwrap(), Some(guess)).unwrap();
        assert!((fit.params.beta - 0.03).abs() < 1e-6, "{:?}", fit.params);
        assert!((fit.params.ms - 350.0).abs() < 1e-4, "{:?}", fit.params);
        assert_eq!(fit.initial, guess);
    }

    #[test]
    fn far_starting_point_is_not_reported_as_converged() {
        // Every prediction saturates at 1, so the Jacobian is ~1e-280.
        let (t, f) = synthetic(0.03, 350.0);
        let guess = KmParams { beta: 1.0, ms: 1000.0 };
        let err = fit_km(&t, &f, Interval::new(0.0, 1.0).unwrap(), Some(guess)).unwrap_err();
        assert!(matches!(&err, DilError::FitDidNotConverge(msg) if msg.contains("sse=")), "{err:?}");
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn too_few_points_in_window() {
        let (t, f) = synthetic(0.03, 350.0);
        let err = fit_km(&t, &f, Interval::new(0.9999, 1.0).unwrap(), None).unwrap_err();
        assert!(matches!(err, DilError::FitDidNotConverge(_)));
    }

    #[test]
    fn length_mismatch_is_invalid() {
        let err = fit_km(&[1.0, 2.0], &[0.5], Interval::new(0.0, 1.0).unwrap(), None).unwrap_err();
        assert!(matches!(err, DilError::InvalidArgument(_)));
    }

    #[test]
    fn evaluation_uses_same_selection() {
        let (t, mut f) = synthetic(0.03, 350.0);
        // Points outside the window must be skipped by both operations.
        f[0] = 1.5;
        f[10] = -0.2;
        let window = Interval::new(0.05, 1.0).unwrap();
        let fit = fit_km(&t, &f, window, None).unwrap();
        let curve = eval_km_fit(&fit.params, &t, &f, window).unwrap();

        assert_eq!(curve.len(), fit.quality.n);
        let expected: Vec<f64> = t
            .iter()
            .zip(&f)
            .filter(|(_, fi)| window.contains(**fi))
            .map(|(ti, _)| *ti)
            .collect();
        assert_eq!(curve.temperature, expected);
        for (ti, fi) in curve.points() {
            assert!((fi - predict(ti, &fit.params)).abs() < 1e-15);
        }
    }
}
