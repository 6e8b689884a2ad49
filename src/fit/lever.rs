//! Transformed fraction by the lever rule.
//!
//! Two straight baselines are fitted to the dilation curve: one over a
//! temperature range where only the parent phase is present (`before`) and one
//! where the transformation is complete (`after`). Both are extrapolated over
//! the whole temperature channel and the fraction transformed is
//!
//! ```text
//! f = (dil - dl_before) / (dl_after - dl_before)
//! ```
//!
//! The fraction is computed for every sample first and only then restricted to
//! the window between the midpoints of the two ranges. Where the baselines
//! cross the fraction is infinite/NaN; that is passed through unchanged.

use log::debug;

use crate::data::{DilationSource, Series};
use crate::domain::{FractionCurve, Interval};
use crate::error::DilError;
use crate::math::{Polynomial, polyfit};

#[derive(Debug, Clone)]
pub struct TransformedFraction {
    /// Samples with `T` inside `window`, in original order.
    pub curve: FractionCurve,
    /// Fraction at every sample of the input (before windowing).
    pub fraction_all: Vec<f64>,
    pub before: Polynomial,
    pub after: Polynomial,
    /// `[min(m1, m2), max(m1, m2)]` of the range midpoints.
    pub window: Interval,
    pub source: DilationSource,
}

/// Apply the lever rule between the `before` and `after` linear regions.
pub fn transformed_fraction(
    series: &Series,
    before: Interval,
    after: Interval,
) -> Result<TransformedFraction, DilError> {
    for range in [before, after] {
        if !(range.lo.is_finite() && range.hi.is_finite()) {
            return Err(DilError::invalid_argument(format!(
                "lever-rule ranges must be finite (got {range})"
            )));
        }
    }

    let temperature = series.require_temperature()?;
    let (dilation, source) = series.dilation()?;

    let window = Interval::new(before.midpoint(), after.midpoint())?;

    let before_fit = fit_baseline(temperature, dilation, before)?;
    let after_fit = fit_baseline(temperature, dilation, after)?;

    let fraction_all: Vec<f64> = temperature
        .iter()
        .zip(dilation)
        .map(|(&t, &dil)| {
            let dl1 = before_fit.eval(t);
            let dl2 = after_fit.eval(t);
            (dil - dl1) / (dl2 - dl1)
        })
        .collect();

    let mut curve = FractionCurve::default();
    for (&t, &f) in temperature.iter().zip(&fraction_all) {
        if window.contains(t) {
            curve.temperature.push(t);
            curve.fraction.push(f);
        }
    }

    debug!(
        "lever rule: before slope={:.4e}, after slope={:.4e}, {} of {} samples in {window}",
        before_fit.slope(),
        after_fit.slope(),
        curve.len(),
        temperature.len()
    );

    Ok(TransformedFraction {
        curve,
        fraction_all,
        before: before_fit,
        after: after_fit,
        window,
        source,
    })
}

fn fit_baseline(temperature: &[f64], dilation: &[f64], range: Interval) -> Result<Polynomial, DilError> {
    let (t, d): (Vec<f64>, Vec<f64>) = temperature
        .iter()
        .zip(dilation)
        .filter(|(t, _)| range.contains(**t))
        .map(|(&t, &d)| (t, d))
        .unzip();
    if t.len() < 2 {
        return Err(DilError::fit_did_not_converge(format!(
            "baseline over {range} needs at least 2 samples, found {}",
            t.len()
        )));
    }
    polyfit(&t, &d, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Table;

    /// Cooling curve: austenite line above 500, martensite line below 200,
    /// smooth S-shaped transition in between.
    fn quench_series(with_dl: bool) -> Series {
        let temps: Vec<f64> = (0..=700).rev().map(|t| t as f64).collect();
        let s1 = 2.2e-5;
        let s2 = 1.2e-5;
        let dil: Vec<f64> = temps
            .iter()
            .map(|&t| {
                let a = s1 * t - 4.0e-3;
                let m = s2 * t + 3.0e-3;
                let x = ((500.0 - t) / 300.0).clamp(0.0, 1.0);
                let w = x * x * (3.0 - 2.0 * x);
                a + w * (m - a)
            })
            .collect();
        let name = if with_dl { "change in length" } else { "dl.pct" };
        let dil = if with_dl { dil } else { dil.iter().map(|v| v * 100.0).collect() };
        let table = Table::new(vec!["temperature".into(), name.into()], vec![temps, dil]).unwrap();
        Series::new(table, None)
    }

    #[test]
    fn fraction_is_zero_and_one_at_range_midpoints() {
        let s = quench_series(true);
        let before = Interval::new(700.0, 500.0).unwrap();
        let after = Interval::new(0.0, 200.0).unwrap();
        let out = transformed_fraction(&s, before, after).unwrap();

        assert_eq!(out.window, Interval { lo: 100.0, hi: 600.0 });
        assert_eq!(out.source, DilationSource::LengthChange);
        assert_eq!(out.curve.len(), 501);
        // Original (descending) order is kept.
        assert_eq!(out.curve.temperature[0], 600.0);
        assert_eq!(*out.curve.temperature.last().unwrap(), 100.0);

        assert!(out.curve.fraction[0].abs() < 1e-9);
        assert!((out.curve.fraction.last().unwrap() - 1.0).abs() < 1e-9);
        assert!((out.before.slope() - 2.2e-5).abs() < 1e-12);
        assert!((out.after.slope() - 1.2e-5).abs() < 1e-12);
        assert_eq!(out.fraction_all.len(), s.len());
    }

    #[test]
    fn falls_back_to_relative_channel() {
        let s = quench_series(false);
        let out = transformed_fraction(
            &s,
            Interval::new(500.0, 700.0).unwrap(),
            Interval::new(0.0, 200.0).unwrap(),
        )
        .unwrap();
        assert_eq!(out.source, DilationSource::RelativeLengthChange);
        let mid = out.curve.temperature.iter().position(|&t| t == 350.0).unwrap();
        assert!((out.curve.fraction[mid] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn crossing_baselines_pass_through_unbounded_fraction() {
        // dl1 = T and dl2 = 100 - T meet at T = 50, where the sample sits off both lines.
        let temps: Vec<f64> = (0..=100).map(|t| t as f64).collect();
        let dil: Vec<f64> = temps
            .iter()
            .map(|&t| match t {
                t if t <= 20.0 => t,
                t if t >= 80.0 => 100.0 - t,
                _ => 60.0,
            })
            .collect();
        let table = Table::new(vec!["temperature".into(), "change in length".into()], vec![temps, dil]).unwrap();
        let s = Series::new(table, None);

        let out = transformed_fraction(&s, Interval::new(0.0, 20.0).unwrap(), Interval::new(80.0, 100.0).unwrap())
            .unwrap();
        assert_eq!(out.window, Interval { lo: 10.0, hi: 90.0 });
        assert_eq!(out.curve.len(), 81);
        assert!(out.curve.fraction[0].abs() < 1e-9);
        assert!((out.curve.fraction[80] - 1.0).abs() < 1e-9);

        let at_crossing = out.fraction_all[50];
        assert!(!at_crossing.is_finite() || at_crossing.abs() > 1e9, "f(50) = {at_crossing}");
        let windowed = out.curve.fraction[40];
        assert_eq!(out.curve.temperature[40], 50.0);
        assert_eq!(windowed.to_bits(), at_crossing.to_bits());
    }

    #[test]
    fn missing_channels_and_empty_ranges() {
        let table = Table::new(vec!["temperature".into()], vec![vec![1.0, 2.0]]).unwrap();
        let s = Series::new(table, None);
        let r = Interval::new(0.0, 1.0).unwrap();
        assert!(matches!(transformed_fraction(&s, r, r), Err(DilError::MissingChannel(_))));

        let s = quench_series(true);
        let err = transformed_fraction(&s, Interval::new(800.0, 900.0).unwrap(), r).unwrap_err();
        assert!(matches!(err, DilError::FitDidNotConverge(_)));

        let open = Interval::new(f64::NEG_INFINITY, 1.0).unwrap();
        assert!(matches!(transformed_fraction(&s, open, r), Err(DilError::InvalidArgument(_))));
    }
}
