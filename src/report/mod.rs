//! Reporting utilities: segment summaries, fit residuals, and formatted
//! terminal output.

pub mod format;

pub use format::*;

use serde::Serialize;

use crate::data::Series;
use crate::domain::{FractionCurve, KmFit, SegmentKind};
use crate::error::AppError;
use crate::fit::eval_km_fit;

/// One line of the segment table.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentSummary {
    pub ordinal: usize,
    pub kind: SegmentKind,
    pub rows: usize,
    pub first_index: Option<i64>,
    pub last_index: Option<i64>,
    pub time_start: Option<f64>,
    pub time_end: Option<f64>,
    pub t_start: Option<f64>,
    pub t_end: Option<f64>,
    pub tnom_start: Option<f64>,
    pub tnom_end: Option<f64>,
}

/// Summarize each segment (first/last values of the main channels).
pub fn summarize_segments(segments: &[Series]) -> Vec<SegmentSummary> {
    segments
        .iter()
        .enumerate()
        .map(|(ordinal, s)| SegmentSummary {
            ordinal,
            kind: s.segment_kind(),
            rows: s.len(),
            first_index: s.index().first().copied(),
            last_index: s.index().last().copied(),
            time_start: s.time().first().copied(),
            time_end: s.time().last().copied(),
            t_start: s.temperature().first().copied(),
            t_end: s.temperature().last().copied(),
            tnom_start: s.nominal_temperature().first().copied(),
            tnom_end: s.nominal_temperature().last().copied(),
        })
        .collect()
}

/// Observed vs. fitted fraction at one temperature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitResidual {
    pub temperature: f64,
    pub observed: f64,
    pub fitted: f64,
    pub residual: f64,
}

/// Fitted values and residuals over the points the fit used.
pub fn compute_residuals(curve: &FractionCurve, fit: &KmFit) -> Result<Vec<FitResidual>, AppError> {
    let predicted = eval_km_fit(&fit.params, &curve.temperature, &curve.fraction, fit.window)?;
    let observed = curve.fraction.iter().filter(|f| fit.window.contains(**f));

    let mut out = Vec::with_capacity(predicted.len());
    for ((&temperature, &fitted), &observed) in predicted.temperature.iter().zip(&predicted.fraction).zip(observed) {
        if !fitted.is_finite() {
            return Err(AppError::new(4, "Non-finite model prediction during residual computation."));
        }
        out.push(FitResidual {
            temperature,
            observed,
            fitted,
            residual: observed - fitted,
        });
    }
    Ok(out)
}
