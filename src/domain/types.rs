//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed between the segmenter, the lever rule and the kinetics fitter
//! - exported to JSON/CSV
//! - reused by the CLI configuration layer

use std::ops::Range;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DilError;

/// Closed interval `[lo, hi]`.
///
/// Construction sorts the endpoints, so `Interval::new(700.0, 500.0)` and
/// `Interval::new(500.0, 700.0)` are the same interval. Infinite endpoints are
/// allowed (open-ended ranges); NaN endpoints are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lo: f64,
    pub hi: f64,
}

impl Interval {
    pub fn new(a: f64, b: f64) -> Result<Self, DilError> {
        if a.is_nan() || b.is_nan() {
            return Err(DilError::invalid_argument(format!(
                "interval endpoints must not be NaN (got [{a}, {b}])"
            )));
        }
        Ok(if a <= b {
            Self { lo: a, hi: b }
        } else {
            Self { lo: b, hi: a }
        })
    }

    /// Closed membership test. NaN is never contained.
    pub fn contains(&self, x: f64) -> bool {
        self.lo <= x && x <= self.hi
    }

    pub fn midpoint(&self) -> f64 {
        0.5 * (self.lo + self.hi)
    }

    /// Boolean membership mask over `values`.
    pub fn mask(&self, values: &[f64]) -> Vec<bool> {
        values.iter().map(|&v| self.contains(v)).collect()
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.lo, self.hi)
    }
}

/// Default fraction window for the Koistinen-Marburger fit.
pub const DEFAULT_FRACTION_WINDOW: Interval = Interval { lo: 0.05, hi: 1.0 };

/// Default tolerance below the peak temperature for the quenching step.
pub const DEFAULT_QUENCH_DT: f64 = 1.0;

/// Canonical measurement channels of a series container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Index,
    Time,
    LengthChange,
    RelativeLengthChange,
    Temperature,
    NominalTemperature,
    Alpha,
}

impl Channel {
    pub fn display_name(self) -> &'static str {
        match self {
            Channel::Index => "index",
            Channel::Time => "time",
            Channel::LengthChange => "length change",
            Channel::RelativeLengthChange => "relative length change",
            Channel::Temperature => "temperature",
            Channel::NominalTemperature => "nominal temperature",
            Channel::Alpha => "alpha",
        }
    }
}

/// Row selection used by the expansion-coefficient calculation.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Contiguous row positions.
    Rows(Range<usize>),
    /// One flag per row.
    Mask(Vec<bool>),
}

impl Selection {
    /// Resolve to sorted row positions for a container with `n` rows.
    pub fn positions(&self, n: usize) -> Result<Vec<usize>, DilError> {
        match self {
            Selection::Rows(range) => {
                if range.start > range.end || range.end > n {
                    return Err(DilError::invalid_argument(format!(
                        "row selection {}..{} out of bounds for {n} rows",
                        range.start, range.end
                    )));
                }
                Ok(range.clone().collect())
            }
            Selection::Mask(mask) => {
                if mask.len() != n {
                    return Err(DilError::invalid_argument(format!(
                        "selection mask has {} entries, container has {n} rows",
                        mask.len()
                    )));
                }
                Ok(mask
                    .iter()
                    .enumerate()
                    .filter_map(|(i, &keep)| keep.then_some(i))
                    .collect())
            }
        }
    }
}

/// Optional overrides for the expansion-coefficient calculation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlphaOptions {
    /// Rows to fit (all rows when `None`).
    pub selection: Option<Selection>,
    /// Reference length overriding the container's own.
    pub reference_length: Option<f64>,
}

/// Thermal behaviour of a segment, judged from its nominal temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Isothermal,
    Heating,
    Cooling,
    /// No nominal temperature, or a single row.
    Unknown,
}

impl SegmentKind {
    pub fn display_name(self) -> &'static str {
        match self {
            SegmentKind::Isothermal => "isothermal",
            SegmentKind::Heating => "heating",
            SegmentKind::Cooling => "cooling",
            SegmentKind::Unknown => "-",
        }
    }
}

/// Koistinen-Marburger parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KmParams {
    /// Rate parameter (1/temperature unit).
    pub beta: f64,
    /// Martensite-start temperature.
    pub ms: f64,
}

/// A (temperature, transformed fraction) curve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FractionCurve {
    pub temperature: Vec<f64>,
    pub fraction: Vec<f64>,
}

impl FractionCurve {
    pub fn len(&self) -> usize {
        self.temperature.len()
    }

    pub fn is_empty(&self) -> bool {
        self.temperature.is_empty()
    }

    pub fn points(&self) -> Vec<(f64, f64)> {
        self.temperature
            .iter()
            .zip(self.fraction.iter())
            .map(|(&t, &f)| (t, f))
            .collect()
    }
}

/// Fit quality diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitQuality {
    pub sse: f64,
    pub rmse: f64,
    pub n: usize,
    pub iterations: usize,
}

/// Result of a Koistinen-Marburger fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KmFit {
    pub params: KmParams,
    /// Starting point actually handed to the solver.
    pub initial: KmParams,
    pub window: Interval,
    pub quality: FitQuality,
}

/// Configuration of a `dil fraction` run.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct FractionConfig {
    pub reference_length: Option<f64>,
    /// Linear region before the transformation.
    pub before: Interval,
    /// Linear region after the transformation.
    pub after: Interval,
    pub fraction_window: Interval,
    pub initial_guess: Option<KmParams>,
    /// Tolerance below the peak temperature for the quenching step.
    pub quench_dt: f64,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_dir: Option<PathBuf>,
    pub debug: bool,
}

/// A saved fit file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitFile {
    pub tool: String,
    pub source: String,
    pub generated: DateTime<Utc>,
    pub reference_length: Option<f64>,
    pub before: Interval,
    pub after: Interval,
    pub quench_rows: usize,
    pub fit: KmFit,
}
