//! Series container: the measurement channels of one dilatometry run (or of
//! a segment of it).
//!
//! Channels are resolved once, at construction, from the column names of a
//! [`Table`] through a fixed synonym table. Channels the source does not
//! provide stay empty; callers check lengths before indexing.

use log::debug;

use crate::data::Table;
use crate::domain::{AlphaOptions, Channel, SegmentKind};
use crate::error::DilError;
use crate::math::{Polynomial, polyfit};

/// Recognised column names, their channel and the factor applied on import.
///
/// Rows are processed in order and a later match overwrites an earlier one.
const SYNONYMS: &[(&str, Channel, f64)] = &[
    ("index", Channel::Index, 1.0),
    ("time", Channel::Time, 1.0),
    ("time.s", Channel::Time, 1.0),
    ("change in length", Channel::LengthChange, 1.0),
    // Percent in the source, stored as a fraction.
    ("rel. change in length", Channel::RelativeLengthChange, 1e-2),
    ("dl.pct", Channel::RelativeLengthChange, 1e-2),
    ("temperature", Channel::Temperature, 1.0),
    ("tc1", Channel::Temperature, 1.0),
    ("sample temperature", Channel::Temperature, 1.0),
    ("nominal temperature", Channel::NominalTemperature, 1.0),
    ("alpha", Channel::Alpha, 1.0),
];

/// Which channel provides the dilation signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DilationSource {
    LengthChange,
    RelativeLengthChange,
}

impl DilationSource {
    /// Short label for plot axes.
    pub fn symbol(self) -> &'static str {
        match self {
            DilationSource::LengthChange => "dl",
            DilationSource::RelativeLengthChange => "dl/l0",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    table: Table,
    index: Vec<i64>,
    time: Vec<f64>,
    length_change: Vec<f64>,
    relative_length_change: Vec<f64>,
    temperature: Vec<f64>,
    nominal_temperature: Vec<f64>,
    alpha: Vec<f64>,
    reference_length: Option<f64>,
    fit_coefficients: Vec<f64>,
}

impl Series {
    /// Resolve channels from `table` and back-fill `dl`/`dll0` from each other
    /// when a (non-zero) reference length is given.
    pub fn new(table: Table, reference_length: Option<f64>) -> Self {
        let mut series = Series {
            table,
            index: Vec::new(),
            time: Vec::new(),
            length_change: Vec::new(),
            relative_length_change: Vec::new(),
            temperature: Vec::new(),
            nominal_temperature: Vec::new(),
            alpha: Vec::new(),
            reference_length,
            fit_coefficients: Vec::new(),
        };

        for &(name, channel, factor) in SYNONYMS {
            let Some(values) = series.table.column(name) else {
                continue;
            };
            let values: Vec<f64> = if factor == 1.0 {
                values.to_vec()
            } else {
                values.iter().map(|v| v * factor).collect()
            };
            match channel {
                Channel::Index => series.index = values.iter().map(|v| v.round() as i64).collect(),
                Channel::Time => series.time = values,
                Channel::LengthChange => series.length_change = values,
                Channel::RelativeLengthChange => series.relative_length_change = values,
                Channel::Temperature => series.temperature = values,
                Channel::NominalTemperature => series.nominal_temperature = values,
                Channel::Alpha => series.alpha = values,
            }
        }

        if let Some(l0) = reference_length.filter(|l0| *l0 != 0.0) {
            if series.relative_length_change.is_empty() && !series.length_change.is_empty() {
                series.relative_length_change = series.length_change.iter().map(|dl| dl / l0).collect();
            } else if series.length_change.is_empty() && !series.relative_length_change.is_empty() {
                series.length_change = series.relative_length_change.iter().map(|r| r * l0).collect();
            }
        }

        debug!(
            "series: {} rows, dl={} dll0={} T={} Tnom={} l0={:?}",
            series.len(),
            series.length_change.len(),
            series.relative_length_change.len(),
            series.temperature.len(),
            series.nominal_temperature.len(),
            series.reference_length
        );

        series
    }

    /// Number of rows of the underlying table.
    pub fn len(&self) -> usize {
        self.table.n_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Raw column of the underlying table (case-insensitive name).
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.table.column(name)
    }

    pub fn index(&self) -> &[i64] {
        &self.index
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn length_change(&self) -> &[f64] {
        &self.length_change
    }

    pub fn relative_length_change(&self) -> &[f64] {
        &self.relative_length_change
    }

    pub fn temperature(&self) -> &[f64] {
        &self.temperature
    }

    pub fn nominal_temperature(&self) -> &[f64] {
        &self.nominal_temperature
    }

    pub fn alpha(&self) -> &[f64] {
        &self.alpha
    }

    pub fn reference_length(&self) -> Option<f64> {
        self.reference_length
    }

    /// Coefficients (lowest order first) of the last expansion-coefficient fit.
    ///
    /// Overwritten by every call to [`Series::linear_expansion_coefficient`];
    /// after a failed call it may still hold the previous fit.
    pub fn fit_coefficients(&self) -> &[f64] {
        &self.fit_coefficients
    }

    /// Dilation signal: the length change if present, else the relative one.
    pub fn dilation(&self) -> Result<(&[f64], DilationSource), DilError> {
        if !self.length_change.is_empty() {
            Ok((&self.length_change, DilationSource::LengthChange))
        } else if !self.relative_length_change.is_empty() {
            Ok((&self.relative_length_change, DilationSource::RelativeLengthChange))
        } else {
            Err(DilError::missing_channel(
                "no dilation channel (neither length change nor relative length change)",
            ))
        }
    }

    /// Temperature channel, or `MissingChannel` when the source has none.
    pub fn require_temperature(&self) -> Result<&[f64], DilError> {
        if self.temperature.is_empty() {
            return Err(DilError::missing_channel(Channel::Temperature.display_name()));
        }
        Ok(&self.temperature)
    }

    /// Classify from first/last nominal temperature.
    pub fn segment_kind(&self) -> SegmentKind {
        let (Some(&first), Some(&last)) = (self.nominal_temperature.first(), self.nominal_temperature.last()) else {
            return SegmentKind::Unknown;
        };
        if self.nominal_temperature.len() < 2 {
            SegmentKind::Unknown
        } else if self.nominal_temperature.iter().all(|&t| t == first) {
            SegmentKind::Isothermal
        } else if last > first {
            SegmentKind::Heating
        } else {
            SegmentKind::Cooling
        }
    }

    /// Mean linear expansion coefficient between `t0` and `t1`.
    ///
    /// Fits a degree-`deg` polynomial of the dilation against temperature over
    /// the selected rows and returns `(p(t1) - p(t0)) / (t1 - t0)`, divided by
    /// the reference length when the fit is done on the absolute length change.
    /// The relative channel is preferred when populated.
    pub fn linear_expansion_coefficient(
        &mut self,
        t0: f64,
        t1: f64,
        deg: usize,
        opts: &AlphaOptions,
    ) -> Result<f64, DilError> {
        if !(t0.is_finite() && t1.is_finite()) || t0 == t1 {
            return Err(DilError::invalid_argument(format!(
                "expansion coefficient needs two distinct finite temperatures (got {t0}, {t1})"
            )));
        }
        let temperature = self.require_temperature()?;
        let positions = match &opts.selection {
            Some(sel) => sel.positions(self.len())?,
            None => (0..self.len()).collect(),
        };
        let t_sel: Vec<f64> = positions.iter().map(|&i| temperature[i]).collect();

        let (poly, divisor) = if !self.relative_length_change.is_empty() {
            let y: Vec<f64> = positions.iter().map(|&i| self.relative_length_change[i]).collect();
            (polyfit(&t_sel, &y, deg)?, 1.0)
        } else {
            let l0 = opts
                .reference_length
                .or(self.reference_length)
                .filter(|l0| *l0 != 0.0)
                .ok_or_else(|| DilError::missing_channel("reference length (l0) not provided"))?;
            if self.length_change.is_empty() {
                return Err(DilError::missing_channel(Channel::LengthChange.display_name()));
            }
            let y: Vec<f64> = positions.iter().map(|&i| self.length_change[i]).collect();
            (polyfit(&t_sel, &y, deg)?, l0)
        };

        let alpha = (poly.eval(t1) - poly.eval(t0)) / (divisor * (t1 - t0));
        let Polynomial { coefficients } = poly;
        self.fit_coefficients = coefficients;
        Ok(alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Selection;

    fn table(cols: &[(&str, Vec<f64>)]) -> Table {
        Table::new(
            cols.iter().map(|(n, _)| n.to_string()).collect(),
            cols.iter().map(|(_, c)| c.clone()).collect(),
        )
        .unwrap()
    }

    #[test]
    fn resolves_synonyms_case_insensitively() {
        let t = table(&[
            ("index", vec![0.0, 1.0]),
            ("Time.s", vec![0.5, 1.0]),
            ("TC1", vec![20.0, 21.0]),
            ("Nominal Temperature", vec![20.0, 20.0]),
            ("dl.pct", vec![0.1, 0.2]),
        ]);
        let s = Series::new(t, None);
        assert_eq!(s.index(), &[0, 1]);
        assert_eq!(s.time(), &[0.5, 1.0]);
        assert_eq!(s.temperature(), &[20.0, 21.0]);
        assert_eq!(s.nominal_temperature(), &[20.0, 20.0]);
        assert!((s.relative_length_change()[1] - 0.002).abs() < 1e-15);
        assert!(s.length_change().is_empty());
        assert!(s.alpha().is_empty());
        assert_eq!(s.column("tc1"), Some(&[20.0, 21.0][..]));
    }

    #[test]
    fn later_synonym_wins() {
        let t = table(&[("sample temperature", vec![3.0]), ("temperature", vec![1.0]), ("tc1", vec![2.0])]);
        let s = Series::new(t, None);
        assert_eq!(s.temperature(), &[3.0]);
    }

    #[test]
    fn derives_relative_from_absolute_and_back() {
        let t = table(&[("change in length", vec![5.0, -10.0])]);
        let s = Series::new(t, Some(1.0e4));
        assert_eq!(s.relative_length_change(), &[5.0e-4, -1.0e-3]);

        let t = table(&[("rel. change in length", vec![0.05, -0.1])]);
        let s = Series::new(t, Some(1.0e4));
        assert!((s.length_change()[0] - 5.0).abs() < 1e-12);
        assert!((s.length_change()[1] + 10.0).abs() < 1e-12);
    }

    #[test]
    fn no_reference_length_leaves_channels_alone() {
        let t = table(&[("change in length", vec![5.0])]);
        let s = Series::new(t, None);
        assert!(s.relative_length_change().is_empty());
        assert!(s.dilation().is_ok());

        let s = Series::new(table(&[("temperature", vec![1.0])]), Some(10.0));
        assert!(matches!(s.dilation(), Err(DilError::MissingChannel(_))));
    }

    #[test]
    fn segment_kind_from_nominal_temperature() {
        let s = Series::new(table(&[("nominal temperature", vec![100.0, 100.0])]), None);
        assert_eq!(s.segment_kind(), SegmentKind::Isothermal);
        let s = Series::new(table(&[("nominal temperature", vec![100.0, 150.0])]), None);
        assert_eq!(s.segment_kind(), SegmentKind::Heating);
        let s = Series::new(table(&[("nominal temperature", vec![150.0, 100.0])]), None);
        assert_eq!(s.segment_kind(), SegmentKind::Cooling);
        let s = Series::new(table(&[("temperature", vec![150.0, 100.0])]), None);
        assert_eq!(s.segment_kind(), SegmentKind::Unknown);
    }

    #[test]
    fn expansion_coefficient_from_relative_channel() {
        let temps: Vec<f64> = (0..30).map(|i| 100.0 + i as f64 * 10.0).collect();
        // 1.5e-5 / K expressed in percent.
        let pct: Vec<f64> = temps.iter().map(|t| 1.5e-3 * (t - 100.0)).collect();
        let mut s = Series::new(table(&[("temperature", temps), ("dl.pct", pct)]), None);

        let alpha = s.linear_expansion_coefficient(200.0, 300.0, 1, &AlphaOptions::default()).unwrap();
        assert!((alpha - 1.5e-5).abs() < 1e-12);
        assert_eq!(s.fit_coefficients().len(), 2);
    }

    #[test]
    fn expansion_coefficient_from_absolute_channel_needs_l0() {
        let temps: Vec<f64> = (0..30).map(|i| 100.0 + i as f64 * 10.0).collect();
        let dl: Vec<f64> = temps.iter().map(|t| 0.15 * (t - 100.0)).collect();
        let mut s = Series::new(table(&[("temperature", temps), ("change in length", dl)]), None);

        let err = s
            .linear_expansion_coefficient(200.0, 300.0, 2, &AlphaOptions::default())
            .unwrap_err();
        assert!(matches!(err, DilError::MissingChannel(_)));

        let opts = AlphaOptions {
            selection: Some(Selection::Rows(0..15)),
            reference_length: Some(1.0e4),
        };
        let alpha = s.linear_expansion_coefficient(200.0, 300.0, 2, &opts).unwrap();
        assert!((alpha - 1.5e-5).abs() < 1e-10);
        assert_eq!(s.fit_coefficients().len(), 3);
    }

    #[test]
    fn expansion_coefficient_rejects_equal_temperatures() {
        let mut s = Series::new(table(&[("temperature", vec![1.0, 2.0]), ("dl.pct", vec![0.0, 1.0])]), None);
        let err = s.linear_expansion_coefficient(5.0, 5.0, 1, &AlphaOptions::default()).unwrap_err();
        assert!(matches!(err, DilError::InvalidArgument(_)));
    }
}
