//! Segmentation of a thermal cycle into sub-series, and the reverse merge.
//!
//! - `split_segments`: isothermal holds vs. ramps, from the nominal temperature
//! - `segments_by_temperature_range`: contiguous runs with `T` inside a range
//! - `find_quenching_step`: the last run below the peak temperature
//! - `merge_segments`: row-wise concatenation
//!
//! Every returned segment is a fresh copy of the selected rows and inherits the
//! parent's reference length.

use log::debug;

use crate::data::{Series, Table};
use crate::domain::{Channel, Interval};
use crate::error::DilError;

/// Split into isothermal and non-isothermal (heating/cooling) segments.
///
/// A consecutive pair of rows is isothermal when the nominal temperatures are
/// exactly equal. A new segment starts at row `j + 1` whenever the flag of
/// pair `j` differs from the flag of pair `j + 1`. Ramps with different rates
/// are not told apart.
pub fn split_segments(series: &Series) -> Result<Vec<Series>, DilError> {
    let tnom = series.nominal_temperature();
    if tnom.is_empty() {
        return Err(DilError::missing_channel(format!(
            "{} not provided",
            Channel::NominalTemperature.display_name()
        )));
    }

    let is_iso: Vec<bool> = tnom.windows(2).map(|w| w[1] == w[0]).collect();
    let boundaries: Vec<usize> = is_iso
        .windows(2)
        .enumerate()
        .filter_map(|(j, w)| (w[0] != w[1]).then_some(j + 1))
        .collect();

    debug!("split_segments: {} rows, {} boundaries", series.len(), boundaries.len());

    Ok(split_at(series.table(), &boundaries)
        .into_iter()
        .map(|table| Series::new(table, series.reference_length()))
        .collect())
}

/// Contiguous runs of rows whose temperature lies in `range` (closed).
///
/// Rows outside the range are dropped; a gap between two selected rows starts
/// a new segment. No selected rows gives an empty list.
pub fn segments_by_temperature_range(series: &Series, range: Interval) -> Result<Vec<Series>, DilError> {
    let temperature = series.require_temperature()?;

    let selected: Vec<usize> = temperature
        .iter()
        .enumerate()
        .filter_map(|(i, &t)| range.contains(t).then_some(i))
        .collect();
    if selected.is_empty() {
        debug!("segments_by_temperature_range: no rows in {range}");
        return Ok(Vec::new());
    }

    let mut runs: Vec<Vec<usize>> = vec![vec![selected[0]]];
    for pair in selected.windows(2) {
        if pair[1] - pair[0] > 1 {
            runs.push(Vec::new());
        }
        if let Some(run) = runs.last_mut() {
            run.push(pair[1]);
        }
    }

    debug!(
        "segments_by_temperature_range: {} of {} rows in {range}, {} runs",
        selected.len(),
        series.len(),
        runs.len()
    );

    Ok(runs
        .iter()
        .map(|rows| Series::new(series.table().select_rows(rows), series.reference_length()))
        .collect())
}

/// Final cooling step: the last run of rows at least `dt` below the peak
/// temperature.
pub fn find_quenching_step(series: &Series, dt: f64) -> Result<Series, DilError> {
    if !dt.is_finite() {
        return Err(DilError::invalid_argument(format!("quench tolerance must be finite (got {dt})")));
    }
    let temperature = series.require_temperature()?;
    let t_max = temperature
        .iter()
        .copied()
        .filter(|t| !t.is_nan())
        .fold(f64::NEG_INFINITY, f64::max);
    if t_max == f64::NEG_INFINITY {
        return Err(DilError::empty_input("temperature channel holds no numeric values"));
    }

    let range = Interval::new(f64::NEG_INFINITY, t_max - dt)?;
    segments_by_temperature_range(series, range)?
        .pop()
        .ok_or_else(|| DilError::empty_input(format!("no rows at or below {} (Tmax={t_max}, dT={dt})", t_max - dt)))
}

/// Concatenate segments in order into a single series.
///
/// The reference length defaults to the first segment's. Rows are taken as
/// given: overlapping or out-of-order index ranges are not deduplicated.
pub fn merge_segments(segments: &[Series], reference_length: Option<f64>) -> Result<Series, DilError> {
    let first = segments
        .first()
        .ok_or_else(|| DilError::empty_input("no segments to merge"))?;
    let l0 = reference_length.or(first.reference_length());
    let table = Table::concat(segments.iter().map(Series::table));
    Ok(Series::new(table, l0))
}

fn split_at(table: &Table, boundaries: &[usize]) -> Vec<Table> {
    let mut out = Vec::with_capacity(boundaries.len() + 1);
    let mut start = 0;
    for &b in boundaries {
        out.push(table.slice_rows(start..b));
        start = b;
    }
    out.push(table.slice_rows(start..table.n_rows()));
    out
}
