//! CSV exports of computed results.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream scripts.
//! Empty cells stand for missing values.

use std::path::Path;

use crate::domain::{KmFit, SegmentKind};
use crate::error::AppError;
use crate::fit::TransformedFraction;
use crate::io::table_csv::fmt_cell;
use crate::models::predict;
use crate::report::SegmentSummary;

/// Write the segment summary table.
pub fn write_segments_csv(path: &Path, rows: &[SegmentSummary]) -> Result<(), AppError> {
    let mut writer = create(path)?;
    write_row(
        &mut writer,
        [
            "segment", "kind", "rows", "first_index", "last_index", "time_start", "time_end", "t_start",
            "t_end", "tnom_start", "tnom_end",
        ]
        .map(String::from),
    )?;

    for r in rows {
        write_row(
            &mut writer,
            [
                r.ordinal.to_string(),
                kind_label(r.kind).to_string(),
                r.rows.to_string(),
                r.first_index.map(|v| v.to_string()).unwrap_or_default(),
                r.last_index.map(|v| v.to_string()).unwrap_or_default(),
                opt_cell(r.time_start),
                opt_cell(r.time_end),
                opt_cell(r.t_start),
                opt_cell(r.t_end),
                opt_cell(r.tnom_start),
                opt_cell(r.tnom_end),
            ],
        )?;
    }
    finish(writer, path)
}

/// Write the transformed-fraction curve with the KM prediction.
///
/// Every point of the lever-rule window is written; `used` marks the points
/// whose fraction lies in the fit window.
pub fn write_fraction_csv(path: &Path, lever: &TransformedFraction, fit: &KmFit) -> Result<(), AppError> {
    let mut writer = create(path)?;
    write_row(&mut writer, ["temperature", "fraction", "km_fraction", "used"].map(String::from))?;

    for (t, f) in lever.curve.points() {
        write_row(
            &mut writer,
            [
                fmt_cell(t),
                fmt_cell(f),
                fmt_cell(predict(t, &fit.params)),
                u8::from(fit.window.contains(f)).to_string(),
            ],
        )?;
    }
    finish(writer, path)
}

/// Write a derivative curve (`x`, `dy/dx`); boundary NaNs become empty cells.
pub fn write_derivative_csv(path: &Path, x: &[f64], derivative: &[f64]) -> Result<(), AppError> {
    let mut writer = create(path)?;
    write_row(&mut writer, ["temperature", "derivative"].map(String::from))?;
    for (&xi, &di) in x.iter().zip(derivative) {
        write_row(&mut writer, [fmt_cell(xi), fmt_cell(di)])?;
    }
    finish(writer, path)
}

fn create(path: &Path) -> Result<csv::Writer<std::fs::File>, AppError> {
    csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))
}

fn write_row<const N: usize>(writer: &mut csv::Writer<std::fs::File>, row: [String; N]) -> Result<(), AppError> {
    writer
        .write_record(&row)
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))
}

fn finish(mut writer: csv::Writer<std::fs::File>, path: &Path) -> Result<(), AppError> {
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV '{}': {e}", path.display())))
}

fn opt_cell(v: Option<f64>) -> String {
    v.map(fmt_cell).unwrap_or_default()
}

fn kind_label(kind: SegmentKind) -> &'static str {
    match kind {
        SegmentKind::Unknown => "unknown",
        other => other.display_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivative_csv_blanks_nan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("d.csv");
        write_derivative_csv(&path, &[1.0, 2.0, 3.0], &[f64::NAN, 0.5, f64::NAN]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "temperature,derivative\n1,\n2,0.5\n3,\n");
    }

    #[test]
    fn segments_csv_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.csv");
        let rows = vec![SegmentSummary {
            ordinal: 0,
            kind: SegmentKind::Unknown,
            rows: 3,
            first_index: Some(0),
            last_index: Some(2),
            time_start: None,
            time_end: None,
            t_start: Some(20.0),
            t_end: Some(22.5),
            tnom_start: None,
            tnom_end: None,
        }];
        write_segments_csv(&path, &rows).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("segment,kind,rows"));
        assert_eq!(lines[1], "0,unknown,3,0,2,,,20,22.5,,");
    }
}
