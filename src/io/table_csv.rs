//! CSV read/write for [`Table`].
//!
//! - the header row gives the column names (kept verbatim; lookup is case-insensitive)
//! - empty cells read as NaN, NaN is written as an empty cell
//! - rows with unparseable cells are skipped and counted

use std::fs::File;
use std::path::Path;

use log::warn;

use crate::data::Table;
use crate::error::AppError;

/// Read a header-labelled CSV file into a table.
pub fn read_table_csv(path: &Path) -> Result<Table, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_table_csv_from(file)
}

pub fn read_table_csv_from<R: std::io::Read>(reader: R) -> Result<Table, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let names: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for result in reader.records() {
        let Ok(record) = result else {
            skipped += 1;
            continue;
        };
        if record.len() != names.len() {
            skipped += 1;
            continue;
        }
        let parsed: Result<Vec<f64>, _> = record
            .iter()
            .map(|cell| if cell.is_empty() { Ok(f64::NAN) } else { cell.parse::<f64>() })
            .collect();
        match parsed {
            Ok(row) => rows.push(row),
            Err(_) => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!("Skipped {skipped} malformed CSV row(s).");
    }

    Table::from_rows(names, &rows).map_err(|e| AppError::new(2, e.to_string()))
}

/// Write a table as CSV.
pub fn write_table_csv(path: &Path, table: &Table) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create CSV '{}': {e}", path.display())))?;

    writer
        .write_record(table.names())
        .map_err(|e| AppError::new(2, format!("Failed to write CSV header: {e}")))?;
    for i in 0..table.n_rows() {
        let row = table.row(i).unwrap_or_default();
        writer
            .write_record(row.iter().map(|v| fmt_cell(*v)))
            .map_err(|e| AppError::new(2, format!("Failed to write CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush CSV '{}': {e}", path.display())))?;
    Ok(())
}

pub(crate) fn fmt_cell(v: f64) -> String {
    if v.is_nan() { String::new() } else { format!("{v}") }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_names_and_nan_cells() {
        let data = "\u{feff}Temperature,Change in length\n20.0,0.1\n21.0,\nbad,0.3\n22.0,0.4\n";
        let table = read_table_csv_from(data.as_bytes()).unwrap();
        assert_eq!(table.names(), &["Temperature", "Change in length"]);
        assert_eq!(table.n_rows(), 3);
        assert!(table.column("change in length").unwrap()[1].is_nan());
    }

    #[test]
    fn write_then_read_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        let table = Table::from_rows(
            vec!["index".into(), "temperature".into()],
            &[vec![0.0, 20.5], vec![1.0, f64::NAN]],
        )
        .unwrap();
        write_table_csv(&path, &table).unwrap();

        let back = read_table_csv(&path).unwrap();
        assert_eq!(back.column("temperature").unwrap()[0], 20.5);
        assert!(back.column("temperature").unwrap()[1].is_nan());
    }
}
