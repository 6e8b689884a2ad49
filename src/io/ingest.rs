//! Input loading: file → table → series container.
//!
//! Files ending in `.csv` are read as header-labelled CSV; anything else is
//! parsed as the dilatometer `.asc` export.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::data::Series;
use crate::error::AppError;
use crate::io::asc::parse_asc;
use crate::io::table_csv::read_table_csv;

/// A loaded input file.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub path: PathBuf,
    /// Location comment of an `.asc` file.
    pub location: Option<String>,
    pub series: Series,
    pub skipped_lines: usize,
}

impl LoadedSeries {
    /// File name for reports (falls back to the full path).
    pub fn label(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Load `path` and build a series with the given reference length.
pub fn load_series(path: &Path, reference_length: Option<f64>) -> Result<LoadedSeries, AppError> {
    let is_csv = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    let (table, location, skipped_lines) = if is_csv {
        (read_table_csv(path)?, None, 0)
    } else {
        let file = File::open(path)
            .map_err(|e| AppError::new(2, format!("Failed to open '{}': {e}", path.display())))?;
        let asc = parse_asc(BufReader::new(file)).map_err(|e| e.context(path.display()))?;
        (asc.table, Some(asc.location), asc.skipped_lines)
    };

    if skipped_lines > 0 {
        warn!("{}: skipped {skipped_lines} malformed line(s)", path.display());
    }
    if table.is_empty() {
        return Err(AppError::new(3, format!("{}: no data rows", path.display())));
    }
    info!(
        "{}: {} rows, columns {:?}",
        path.display(),
        table.n_rows(),
        table.names()
    );

    Ok(LoadedSeries {
        path: path.to_path_buf(),
        location,
        series: Series::new(table, reference_length),
        skipped_lines,
    })
}
