//! Read/write fit JSON files.
//!
//! Fit JSON is the "portable" record of one Koistinen-Marburger fit:
//! - source file, generation time and reference length
//! - lever-rule ranges and quenching-step size
//! - fitted parameters, starting point, window and diagnostics
//!
//! The schema is defined by `domain::FitFile`.

use std::fs::File;
use std::path::Path;

use chrono::Utc;

use crate::app::pipeline::FractionRun;
use crate::domain::{FitFile, FractionConfig};
use crate::error::AppError;

/// Build the JSON record of a finished run.
pub fn build_fit_file(run: &FractionRun, config: &FractionConfig) -> FitFile {
    FitFile {
        tool: "dil".to_string(),
        source: run.input.path.display().to_string(),
        generated: Utc::now(),
        reference_length: run.input.series.reference_length(),
        before: config.before,
        after: config.after,
        quench_rows: run.quench.len(),
        fit: run.fit.clone(),
    }
}

/// Write a fit JSON file.
pub fn write_fit_json(path: &Path, fit: &FitFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create fit JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, fit)
        .map_err(|e| AppError::new(2, format!("Failed to write fit JSON: {e}")))?;
    Ok(())
}

/// Read a fit JSON file.
pub fn read_fit_json(path: &Path) -> Result<FitFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open fit JSON '{}': {e}", path.display())))?;
    let fit: FitFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid fit JSON: {e}")))?;
    Ok(fit)
}
