//! Debug bundle writer for inspecting one fraction run.
//!
//! The bundle is a markdown file with the run settings, the lever-rule
//! baselines, the fit diagnostics and the full residual table.

use std::fs::{File, create_dir_all};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::app::pipeline::FractionRun;
use crate::domain::FractionConfig;
use crate::error::AppError;
use crate::report::format_km_equation;

pub fn write_debug_bundle(run: &FractionRun, config: &FractionConfig, dir: &Path) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| AppError::new(2, format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let stem = run
        .input
        .path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input".to_string());
    let path = dir.join(format!("dil_debug_{stem}_{ts}.md"));

    let file = File::create(&path).map_err(|e| AppError::new(2, format!("Failed to create debug file: {e}")))?;
    let mut file = BufWriter::new(file);
    write_bundle(&mut file, run, config).map_err(|e| AppError::new(2, format!("Failed to write debug: {e}")))?;
    file.flush()
        .map_err(|e| AppError::new(2, format!("Failed to write debug: {e}")))?;

    Ok(path)
}

fn write_bundle(out: &mut impl Write, run: &FractionRun, config: &FractionConfig) -> std::io::Result<()> {
    writeln!(out, "# dil debug bundle")?;
    writeln!(out, "- generated: {}", Local::now().to_rfc3339())?;
    writeln!(out, "- source: {}", run.input.path.display())?;
    if let Some(location) = &run.input.location {
        writeln!(out, "- location: {location}")?;
    }
    writeln!(out, "- rows: {} (skipped lines: {})", run.input.series.len(), run.input.skipped_lines)?;
    writeln!(
        out,
        "- l0: {}",
        run.input
            .series
            .reference_length()
            .map(|v| format!("{v}"))
            .unwrap_or_else(|| "-".to_string())
    )?;
    writeln!(out, "- quenching step: {} rows (dT={})", run.quench.len(), config.quench_dt)?;

    writeln!(out, "\n## Lever rule")?;
    writeln!(out, "| baseline | range | coefficients (low order first) |")?;
    writeln!(out, "| - | - | - |")?;
    writeln!(out, "| before | {} | {:?} |", config.before, run.lever.before.coefficients)?;
    writeln!(out, "| after | {} | {:?} |", config.after, run.lever.after.coefficients)?;
    writeln!(out, "\nTemperature window: {} ({} points)", run.lever.window, run.lever.curve.len())?;

    let fit = &run.fit;
    writeln!(out, "\n## Koistinen-Marburger fit")?;
    writeln!(out, "- fraction window: {}", fit.window)?;
    writeln!(out, "- start: beta={:.6e}, Ms={:.4}", fit.initial.beta, fit.initial.ms)?;
    writeln!(out, "- result: beta={:.6e}, Ms={:.4}", fit.params.beta, fit.params.ms)?;
    writeln!(
        out,
        "- n={}, sse={:.6e}, rmse={:.6e}, iterations={}",
        fit.quality.n, fit.quality.sse, fit.quality.rmse, fit.quality.iterations
    )?;
    writeln!(out, "- {}", format_km_equation(&fit.params))?;

    writeln!(out, "\n## Residuals")?;
    writeln!(out, "| T | f | f_km | residual |")?;
    writeln!(out, "| - | - | - | - |")?;
    for r in &run.residuals {
        writeln!(
            out,
            "| {:.3} | {:.6} | {:.6} | {:.3e} |",
            r.temperature, r.observed, r.fitted, r.residual
        )?;
    }

    Ok(())
}
