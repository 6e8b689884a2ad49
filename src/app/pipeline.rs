//! Shared "fraction pipeline" logic used by the CLI front-end.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load -> quenching step -> lever rule -> KM fit -> residuals
//!
//! Several files are processed in parallel; each worker owns its series.

use std::path::{Path, PathBuf};

use log::info;
use rayon::prelude::*;

use crate::data::{Series, find_quenching_step};
use crate::domain::{FractionConfig, KmFit};
use crate::error::AppError;
use crate::fit::{TransformedFraction, fit_km, transformed_fraction};
use crate::io::ingest::{LoadedSeries, load_series};
use crate::report::{FitResidual, compute_residuals};

/// All computed outputs of a single `dil fraction` run on one file.
#[derive(Debug, Clone)]
pub struct FractionRun {
    pub input: LoadedSeries,
    pub quench: Series,
    pub lever: TransformedFraction,
    pub fit: KmFit,
    pub residuals: Vec<FitResidual>,
}

/// Load `path` and run the full pipeline on it.
pub fn run_fraction(path: &Path, config: &FractionConfig) -> Result<FractionRun, AppError> {
    let input = load_series(path, config.reference_length)?;
    run_fraction_on(input, config)
}

/// Run the pipeline on an already loaded file.
pub fn run_fraction_on(input: LoadedSeries, config: &FractionConfig) -> Result<FractionRun, AppError> {
    let label = input.label();

    // 1) Final cooling step.
    let quench = find_quenching_step(&input.series, config.quench_dt)
        .map_err(|e| AppError::from(e).context(&label))?;
    info!("{label}: quenching step has {} rows", quench.len());

    // 2) Lever rule between the two linear regions.
    let lever = transformed_fraction(&quench, config.before, config.after)
        .map_err(|e| AppError::from(e).context(&label))?;

    // 3) Koistinen-Marburger fit.
    let fit = fit_km(
        &lever.curve.temperature,
        &lever.curve.fraction,
        config.fraction_window,
        config.initial_guess,
    )
    .map_err(|e| AppError::from(e).context(&label))?;

    // 4) Residuals over the fitted window.
    let residuals = compute_residuals(&lever.curve, &fit).map_err(|e| e.context(&label))?;

    Ok(FractionRun {
        input,
        quench,
        lever,
        fit,
        residuals,
    })
}

/// Run the pipeline on every file in parallel; results keep the input order.
pub fn run_fraction_batch(paths: &[PathBuf], config: &FractionConfig) -> Vec<Result<FractionRun, AppError>> {
    paths
        .par_iter()
        .map(|path| run_fraction(path, config))
        .collect()
}
