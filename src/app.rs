//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments (after loading `.env`)
//! - loads instrument files
//! - runs segmentation, derivatives, expansion coefficients or the KM pipeline
//! - prints reports/plots
//! - writes optional exports

use std::path::{Path, PathBuf};

use clap::Parser;
use log::{error, info};

use crate::cli::{AlphaArgs, Command, DerivativeArgs, FractionArgs, MergeArgs, RangeArgs, SegmentsArgs};
use crate::data::{merge_segments, segments_by_temperature_range, split_segments};
use crate::domain::{AlphaOptions, FractionConfig, Interval, KmParams, Selection};
use crate::error::{AppError, DilError};
use crate::io::{load_series, write_table_csv};
use crate::math::smooth_derivative;
use crate::report::{format_segments_table, summarize_segments};

pub mod pipeline;

/// Entry point for the `dil` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = crate::cli::Cli::parse();
    crate::cli::init_logging(cli.verbose);

    let l0 = cli.l0;
    match cli.command {
        Command::Segments(args) => handle_segments(args, l0),
        Command::Range(args) => handle_range(args, l0),
        Command::Merge(args) => handle_merge(args, l0),
        Command::Derivative(args) => handle_derivative(args, l0),
        Command::Alpha(args) => handle_alpha(args, l0),
        Command::Fraction(args) => handle_fraction(args, l0),
    }
}

fn handle_segments(args: SegmentsArgs, l0: Option<f64>) -> Result<(), AppError> {
    let input = load_series(&args.file, l0)?;
    let segments = split_segments(&input.series).map_err(|e| AppError::from(e).context(input.label()))?;
    let rows = summarize_segments(&segments);

    println!("{}", format_segments_table(&input.label(), &rows));
    if let Some(path) = &args.export {
        crate::io::export::write_segments_csv(path, &rows)?;
        info!("wrote {}", path.display());
    }
    Ok(())
}

fn handle_range(args: RangeArgs, l0: Option<f64>) -> Result<(), AppError> {
    let range = Interval::new(args.tmin, args.tmax)?;
    let input = load_series(&args.file, l0)?;
    let segments =
        segments_by_temperature_range(&input.series, range).map_err(|e| AppError::from(e).context(input.label()))?;
    let rows = summarize_segments(&segments);

    println!("{}", format_segments_table(&format!("{} T in {range}", input.label()), &rows));
    if let Some(path) = &args.export {
        crate::io::export::write_segments_csv(path, &rows)?;
        info!("wrote {}", path.display());
    }
    Ok(())
}

fn handle_merge(args: MergeArgs, l0: Option<f64>) -> Result<(), AppError> {
    let input = load_series(&args.file, l0)?;
    let segments = split_segments(&input.series).map_err(|e| AppError::from(e).context(input.label()))?;

    let to = args.to.unwrap_or(segments.len().saturating_sub(1));
    if args.from > to || to >= segments.len() {
        return Err(AppError::new(
            2,
            format!(
                "Segment range {}..={to} is out of bounds ({} segment(s)).",
                args.from,
                segments.len()
            ),
        ));
    }

    let merged = merge_segments(&segments[args.from..=to], l0)?;
    write_table_csv(&args.output, merged.table())?;
    println!(
        "Merged segments {}..={to} ({} rows) into {}",
        args.from,
        merged.len(),
        args.output.display()
    );
    Ok(())
}

fn handle_derivative(args: DerivativeArgs, l0: Option<f64>) -> Result<(), AppError> {
    let input = load_series(&args.file, l0)?;
    let series = &input.series;
    let temperature = series.require_temperature()?;
    let dll0 = series.relative_length_change();
    if dll0.is_empty() {
        return Err(AppError::from(DilError::missing_channel(
            "relative change in length (provide it, or a change in length with --l0)",
        ))
        .context(input.label()));
    }

    let derivative = smooth_derivative(temperature, dll0, args.window)?;
    let finite: Vec<f64> = derivative.iter().copied().filter(|v| v.is_finite()).collect();
    let (lo, hi) = finite
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    println!("=== {} ===", input.label());
    println!(
        "d(dl/l0)/dT: window={} | {} of {} positions defined",
        args.window,
        finite.len(),
        derivative.len()
    );
    if !finite.is_empty() {
        println!("range: [{lo:.4e}, {hi:.4e}]");
    }

    if let Some(path) = &args.export {
        crate::io::export::write_derivative_csv(path, temperature, &derivative)?;
        info!("wrote {}", path.display());
    }
    Ok(())
}

fn handle_alpha(args: AlphaArgs, l0: Option<f64>) -> Result<(), AppError> {
    let mut input = load_series(&args.file, l0)?;
    let opts = alpha_options_from_args(&args, input.series.temperature())?;

    let alpha = input
        .series
        .linear_expansion_coefficient(args.t0, args.t1, args.deg, &opts)
        .map_err(|e| AppError::from(e).context(input.label()))?;

    println!("=== {} ===", input.label());
    println!("alpha({}, {}) = {alpha:.6e} 1/K", args.t0, args.t1);
    println!("polynomial (low order first): {:?}", input.series.fit_coefficients());
    Ok(())
}

fn handle_fraction(args: FractionArgs, l0: Option<f64>) -> Result<(), AppError> {
    let config = fraction_config_from_args(&args, l0)?;
    let results = pipeline::run_fraction_batch(&args.files, &config);

    let mut first_error = None;
    for result in results {
        let outcome = result.and_then(|run| report_fraction_run(&run, &config));
        if let Err(err) = outcome {
            error!("{err}");
            first_error.get_or_insert(err);
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn report_fraction_run(run: &pipeline::FractionRun, config: &FractionConfig) -> Result<(), AppError> {
    println!("{}", crate::report::format_fraction_summary(run, config));

    if config.plot {
        if let (Ok((dilation, source)), Ok(temperature)) = (run.quench.dilation(), run.quench.require_temperature()) {
            println!(
                "{}",
                crate::plot::render_dilation_plot(
                    temperature,
                    dilation,
                    source,
                    &run.lever.before,
                    &run.lever.after,
                    config.plot_width,
                    config.plot_height,
                )
            );
        }
        println!(
            "{}",
            crate::plot::render_fraction_plot(&run.lever.curve, &run.fit, config.plot_width, config.plot_height)
        );
    }

    let stem = file_stem(&run.input.path);
    if let Some(dir) = &config.export_dir {
        std::fs::create_dir_all(dir)
            .map_err(|e| AppError::new(2, format!("Failed to create export dir '{}': {e}", dir.display())))?;

        let csv_path = dir.join(format!("{stem}_fraction.csv"));
        crate::io::export::write_fraction_csv(&csv_path, &run.lever, &run.fit)?;
        let json_path = dir.join(format!("{stem}_fit.json"));
        crate::io::fit_json::write_fit_json(&json_path, &crate::io::fit_json::build_fit_file(run, config))?;
        info!("wrote {} and {}", csv_path.display(), json_path.display());
    }

    if config.debug {
        let dir = config.export_dir.clone().unwrap_or_else(|| PathBuf::from("debug"));
        let path = crate::debug::write_debug_bundle(run, config, &dir)?;
        println!("Debug bundle: {}", path.display());
    }

    Ok(())
}

pub fn fraction_config_from_args(args: &FractionArgs, l0: Option<f64>) -> Result<FractionConfig, AppError> {
    // clap makes --beta0 and --ms0 require each other.
    let initial_guess = args.beta0.zip(args.ms0).map(|(beta, ms)| KmParams { beta, ms });
    if !(args.dt.is_finite() && args.dt >= 0.0) {
        return Err(AppError::new(2, format!("--dt must be a finite non-negative number (got {}).", args.dt)));
    }

    Ok(FractionConfig {
        reference_length: l0,
        before: interval_arg("--before", &args.before)?,
        after: interval_arg("--after", &args.after)?,
        fraction_window: interval_arg("--frng", &args.frng)?,
        initial_guess,
        quench_dt: args.dt,
        plot: args.plot,
        plot_width: args.width,
        plot_height: args.height,
        export_dir: args.export_dir.clone(),
        debug: args.debug,
    })
}

pub fn alpha_options_from_args(args: &AlphaArgs, temperature: &[f64]) -> Result<AlphaOptions, AppError> {
    let selection = match (args.tmin, args.tmax) {
        (None, None) => None,
        (tmin, tmax) => {
            let range = Interval::new(tmin.unwrap_or(f64::NEG_INFINITY), tmax.unwrap_or(f64::INFINITY))?;
            Some(Selection::Mask(range.mask(temperature)))
        }
    };
    Ok(AlphaOptions {
        selection,
        reference_length: None,
    })
}

fn interval_arg(flag: &str, values: &[f64]) -> Result<Interval, AppError> {
    match values {
        [a, b] => Interval::new(*a, *b).map_err(|e| AppError::from(e).context(flag)),
        _ => Err(AppError::new(2, format!("{flag} expects two values."))),
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fraction_args(extra: &[&str]) -> FractionArgs {
        let mut argv = vec!["dil", "fraction", "a.asc", "--before", "800", "600", "--after", "150", "50"];
        argv.extend_from_slice(extra);
        let cli = crate::cli::Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Command::Fraction(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn fraction_config_sorts_ranges_and_keeps_guess() {
        let args = fraction_args(&["--beta0", "0.02", "--ms0", "360", "--dt", "2.5"]);
        let config = fraction_config_from_args(&args, Some(10.0)).unwrap();
        assert_eq!(config.before, Interval { lo: 600.0, hi: 800.0 });
        assert_eq!(config.after, Interval { lo: 50.0, hi: 150.0 });
        assert_eq!(config.fraction_window, Interval { lo: 0.05, hi: 1.0 });
        assert_eq!(config.initial_guess, Some(KmParams { beta: 0.02, ms: 360.0 }));
        assert_eq!(config.quench_dt, 2.5);
        assert_eq!(config.reference_length, Some(10.0));
    }

    #[test]
    fn no_starting_point_without_both_flags() {
        let args = fraction_args(&[]);
        assert_eq!(fraction_config_from_args(&args, None).unwrap().initial_guess, None);
    }

    #[test]
    fn negative_dt_is_rejected() {
        let args = fraction_args(&["--dt", "-1"]);
        assert_eq!(fraction_config_from_args(&args, None).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn alpha_mask_from_temperature_bounds() {
        let cli = crate::cli::Cli::try_parse_from(["dil", "alpha", "a.asc", "--t0", "0", "--t1", "1", "--tmin", "15"])
            .unwrap();
        let Command::Alpha(args) = cli.command else {
            panic!("expected alpha");
        };
        let opts = alpha_options_from_args(&args, &[10.0, 20.0, 30.0]).unwrap();
        assert_eq!(opts.selection, Some(Selection::Mask(vec![false, true, true])));
    }
}
