//! Command-line parsing for the dilatometry toolkit.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the segmentation/fitting code.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "dil", version, about = "Dilatometry segmentation and transformation kinetics")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reference sample length l0 (same unit as the change in length).
    #[arg(long, env = "DIL_L0", global = true)]
    pub l0: Option<f64>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Split a file into isothermal and ramp segments and print a summary.
    Segments(SegmentsArgs),
    /// Split a file into contiguous runs inside a temperature range.
    Range(RangeArgs),
    /// Merge consecutive segments and write the merged table as CSV.
    Merge(MergeArgs),
    /// Smoothing derivative of the relative length change against temperature.
    Derivative(DerivativeArgs),
    /// Mean linear expansion coefficient between two temperatures.
    Alpha(AlphaArgs),
    /// Quenching step -> lever rule -> Koistinen-Marburger fit, for each file.
    Fraction(FractionArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct SegmentsArgs {
    /// Input file (`.asc` instrument export or `.csv`).
    pub file: PathBuf,

    /// Export the segment summary to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct RangeArgs {
    pub file: PathBuf,

    /// Lower temperature bound (inclusive).
    #[arg(long, allow_negative_numbers = true)]
    pub tmin: f64,

    /// Upper temperature bound (inclusive).
    #[arg(long, allow_negative_numbers = true)]
    pub tmax: f64,

    /// Export the segment summary to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct MergeArgs {
    pub file: PathBuf,

    /// First segment to merge (0-based, as printed by `dil segments`).
    #[arg(long)]
    pub from: usize,

    /// Last segment to merge (inclusive; defaults to the last segment).
    #[arg(long)]
    pub to: Option<usize>,

    /// Output CSV for the merged table.
    #[arg(short, long)]
    pub output: PathBuf,
}

#[derive(Debug, Parser, Clone)]
pub struct DerivativeArgs {
    pub file: PathBuf,

    /// Half-width of the regression window (samples on each side).
    #[arg(long, default_value_t = 10)]
    pub window: usize,

    /// Export `temperature,derivative` to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct AlphaArgs {
    pub file: PathBuf,

    /// Lower evaluation temperature.
    #[arg(long, allow_negative_numbers = true)]
    pub t0: f64,

    /// Upper evaluation temperature.
    #[arg(long, allow_negative_numbers = true)]
    pub t1: f64,

    /// Degree of the fitted polynomial.
    #[arg(long, default_value_t = 1)]
    pub deg: usize,

    /// Only fit rows with temperature >= TMIN.
    #[arg(long, allow_negative_numbers = true)]
    pub tmin: Option<f64>,

    /// Only fit rows with temperature <= TMAX.
    #[arg(long, allow_negative_numbers = true)]
    pub tmax: Option<f64>,
}

#[derive(Debug, Parser, Clone)]
pub struct FractionArgs {
    /// Input files; several files are processed in parallel.
    #[arg(required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Linear temperature range before the transformation (austenite).
    #[arg(long, num_args = 2, value_names = ["A", "B"], required = true, allow_negative_numbers = true)]
    pub before: Vec<f64>,

    /// Linear temperature range after the transformation (martensite).
    #[arg(long, num_args = 2, value_names = ["A", "B"], required = true, allow_negative_numbers = true)]
    pub after: Vec<f64>,

    /// Fraction window of the points used by the KM fit.
    #[arg(long, num_args = 2, value_names = ["LO", "HI"], default_values_t = [0.05, 1.0])]
    pub frng: Vec<f64>,

    /// Starting beta for the KM fit (requires --ms0).
    #[arg(long, requires = "ms0")]
    pub beta0: Option<f64>,

    /// Starting Ms for the KM fit (requires --beta0).
    #[arg(long, requires = "beta0", allow_negative_numbers = true)]
    pub ms0: Option<f64>,

    /// Quenching step starts at the last sample within DT of the peak temperature.
    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    pub dt: f64,

    /// Render ASCII plots of the dilation and the fit.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Write `<stem>_fraction.csv` and `<stem>_fit.json` per input into DIR.
    #[arg(long, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,

    /// Write a markdown debug bundle per input (into the export dir, or `debug/`).
    #[arg(long)]
    pub debug: bool,
}

/// Initialise `env_logger` with a default level chosen by `-v`.
pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    // A second call (e.g. from tests) keeps the first logger.
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fraction_ranges() {
        let cli = Cli::try_parse_from([
            "dil", "-v", "fraction", "a.asc", "b.asc", "--before", "800", "600", "--after", "150", "50",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        let Command::Fraction(args) = cli.command else {
            panic!("expected fraction");
        };
        assert_eq!(args.files.len(), 2);
        assert_eq!(args.before, vec![800.0, 600.0]);
        assert_eq!(args.after, vec![150.0, 50.0]);
        assert_eq!(args.frng, vec![0.05, 1.0]);
        assert_eq!(args.dt, 1.0);
        assert!(args.beta0.is_none());
    }

    #[test]
    fn beta0_requires_ms0() {
        let res = Cli::try_parse_from([
            "dil", "fraction", "a.asc", "--before", "800", "600", "--after", "150", "50", "--beta0", "0.01",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn global_l0_after_subcommand() {
        let cli = Cli::try_parse_from(["dil", "alpha", "a.asc", "--t0", "100", "--t1", "200", "--l0", "10"]).unwrap();
        assert_eq!(cli.l0, Some(10.0));
        let Command::Alpha(args) = cli.command else {
            panic!("expected alpha");
        };
        assert_eq!(args.deg, 1);
    }
}
