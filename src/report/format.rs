//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized

use crate::app::pipeline::FractionRun;
use crate::data::DilationSource;
use crate::domain::{FractionConfig, KmParams};
use crate::report::SegmentSummary;

/// `1 - exp[-β (Ms - T)]` with the fitted numbers filled in.
pub fn format_km_equation(params: &KmParams) -> String {
    format!("f = 1 - exp[-{:.4e} ({:.1} - T)]", params.beta, params.ms)
}

/// Format the segment table.
pub fn format_segments_table(title: &str, rows: &[SegmentSummary]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{title}: {} segment(s)\n", rows.len()));
    out.push_str(
        format!(
            "{:>4} {:<10} {:>7} {:>13} {:>21} {:>21} {:>21}\n",
            "#", "kind", "rows", "index", "time [s]", "T", "Tnom"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<4} {:-<10} {:-<7} {:-<13} {:-<21} {:-<21} {:-<21}\n",
            "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for r in rows {
        let index = match (r.first_index, r.last_index) {
            (Some(a), Some(b)) => format!("{a}..{b}"),
            _ => "-".to_string(),
        };
        out.push_str(
            format!(
                "{:>4} {:<10} {:>7} {:>13} {:>21} {:>21} {:>21}\n",
                r.ordinal,
                r.kind.display_name(),
                r.rows,
                index,
                fmt_span(r.time_start, r.time_end, 1),
                fmt_span(r.t_start, r.t_end, 1),
                fmt_span(r.tnom_start, r.tnom_end, 1),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

/// Format the summary of one fraction run.
pub fn format_fraction_summary(run: &FractionRun, config: &FractionConfig) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== {} ===\n", run.input.label()));
    if let Some(location) = run.input.location.as_deref().filter(|l| !l.is_empty()) {
        out.push_str(&format!("Location: {location}\n"));
    }
    out.push_str(&format!(
        "Rows: {} total | quenching step {} (dT={})\n",
        run.input.series.len(),
        run.quench.len(),
        config.quench_dt
    ));

    let source = match run.lever.source {
        DilationSource::LengthChange => "change in length",
        DilationSource::RelativeLengthChange => "relative change in length",
    };
    out.push_str(&format!("Dilation: {source}\n"));
    out.push_str(&format!(
        "Baselines: before {} slope={:.4e} | after {} slope={:.4e}\n",
        config.before,
        run.lever.before.slope(),
        config.after,
        run.lever.after.slope()
    ));
    out.push_str(&format!(
        "Fraction curve: {} points in T {}\n",
        run.lever.curve.len(),
        run.lever.window
    ));

    let fit = &run.fit;
    out.push_str("\nKoistinen-Marburger fit:\n");
    out.push_str(&format!("- window : f in {}\n", fit.window));
    out.push_str(&format!(
        "- start  : beta={:.5e} Ms={:.2}\n",
        fit.initial.beta, fit.initial.ms
    ));
    out.push_str(&format!("- beta   : {:.5e}\n", fit.params.beta));
    out.push_str(&format!("- Ms     : {:.2}\n", fit.params.ms));
    out.push_str(&format!(
        "- quality: n={} SSE={:.4e} RMSE={:.4e} iterations={}\n",
        fit.quality.n, fit.quality.sse, fit.quality.rmse, fit.quality.iterations
    ));
    out.push_str(&format!("- {}\n", format_km_equation(&fit.params)));

    out
}

fn fmt_span(a: Option<f64>, b: Option<f64>, decimals: usize) -> String {
    match (a, b) {
        (Some(a), Some(b)) => format!("{a:.decimals$} -> {b:.decimals$}"),
        _ => "-".to_string(),
    }
}
