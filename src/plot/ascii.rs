//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed points: `o`
//! - fitted curves / baselines: `-` and `=` lines

use crate::data::DilationSource;
use crate::domain::{FractionCurve, KmFit};
use crate::math::Polynomial;
use crate::models::predict;

/// Number of samples used to draw a smooth curve across the x range.
const CURVE_SAMPLES: usize = 101;

/// Observed fraction (`o`) with the fitted Koistinen-Marburger curve (`-`).
pub fn render_fraction_plot(curve: &FractionCurve, fit: &KmFit, width: usize, height: usize) -> String {
    let points: Vec<(f64, f64)> = curve
        .points()
        .into_iter()
        .filter(|&(_, f)| fit.window.contains(f))
        .collect();
    let Some((t_min, t_max)) = x_range(&points) else {
        return "Plot: no points in the fit window\n".to_string();
    };

    let fitted = sample(t_min, t_max, |t| predict(t, &fit.params));
    render_plot(&points, &[(fitted.as_slice(), '-')], (t_min, t_max), ("T", "f"), width, height)
}

/// Dilation of the quenching step (`o`) with both lever-rule baselines
/// (`-` before, `=` after) extrapolated across the whole temperature range.
/// The y axis is labelled after `source`.
pub fn render_dilation_plot(
    temperature: &[f64],
    dilation: &[f64],
    source: DilationSource,
    before: &Polynomial,
    after: &Polynomial,
    width: usize,
    height: usize,
) -> String {
    let points: Vec<(f64, f64)> = temperature
        .iter()
        .zip(dilation)
        .filter(|(t, d)| t.is_finite() && d.is_finite())
        .map(|(&t, &d)| (t, d))
        .collect();
    let Some((t_min, t_max)) = x_range(&points) else {
        return "Plot: no finite dilation samples\n".to_string();
    };

    let before_line = sample(t_min, t_max, |t| before.eval(t));
    let after_line = sample(t_min, t_max, |t| after.eval(t));
    render_plot(
        &points,
        &[(before_line.as_slice(), '-'), (after_line.as_slice(), '=')],
        (t_min, t_max),
        ("T", source.symbol()),
        width,
        height,
    )
}

fn render_plot(
    points: &[(f64, f64)],
    curves: &[(&[(f64, f64)], char)],
    (x_min, x_max): (f64, f64),
    (x_name, y_name): (&str, &str),
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    // The y range follows the observed points only so that extrapolated
    // baselines do not squash the data.
    let (y_min, y_max) = y_range(points).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Draw curves first (so points can overlay).
    for &(curve, ch) in curves {
        draw_curve(&mut grid, curve, ch, (x_min, x_max), (y_min, y_max));
    }

    for &(x, y) in points {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        grid[row][col] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {x_name}=[{x_min:.1}, {x_max:.1}] | {y_name}=[{y_min:.3}, {y_max:.3}]\n"
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn sample(x_min: f64, x_max: f64, f: impl Fn(f64) -> f64) -> Vec<(f64, f64)> {
    (0..CURVE_SAMPLES)
        .map(|i| {
            let u = i as f64 / (CURVE_SAMPLES as f64 - 1.0);
            let x = x_min + u * (x_max - x_min);
            (x, f(x))
        })
        .collect()
}

fn x_range(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    for &(x, _) in points {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
    }
    if min_x.is_finite() && max_x.is_finite() && max_x > min_x {
        Some((min_x, max_x))
    } else {
        None
    }
}

fn y_range(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &(_, y) in points {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], ch: char, x: (f64, f64), y: (f64, f64)) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(cx, cy) in curve {
        if !cy.is_finite() {
            prev = None;
            continue;
        }
        let col = map_x(cx, x.0, x.1, width);
        let row = map_y(cy, y.0, y.1, height);
        if let Some((c0, r0)) = prev {
            draw_line(grid, c0, r0, col, row, ch);
        } else if grid[row][col] == ' ' {
            grid[row][col] = ch;
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
