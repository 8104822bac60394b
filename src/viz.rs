//! Elbow curve plot using Plotters

use crate::error::{Error, Result};
use crate::sweep::InertiaCurve;
use plotters::prelude::*;
use std::path::Path;
use tracing::info;

const CURVE_COLOR: RGBColor = BLUE;
const ELBOW_COLOR: RGBColor = RED;

fn plot_err<E: std::fmt::Display>(e: E) -> Error {
    Error::Plot(e.to_string())
}

/// Render the fitted points of an inertia curve as a PNG line plot.
///
/// The elbow, when given and fitted, is marked with a larger point and a
/// vertical guide line. Skipped k values leave a gap in the markers.
pub fn render_elbow_curve(
    curve: &InertiaCurve,
    elbow: Option<usize>,
    output_path: &Path,
) -> Result<()> {
    let points: Vec<(f64, f64)> = curve
        .defined()
        .into_iter()
        .map(|(k, sse)| (k as f64, sse))
        .collect();
    if points.is_empty() {
        return Err(Error::Plot("inertia curve has no fitted points".to_string()));
    }

    let x_min = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min) - 0.5;
    let x_max = points.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max) + 0.5;
    let y_peak = points.iter().map(|p| p.1).fold(0.0, f64::max);
    let y_max = if y_peak > 0.0 { y_peak * 1.1 } else { 1.0 };

    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .build_cartesian_2d(x_min..x_max, 0f64..y_max)
        .map_err(plot_err)?;

    chart
        .draw_series(LineSeries::new(points.iter().copied(), &CURVE_COLOR))
        .map_err(plot_err)?;
    chart
        .draw_series(
            points
                .iter()
                .map(|&p| Circle::new(p, 4, CURVE_COLOR.filled())),
        )
        .map_err(plot_err)?;

    if let Some(&(k, sse)) = elbow.and_then(|k| points.iter().find(|p| p.0 == k as f64)) {
        chart
            .draw_series(LineSeries::new(vec![(k, 0.0), (k, y_max)], &ELBOW_COLOR))
            .map_err(plot_err)?;
        chart
            .draw_series(std::iter::once(Circle::new((k, sse), 8, ELBOW_COLOR.filled())))
            .map_err(plot_err)?;
    }

    root.present().map_err(plot_err)?;
    info!(path = %output_path.display(), "Elbow curve saved");

    Ok(())
}
