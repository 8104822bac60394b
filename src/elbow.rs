//! Elbow detection on the inertia-vs-k curve

use crate::sweep::InertiaCurve;
use tracing::debug;

/// Distances at or below this are treated as lying on the chord
const MIN_DISTANCE: f64 = 1e-12;

/// Find the elbow of a convex, decreasing inertia curve.
///
/// Both axes are normalized to [0, 1]; the elbow is the k whose point lies
/// farthest below the chord joining the first and last points. Undefined
/// steps are ignored. Returns `None` when fewer than three points are
/// defined or the curve does not decrease with a bulge below its chord.
pub fn detect(curve: &InertiaCurve) -> Option<usize> {
    let points = curve.defined();
    if points.len() < 3 {
        debug!(points = points.len(), "Too few points for elbow detection");
        return None;
    }

    let (first_k, first_sse) = points[0];
    let (last_k, last_sse) = points[points.len() - 1];
    if last_sse >= first_sse || last_k <= first_k {
        debug!("Inertia curve is not decreasing");
        return None;
    }

    let (y_min, y_max) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, y)| {
            (lo.min(y), hi.max(y))
        });
    let x_span = (last_k - first_k) as f64;
    let y_span = y_max - y_min;
    if y_span <= 0.0 {
        return None;
    }

    let normalize = |(k, sse): (usize, f64)| {
        ((k as f64 - first_k as f64) / x_span, (sse - y_min) / y_span)
    };
    let (x0, y0) = normalize(points[0]);
    let (x1, y1) = normalize(points[points.len() - 1]);
    let chord_len = ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt();

    let mut best: Option<(usize, f64)> = None;
    for &point in &points[1..points.len() - 1] {
        let (x, y) = normalize(point);
        // Signed perpendicular distance, positive below the chord.
        let distance = ((y1 - y0) * x - (x1 - x0) * y + x1 * y0 - y1 * x0) / chord_len;
        if distance > MIN_DISTANCE && best.map_or(true, |(_, d)| distance > d) {
            best = Some((point.0, distance));
        }
    }

    debug!(elbow = ?best.map(|(k, _)| k), "Elbow detection finished");
    best.map(|(k, _)| k)
}
