//! Contour extraction with an adaptive simplification tolerance.
//!
//! Traces the edge mask, drops near-duplicate traces, then simplifies
//! every contour with Douglas-Peucker. While the total point count stays
//! above the budget the tolerance is raised and simplification repeats,
//! at most [`MAX_EPSILON_ITERATIONS`] times. If the budget is still not
//! met, all points are flattened into one contour and truncated.

use serde::{Deserialize, Serialize};

use crate::contour::{self, ContourTracer};
use crate::simplify::simplify_closed;
use crate::types::{GrayImage, PipelineError, Point, Polyline, centroid, reorder_for_loop};

/// Upper bound on tolerance adjustments before falling back to truncation.
pub const MAX_EPSILON_ITERATIONS: usize = 100;

/// A raw trace is "nearly closed" when its endpoints are closer than this
/// fraction of its bounding-box diagonal.
pub const NEARLY_CLOSED_FRACTION: f64 = 0.1;

/// How the adaptive simplification converged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Tolerance used for the returned contours.
    pub epsilon: f64,
    /// Number of tolerance adjustments made.
    pub iterations: usize,
    /// `true` if the budget could not be met and points were truncated.
    pub truncated: bool,
}

/// Output of [`extract_contours`].
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Simplified contours in trace order.
    pub contours: Vec<Polyline>,
    /// Convergence details.
    pub stats: ExtractionStats,
}

impl Extraction {
    /// Total number of points across all contours.
    #[must_use]
    pub fn total_points(&self) -> usize {
        self.contours.iter().map(Polyline::len).sum()
    }
}

/// Next tolerance given how many points the last pass was over budget.
///
/// Far over budget (more than 100 points) grows by 0.5, close to budget
/// (20 or fewer) by 0.1, and in between the step scales linearly from
/// 0.1 to 0.6.
#[must_use]
pub fn adjust_epsilon(epsilon: f64, points_over: usize) -> f64 {
    if points_over > 100 {
        epsilon + 0.5
    } else if points_over <= 20 {
        epsilon + 0.1
    } else {
        #[allow(clippy::cast_precision_loss)]
        let scale = (points_over - 20) as f64 / 80.0;
        0.5f64.mul_add(scale, epsilon + 0.1)
    }
}

/// `true` if the trace's endpoints are within [`NEARLY_CLOSED_FRACTION`]
/// of its bounding-box diagonal.
#[must_use]
pub fn is_nearly_closed(raw: &Polyline) -> bool {
    let (Some(first), Some(last), Some(bb)) = (raw.first(), raw.last(), raw.bounding_box()) else {
        return false;
    };
    first.distance(*last) < bb.diagonal() * NEARLY_CLOSED_FRACTION
}

/// Append the first point unless the contour already ends on it.
///
/// Single points are left alone.
#[must_use]
pub fn close_contour(mut points: Vec<Point>) -> Vec<Point> {
    if points.len() > 1 && points.first() != points.last() {
        points.push(points[0]);
    }
    points
}

/// Trace `mask`, deduplicate the traces, and simplify them to fit within
/// `max_points`.
///
/// # Errors
///
/// Returns [`PipelineError::NoContours`] if nothing survives
/// simplification.
pub fn extract_contours<T: ContourTracer + ?Sized>(
    mask: &GrayImage,
    tracer: &T,
    epsilon: f64,
    max_points: usize,
) -> Result<Extraction, PipelineError> {
    let raw = tracer.trace(mask);
    let traced = raw.len();
    let unique = contour::deduplicate(raw, contour::DEFAULT_SIMILARITY_THRESHOLD);
    tracing::debug!(traced, unique = unique.len(), "traced edge mask");

    simplify_to_budget(&unique, epsilon, max_points)
}

/// Simplify already-traced contours, raising the tolerance until the total
/// point count fits within `max_points`.
///
/// # Errors
///
/// Returns [`PipelineError::NoContours`] if `raw` yields no points.
pub fn simplify_to_budget(
    raw: &[Polyline],
    initial_epsilon: f64,
    max_points: usize,
) -> Result<Extraction, PipelineError> {
    let mut epsilon = initial_epsilon;
    let mut iterations = 0;

    loop {
        let contours = simplify_all(raw, epsilon)?;
        let total: usize = contours.iter().map(Polyline::len).sum();

        if total <= max_points {
            return finish(contours, epsilon, iterations, false);
        }

        let used = epsilon;
        epsilon = adjust_epsilon(epsilon, total - max_points);
        iterations += 1;

        if iterations >= MAX_EPSILON_ITERATIONS {
            tracing::warn!(
                total,
                max_points,
                epsilon = used,
                "point budget not reached, truncating"
            );
            let mut flat: Vec<Point> = contours.into_iter().flat_map(Polyline::into_points).collect();
            flat.truncate(max_points);
            return finish(vec![Polyline::new(flat)], used, iterations, true);
        }
    }
}

fn finish(
    contours: Vec<Polyline>,
    epsilon: f64,
    iterations: usize,
    truncated: bool,
) -> Result<Extraction, PipelineError> {
    if contours.is_empty() {
        return Err(PipelineError::NoContours);
    }
    let extraction = Extraction {
        contours,
        stats: ExtractionStats {
            epsilon,
            iterations,
            truncated,
        },
    };
    tracing::debug!(
        contours = extraction.contours.len(),
        points = extraction.total_points(),
        epsilon,
        iterations,
        "simplified contours"
    );
    Ok(extraction)
}

/// One simplification pass over every raw trace.
fn simplify_all(raw: &[Polyline], epsilon: f64) -> Result<Vec<Polyline>, PipelineError> {
    let mut out = Vec::with_capacity(raw.len());
    for trace in raw {
        let mut points = simplify_closed(trace, epsilon).into_points();
        if points.is_empty() {
            continue;
        }
        if is_nearly_closed(trace) {
            points = close_contour(points);
        }
        let polyline = Polyline::new(points);
        if polyline.is_closed() {
            let center = centroid(polyline.points())?;
            out.push(Polyline::new(reorder_for_loop(polyline.points(), center)));
        } else {
            out.push(polyline);
        }
    }
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::contour::ContourMode;

    /// Points on a circle, one per step, as a pixel tracer would report
    /// them (no repeated start).
    fn circle_trace(cx: f64, cy: f64, radius: f64, n: u32) -> Polyline {
        let points = (0..n)
            .map(|i| {
                let a = std::f64::consts::TAU * f64::from(i) / f64::from(n);
                Point::new((cx + radius * a.cos()).round(), (cy + radius * a.sin()).round())
            })
            .collect::<Vec<_>>();
        Polyline::new(crate::types::remove_consecutive_duplicates(&points))
    }

    #[test]
    fn adjust_epsilon_steps() {
        assert!((adjust_epsilon(1.0, 150) - 1.5).abs() < 1e-12);
        assert!((adjust_epsilon(1.0, 20) - 1.1).abs() < 1e-12);
        assert!((adjust_epsilon(1.0, 5) - 1.1).abs() < 1e-12);
        // Midpoint of the linear range: 0.1 + 0.5 * 0.5.
        assert!((adjust_epsilon(1.0, 60) - 1.35).abs() < 1e-12);
        assert!((adjust_epsilon(1.0, 100) - 1.6).abs() < 1e-12);
    }

    #[test]
    fn adjust_epsilon_grows_strictly() {
        let mut epsilon = 2.0;
        for _ in 0..50 {
            let next = adjust_epsilon(epsilon, 150);
            assert!(next > epsilon);
            epsilon = next;
        }
    }

    #[test]
    fn nearly_closed_detection() {
        let ring = circle_trace(50.0, 50.0, 20.0, 60);
        assert!(is_nearly_closed(&ring));

        let line = Polyline::new(vec![Point::new(0.0, 0.0), Point::new(30.0, 0.0)]);
        assert!(!is_nearly_closed(&line));

        assert!(!is_nearly_closed(&Polyline::new(vec![])));
    }

    #[test]
    fn close_contour_appends_first_point_once() {
        let pts = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)];
        let closed = close_contour(pts);
        assert_eq!(closed.len(), 3);
        assert_eq!(closed[0], closed[2]);
        assert_eq!(close_contour(closed.clone()), closed);
    }

    #[test]
    fn close_contour_leaves_single_point() {
        let pts = vec![Point::new(4.0, 4.0)];
        assert_eq!(close_contour(pts.clone()), pts);
    }

    #[test]
    fn traced_square_becomes_closed_corner_loop() {
        let mut pts = Vec::new();
        for i in 0..10 {
            pts.push(Point::new(10.0 + f64::from(i), 10.0));
        }
        for i in 0..10 {
            pts.push(Point::new(20.0, 10.0 + f64::from(i)));
        }
        for i in 0..10 {
            pts.push(Point::new(20.0 - f64::from(i), 20.0));
        }
        for i in 0..10 {
            pts.push(Point::new(10.0, 20.0 - f64::from(i)));
        }
        let extraction = simplify_to_budget(&[Polyline::new(pts)], 1.0, 1000).unwrap();
        assert!(!extraction.stats.truncated);
        assert_eq!(extraction.stats.iterations, 0);
        assert_eq!(
            extraction.contours[0].points(),
            &[
                Point::new(10.0, 10.0),
                Point::new(20.0, 10.0),
                Point::new(20.0, 20.0),
                Point::new(10.0, 20.0),
                Point::new(10.0, 10.0),
            ]
        );
    }

    #[test]
    fn epsilon_grows_until_budget_met() {
        let raw = vec![
            circle_trace(50.0, 50.0, 40.0, 250),
            circle_trace(150.0, 50.0, 40.0, 250),
        ];
        let extraction = simplify_to_budget(&raw, 0.5, 20).unwrap();
        assert!(extraction.total_points() <= 20);
        assert!(extraction.stats.iterations > 0);
        assert!(extraction.stats.epsilon > 0.5);
        assert!(!extraction.stats.truncated);
        assert_eq!(extraction.contours.len(), 2);
    }

    #[test]
    fn unreachable_budget_truncates() {
        // A closed contour never simplifies below a point plus its closing
        // repeat, so a budget of one can only be met by truncation.
        let raw = vec![circle_trace(50.0, 50.0, 20.0, 40)];
        let extraction = simplify_to_budget(&raw, 1.0, 1).unwrap();
        assert!(extraction.stats.truncated);
        assert_eq!(extraction.stats.iterations, MAX_EPSILON_ITERATIONS);
        assert_eq!(extraction.contours.len(), 1);
        assert_eq!(extraction.total_points(), 1);
    }

    #[test]
    fn no_traces_is_no_contours_error() {
        assert!(matches!(
            simplify_to_budget(&[], 2.0, 100),
            Err(PipelineError::NoContours)
        ));
        let blank = GrayImage::new(16, 16);
        assert!(matches!(
            extract_contours(&blank, &ContourMode::Tree, 2.0, 100),
            Err(PipelineError::NoContours)
        ));
    }

    #[test]
    fn extract_from_mask_finds_square() {
        let mut mask = GrayImage::new(40, 40);
        for y in 10..30 {
            for x in 10..30 {
                mask.put_pixel(x, y, image::Luma([255]));
            }
        }
        let extraction = extract_contours(&mask, &ContourMode::External, 2.0, 200).unwrap();
        assert_eq!(extraction.contours.len(), 1);
        let contour = &extraction.contours[0];
        assert!(contour.is_closed());
        // Four corners plus the closing repeat.
        assert_eq!(contour.len(), 5);
    }
}
