//! Polar conversion: Cartesian draw points to `(r, theta)` pairs for a
//! two-motor table.
//!
//! The drawing is centered on the midpoint of its bounding box. Radii are
//! scaled so the farthest point sits at [`MAX_RADIUS`]. Theta is measured
//! counterclockwise from the positive x axis with image y pointing down,
//! and is unwound into a continuous trace: each step takes the equivalent
//! angle closest to the previous one, so multi-turn paths never alias.
//! Angles are reported in tenths of a degree.

use std::f64::consts::{PI, TAU};

use crate::types::{PipelineError, Point, PolarPoint};

/// Radius assigned to the point farthest from the center.
pub const MAX_RADIUS: f64 = 1000.0;

/// Tenths of a degree per radian.
pub const TENTHS_PER_RADIAN: f64 = 1800.0 / PI;

/// Midpoint of the bounding box of `points`.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidInput`] if `points` is empty.
pub fn bounding_center(points: &[Point]) -> Result<Point, PipelineError> {
    let Some(first) = points.first() else {
        return Err(PipelineError::InvalidInput(
            "center of an empty point set".to_string(),
        ));
    };
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Ok(Point::new(f64::midpoint(min_x, max_x), f64::midpoint(min_y, max_y)))
}

/// Convert `points` to continuous polar coordinates.
///
/// When every point coincides with the center all radii are zero. A point
/// exactly at the center has no direction; it reuses the previous angle
/// (zero for the first point).
///
/// # Errors
///
/// Returns [`PipelineError::InvalidInput`] if `points` is empty.
pub fn to_polar(points: &[Point]) -> Result<Vec<PolarPoint>, PipelineError> {
    let center = bounding_center(points)?;
    let offsets: Vec<(f64, f64)> = points
        .iter()
        .map(|p| (p.x - center.x, p.y - center.y))
        .collect();

    let max_dist = offsets
        .iter()
        .map(|&(dx, dy)| dx.hypot(dy))
        .fold(0.0, f64::max);
    let scale = if max_dist > 0.0 {
        MAX_RADIUS / max_dist
    } else {
        0.0
    };

    let mut prev_theta: Option<f64> = None;
    let polar = offsets
        .into_iter()
        .map(|(dx, dy)| {
            let dist = dx.hypot(dy);
            let theta = if dist == 0.0 {
                prev_theta.unwrap_or(0.0)
            } else {
                // Negated so counterclockwise on screen is positive.
                let raw = -dy.atan2(dx);
                prev_theta.map_or(raw, |prev| prev + wrap_delta(raw - prev))
            };
            prev_theta = Some(theta);
            PolarPoint::new(dist * scale, theta * TENTHS_PER_RADIAN)
        })
        .collect();

    Ok(polar)
}

/// Reduce an angle difference to `[-π, π]`.
fn wrap_delta(delta: f64) -> f64 {
    let mut d = delta % TAU;
    if d > PI {
        d -= TAU;
    } else if d < -PI {
        d += TAU;
    }
    d
}

/// Repeat the last point of every contour except the final one, so a
/// consumer can tell where the pen lifts.
///
/// `segment_ends` holds ascending indices into `polar` of the points where
/// a segment ends; each gets a copy inserted right after it. In loop mode
/// the final point is repeated as well. Indices past the end of `polar`
/// are ignored.
#[must_use = "returns the points with pen-up markers"]
pub fn insert_pen_up_markers(
    polar: &[PolarPoint],
    segment_ends: &[usize],
    is_loop: bool,
) -> Vec<PolarPoint> {
    let mut out = Vec::with_capacity(polar.len() + segment_ends.len() + 1);
    let mut ends = segment_ends.iter().copied().peekable();

    for (i, &p) in polar.iter().enumerate() {
        out.push(p);
        while let Some(end) = ends.next_if(|&end| end <= i) {
            if end == i {
                out.push(p);
            }
        }
    }

    if is_loop && let Some(&last) = out.last() {
        out.push(last);
    }
    out
}
