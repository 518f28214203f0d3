//! Path simplification using the Ramer-Douglas-Peucker algorithm.
//!
//! Reduces point count in polylines by removing points that are within
//! a given tolerance of the line between their neighbors.
//!
//! Traced contours are closed boundaries, so [`simplify_closed`] treats
//! the input as a polygon: it splits the ring at the vertex farthest from
//! the first one and simplifies both halves. The output does not repeat
//! the first point; closing is decided later by the extractor.

use crate::types::{Point, Polyline};

/// Simplify a closed boundary (polygon) with tolerance `tolerance`.
///
/// A trailing point equal to the first is ignored. The returned polygon
/// starts at the same point as the input and never repeats it at the
/// end.
#[must_use = "returns the simplified polygon"]
pub fn simplify_closed(polygon: &Polyline, tolerance: f64) -> Polyline {
    let mut ring = polygon.points();
    if ring.len() > 1 && ring.first() == ring.last() {
        ring = &ring[..ring.len() - 1];
    }
    if ring.len() < 3 {
        return Polyline::new(ring.to_vec());
    }

    let anchor = ring[0];
    let split = ring
        .iter()
        .enumerate()
        .skip(1)
        .max_by(|(_, a), (_, b)| {
            a.distance_squared(anchor)
                .total_cmp(&b.distance_squared(anchor))
        })
        .map_or(ring.len() / 2, |(idx, _)| idx);

    // First half: anchor .. split. Second half: split .. end, back to anchor.
    let first_half = simplify_span(&ring[..=split], tolerance);
    let mut second: Vec<Point> = ring[split..].to_vec();
    second.push(anchor);
    let second_half = simplify_span(&second, tolerance);

    let mut out = first_half;
    // Skip the shared split point and the returning anchor.
    out.extend_from_slice(&second_half[1..second_half.len() - 1]);
    Polyline::new(out)
}

/// RDP over an open span whose first and last points are always kept.
///
/// Points within `tolerance` pixels of the line between their kept
/// neighbors are removed. A tolerance of 0.0 preserves all points and
/// spans with fewer than 3 points are returned unchanged.
fn simplify_span(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut kept = vec![false; points.len()];
    kept[0] = true;
    kept[points.len() - 1] = true;

    rdp_recurse(points, 0, points.len() - 1, tolerance, &mut kept);

    points
        .iter()
        .zip(&kept)
        .filter(|&(_, k)| *k)
        .map(|(&p, _)| p)
        .collect()
}

/// Recursive step of the Ramer-Douglas-Peucker algorithm.
///
/// Finds the point between `start` and `end` that is farthest from the
/// line segment between them. If that distance exceeds `tolerance`, the
/// point is kept and both sub-segments are processed recursively.
fn rdp_recurse(points: &[Point], start: usize, end: usize, tolerance: f64, kept: &mut [bool]) {
    if end <= start + 1 {
        return;
    }

    let mut max_dist = 0.0;
    let mut max_idx = start;

    for i in (start + 1)..end {
        let d = perpendicular_distance(points[i], points[start], points[end]);
        if d > max_dist {
            max_dist = d;
            max_idx = i;
        }
    }

    if max_dist > tolerance {
        kept[max_idx] = true;
        rdp_recurse(points, start, max_idx, tolerance, kept);
        rdp_recurse(points, max_idx, end, tolerance, kept);
    }
}

/// Perpendicular distance from point `p` to the line defined by `a` and `b`.
///
/// Uses the formula: |cross(b-a, p-a)| / |b-a|.
/// When `a` and `b` coincide, returns the distance from `p` to `a`.
fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx.mul_add(dx, dy * dy);

    if length_sq == 0.0 {
        return p.distance(a);
    }

    let cross = dx.mul_add(a.y - p.y, -(dy * (a.x - p.x)));
    cross.abs() / length_sq.sqrt()
}
