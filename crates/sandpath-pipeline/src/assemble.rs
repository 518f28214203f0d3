//! Path assembly: interleave ordered contours with connector paths and
//! flatten them into the single point sequence the table draws.
//!
//! Connectors come from the jump router when jump minimization is on.
//! Every connector found is added to the set of drawn paths, so later
//! connectors can retrace it. In loop mode the last contour is also
//! connected back to the first.

use crate::route::find_connector;
use crate::types::{PipelineError, Point, Polyline, centroid};

/// Divisor applied to the tolerance when choosing interpolation density:
/// segments get one sample per `epsilon * INTERPOLATION_SPACING` pixels.
pub const INTERPOLATION_SPACING: f64 = 5.0;

/// Interleave `ordered` contours with connector paths.
///
/// Returns `contour₀, connector₀₁, contour₁, …, contourₙ`. Connectors are
/// only present when `minimize_jumps` is set and the router found a
/// route. In loop mode the sequence ends with the connector from the last
/// contour back to the first instead of the bare last contour.
#[must_use = "returns the contours interleaved with connectors"]
pub fn connect_contours(ordered: &[Polyline], is_loop: bool, minimize_jumps: bool) -> Vec<Polyline> {
    let n = ordered.len();
    if n == 0 {
        return Vec::new();
    }

    let mut drawn: Vec<Polyline> = ordered.to_vec();
    let mut result = Vec::with_capacity(2 * n);
    let links = if is_loop { n } else { n - 1 };

    for i in 0..links {
        let current = &ordered[i];
        let next = &ordered[(i + 1) % n];
        result.push(current.clone());

        if !minimize_jumps {
            continue;
        }
        let (Some(&start), Some(&end)) = (current.last(), next.first()) else {
            continue;
        };
        let connector = find_connector(&drawn, start, end);
        if !connector.is_empty() {
            tracing::debug!(from = i, points = connector.len(), "routed connector");
            drawn.push(connector.clone());
            result.push(connector);
        }
    }

    if !is_loop {
        result.push(ordered[n - 1].clone());
    }

    result
}

/// Resample every segment of `polyline` with evenly spaced points.
///
/// A segment of length `d` becomes `max(2, ceil(d / (epsilon * 5)))`
/// points including both ends. Shared vertices are emitted once.
#[must_use = "returns the interpolated polyline"]
pub fn interpolate(polyline: &Polyline, epsilon: f64) -> Polyline {
    let points = polyline.points();
    if points.len() <= 1 {
        return polyline.clone();
    }

    let spacing = epsilon * INTERPOLATION_SPACING;
    let mut out = Vec::new();
    for (i, pair) in points.windows(2).enumerate() {
        let (a, b) = (pair[0], pair[1]);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let samples = ((a.distance(b) / spacing).ceil() as usize).max(2);
        let is_last_segment = i == points.len() - 2;
        let emitted = if is_last_segment { samples } else { samples - 1 };

        for k in 0..emitted {
            #[allow(clippy::cast_precision_loss)]
            let t = k as f64 / (samples - 1) as f64;
            out.push(Point::new(
                t.mul_add(b.x - a.x, a.x),
                t.mul_add(b.y - a.y, a.y),
            ));
        }
    }
    Polyline::new(out)
}

/// The flattened draw sequence with its segment boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    /// Points in draw order.
    pub points: Vec<Point>,
    /// Ascending indices into `points` where a segment other than the
    /// last one ends.
    pub segment_ends: Vec<usize>,
}

/// Flatten the processed contours into the final draw sequence.
///
/// A closed sequence, or any sequence in loop mode, is rotated to start
/// at the point nearest its centroid. Consecutive duplicates are removed
/// and a trailing repeat of the first point is dropped. The end of every
/// segment but the last is tracked through these steps; where a segment
/// end merges with the next segment's start, the merged point is the end.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidInput`] if `processed` holds no
/// points.
pub fn assemble_points(processed: &[Polyline], is_loop: bool) -> Result<Assembly, PipelineError> {
    let last_segment = processed.len().saturating_sub(1);
    let flat: Vec<(Point, bool)> = processed
        .iter()
        .enumerate()
        .flat_map(|(si, segment)| {
            let end = segment.len().saturating_sub(1);
            segment
                .points()
                .iter()
                .enumerate()
                .map(move |(pi, &p)| (p, si < last_segment && pi == end))
        })
        .collect();
    let (Some(first), Some(last)) = (flat.first(), flat.last()) else {
        return Err(PipelineError::InvalidInput(
            "no points to assemble".to_string(),
        ));
    };

    let closed = first.0 == last.0;
    let rotated = if closed || is_loop {
        let points: Vec<Point> = flat.iter().map(|&(p, _)| p).collect();
        let start = nearest_index(&points, centroid(&points)?);
        flat[start..]
            .iter()
            .chain(&flat[..=start])
            .copied()
            .collect()
    } else {
        flat
    };

    let mut tagged: Vec<(Point, bool)> = Vec::with_capacity(rotated.len());
    for (p, is_end) in rotated {
        match tagged.last_mut() {
            Some((q, q_end)) if *q == p => *q_end |= is_end,
            _ => tagged.push((p, is_end)),
        }
    }
    if tagged.len() > 1
        && tagged.first().map(|t| t.0) == tagged.last().map(|t| t.0)
        && let Some((_, is_end)) = tagged.pop()
    {
        tagged[0].1 |= is_end;
    }

    Ok(Assembly {
        points: tagged.iter().map(|&(p, _)| p).collect(),
        segment_ends: tagged
            .iter()
            .enumerate()
            .filter(|&(_, &(_, is_end))| is_end)
            .map(|(i, _)| i)
            .collect(),
    })
}

/// Index of the point nearest `target`; ties go to the lowest index.
fn nearest_index(points: &[Point], target: Point) -> usize {
    let mut best_idx = 0;
    let mut best_dist = f64::INFINITY;
    for (i, p) in points.iter().enumerate() {
        let d = p.distance(target);
        if d < best_dist {
            best_dist = d;
            best_idx = i;
        }
    }
    best_idx
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(points: &[(f64, f64)]) -> Polyline {
        Polyline::new(points.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    #[test]
    fn connect_empty_is_empty() {
        assert!(connect_contours(&[], false, true).is_empty());
    }

    #[test]
    fn connect_without_routing_keeps_contours() {
        let a = line(&[(0.0, 0.0), (1.0, 0.0)]);
        let b = line(&[(5.0, 0.0), (6.0, 0.0)]);
        let result = connect_contours(&[a.clone(), b.clone()], false, false);
        assert_eq!(result, vec![a, b]);
    }

    #[test]
    fn connect_inserts_connector_between_contours() {
        let a = line(&[(0.0, 0.0), (1.0, 0.0)]);
        let b = line(&[(5.0, 0.0), (6.0, 0.0)]);
        let result = connect_contours(&[a.clone(), b.clone()], false, true);
        assert_eq!(result.len(), 3);
        assert_eq!(result[0], a);
        assert_eq!(result[1].first(), a.last());
        assert_eq!(result[1].last(), b.first());
        assert_eq!(result[2], b);
    }

    #[test]
    fn connect_loop_returns_to_first_contour() {
        let a = line(&[(0.0, 0.0), (1.0, 0.0)]);
        let b = line(&[(5.0, 0.0), (6.0, 0.0)]);
        let result = connect_contours(&[a.clone(), b.clone()], true, true);
        // a, a->b, b, b->a
        assert_eq!(result.len(), 4);
        assert_eq!(result[2], b);
        assert_eq!(result[3].first(), b.last());
        assert_eq!(result[3].last(), a.first());
    }

    #[test]
    fn connect_loop_without_routing_drops_nothing() {
        let a = line(&[(0.0, 0.0), (1.0, 0.0)]);
        let b = line(&[(5.0, 0.0), (6.0, 0.0)]);
        let result = connect_contours(&[a.clone(), b.clone()], true, false);
        assert_eq!(result, vec![a, b]);
    }

    #[test]
    fn interpolate_short_segment_keeps_endpoints() {
        let pl = line(&[(0.0, 0.0), (3.0, 0.0)]);
        assert_eq!(interpolate(&pl, 2.0), pl);
    }

    #[test]
    fn interpolate_long_segment_adds_points() {
        // Length 40, spacing 10: four samples including both ends.
        let pl = line(&[(0.0, 0.0), (40.0, 0.0)]);
        let result = interpolate(&pl, 2.0);
        assert_eq!(result.len(), 4);
        assert_eq!(result.first(), Some(&Point::new(0.0, 0.0)));
        assert_eq!(result.last(), Some(&Point::new(40.0, 0.0)));
        let step = result.points()[1].x - result.points()[0].x;
        assert!((step - 40.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn interpolate_shares_vertices_between_segments() {
        let pl = line(&[(0.0, 0.0), (5.0, 0.0), (5.0, 5.0)]);
        let result = interpolate(&pl, 2.0);
        assert_eq!(result, pl);
    }

    #[test]
    fn interpolate_single_point_unchanged() {
        let pl = line(&[(1.0, 1.0)]);
        assert_eq!(interpolate(&pl, 2.0), pl);
    }

    #[test]
    fn assemble_open_sequence_keeps_order() {
        let contours = [line(&[(0.0, 0.0), (1.0, 0.0)]), line(&[(1.0, 0.0), (2.0, 0.0)])];
        let assembly = assemble_points(&contours, false).unwrap();
        assert_eq!(
            assembly.points,
            vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(2.0, 0.0)]
        );
        assert_eq!(assembly.segment_ends, vec![1]);
    }

    #[test]
    fn assemble_closed_sequence_drops_repeat() {
        let square = line(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)]);
        let assembly = assemble_points(&[square], false).unwrap();
        assert_eq!(assembly.points.len(), 4);
        assert_ne!(assembly.points.first(), assembly.points.last());
        assert!(assembly.segment_ends.is_empty());
    }

    #[test]
    fn assemble_loop_rotates_to_centroid() {
        let open = line(&[(0.0, 0.0), (10.0, 0.0), (4.0, 1.0), (20.0, 0.0)]);
        // Centroid (8.5, 0.25); nearest point is (10, 0).
        let points = assemble_points(&[open], true).unwrap().points;
        assert_eq!(points[0], Point::new(10.0, 0.0));
        assert_eq!(points.len(), 4);
    }

    #[test]
    fn assemble_single_point_survives() {
        let points = assemble_points(&[line(&[(3.0, 3.0)])], false).unwrap().points;
        assert_eq!(points, vec![Point::new(3.0, 3.0)]);
    }

    #[test]
    fn segment_ends_survive_connector_dedup() {
        let a = line(&[(0.0, 0.0), (1.0, 0.0)]);
        let connector = line(&[(1.0, 0.0), (3.0, 2.0), (5.0, 0.0)]);
        let b = line(&[(5.0, 0.0), (6.0, 0.0)]);
        let assembly = assemble_points(&[a, connector, b], false).unwrap();
        assert_eq!(assembly.points.len(), 5);
        // (1, 0) ends `a`; (5, 0) ends the connector.
        assert_eq!(assembly.segment_ends, vec![1, 3]);
        assert_eq!(assembly.points[1], Point::new(1.0, 0.0));
        assert_eq!(assembly.points[3], Point::new(5.0, 0.0));
    }

    #[test]
    fn segment_ends_follow_rotation() {
        let a = line(&[(0.0, 0.0), (10.0, 0.0), (6.0, 4.0)]);
        let b = line(&[(10.0, 10.0), (0.0, 10.0)]);
        // Centroid (5.2, 4.8); nearest point is (6, 4), the end of `a`.
        let assembly = assemble_points(&[a, b], true).unwrap();
        assert_eq!(
            assembly.points,
            vec![
                Point::new(6.0, 4.0),
                Point::new(10.0, 10.0),
                Point::new(0.0, 10.0),
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
            ]
        );
        assert_eq!(assembly.segment_ends, vec![0]);
    }

    #[test]
    fn segment_ends_after_rotation_keep_their_points() {
        let a = line(&[(0.0, 0.0), (4.0, 0.0)]);
        let b = line(&[(9.0, 0.0), (9.0, 6.0), (5.0, 5.0)]);
        let c = line(&[(0.0, 6.0), (0.0, 1.0)]);
        let assembly = assemble_points(&[a, b, c], true).unwrap();
        let ends: Vec<Point> = assembly
            .segment_ends
            .iter()
            .map(|&i| assembly.points[i])
            .collect();
        assert_eq!(ends.len(), 2);
        assert!(ends.contains(&Point::new(4.0, 0.0)));
        assert!(ends.contains(&Point::new(5.0, 5.0)));
    }

    #[test]
    fn assemble_empty_is_invalid_input() {
        assert!(matches!(
            assemble_points(&[], false),
            Err(PipelineError::InvalidInput(_))
        ));
    }
}
