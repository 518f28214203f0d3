//! Path optimization: reorder and orient contours to minimize travel distance.
//!
//! Builds a matrix of endpoint distances between contours (the minimum of
//! the four start/end combinations), visits contours in nearest-neighbor
//! order starting from the first one, then orients each contour relative
//! to the end of the one placed before it. Closed contours are rotated to
//! start near that point; open contours are reversed when their far end
//! is closer.
//!
//! The tour is a greedy approximation, not an optimal TSP solution.

use crate::types::{Point, Polyline, reorder_for_loop};

/// Pairwise contour distances. `matrix[i][j]` is the smallest distance
/// between an endpoint of contour `i` and an endpoint of contour `j`.
/// The diagonal is zero.
///
/// Empty contours are infinitely far from everything else.
#[must_use]
pub fn endpoint_distances(contours: &[Polyline]) -> Vec<Vec<f64>> {
    let ends: Vec<Option<(Point, Point)>> = contours
        .iter()
        .map(|c| Some((*c.first()?, *c.last()?)))
        .collect();

    ends.iter()
        .enumerate()
        .map(|(i, a)| {
            ends.iter()
                .enumerate()
                .map(|(j, b)| {
                    if i == j {
                        return 0.0;
                    }
                    let (Some((a_start, a_end)), Some((b_start, b_end))) = (a, b) else {
                        return f64::INFINITY;
                    };
                    a_start
                        .distance(*b_start)
                        .min(a_start.distance(*b_end))
                        .min(a_end.distance(*b_start))
                        .min(a_end.distance(*b_end))
                })
                .collect()
        })
        .collect()
}

/// Greedy tour over a distance matrix, starting at index 0.
///
/// At each step the unvisited index with the strictly smallest distance
/// from the last visited one is chosen, so ties go to the lowest index.
/// Returns a permutation of `0..distances.len()`.
#[must_use]
pub fn nearest_neighbor_tour(distances: &[Vec<f64>]) -> Vec<usize> {
    let n = distances.len();
    if n == 0 {
        return Vec::new();
    }

    let mut visited = vec![false; n];
    let mut tour = Vec::with_capacity(n);
    visited[0] = true;
    tour.push(0);

    while tour.len() < n {
        let last = tour[tour.len() - 1];
        let mut nearest = None;
        let mut nearest_distance = f64::INFINITY;

        for (j, &d) in distances[last].iter().enumerate() {
            if !visited[j] && (nearest.is_none() || d < nearest_distance) {
                nearest_distance = d;
                nearest = Some(j);
            }
        }

        // At least one index is unvisited while the tour is short.
        let Some(next) = nearest else {
            break;
        };
        visited[next] = true;
        tour.push(next);
    }

    tour
}

/// Orient `contour` to follow a pen resting at `previous`.
///
/// Closed contours are rotated to start at the point nearest `previous`.
/// Open contours are reversed if their last point is strictly closer to
/// `previous` than their first.
#[must_use]
pub fn reorient(contour: &Polyline, previous: Point) -> Polyline {
    if contour.is_closed() {
        return Polyline::new(reorder_for_loop(contour.points(), previous));
    }
    match (contour.first(), contour.last()) {
        (Some(first), Some(last)) if previous.distance(*last) < previous.distance(*first) => {
            contour.reversed()
        }
        _ => contour.clone(),
    }
}

/// Reorder and orient contours to minimize total travel distance.
///
/// The first contour keeps its place and orientation. Empty contours are
/// dropped.
#[must_use = "returns the optimized contour ordering"]
pub fn optimize_contour_order(contours: &[Polyline]) -> Vec<Polyline> {
    let candidates: Vec<Polyline> = contours.iter().filter(|c| !c.is_empty()).cloned().collect();
    let tour = nearest_neighbor_tour(&endpoint_distances(&candidates));

    let mut ordered: Vec<Polyline> = Vec::with_capacity(tour.len());
    for idx in tour {
        let contour = &candidates[idx];
        let placed = match ordered.last().and_then(Polyline::last) {
            Some(&previous) => reorient(contour, previous),
            None => contour.clone(),
        };
        ordered.push(placed);
    }

    ordered
}
