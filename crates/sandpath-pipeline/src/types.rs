//! Shared types for the sandpath conversion pipeline.

use serde::{Deserialize, Serialize};

use crate::contour::ContourMode;
use crate::extract::ExtractionStats;

/// Re-export `GrayImage` so downstream crates can hand over an edge
/// mask without depending on `image` directly.
pub use image::GrayImage;

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// A sequence of connected points: one traced contour or one connector
/// path between contours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline(Vec<Point>);

impl Polyline {
    /// Create a new polyline from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the polyline has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the polyline.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Point> {
        self.0.first()
    }

    /// Returns the last point, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Point> {
        self.0.last()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Consumes the polyline and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }

    /// Returns `true` when the first and last points are exactly equal.
    ///
    /// An empty polyline is not closed. A single point is trivially
    /// closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        match (self.0.first(), self.0.last()) {
            (Some(first), Some(last)) => first == last,
            _ => false,
        }
    }

    /// Returns the same points in reverse order.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self(self.0.iter().rev().copied().collect())
    }

    /// Pixel bounding box of the polyline, or `None` when empty.
    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::enclosing(&self.0)
    }
}

/// Axis-aligned bounding box of a set of pixel coordinates.
///
/// Follows raster bounding-rect semantics: a box around integer pixel
/// positions covers whole pixels, so `width = max_x - min_x + 1`. A
/// single pixel therefore has a 1x1 box and a non-zero area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Horizontal extent in pixels.
    pub width: f64,
    /// Vertical extent in pixels.
    pub height: f64,
}

impl BoundingBox {
    /// Smallest box enclosing all `points`, or `None` for an empty slice.
    #[must_use]
    pub fn enclosing(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1.0,
            height: max_y - min_y + 1.0,
        })
    }

    /// Area of the box.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Length of the box diagonal.
    #[must_use]
    pub fn diagonal(&self) -> f64 {
        self.width.hypot(self.height)
    }

    /// Intersection-over-union with another box, in `[0, 1]`.
    #[must_use]
    pub fn iou(&self, other: &Self) -> f64 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union = self.area() + other.area() - intersection;
        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }
}

/// Arithmetic mean of a set of points.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidInput`] if `points` is empty.
pub fn centroid(points: &[Point]) -> Result<Point, PipelineError> {
    if points.is_empty() {
        return Err(PipelineError::InvalidInput(
            "centroid of an empty point set".to_string(),
        ));
    }
    let (sum_x, sum_y) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    Ok(Point::new(sum_x / n, sum_y / n))
}

/// Drop every point that exactly equals its predecessor.
#[must_use]
pub fn remove_consecutive_duplicates(points: &[Point]) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        if out.last() != Some(&p) {
            out.push(p);
        }
    }
    out
}

/// Rotate a loop so that it starts at the point nearest `start_near`.
///
/// The rotated sequence runs from the chosen point to the end and then
/// wraps around to the chosen point again, so a closed input stays
/// closed. Consecutive duplicates created by the rotation are removed.
/// Ties go to the lowest index.
#[must_use]
pub fn reorder_for_loop(points: &[Point], start_near: Point) -> Vec<Point> {
    if points.is_empty() {
        return Vec::new();
    }

    let mut best_idx = 0;
    let mut best_dist = f64::INFINITY;
    for (i, p) in points.iter().enumerate() {
        let d = p.distance(start_near);
        if d < best_dist {
            best_dist = d;
            best_idx = i;
        }
    }

    let rotated: Vec<Point> = points[best_idx..]
        .iter()
        .chain(&points[..=best_idx])
        .copied()
        .collect();
    remove_consecutive_duplicates(&rotated)
}

/// A polar coordinate ready for a two-motor table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolarPoint {
    /// Radius, normalized so the farthest point sits at 1000.
    pub r: f64,
    /// Continuous (unwrapped) angle in tenths of a degree.
    pub theta: f64,
}

impl PolarPoint {
    /// Create a new polar point.
    #[must_use]
    pub const fn new(r: f64, theta: f64) -> Self {
        Self { r, theta }
    }
}

/// Configuration for one conversion request.
///
/// # Validation
///
/// Fields are public; [`validate`](Self::validate) is called by
/// [`convert_mask`](crate::convert_mask) before any work is done.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Initial Douglas-Peucker tolerance in pixels. Grown automatically
    /// until the point budget is met.
    pub epsilon: f64,

    /// Which contours to trace from the edge mask.
    pub contour_mode: ContourMode,

    /// Target maximum number of points across all contours.
    pub max_points: usize,

    /// Output encoding code (see [`OutputFormat`](crate::format::OutputFormat)).
    /// Unrecognized codes produce an empty formatted string.
    pub output_format: u8,

    /// Close the drawing: connect the last contour back to the first.
    pub is_loop: bool,

    /// Route connectors through already-drawn strokes instead of
    /// jumping straight between contours.
    pub minimize_jumps: bool,

    /// Emit repeated points at contour boundaries as pen-lift markers.
    pub pen_up_enabled: bool,
}

impl ConvertConfig {
    /// Default initial simplification tolerance.
    pub const DEFAULT_EPSILON: f64 = 2.0;
    /// Default retrieval mode.
    pub const DEFAULT_CONTOUR_MODE: ContourMode = ContourMode::Tree;
    /// Default point budget.
    pub const DEFAULT_MAX_POINTS: usize = 200;
    /// Default output encoding (`{r,theta}` pairs).
    pub const DEFAULT_OUTPUT_FORMAT: u8 = 0;

    /// Check the invariants the pipeline relies on.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if `epsilon` is not a
    /// positive finite number or `max_points` is zero.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "epsilon must be positive and finite, got {}",
                self.epsilon
            )));
        }
        if self.max_points == 0 {
            return Err(PipelineError::InvalidConfig(
                "max_points must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            epsilon: Self::DEFAULT_EPSILON,
            contour_mode: Self::DEFAULT_CONTOUR_MODE,
            max_points: Self::DEFAULT_MAX_POINTS,
            output_format: Self::DEFAULT_OUTPUT_FORMAT,
            is_loop: false,
            minimize_jumps: false,
            pen_up_enabled: false,
        }
    }
}

/// Everything a conversion produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    /// The polar points rendered in the requested output format.
    pub formatted: String,

    /// Ordered contours interleaved with connector paths, after optional
    /// interpolation. Pen-up markers are placed at these boundaries.
    pub processed_contours: Vec<Polyline>,

    /// The final flat point sequence fed to the polar transform.
    pub ordered_points: Vec<Point>,

    /// Polar coordinates in draw order.
    pub polar_points: Vec<PolarPoint>,

    /// How the adaptive simplification converged.
    pub extraction: ExtractionStats,
}

/// Errors that can occur during conversion.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Conversion configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// No contour survived tracing and simplification.
    #[error("no contours found in the image")]
    NoContours,

    /// A geometric helper received input it cannot handle (e.g. an
    /// empty point list).
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
