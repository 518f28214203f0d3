//! Contour tracing: extract raw boundary polylines from a binary edge mask.
//!
//! This module defines the [`ContourTracer`] trait and the [`ContourMode`]
//! enum selecting which borders are kept, plus the bounding-box
//! deduplication applied to the raw traces.
//!
//! Hierarchical retrieval reports both sides of a thin stroke (its outer
//! border and the hole border just inside it), which would otherwise be
//! drawn twice. [`deduplicate`] drops a contour whose bounding box
//! overlaps an already-kept one by more than a given IoU.

use image::GrayImage;
use imageproc::contours::Contour;
use serde::{Deserialize, Serialize};

use crate::types::{Point, Polyline};

/// Bounding-box IoU above which two contours count as duplicates.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.5;

/// Selects which borders contour tracing keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContourMode {
    /// Only the outermost borders (those without a parent).
    External,

    /// Every border, outer and hole, at every nesting depth.
    #[default]
    Tree,
}

/// Trait for contour tracing strategies.
///
/// Input: a binary edge mask (non-zero pixels = foreground). The mask is
/// borrowed; the caller keeps ownership.
/// Output: raw boundary polylines in integer pixel coordinates.
pub trait ContourTracer {
    /// Trace contours in the given binary mask.
    fn trace(&self, mask: &GrayImage) -> Vec<Polyline>;
}

impl ContourTracer for ContourMode {
    fn trace(&self, mask: &GrayImage) -> Vec<Polyline> {
        let contours: Vec<Contour<u32>> = imageproc::contours::find_contours(mask);

        contours
            .into_iter()
            .filter(|c| !c.points.is_empty())
            .filter(|c| match *self {
                Self::External => c.parent.is_none(),
                Self::Tree => true,
            })
            .map(|c| {
                let points = c
                    .points
                    .into_iter()
                    .map(|p| Point::new(f64::from(p.x), f64::from(p.y)))
                    .collect();
                Polyline::new(points)
            })
            .collect()
    }
}

/// Keep only the first of every group of contours whose bounding boxes
/// overlap with IoU greater than `similarity_threshold`.
///
/// Each contour is compared against the contours kept so far, so the
/// result preserves input order.
#[must_use = "returns the deduplicated contours"]
pub fn deduplicate(contours: Vec<Polyline>, similarity_threshold: f64) -> Vec<Polyline> {
    let mut unique: Vec<Polyline> = Vec::with_capacity(contours.len());
    let mut boxes = Vec::with_capacity(contours.len());

    for contour in contours {
        let Some(bb) = contour.bounding_box() else {
            continue;
        };
        let is_duplicate = boxes.iter().any(|kept| bb.iou(kept) > similarity_threshold);
        if !is_duplicate {
            boxes.push(bb);
            unique.push(contour);
        }
    }

    unique
}
