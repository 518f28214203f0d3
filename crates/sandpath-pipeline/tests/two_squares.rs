//! Integration test: two disjoint squares joined by a routed connector.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use sandpath_pipeline::{ContourMode, ConvertConfig, GrayImage, PolarPoint, convert_mask};

/// Two filled 10x10 squares, 100 pixels apart.
fn two_squares() -> GrayImage {
    let mut mask = GrayImage::new(200, 60);
    for y in 20..30 {
        for x in (20..30).chain(130..140) {
            mask.put_pixel(x, y, image::Luma([255]));
        }
    }
    mask
}

fn config(mode: ContourMode) -> ConvertConfig {
    ConvertConfig {
        contour_mode: mode,
        max_points: 50,
        minimize_jumps: true,
        is_loop: false,
        ..ConvertConfig::default()
    }
}

#[test]
fn connector_joins_the_two_squares() {
    for mode in [ContourMode::External, ContourMode::Tree] {
        let result = convert_mask(&two_squares(), &config(mode)).expect("conversion should succeed");

        let contours = &result.processed_contours;
        assert_eq!(contours.len(), 3, "{mode:?}: expected square, connector, square");

        let (first, connector, second) = (&contours[0], &contours[1], &contours[2]);
        assert_eq!(connector.first(), first.last());
        assert_eq!(connector.last(), second.first());

        // The connector crosses the 100 pixel gap.
        let gap = connector.first().unwrap().distance(*connector.last().unwrap());
        assert!(gap >= 100.0, "{mode:?}: connector spans only {gap}");

        assert!(!result.extraction.truncated);
        assert!(result.ordered_points.len() <= 50);
    }
}

#[test]
fn polar_output_is_continuous_and_normalized() {
    let result = convert_mask(&two_squares(), &config(ContourMode::Tree)).unwrap();
    let polar: &[PolarPoint] = &result.polar_points;
    assert_eq!(polar.len(), result.ordered_points.len());

    for pair in polar.windows(2) {
        assert!(
            (pair[1].theta - pair[0].theta).abs() <= 1800.0,
            "theta jumped from {} to {}",
            pair[0].theta,
            pair[1].theta
        );
    }

    let max_r = polar.iter().map(|p| p.r).fold(0.0, f64::max);
    assert!((max_r - 1000.0).abs() < 1e-6);
}

#[test]
fn formatted_output_round_trips() {
    let result = convert_mask(&two_squares(), &config(ContourMode::Tree)).unwrap();
    let parsed = sandpath_pipeline::parse_default(&result.formatted);
    assert_eq!(parsed.len(), result.polar_points.len());
    assert_eq!(
        sandpath_pipeline::format_points(&parsed, 0),
        result.formatted
    );
}
