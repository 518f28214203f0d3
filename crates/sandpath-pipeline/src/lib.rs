//! sandpath-pipeline: image to polar drawing path for sand tables (sans-IO).
//!
//! Converts a raster image into an ordered list of polar coordinates
//! through:
//! edge mask -> contour tracing -> adaptive simplification ->
//! contour ordering -> jump routing -> path assembly -> polar transform ->
//! text encoding.
//!
//! This crate has **no I/O dependencies**: it operates on in-memory byte
//! slices and masks and returns structured data. File handling lives in
//! `sandpath-cli`.

pub mod assemble;
pub mod contour;
pub mod edge;
pub mod extract;
pub mod format;
pub mod optimize;
pub mod polar;
pub mod queue;
pub mod route;
pub mod simplify;
pub mod types;

pub use contour::{ContourMode, ContourTracer};
pub use extract::ExtractionStats;
pub use format::{OutputFormat, format_points, parse_default};
pub use types::{
    ConversionResult, ConvertConfig, GrayImage, PipelineError, Point, PolarPoint, Polyline,
};

/// Run the full conversion on encoded image bytes.
///
/// Decodes the image (PNG, JPEG, BMP, WebP), builds the binary edge mask
/// and hands it to [`convert_mask`].
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` fails validation.
/// Returns [`PipelineError::EmptyInput`] if `image_bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is unrecognized.
/// Returns [`PipelineError::NoContours`] if no contour survives extraction.
pub fn convert(
    image_bytes: &[u8],
    config: &ConvertConfig,
) -> Result<ConversionResult, PipelineError> {
    config.validate()?;
    let mask = edge::edge_mask_from_bytes(image_bytes)?;
    convert_mask(&mask, config)
}

/// Run the conversion on a binary edge mask (non-zero = edge).
///
/// The mask is borrowed and left untouched.
///
/// # Pipeline steps
///
/// 1. Trace, deduplicate and simplify contours within the point budget
/// 2. Order contours by a nearest-neighbor tour and orient them
/// 3. Interleave connector paths (routed when jump minimization is on)
/// 4. Interpolate straight segments (theta-rho output only)
/// 5. Flatten into one draw sequence
/// 6. Polar transform, with pen-up markers when enabled
/// 7. Render in the requested text format
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` fails validation.
/// Returns [`PipelineError::NoContours`] if no contour survives extraction.
pub fn convert_mask(
    mask: &GrayImage,
    config: &ConvertConfig,
) -> Result<ConversionResult, PipelineError> {
    config.validate()?;

    // 1. Extraction.
    let extraction = extract::extract_contours(
        mask,
        &config.contour_mode,
        config.epsilon,
        config.max_points,
    )?;

    // 2. Ordering.
    let ordered = optimize::optimize_contour_order(&extraction.contours);

    // 3. Connectors.
    let traced = assemble::connect_contours(&ordered, config.is_loop, config.minimize_jumps);

    // 4. Interpolation uses the initial tolerance, not the adjusted one.
    let processed_contours: Vec<Polyline> =
        if OutputFormat::from_code(config.output_format) == Some(OutputFormat::ThetaRho) {
            traced
                .iter()
                .map(|c| assemble::interpolate(c, config.epsilon))
                .collect()
        } else {
            traced
        };

    // 5. Flatten.
    let assembly = assemble::assemble_points(&processed_contours, config.is_loop)?;
    let ordered_points = assembly.points;

    // 6. Polar transform.
    let polar_points = polar::to_polar(&ordered_points)?;
    let polar_points = if config.pen_up_enabled {
        polar::insert_pen_up_markers(&polar_points, &assembly.segment_ends, config.is_loop)
    } else {
        polar_points
    };

    // 7. Encoding.
    let formatted = format::format_points(&polar_points, config.output_format);

    tracing::debug!(
        contours = ordered.len(),
        segments = processed_contours.len(),
        points = ordered_points.len(),
        polar = polar_points.len(),
        "conversion finished"
    );

    Ok(ConversionResult {
        formatted,
        processed_contours,
        ordered_points,
        polar_points,
        extraction: extraction.stats,
    })
}
