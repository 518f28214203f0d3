//! Edge-mask preprocessing: image bytes in, binary edge mask out.
//!
//! Decodes the image, converts it to grayscale, runs Canny edge detection
//! and closes small gaps with a 3x3 morphological close (dilate then
//! erode). The result is a binary image where white pixels (255) are
//! edges and black pixels (0) are background, which is what contour
//! tracing expects.

use image::GrayImage;
use imageproc::distance_transform::Norm;

use crate::types::PipelineError;

/// Canny low threshold.
pub const CANNY_LOW: f32 = 50.0;

/// Canny high threshold.
pub const CANNY_HIGH: f32 = 150.0;

/// Radius of the square structuring element used to close edge gaps
/// (`1` under the L-infinity norm is a 3x3 square).
const CLOSE_RADIUS: u8 = 1;

/// Decode raw image bytes and convert to grayscale.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode_and_grayscale(bytes: &[u8]) -> Result<GrayImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Ok(img.to_luma8())
}

/// Detect edges and close one-pixel gaps between them.
#[must_use = "returns the binary edge mask"]
pub fn edge_mask(gray: &GrayImage) -> GrayImage {
    let edges = imageproc::edges::canny(gray, CANNY_LOW, CANNY_HIGH);
    imageproc::morphology::close(&edges, Norm::LInf, CLOSE_RADIUS)
}

/// Decode `bytes` and produce the binary edge mask in one step.
///
/// # Errors
///
/// Propagates the errors of [`decode_and_grayscale`].
pub fn edge_mask_from_bytes(bytes: &[u8]) -> Result<GrayImage, PipelineError> {
    let gray = decode_and_grayscale(bytes)?;
    Ok(edge_mask(&gray))
}
