//! Whole-image decoding for stills (gallery pictures, screenshots)
//!
//! No region selection: the full image is analyzed with the still-image plan
//! (primary, inverted, counter-clockwise; both binarizers each).

use image::DynamicImage;
use tracing::debug;

use super::Decoder;
use super::hints::DecodeHints;
use super::strategy::{AnalysisResult, DecodeStrategy, still_image_plan};
use crate::error::Result;
use crate::models::{LuminancePlane, Rect};

/// Decode a code from a full luminance plane
pub fn decode_luminance<D: Decoder + ?Sized>(
    decoder: &D,
    plane: &LuminancePlane<'_>,
    hints: &DecodeHints,
) -> AnalysisResult {
    let region = Rect::full(plane.width(), plane.height());
    let strategy = DecodeStrategy::new(decoder);
    strategy.run_plan(&plane.to_region(), region, hints, &still_image_plan())
}

/// Convert `image` to luminance and decode it.
///
/// Fails only for a zero-sized image; an unreadable image is `NotFound`.
pub fn decode_image<D: Decoder + ?Sized>(
    decoder: &D,
    image: &DynamicImage,
    hints: &DecodeHints,
) -> Result<AnalysisResult> {
    let gray = image.to_luma8();
    let (width, height) = (gray.width() as usize, gray.height() as usize);
    debug!(width, height, "decoding still image");
    let plane = LuminancePlane::new(gray.as_raw(), width, height)?;
    Ok(decode_luminance(decoder, &plane, hints))
}
