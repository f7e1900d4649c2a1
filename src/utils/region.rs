//! Region-of-interest selection
//!
//! The arithmetic here must match the viewfinder overlay exactly: the guide
//! drawn on screen is only useful if it frames the pixels actually decoded.

use crate::decoder::config::DecodeConfig;
use crate::models::Rect;

/// Which rule produced a region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionMode {
    /// Whole frame (`full_area_scan`)
    FullArea,
    /// Caller-supplied rectangle, used verbatim
    Explicit,
    /// Centered square from `area_ratio` plus offsets
    RatioOffset,
}

/// Compute the region to analyze in a `frame_width` x `frame_height` frame.
///
/// Priority: full-area scan, then a non-degenerate explicit region (never
/// clamped), then the centered ratio square shifted by the offsets.
pub fn select_region(frame_width: usize, frame_height: usize, config: &DecodeConfig) -> Rect {
    select_region_with_mode(frame_width, frame_height, config).0
}

/// Like [`select_region`], also reporting which rule applied
pub fn select_region_with_mode(
    frame_width: usize,
    frame_height: usize,
    config: &DecodeConfig,
) -> (Rect, RegionMode) {
    if config.full_area_scan {
        return (Rect::full(frame_width, frame_height), RegionMode::FullArea);
    }

    if let Some(rect) = config.explicit_region {
        if rect.is_non_degenerate() {
            return (rect, RegionMode::Explicit);
        }
    }

    // offsets are unbounded; work in i64 so a far-off region saturates
    // instead of wrapping back onto the frame
    let width = frame_width as i64;
    let height = frame_height as i64;
    let side = (width.min(height) as f32 * config.area_ratio).floor() as i64;
    let left = (width - side) / 2 + i64::from(config.horizontal_offset);
    let top = (height - side) / 2 + i64::from(config.vertical_offset);
    let rect = Rect::new(saturate(left), saturate(top), saturate(side), saturate(side));
    (rect, RegionMode::RatioOffset)
}

fn saturate(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
