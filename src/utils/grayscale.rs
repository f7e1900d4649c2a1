//! Luminance extraction from camera frames
//!
//! Y = 0.299*R + 0.587*G + 0.114*B, computed in integer arithmetic as
//! Y = (76*R + 150*G + 29*B) >> 8. YUV formats already carry luminance in
//! their leading plane and are copied row by row.

use rayon::prelude::*;

use crate::error::Result;
use crate::models::{Frame, PixelFormat};

/// Coefficients for grayscale conversion: Y = (76*R + 150*G + 29*B) >> 8
const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

/// Frames with at least this many rows are converted in parallel
const PARALLEL_ROW_THRESHOLD: usize = 720;

#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((COEF_R * r as u32 + COEF_G * g as u32 + COEF_B * b as u32) >> 8).min(255) as u8
}

/// Write the frame's luminance plane into `output` (tightly packed, `width * height`).
///
/// The frame is validated first; `output` must hold at least
/// `frame.luminance_len()` bytes.
pub fn extract_luminance_into(frame: &Frame<'_>, output: &mut [u8]) -> Result<()> {
    frame.validate()?;
    let width = frame.width;
    let stride = frame.row_stride();
    let bpp = frame.format.bytes_per_pixel();
    let output = &mut output[..frame.luminance_len()];

    let convert_row = |(y, row): (usize, &mut [u8])| {
        let start = y * stride;
        let src = &frame.data[start..start + width * bpp];
        match frame.format {
            PixelFormat::Luma8 | PixelFormat::Nv21 | PixelFormat::Yuv420 => {
                row.copy_from_slice(src);
            }
            PixelFormat::Rgb8 | PixelFormat::Rgba8 => {
                for (dst, px) in row.iter_mut().zip(src.chunks_exact(bpp)) {
                    *dst = luma(px[0], px[1], px[2]);
                }
            }
        }
    };

    if frame.height >= PARALLEL_ROW_THRESHOLD && bpp > 1 {
        output
            .par_chunks_mut(width)
            .enumerate()
            .for_each(convert_row);
    } else {
        output.chunks_mut(width).enumerate().for_each(convert_row);
    }
    Ok(())
}
