//! Camera frames as delivered by a frame source

use serde::{Deserialize, Serialize};

use super::Rect;
use crate::error::{Result, ScanError};

/// Clockwise rotation the frame source reports for a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    /// Upright
    #[default]
    Deg0,
    /// Quarter turn
    Deg90,
    /// Upside down
    Deg180,
    /// Three-quarter turn
    Deg270,
}

impl Rotation {
    /// Parse a rotation in degrees; only multiples of 90 in [0, 270] are valid
    pub fn from_degrees(degrees: i32) -> Result<Self> {
        match degrees {
            0 => Ok(Self::Deg0),
            90 => Ok(Self::Deg90),
            180 => Ok(Self::Deg180),
            270 => Ok(Self::Deg270),
            other => Err(ScanError::UnsupportedRotation(other)),
        }
    }

    /// Rotation in degrees
    pub fn degrees(&self) -> i32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// True when the code would appear sideways (90 or 270 degrees)
    pub fn is_sideways(&self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }
}

/// Pixel layout of a frame's data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// 8-bit luminance, one byte per pixel
    #[default]
    Luma8,
    /// NV21 semi-planar YUV; only the leading Y plane is read
    Nv21,
    /// I420 planar YUV; only the leading Y plane is read
    Yuv420,
    /// Packed RGB, 3 bytes per pixel
    Rgb8,
    /// Packed RGBA, 4 bytes per pixel
    Rgba8,
}

impl PixelFormat {
    /// Bytes per pixel of the plane the luminance is read from
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Luma8 | Self::Nv21 | Self::Yuv420 => 1,
            Self::Rgb8 => 3,
            Self::Rgba8 => 4,
        }
    }
}

/// A frame pushed by the frame source.
///
/// The pixel data is borrowed: the pipeline copies the luminance into a
/// pooled buffer before returning from `on_frame_available`.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    /// Raw pixel data
    pub data: &'a [u8],
    /// Width in pixels
    pub width: usize,
    /// Height in pixels
    pub height: usize,
    /// Declared clockwise rotation
    pub rotation: Rotation,
    /// Pixel layout of `data`
    pub format: PixelFormat,
    /// Bytes per row; `None` means tightly packed
    pub stride: Option<usize>,
}

impl<'a> Frame<'a> {
    /// Tightly packed 8-bit luminance frame
    pub fn luma(data: &'a [u8], width: usize, height: usize, rotation: Rotation) -> Self {
        Self {
            data,
            width,
            height,
            rotation,
            format: PixelFormat::Luma8,
            stride: None,
        }
    }

    /// Set the pixel format
    pub fn with_format(mut self, format: PixelFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the row stride in bytes
    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = Some(stride);
        self
    }

    /// Bytes per row of the plane luminance is read from
    pub fn row_stride(&self) -> usize {
        self.stride
            .unwrap_or(self.width * self.format.bytes_per_pixel())
    }

    /// Number of luminance samples (`width * height`)
    pub fn luminance_len(&self) -> usize {
        self.width * self.height
    }

    /// Check the frame describes a readable plane
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ScanError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        let row_bytes = self.width * self.format.bytes_per_pixel();
        let stride = self.row_stride();
        if stride < row_bytes {
            return Err(ScanError::FrameTooSmall {
                expected: row_bytes,
                actual: stride,
            });
        }
        let expected = stride * (self.height - 1) + row_bytes;
        if self.data.len() < expected {
            return Err(ScanError::FrameTooSmall {
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }
}

/// Frame description handed back with a successful result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameMetadata {
    /// Original frame width
    pub width: usize,
    /// Original frame height
    pub height: usize,
    /// Declared rotation of the frame
    pub rotation: Rotation,
    /// Region analyzed, in orientation-normalized coordinates
    pub region: Rect,
}
