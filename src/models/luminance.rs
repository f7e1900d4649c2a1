//! Single-channel luminance grids handed to decoders

use super::Rect;
use crate::error::{Result, ScanError};
use crate::utils::rotation::{invert_luminance, rotate90, rotate90_ccw};

/// Borrowed row-major luminance plane (one byte per sample, no padding)
#[derive(Debug, Clone, Copy)]
pub struct LuminancePlane<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
}

impl<'a> LuminancePlane<'a> {
    /// Wrap `data`, which must hold at least `width * height` samples
    pub fn new(data: &'a [u8], width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ScanError::InvalidDimensions { width, height });
        }
        let expected = width * height;
        if data.len() < expected {
            return Err(ScanError::FrameTooSmall {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data: &data[..expected],
            width,
            height,
        })
    }

    /// Plane width
    pub fn width(&self) -> usize {
        self.width
    }

    /// Plane height
    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw samples
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Copy out `rect`, which must lie entirely inside the plane
    pub fn crop(&self, rect: Rect) -> Result<LuminanceRegion> {
        if !rect.fits_within(self.width, self.height) {
            return Err(ScanError::MalformedRegion {
                region: rect,
                width: self.width,
                height: self.height,
            });
        }
        let (left, top) = (rect.left as usize, rect.top as usize);
        let (width, height) = (rect.width as usize, rect.height as usize);

        let mut data = Vec::with_capacity(width * height);
        for row in self.data.chunks_exact(self.width).skip(top).take(height) {
            data.extend_from_slice(&row[left..left + width]);
        }
        Ok(LuminanceRegion {
            data,
            width,
            height,
        })
    }

    /// Copy the whole plane into an owned region
    pub fn to_region(&self) -> LuminanceRegion {
        LuminanceRegion {
            data: self.data.to_vec(),
            width: self.width,
            height: self.height,
        }
    }
}

/// Owned luminance grid: a cropped region or one of its retry variants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LuminanceRegion {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl LuminanceRegion {
    /// Build a region from row-major samples; `data.len()` must equal `width * height`
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> Result<Self> {
        if data.len() != width * height {
            return Err(ScanError::FrameTooSmall {
                expected: width * height,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Region width
    pub fn width(&self) -> usize {
        self.width
    }

    /// Region height
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major samples
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Sample at (x, y)
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    /// Quarter turn clockwise; width and height swap
    pub fn rotated_clockwise(&self) -> Self {
        Self {
            data: rotate90(&self.data, self.width, self.height),
            width: self.height,
            height: self.width,
        }
    }

    /// Quarter turn counter-clockwise; width and height swap
    pub fn rotated_counter_clockwise(&self) -> Self {
        Self {
            data: rotate90_ccw(&self.data, self.width, self.height),
            width: self.height,
            height: self.width,
        }
    }

    /// Copy with every sample `v` replaced by `255 - v`
    pub fn inverted(&self) -> Self {
        let mut data = self.data.clone();
        invert_luminance(&mut data);
        Self {
            data,
            width: self.width,
            height: self.height,
        }
    }
}
