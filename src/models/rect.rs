use std::fmt;

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in pixel coordinates.
///
/// Coordinates are signed: a ratio-derived region shifted by a negative
/// offset may start left of or above the frame origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub left: i32,
    /// Top edge
    pub top: i32,
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
}

impl Rect {
    /// Create a rectangle from its origin and size
    pub fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Rectangle covering a whole `width` x `height` plane
    pub fn full(width: usize, height: usize) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    /// True when both dimensions are positive
    pub fn is_non_degenerate(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Exclusive right edge
    pub fn right(&self) -> i64 {
        self.left as i64 + self.width as i64
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> i64 {
        self.top as i64 + self.height as i64
    }

    /// True when the rectangle is non-degenerate and lies fully inside the plane
    pub fn fits_within(&self, width: usize, height: usize) -> bool {
        self.is_non_degenerate()
            && self.left >= 0
            && self.top >= 0
            && self.right() <= width as i64
            && self.bottom() <= height as i64
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}x{})",
            self.left, self.top, self.width, self.height
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits_within() {
        assert!(Rect::new(0, 0, 10, 10).fits_within(10, 10));
        assert!(Rect::new(2, 3, 4, 5).fits_within(10, 10));
        assert!(!Rect::new(-1, 0, 5, 5).fits_within(10, 10));
        assert!(!Rect::new(6, 0, 5, 5).fits_within(10, 10));
        assert!(!Rect::new(0, 0, 0, 5).fits_within(10, 10));
    }

    #[test]
    fn test_full() {
        assert_eq!(Rect::full(640, 480), Rect::new(0, 0, 640, 480));
    }
}
