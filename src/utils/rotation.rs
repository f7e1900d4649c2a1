//! Orientation normalization and contrast inversion for luminance grids
//!
//! Everything here is byte-exact: a misplaced sample shifts the decode
//! region without raising any error.

use rayon::prelude::*;

/// Planes at or above this many samples are inverted in parallel
const PARALLEL_INVERT_THRESHOLD: usize = 1 << 20;

/// Rotate a `width` x `height` plane a quarter turn clockwise.
///
/// The source sample at `x + y * width` lands at `x * height + (height - 1 - y)`;
/// the result is `height` wide and `width` tall.
pub fn rotate90(data: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut rotated = vec![0u8; width * height];
    rotate90_into(data, width, height, &mut rotated);
    rotated
}

/// Clockwise quarter turn into a caller-provided buffer (no allocation).
///
/// `output` must hold at least `width * height` samples.
pub fn rotate90_into(data: &[u8], width: usize, height: usize, output: &mut [u8]) {
    assert!(output.len() >= width * height, "Output buffer too small");
    for (y, row) in data.chunks_exact(width).take(height).enumerate() {
        let column = height - 1 - y;
        for (x, &sample) in row.iter().enumerate() {
            output[x * height + column] = sample;
        }
    }
}

/// Rotate a `width` x `height` plane a quarter turn counter-clockwise.
///
/// The source sample at `x + y * width` lands at `(width - 1 - x) * height + y`.
pub fn rotate90_ccw(data: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut rotated = vec![0u8; width * height];
    for (y, row) in data.chunks_exact(width).take(height).enumerate() {
        for (x, &sample) in row.iter().enumerate() {
            rotated[(width - 1 - x) * height + y] = sample;
        }
    }
    rotated
}

/// Invert contrast in place (`v -> 255 - v`)
pub fn invert_luminance(data: &mut [u8]) {
    if data.len() >= PARALLEL_INVERT_THRESHOLD {
        data.par_iter_mut().for_each(|v| *v = u8::MAX - *v);
    } else {
        data.iter_mut().for_each(|v| *v = u8::MAX - *v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate90_index_mapping() {
        // 3x2 plane
        let data = vec![1, 2, 3, 4, 5, 6];
        let rotated = rotate90(&data, 3, 2);
        // Result is 2 wide, 3 tall
        assert_eq!(rotated, vec![4, 1, 5, 2, 6, 3]);
    }

    #[test]
    fn test_rotate90_four_times_is_identity() {
        let (width, height) = (7, 4);
        let data: Vec<u8> = (0..(width * height) as u8).collect();

        let mut current = data.clone();
        let (mut w, mut h) = (width, height);
        for _ in 0..4 {
            current = rotate90(&current, w, h);
            std::mem::swap(&mut w, &mut h);
        }
        assert_eq!((w, h), (width, height));
        assert_eq!(current, data);
    }

    #[test]
    fn test_ccw_undoes_cw() {
        let data: Vec<u8> = (0..15).collect();
        let cw = rotate90(&data, 5, 3);
        let back = rotate90_ccw(&cw, 3, 5);
        assert_eq!(back, data);
    }

    #[test]
    fn test_rotate90_into_reuses_buffer() {
        let data = vec![1, 2, 3, 4];
        let mut out = vec![0u8; 8];
        rotate90_into(&data, 2, 2, &mut out);
        assert_eq!(&out[..4], &[3, 1, 4, 2]);
    }

    #[test]
    fn test_invert_twice_is_identity() {
        let data: Vec<u8> = (0..=255).collect();
        let mut inverted = data.clone();
        invert_luminance(&mut inverted);
        assert_eq!(inverted[0], 255);
        assert_eq!(inverted[255], 0);
        invert_luminance(&mut inverted);
        assert_eq!(inverted, data);
    }
}
