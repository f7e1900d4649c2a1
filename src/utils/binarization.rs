//! Luminance to black/white conversion
//!
//! Two strategies with different lighting trade-offs:
//! - adaptive: compares each sample to the mean of its neighborhood, robust
//!   to gradients and uneven lighting on small uniform codes
//! - global histogram: a single Otsu threshold for the whole region, the
//!   fallback when local contrast is too noisy

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::{BitMatrix, LuminanceRegion};

/// Side of the square neighborhood used by the adaptive binarizer
pub const ADAPTIVE_WINDOW: usize = 31;

/// A sample must be this far below its local mean to count as dark
const ADAPTIVE_BIAS: i64 = 7;

/// Regions with at least this many rows are thresholded in parallel
const PARALLEL_ROW_THRESHOLD: usize = 512;

/// Binarization strategy requested for a decode attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinarizerKind {
    /// Local-contrast threshold (primary)
    Adaptive,
    /// Single global threshold from the luminance histogram (fallback)
    GlobalHistogram,
}

/// Binarize a region with the given strategy
pub fn binarize(region: &LuminanceRegion, kind: BinarizerKind) -> BitMatrix {
    match kind {
        BinarizerKind::Adaptive => adaptive_binarize(region.data(), region.width(), region.height()),
        BinarizerKind::GlobalHistogram => {
            otsu_binarize(region.data(), region.width(), region.height())
        }
    }
}

/// Convert grayscale to binary using Otsu's thresholding method
/// Returns a BitMatrix where true = black, false = white
pub fn otsu_binarize(gray: &[u8], width: usize, height: usize) -> BitMatrix {
    let threshold = calculate_otsu_threshold(&gray[..width * height]);
    threshold_binarize(gray, width, height, threshold)
}

/// Calculate Otsu's optimal threshold from the 256-bin histogram
pub fn calculate_otsu_threshold(gray: &[u8]) -> u8 {
    let mut histogram = [0u64; 256];
    for &pixel in gray {
        histogram[pixel as usize] += 1;
    }

    let total = gray.len() as f64;
    if total == 0.0 {
        return 128;
    }
    let sum_all: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &count)| i as f64 * count as f64)
        .sum();

    let mut weight_bg = 0.0f64;
    let mut sum_bg = 0.0f64;
    let mut max_variance = 0.0f64;
    let mut optimal_threshold = 128u8;

    // Threshold t puts intensities < t in the dark class
    for t in 1..256usize {
        weight_bg += histogram[t - 1] as f64;
        sum_bg += (t - 1) as f64 * histogram[t - 1] as f64;
        let weight_fg = total - weight_bg;
        if weight_bg == 0.0 || weight_fg == 0.0 {
            continue;
        }
        let mean_bg = sum_bg / weight_bg;
        let mean_fg = (sum_all - sum_bg) / weight_fg;
        let variance = weight_bg * weight_fg * (mean_bg - mean_fg).powi(2);
        if variance > max_variance {
            max_variance = variance;
            optimal_threshold = t as u8;
        }
    }

    optimal_threshold
}

/// Simple global threshold binarization
pub fn threshold_binarize(gray: &[u8], width: usize, height: usize, threshold: u8) -> BitMatrix {
    let mask: Vec<u8> = gray[..width * height]
        .iter()
        .map(|&v| (v < threshold) as u8)
        .collect();
    BitMatrix::from_mask(width, height, &mask)
}

/// Local-mean binarization over an integral image.
///
/// Regions smaller than the window in either dimension have no meaningful
/// neighborhood and fall back to Otsu.
pub fn adaptive_binarize(gray: &[u8], width: usize, height: usize) -> BitMatrix {
    if width < ADAPTIVE_WINDOW || height < ADAPTIVE_WINDOW {
        return otsu_binarize(gray, width, height);
    }

    let integral = integral_image(gray, width, height);
    let stride = width + 1;
    let radius = ADAPTIVE_WINDOW / 2;

    let threshold_row = |(y, row): (usize, &mut [u8])| {
        let y0 = y.saturating_sub(radius);
        let y1 = (y + radius + 1).min(height);
        for (x, out) in row.iter_mut().enumerate() {
            let x0 = x.saturating_sub(radius);
            let x1 = (x + radius + 1).min(width);
            let count = ((x1 - x0) * (y1 - y0)) as i64;
            let sum = integral[y1 * stride + x1] as i64 - integral[y0 * stride + x1] as i64
                - integral[y1 * stride + x0] as i64
                + integral[y0 * stride + x0] as i64;
            let value = gray[y * width + x] as i64;
            *out = (value * count < sum - ADAPTIVE_BIAS * count) as u8;
        }
    };

    let mut mask = vec![0u8; width * height];
    if height >= PARALLEL_ROW_THRESHOLD {
        mask.par_chunks_mut(width).enumerate().for_each(threshold_row);
    } else {
        mask.chunks_mut(width).enumerate().for_each(threshold_row);
    }
    BitMatrix::from_mask(width, height, &mask)
}

/// Summed-area table with a zero top row and left column, `(width+1) x (height+1)`
fn integral_image(gray: &[u8], width: usize, height: usize) -> Vec<u64> {
    let stride = width + 1;
    let mut integral = vec![0u64; stride * (height + 1)];
    for y in 0..height {
        let mut row_sum = 0u64;
        for x in 0..width {
            row_sum += gray[y * width + x] as u64;
            integral[(y + 1) * stride + x + 1] = integral[y * stride + x + 1] + row_sum;
        }
    }
    integral
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_binarize() {
        let gray = vec![100, 150, 200, 50]; // 2x2 image
        let binary = threshold_binarize(&gray, 2, 2, 128);

        // Pixels < 128 should be black (true)
        assert!(binary.get(0, 0)); // 100 < 128
        assert!(!binary.get(1, 0)); // 150 >= 128
        assert!(!binary.get(0, 1)); // 200 >= 128
        assert!(binary.get(1, 1)); // 50 < 128
    }

    #[test]
    fn test_otsu_binarize() {
        // Create a simple two-class image
        let mut gray = vec![50u8; 50]; // Dark class
        gray.extend(vec![200u8; 50]); // Light class

        let binary = otsu_binarize(&gray, 10, 10);

        // Top half should be black (true), bottom half white (false)
        assert!(binary.get(0, 0));
        assert!(!binary.get(0, 7));
    }

    #[test]
    fn test_otsu_threshold_separates_classes() {
        let mut gray = vec![40u8; 100];
        gray.extend(vec![220u8; 100]);
        let t = calculate_otsu_threshold(&gray);
        assert!(t > 40 && t <= 220);
    }

    #[test]
    fn test_adaptive_handles_gradient() {
        // Dark square on a left-to-right brightness gradient
        let (width, height) = (64, 64);
        let mut gray = vec![0u8; width * height];
        for y in 0..height {
            for x in 0..width {
                let background = 100 + (x * 2) as u8;
                let in_square = (24..40).contains(&x) && (24..40).contains(&y);
                gray[y * width + x] = if in_square { background - 80 } else { background };
            }
        }
        let binary = adaptive_binarize(&gray, width, height);
        assert!(binary.get(32, 32));
        assert!(!binary.get(20, 5));
        assert!(!binary.get(60, 60));
    }

    #[test]
    fn test_small_region_falls_back_to_global() {
        let gray = vec![10, 10, 240, 240];
        let region = LuminanceRegion::new(gray, 2, 2).unwrap();
        let adaptive = binarize(&region, BinarizerKind::Adaptive);
        let global = binarize(&region, BinarizerKind::GlobalHistogram);
        assert_eq!(adaptive, global);
        assert!(adaptive.get(0, 0));
        assert!(!adaptive.get(0, 1));
    }
}
