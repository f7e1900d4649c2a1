//! Frame-level helpers used by the analysis pipeline
//!
//! - Grayscale conversion (frame formats to a luminance plane)
//! - Binarization (adaptive and global-histogram)
//! - Rotation and contrast inversion
//! - Region-of-interest selection
//! - Frame buffer pooling

pub mod binarization;
pub mod grayscale;
pub mod memory_pool;
pub mod region;
pub mod rotation;
