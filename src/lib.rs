//! RustScan - real-time barcode and QR frame analysis
//!
//! Turns a stream of camera frames into decoded codes under backpressure:
//! at most one frame is analyzed at a time, frames arriving meanwhile are
//! dropped, and each analysis runs a fixed ladder of retries (second
//! binarizer, sideways, inverted) against a selected region of interest.
//!
//! The symbol reader is pluggable through [`Decoder`]; [`QrDecoder`] is the
//! bundled rqrr-backed implementation.
//!
//! ```no_run
//! use std::sync::Arc;
//! use rust_scan::{
//!     AnalysisContext, AnalysisListener, DecodeConfig, Frame, FrameAnalysisPipeline, QrDecoder,
//!     Rotation, ScanResult,
//! };
//!
//! struct Print;
//!
//! impl AnalysisListener for Print {
//!     fn on_result(&self, result: ScanResult) {
//!         println!("{}", result.code().text);
//!     }
//! }
//!
//! # fn main() -> rust_scan::Result<()> {
//! let pipeline = FrameAnalysisPipeline::builder(QrDecoder::new(), Arc::new(Print))
//!     .config(DecodeConfig::default().with_vertical_code(true, false))
//!     .context(AnalysisContext::dedicated()?)
//!     .build()?;
//!
//! let luma = vec![255u8; 640 * 480];
//! pipeline.on_frame_available(&Frame::luma(&luma, 640, 480, Rotation::Deg0));
//! # Ok(())
//! # }
//! ```

/// Decoder capability, decode configuration and retry strategy
pub mod decoder;
/// Error types
pub mod error;
/// Core data structures (Frame, Rect, LuminanceRegion, Code, etc.)
pub mod models;
/// Single-flight frame analysis pipeline
pub mod pipeline;
/// Utility functions (grayscale, binarization, rotation, region, pooling)
pub mod utils;

pub use decoder::still_image::{decode_image, decode_luminance};
pub use decoder::{
    AnalysisResult, DecodeConfig, DecodeHints, DecodeStrategy, Decoded, Decoder,
    MultiFormatDecoder, QrDecoder,
};
pub use error::{DecodeError, Result, ScanError};
pub use models::{Code, CodeFormat, Frame, FrameMetadata, PixelFormat, Point, Rect, Rotation};
pub use pipeline::{
    AnalysisContext, AnalysisListener, FrameAnalysisPipeline, PipelineState, PipelineStats,
    ScanMode, ScanResult,
};
pub use utils::binarization::BinarizerKind;
pub use utils::memory_pool::{BufferLease, FrameBufferPool};
