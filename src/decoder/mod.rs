//! Decoding: the `Decoder` capability and the retry strategy around it
//!
//! The bit-level symbol reader is an injected capability. Everything in this
//! module decides *what* to hand it and in which order:
//! - Decode configuration and format hints
//! - The ordered retry plan (binarizer fallback, vertical, inverted)
//! - Still-image decoding
//! - Bundled decoders (rqrr-backed QR, multi-format composition)

pub mod config;
pub mod hints;
pub mod multi_format;
pub mod qr;
pub mod still_image;
pub mod strategy;

use crate::error::DecodeError;
use crate::models::{Code, CodeFormat, LuminanceRegion};
use crate::utils::binarization::BinarizerKind;

pub use config::DecodeConfig;
pub use hints::DecodeHints;
pub use multi_format::MultiFormatDecoder;
pub use qr::QrDecoder;
pub use strategy::{AnalysisResult, Attempt, DecodeStrategy, Decoded, Variant};

/// Reads one symbol from a luminance region.
///
/// Treated as a pure function: the only observable effects are the return
/// value and, possibly, a panic. Both an `Err` and a panic count as "not
/// found" for that single attempt.
pub trait Decoder: Send + Sync {
    /// Try to decode `region` after binarizing it with `binarizer`
    fn decode_with_binarizer(
        &self,
        region: &LuminanceRegion,
        hints: &DecodeHints,
        binarizer: BinarizerKind,
    ) -> Result<Code, DecodeError>;

    /// Whether this decoder can ever report `format`
    fn supports(&self, _format: CodeFormat) -> bool {
        true
    }
}

impl<D: Decoder + ?Sized> Decoder for &D {
    fn decode_with_binarizer(
        &self,
        region: &LuminanceRegion,
        hints: &DecodeHints,
        binarizer: BinarizerKind,
    ) -> Result<Code, DecodeError> {
        (**self).decode_with_binarizer(region, hints, binarizer)
    }

    fn supports(&self, format: CodeFormat) -> bool {
        (**self).supports(format)
    }
}

impl<D: Decoder + ?Sized> Decoder for Box<D> {
    fn decode_with_binarizer(
        &self,
        region: &LuminanceRegion,
        hints: &DecodeHints,
        binarizer: BinarizerKind,
    ) -> Result<Code, DecodeError> {
        (**self).decode_with_binarizer(region, hints, binarizer)
    }

    fn supports(&self, format: CodeFormat) -> bool {
        (**self).supports(format)
    }
}

impl<D: Decoder + ?Sized> Decoder for std::sync::Arc<D> {
    fn decode_with_binarizer(
        &self,
        region: &LuminanceRegion,
        hints: &DecodeHints,
        binarizer: BinarizerKind,
    ) -> Result<Code, DecodeError> {
        (**self).decode_with_binarizer(region, hints, binarizer)
    }

    fn supports(&self, format: CodeFormat) -> bool {
        (**self).supports(format)
    }
}
