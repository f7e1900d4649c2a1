//! QR-only decoder backed by `rqrr`

use rqrr::PreparedImage;
use tracing::trace;

use super::Decoder;
use super::hints::DecodeHints;
use crate::error::DecodeError;
use crate::models::{Code, CodeFormat, LuminanceRegion, MetadataKey, Point};
use crate::utils::binarization::{BinarizerKind, binarize};

/// Reads QR codes: binarize with the requested strategy, then hand the
/// bitmap to rqrr's grid detector.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrDecoder;

impl QrDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for QrDecoder {
    fn decode_with_binarizer(
        &self,
        region: &LuminanceRegion,
        hints: &DecodeHints,
        binarizer: BinarizerKind,
    ) -> Result<Code, DecodeError> {
        if !hints.allows(CodeFormat::QrCode) {
            return Err(DecodeError::UnsupportedFormats);
        }

        let matrix = binarize(region, binarizer);
        let mut prepared =
            PreparedImage::prepare_from_bitmap(matrix.width(), matrix.height(), |x, y| {
                matrix.get(x, y)
            });
        let grids = prepared.detect_grids();
        trace!(grids = grids.len(), ?binarizer, "qr grids detected");

        let mut last_error = DecodeError::NotFound;
        for grid in &grids {
            match grid.decode() {
                Ok((meta, text)) => {
                    let mut code = Code::new(text, CodeFormat::QrCode)
                        .with_metadata(MetadataKey::SymbolVersion, meta.version.0)
                        .with_metadata(MetadataKey::ErrorCorrectionLevel, ecc_name(meta.ecc_level))
                        .with_metadata(MetadataKey::Mask, meta.mask);
                    code.points = grid
                        .bounds
                        .iter()
                        .map(|p| Point::new(p.x as f32, p.y as f32))
                        .collect();
                    return Ok(code);
                }
                Err(err) => last_error = DecodeError::Checksum(err.to_string()),
            }
        }
        Err(last_error)
    }

    fn supports(&self, format: CodeFormat) -> bool {
        format == CodeFormat::QrCode
    }
}

/// rqrr's two-bit EC level field as its usual letter
fn ecc_name(level: u16) -> &'static str {
    match level {
        0 => "M",
        1 => "L",
        2 => "H",
        3 => "Q",
        _ => "?",
    }
}
