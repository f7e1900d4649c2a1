use tracing::trace;

use super::Decoder;
use super::hints::DecodeHints;
use crate::error::DecodeError;
use crate::models::{Code, CodeFormat, LuminanceRegion};
use crate::utils::binarization::BinarizerKind;

/// Composes several decoders behind one [`Decoder`].
///
/// Only decoders supporting at least one hinted format are consulted, in
/// insertion order. The first success wins.
#[derive(Default)]
pub struct MultiFormatDecoder {
    readers: Vec<Box<dyn Decoder>>,
}

impl MultiFormatDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a reader
    pub fn with_reader(mut self, reader: impl Decoder + 'static) -> Self {
        self.readers.push(Box::new(reader));
        self
    }

    pub fn len(&self) -> usize {
        self.readers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }
}

impl Decoder for MultiFormatDecoder {
    fn decode_with_binarizer(
        &self,
        region: &LuminanceRegion,
        hints: &DecodeHints,
        binarizer: BinarizerKind,
    ) -> Result<Code, DecodeError> {
        let mut eligible = self
            .readers
            .iter()
            .filter(|reader| hints.possible_formats.iter().any(|f| reader.supports(*f)))
            .peekable();
        if eligible.peek().is_none() {
            return Err(DecodeError::UnsupportedFormats);
        }

        let mut last_error = DecodeError::NotFound;
        for reader in eligible {
            match reader.decode_with_binarizer(region, hints, binarizer) {
                Ok(code) => return Ok(code),
                Err(DecodeError::NotFound) => {}
                Err(err) => {
                    trace!(error = %err, "reader failed");
                    last_error = err;
                }
            }
        }
        Err(last_error)
    }

    fn supports(&self, format: CodeFormat) -> bool {
        self.readers.iter().any(|reader| reader.supports(format))
    }
}
