use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Point;

/// Barcode symbology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CodeFormat {
    /// Aztec 2D
    Aztec,
    /// Codabar 1D
    Codabar,
    /// Code 39 1D
    #[serde(rename = "CODE_39")]
    Code39,
    /// Code 93 1D
    #[serde(rename = "CODE_93")]
    Code93,
    /// Code 128 1D
    #[serde(rename = "CODE_128")]
    Code128,
    /// Data Matrix 2D
    DataMatrix,
    /// EAN-8 1D
    #[serde(rename = "EAN_8")]
    Ean8,
    /// EAN-13 1D
    #[serde(rename = "EAN_13")]
    Ean13,
    /// ITF (Interleaved Two of Five) 1D
    Itf,
    /// MaxiCode 2D
    Maxicode,
    /// PDF417 stacked
    #[serde(rename = "PDF_417")]
    Pdf417,
    /// QR Code 2D
    QrCode,
    /// GS1 DataBar (RSS-14)
    #[serde(rename = "RSS_14")]
    Rss14,
    /// GS1 DataBar Expanded
    RssExpanded,
    /// UPC-A 1D
    UpcA,
    /// UPC-E 1D
    UpcE,
    /// UPC/EAN 2- or 5-digit extension
    UpcEanExtension,
}

impl CodeFormat {
    /// Every supported symbology
    pub const ALL: [CodeFormat; 17] = [
        CodeFormat::Aztec,
        CodeFormat::Codabar,
        CodeFormat::Code39,
        CodeFormat::Code93,
        CodeFormat::Code128,
        CodeFormat::DataMatrix,
        CodeFormat::Ean8,
        CodeFormat::Ean13,
        CodeFormat::Itf,
        CodeFormat::Maxicode,
        CodeFormat::Pdf417,
        CodeFormat::QrCode,
        CodeFormat::Rss14,
        CodeFormat::RssExpanded,
        CodeFormat::UpcA,
        CodeFormat::UpcE,
        CodeFormat::UpcEanExtension,
    ];

    /// Canonical upper-case name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Aztec => "AZTEC",
            Self::Codabar => "CODABAR",
            Self::Code39 => "CODE_39",
            Self::Code93 => "CODE_93",
            Self::Code128 => "CODE_128",
            Self::DataMatrix => "DATA_MATRIX",
            Self::Ean8 => "EAN_8",
            Self::Ean13 => "EAN_13",
            Self::Itf => "ITF",
            Self::Maxicode => "MAXICODE",
            Self::Pdf417 => "PDF_417",
            Self::QrCode => "QR_CODE",
            Self::Rss14 => "RSS_14",
            Self::RssExpanded => "RSS_EXPANDED",
            Self::UpcA => "UPC_A",
            Self::UpcE => "UPC_E",
            Self::UpcEanExtension => "UPC_EAN_EXTENSION",
        }
    }

    /// True for linear (1D) symbologies
    pub fn is_one_dimensional(&self) -> bool {
        !matches!(
            self,
            Self::Aztec | Self::DataMatrix | Self::Maxicode | Self::Pdf417 | Self::QrCode
        )
    }
}

impl fmt::Display for CodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error from parsing an unknown format name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown code format: {0}")]
pub struct UnknownFormat(pub String);

impl FromStr for CodeFormat {
    type Err = UnknownFormat;

    /// Accepts canonical names case-insensitively, with or without `_`/`-`
    /// (`qr_code`, `QRCODE`, `code128`, `ean-13`), plus the short alias `qr`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_uppercase();
        if wanted == "QR" {
            return Ok(Self::QrCode);
        }
        Self::ALL
            .into_iter()
            .find(|format| format.name().replace('_', "") == wanted)
            .ok_or_else(|| UnknownFormat(s.to_string()))
    }
}

/// Keys of the metadata a decoder may attach to a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetadataKey {
    /// Symbol version (QR version number, etc.)
    SymbolVersion,
    /// Error correction level
    ErrorCorrectionLevel,
    /// Data mask pattern
    Mask,
    /// Orientation the symbol was found at, in degrees
    Orientation,
}

/// A decoded symbol as returned by a `Decoder`
#[derive(Debug, Clone, PartialEq)]
pub struct Code {
    /// Decoded text payload
    pub text: String,
    /// Symbology the payload was read from
    pub format: CodeFormat,
    /// Corner or finder points. Decoders report them in region coordinates;
    /// analysis results carry them in frame coordinates.
    pub points: Vec<Point>,
    /// Decoder-specific metadata
    pub metadata: BTreeMap<MetadataKey, String>,
}

impl Code {
    /// Create a code without points or metadata
    pub fn new(text: impl Into<String>, format: CodeFormat) -> Self {
        Self {
            text: text.into(),
            format,
            points: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: MetadataKey, value: impl ToString) -> Self {
        self.metadata.insert(key, value.to_string());
        self
    }
}
