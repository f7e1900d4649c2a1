//! Decode hints: which symbologies to look for and how hard to try
//!
//! Hint sets are plain values built on demand; nothing here is global state.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::CodeFormat;

/// Character set assumed for byte-mode payloads
pub const DEFAULT_CHARACTER_SET: &str = "UTF-8";

/// Options handed to a `Decoder` with every attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeHints {
    /// Symbologies the decoder may report
    pub possible_formats: BTreeSet<CodeFormat>,
    /// Favor accuracy over speed
    pub try_harder: bool,
    /// Character encoding for byte payloads
    pub character_set: String,
}

impl DecodeHints {
    /// Hints for exactly the given formats, with the common options set
    pub fn for_formats<I>(formats: I) -> Self
    where
        I: IntoIterator<Item = CodeFormat>,
    {
        Self {
            possible_formats: formats.into_iter().collect(),
            try_harder: true,
            character_set: DEFAULT_CHARACTER_SET.to_string(),
        }
    }

    /// Every supported symbology
    pub fn all() -> Self {
        Self::for_formats(CodeFormat::ALL)
    }

    /// Linear symbologies only
    pub fn one_dimensional() -> Self {
        Self::for_formats(CodeFormat::ALL.into_iter().filter(|f| f.is_one_dimensional()))
    }

    /// Matrix and stacked symbologies only
    pub fn two_dimensional() -> Self {
        Self::for_formats(CodeFormat::ALL.into_iter().filter(|f| !f.is_one_dimensional()))
    }

    /// The everyday mix: QR, UPC-A, EAN-13 and Code 128
    pub fn default_formats() -> Self {
        Self::for_formats([
            CodeFormat::QrCode,
            CodeFormat::UpcA,
            CodeFormat::Ean13,
            CodeFormat::Code128,
        ])
    }

    /// QR codes only
    pub fn qr_code() -> Self {
        Self::for_formats([CodeFormat::QrCode])
    }

    /// Code 128 only
    pub fn code_128() -> Self {
        Self::for_formats([CodeFormat::Code128])
    }

    /// True when `format` may be reported
    pub fn allows(&self, format: CodeFormat) -> bool {
        self.possible_formats.contains(&format)
    }
}

impl Default for DecodeHints {
    fn default() -> Self {
        Self::default_formats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partitions_cover_all_formats() {
        let one = DecodeHints::one_dimensional();
        let two = DecodeHints::two_dimensional();
        assert_eq!(one.possible_formats.len(), 12);
        assert_eq!(two.possible_formats.len(), 5);
        assert!(one.possible_formats.is_disjoint(&two.possible_formats));
        assert_eq!(DecodeHints::all().possible_formats.len(), 17);
    }

    #[test]
    fn test_common_options_always_set() {
        for hints in [
            DecodeHints::all(),
            DecodeHints::qr_code(),
            DecodeHints::default(),
            DecodeHints::for_formats([CodeFormat::Itf]),
        ] {
            assert!(hints.try_harder);
            assert_eq!(hints.character_set, "UTF-8");
        }
    }

    #[test]
    fn test_default_formats() {
        let hints = DecodeHints::default();
        assert!(hints.allows(CodeFormat::QrCode));
        assert!(hints.allows(CodeFormat::Ean13));
        assert!(!hints.allows(CodeFormat::Aztec));
    }
}
