use std::path::Path;

use serde::{Deserialize, Serialize};

use super::hints::DecodeHints;
use crate::error::{Result, ScanError};
use crate::models::Rect;

/// Default fraction of the frame's short side used as the region side
pub const DEFAULT_AREA_RATIO: f32 = 0.8;

/// Per-session decode configuration.
///
/// Controls which symbologies are attempted, which retry tiers run, and how
/// the region of interest is chosen. Immutable once handed to a pipeline.
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```toml
/// multi_decode = false
/// support_vertical_code = true
/// area_ratio = 0.6
///
/// [hints]
/// possible_formats = ["QR_CODE"]
/// try_harder = true
/// character_set = "UTF-8"
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    pub hints: DecodeHints,
    /// Retry with the global-histogram binarizer when the adaptive one fails.
    pub multi_decode: bool,
    /// Retry on a contrast-inverted copy of the region.
    pub support_luminance_invert: bool,
    pub invert_multi_decode: bool,
    /// Retry on a quarter-turned copy of the region.
    pub support_vertical_code: bool,
    pub vertical_multi_decode: bool,
    /// Analyze the whole frame, ignoring region and ratio settings.
    pub full_area_scan: bool,
    /// Region used verbatim when non-degenerate.
    pub explicit_region: Option<Rect>,
    /// Fraction of `min(width, height)` used as the region side, in (0, 1].
    pub area_ratio: f32,
    pub horizontal_offset: i32,
    pub vertical_offset: i32,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            hints: DecodeHints::default(),
            multi_decode: true,
            support_luminance_invert: false,
            invert_multi_decode: false,
            support_vertical_code: false,
            vertical_multi_decode: false,
            full_area_scan: false,
            explicit_region: None,
            area_ratio: DEFAULT_AREA_RATIO,
            horizontal_offset: 0,
            vertical_offset: 0,
        }
    }
}

impl DecodeConfig {
    /// Replace the decode hints
    pub fn with_hints(mut self, hints: DecodeHints) -> Self {
        self.hints = hints;
        self
    }

    pub fn with_multi_decode(mut self, enabled: bool) -> Self {
        self.multi_decode = enabled;
        self
    }

    /// Enable the inverted retry tier, optionally with its own fallback binarizer
    pub fn with_luminance_invert(mut self, enabled: bool, multi_decode: bool) -> Self {
        self.support_luminance_invert = enabled;
        self.invert_multi_decode = multi_decode;
        self
    }

    /// Enable the vertical retry tier, optionally with its own fallback binarizer
    pub fn with_vertical_code(mut self, enabled: bool, multi_decode: bool) -> Self {
        self.support_vertical_code = enabled;
        self.vertical_multi_decode = multi_decode;
        self
    }

    pub fn with_full_area_scan(mut self, enabled: bool) -> Self {
        self.full_area_scan = enabled;
        self
    }

    pub fn with_explicit_region(mut self, region: Rect) -> Self {
        self.explicit_region = Some(region);
        self
    }

    pub fn with_area_ratio(mut self, ratio: f32) -> Self {
        self.area_ratio = ratio;
        self
    }

    pub fn with_offsets(mut self, horizontal: i32, vertical: i32) -> Self {
        self.horizontal_offset = horizontal;
        self.vertical_offset = vertical;
        self
    }

    /// Reject settings outside their domain
    pub fn validate(&self) -> Result<()> {
        if !(self.area_ratio > 0.0 && self.area_ratio <= 1.0) {
            return Err(ScanError::InvalidAreaRatio(self.area_ratio));
        }
        Ok(())
    }

    /// Parse and validate a TOML config
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}
