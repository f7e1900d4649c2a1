//! Ordered decode attempts against one region
//!
//! The retry policy is an explicit list of [`Attempt`]s evaluated in order
//! with early exit. Variants (rotated, inverted) are built lazily, the first
//! time an attempt needs them.

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, trace};

use super::Decoder;
use super::config::DecodeConfig;
use super::hints::DecodeHints;
use crate::error::panic_message;
use crate::models::{Code, LuminancePlane, LuminanceRegion, MetadataKey, Point, Rect};
use crate::utils::binarization::BinarizerKind;

/// Which copy of the region an attempt reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// The region as cropped
    Primary,
    /// Quarter turn clockwise, for codes printed sideways
    Vertical,
    /// Contrast inverted, for light-on-dark codes
    Inverted,
    /// Quarter turn counter-clockwise (still images only)
    CounterClockwise,
}

impl Variant {
    /// Map a point found in this variant back onto the primary region of
    /// size `width` x `height`.
    pub fn to_primary(self, point: Point, width: usize, height: usize) -> Point {
        match self {
            Variant::Primary | Variant::Inverted => point,
            // (x, y) -> (h - 1 - y, x)
            Variant::Vertical => Point::new(point.y, height as f32 - 1.0 - point.x),
            // (x, y) -> (y, w - 1 - x)
            Variant::CounterClockwise => Point::new(width as f32 - 1.0 - point.y, point.x),
        }
    }

    /// Clockwise turn applied to the primary region, in degrees
    pub fn rotation_degrees(self) -> u32 {
        match self {
            Variant::Primary | Variant::Inverted => 0,
            Variant::Vertical => 90,
            Variant::CounterClockwise => 270,
        }
    }
}

/// One decoder call: a region variant and a binarizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Attempt {
    pub variant: Variant,
    pub binarizer: BinarizerKind,
}

impl Attempt {
    pub const fn new(variant: Variant, binarizer: BinarizerKind) -> Self {
        Self { variant, binarizer }
    }
}

/// Push the adaptive attempt for `variant`, then the global one if `multi`
fn push_tier(plan: &mut Vec<Attempt>, variant: Variant, multi: bool) {
    plan.push(Attempt::new(variant, BinarizerKind::Adaptive));
    if multi {
        plan.push(Attempt::new(variant, BinarizerKind::GlobalHistogram));
    }
}

/// Attempts for a camera frame region, in evaluation order.
///
/// Primary first, then the vertical tier, then the inverted tier. Each tier
/// tries the adaptive binarizer and, when its multi-decode flag is set, the
/// global-histogram binarizer.
pub fn attempt_plan(config: &DecodeConfig) -> Vec<Attempt> {
    let mut plan = Vec::with_capacity(6);
    push_tier(&mut plan, Variant::Primary, config.multi_decode);
    if config.support_vertical_code {
        push_tier(&mut plan, Variant::Vertical, config.vertical_multi_decode);
    }
    if config.support_luminance_invert {
        push_tier(&mut plan, Variant::Inverted, config.invert_multi_decode);
    }
    plan
}

/// Attempts for a still image: primary, inverted, then counter-clockwise,
/// each with both binarizers.
pub fn still_image_plan() -> Vec<Attempt> {
    let mut plan = Vec::with_capacity(6);
    for variant in [Variant::Primary, Variant::Inverted, Variant::CounterClockwise] {
        push_tier(&mut plan, variant, true);
    }
    plan
}

/// A successful decode and where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    /// Payload, format, metadata; points in frame coordinates
    pub code: Code,
    /// The attempt that succeeded
    pub attempt: Attempt,
    /// Region that was analyzed
    pub region: Rect,
}

/// Outcome of analyzing one frame or image
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisResult {
    Decoded(Decoded),
    NotFound,
}

impl AnalysisResult {
    pub fn is_decoded(&self) -> bool {
        matches!(self, AnalysisResult::Decoded(_))
    }

    /// The decoded code, if any
    pub fn code(&self) -> Option<&Code> {
        match self {
            AnalysisResult::Decoded(decoded) => Some(&decoded.code),
            AnalysisResult::NotFound => None,
        }
    }
}

/// Region variants, each built on first use
struct Variants<'r> {
    primary: &'r LuminanceRegion,
    vertical: Option<LuminanceRegion>,
    inverted: Option<LuminanceRegion>,
    counter_clockwise: Option<LuminanceRegion>,
}

impl<'r> Variants<'r> {
    fn new(primary: &'r LuminanceRegion) -> Self {
        Self {
            primary,
            vertical: None,
            inverted: None,
            counter_clockwise: None,
        }
    }

    fn get(&mut self, variant: Variant) -> &LuminanceRegion {
        let primary = self.primary;
        match variant {
            Variant::Primary => primary,
            Variant::Vertical => self
                .vertical
                .get_or_insert_with(|| primary.rotated_clockwise()),
            Variant::Inverted => self.inverted.get_or_insert_with(|| primary.inverted()),
            Variant::CounterClockwise => self
                .counter_clockwise
                .get_or_insert_with(|| primary.rotated_counter_clockwise()),
        }
    }
}

/// Runs the retry plan against an injected [`Decoder`]
pub struct DecodeStrategy<D> {
    decoder: D,
}

impl<D: Decoder> DecodeStrategy<D> {
    pub fn new(decoder: D) -> Self {
        Self { decoder }
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Crop `region` out of `plane` and run the plan built from `config`.
    ///
    /// A region that does not fit inside the plane cannot be read; that is
    /// reported as `NotFound`, not as a fault.
    pub fn decode(
        &self,
        plane: &LuminancePlane<'_>,
        region: Rect,
        config: &DecodeConfig,
    ) -> AnalysisResult {
        let cropped = match plane.crop(region) {
            Ok(cropped) => cropped,
            Err(err) => {
                debug!(%region, error = %err, "region outside frame, nothing to decode");
                return AnalysisResult::NotFound;
            }
        };
        self.run_plan(&cropped, region, &config.hints, &attempt_plan(config))
    }

    /// Evaluate `plan` in order against `cropped`, stopping at the first success.
    ///
    /// `region` locates `cropped` in the frame; result points are mapped back
    /// through it. An `Err` or a panic from the decoder counts as not found
    /// for that attempt only.
    pub fn run_plan(
        &self,
        cropped: &LuminanceRegion,
        region: Rect,
        hints: &DecodeHints,
        plan: &[Attempt],
    ) -> AnalysisResult {
        let mut variants = Variants::new(cropped);

        for (index, attempt) in plan.iter().copied().enumerate() {
            let luminance = variants.get(attempt.variant);
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                self.decoder
                    .decode_with_binarizer(luminance, hints, attempt.binarizer)
            }));

            match outcome {
                Ok(Ok(mut code)) => {
                    debug!(
                        attempt = index + 1,
                        variant = ?attempt.variant,
                        binarizer = ?attempt.binarizer,
                        format = %code.format,
                        "decoded"
                    );
                    code.points = code
                        .points
                        .iter()
                        .map(|p| {
                            attempt
                                .variant
                                .to_primary(*p, cropped.width(), cropped.height())
                                .translate(region.left as f32, region.top as f32)
                        })
                        .collect();
                    code.metadata
                        .entry(MetadataKey::Orientation)
                        .or_insert_with(|| attempt.variant.rotation_degrees().to_string());
                    return AnalysisResult::Decoded(Decoded {
                        code,
                        attempt,
                        region,
                    });
                }
                Ok(Err(err)) => {
                    trace!(
                        attempt = index + 1,
                        variant = ?attempt.variant,
                        binarizer = ?attempt.binarizer,
                        error = %err,
                        "attempt failed"
                    );
                }
                Err(payload) => {
                    debug!(
                        attempt = index + 1,
                        variant = ?attempt.variant,
                        binarizer = ?attempt.binarizer,
                        panic = %panic_message(payload.as_ref()),
                        "decoder panicked, treating as not found"
                    );
                }
            }
        }

        trace!(attempts = plan.len(), "no code found");
        AnalysisResult::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;
    use crate::models::CodeFormat;

    struct NeverFinds;

    impl Decoder for NeverFinds {
        fn decode_with_binarizer(
            &self,
            _region: &LuminanceRegion,
            _hints: &DecodeHints,
            _binarizer: BinarizerKind,
        ) -> Result<Code, DecodeError> {
            Err(DecodeError::NotFound)
        }
    }

    /// Reports one corner point at the region's top-left sample
    struct FindsOnVertical;

    impl Decoder for FindsOnVertical {
        fn decode_with_binarizer(
            &self,
            region: &LuminanceRegion,
            _hints: &DecodeHints,
            _binarizer: BinarizerKind,
        ) -> Result<Code, DecodeError> {
            // the vertical variant of a 4x2 region is 2x4
            if region.width() == 2 {
                let mut code = Code::new("sideways", CodeFormat::Code128);
                code.points.push(Point::new(0.0, 0.0));
                Ok(code)
            } else {
                Err(DecodeError::NotFound)
            }
        }
    }

    #[test]
    fn test_plan_primary_only() {
        let config = DecodeConfig::default().with_multi_decode(false);
        assert_eq!(
            attempt_plan(&config),
            vec![Attempt::new(Variant::Primary, BinarizerKind::Adaptive)]
        );
    }

    #[test]
    fn test_plan_all_tiers() {
        let config = DecodeConfig::default()
            .with_vertical_code(true, true)
            .with_luminance_invert(true, true);
        let plan = attempt_plan(&config);
        let variants: Vec<Variant> = plan.iter().map(|a| a.variant).collect();
        assert_eq!(
            variants,
            vec![
                Variant::Primary,
                Variant::Primary,
                Variant::Vertical,
                Variant::Vertical,
                Variant::Inverted,
                Variant::Inverted
            ]
        );
        assert!(plan.iter().step_by(2).all(|a| a.binarizer == BinarizerKind::Adaptive));
    }

    #[test]
    fn test_plan_tier_multi_flags_are_independent() {
        let config = DecodeConfig::default()
            .with_multi_decode(true)
            .with_vertical_code(true, false)
            .with_luminance_invert(true, true);
        assert_eq!(
            attempt_plan(&config),
            vec![
                Attempt::new(Variant::Primary, BinarizerKind::Adaptive),
                Attempt::new(Variant::Primary, BinarizerKind::GlobalHistogram),
                Attempt::new(Variant::Vertical, BinarizerKind::Adaptive),
                Attempt::new(Variant::Inverted, BinarizerKind::Adaptive),
                Attempt::new(Variant::Inverted, BinarizerKind::GlobalHistogram),
            ]
        );
    }

    #[test]
    fn test_still_image_plan_order() {
        let plan = still_image_plan();
        assert_eq!(plan.len(), 6);
        assert_eq!(plan[2], Attempt::new(Variant::Inverted, BinarizerKind::Adaptive));
        assert_eq!(
            plan[5],
            Attempt::new(Variant::CounterClockwise, BinarizerKind::GlobalHistogram)
        );
    }

    #[test]
    fn test_out_of_bounds_region_is_not_found() {
        let data = vec![0u8; 16];
        let plane = LuminancePlane::new(&data, 4, 4).unwrap();
        let strategy = DecodeStrategy::new(NeverFinds);
        let result = strategy.decode(&plane, Rect::new(2, 2, 4, 4), &DecodeConfig::default());
        assert_eq!(result, AnalysisResult::NotFound);
    }

    #[test]
    fn test_vertical_points_map_back_to_frame() {
        let data = vec![128u8; 6 * 4];
        let plane = LuminancePlane::new(&data, 6, 4).unwrap();
        let config = DecodeConfig::default()
            .with_explicit_region(Rect::new(1, 1, 4, 2))
            .with_vertical_code(true, false);
        let strategy = DecodeStrategy::new(FindsOnVertical);

        let result = strategy.decode(&plane, Rect::new(1, 1, 4, 2), &config);
        let AnalysisResult::Decoded(decoded) = result else {
            panic!("expected a decode");
        };
        assert_eq!(decoded.attempt.variant, Variant::Vertical);
        // top-left of the rotated copy is the bottom-left of the region
        assert_eq!(decoded.code.points, vec![Point::new(1.0, 2.0)]);
        assert_eq!(
            decoded.code.metadata.get(&MetadataKey::Orientation).map(String::as_str),
            Some("90")
        );
    }

    #[test]
    fn test_to_primary_inverts_rotations() {
        let region = LuminanceRegion::new((0..12).collect(), 4, 3).unwrap();
        let cw = region.rotated_clockwise();
        let ccw = region.rotated_counter_clockwise();
        for y in 0..cw.height() {
            for x in 0..cw.width() {
                let p = Variant::Vertical.to_primary(Point::new(x as f32, y as f32), 4, 3);
                assert_eq!(cw.get(x, y), region.get(p.x as usize, p.y as usize));

                let p = Variant::CounterClockwise.to_primary(Point::new(x as f32, y as f32), 4, 3);
                assert_eq!(ccw.get(x, y), region.get(p.x as usize, p.y as usize));
            }
        }
    }
}
