use thiserror::Error;

use crate::models::Rect;

/// Faults raised while preparing or analyzing a frame.
///
/// None of these cross the pipeline boundary as a panic or a `Result`;
/// the pipeline reports them through `AnalysisListener::on_failure`.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Invalid frame dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Frame data too short: expected at least {expected} bytes, got {actual}")]
    FrameTooSmall { expected: usize, actual: usize },

    #[error("Unsupported frame rotation: {0} degrees")]
    UnsupportedRotation(i32),

    #[error("Region {region} does not fit inside a {width}x{height} plane")]
    MalformedRegion {
        region: Rect,
        width: usize,
        height: usize,
    },

    #[error("Invalid area ratio {0}: must be within (0, 1]")]
    InvalidAreaRatio(f32),

    #[error("Analysis panicked: {0}")]
    AnalysisPanic(String),

    #[error("Failed to start analysis thread: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid config file: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ScanError>;

/// Outcome of a single failed decode attempt.
///
/// `NotFound` is the expected, frequent case. The other variants describe a
/// symbol that was located but could not be read; the retry strategy treats
/// all of them the same way and moves on to the next attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("No code found in region")]
    NotFound,

    #[error("Checksum or error correction failed: {0}")]
    Checksum(String),

    #[error("Malformed symbol: {0}")]
    Format(String),

    #[error("Decoder supports none of the requested formats")]
    UnsupportedFormats,
}

/// Render a caught panic payload as text for logging.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
