pub mod code;
pub mod frame;
pub mod luminance;
pub mod matrix;
pub mod point;
pub mod rect;

pub use code::{Code, CodeFormat, MetadataKey, UnknownFormat};
pub use frame::{Frame, FrameMetadata, PixelFormat, Rotation};
pub use luminance::{LuminancePlane, LuminanceRegion};
pub use matrix::BitMatrix;
pub use point::Point;
pub use rect::Rect;
