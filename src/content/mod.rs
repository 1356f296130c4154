//! Module for subtitle content utils: bounding boxes and sizes used to place
//! subtitle bitmaps on screen and inside the OCR mosaic.
mod area;
mod size;

pub use area::{Area, AreaValues};
pub use size::Size;
use thiserror::Error;

/// Errors raised while building subtitle content value types.
#[derive(Debug, Error)]
pub enum ContentError {
    /// A bounding box had `x2 <= x1` or `y2 <= y1`.
    #[error("Invalid area bounding box")]
    InvalidAreaBounding,
}
