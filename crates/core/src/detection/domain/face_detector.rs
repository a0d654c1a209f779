use thiserror::Error;

use crate::shared::frame::{Frame, PixelFormat};
use crate::shared::region::FaceRegion;

/// Why a detection pass failed.
///
/// `ModelLoad` occurs at construction time and is fatal to startup; the
/// other variants end only the cycle they occurred in.
#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("failed to load detection model: {0}")]
    ModelLoad(String),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("detector produced malformed output: {0}")]
    MalformedOutput(String),
}

/// Domain interface for face detection.
///
/// Implementations may keep per-frame state, hence `&mut self`. Callers
/// must check `supports_format` before handing over a frame; `detect` is
/// only defined for formats the implementation reports as supported.
pub trait FaceDetector: Send {
    /// Whether `detect` accepts frames in the given pixel layout.
    fn supports_format(&self, format: PixelFormat) -> bool;

    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceRegion>, DetectionError>;
}
