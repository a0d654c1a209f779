use thiserror::Error;

use crate::shared::frame::{Frame, PixelFormat};

/// Why a single frame fetch failed.
///
/// Recovered locally: the current detection cycle ends early and the loop
/// carries on with the next tick.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("capture device is not streaming")]
    NotStreaming,
    #[error("frame fetch failed: {0}")]
    Fetch(String),
    #[error("frame decode failed: {0}")]
    Decode(String),
}

/// Supplies the current camera image in a caller-chosen format and size.
///
/// Implementations block until a frame is available. The scheduler calls
/// this once per admitted cycle from its worker thread, hence `Send`.
pub trait FrameSource: Send {
    fn fetch_frame(
        &mut self,
        format: PixelFormat,
        width: u32,
        height: u32,
    ) -> Result<Frame, CaptureError>;
}
