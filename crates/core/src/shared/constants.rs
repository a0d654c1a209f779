use std::time::Duration;

pub const ULTRAFACE_MODEL_NAME: &str = "version-RFB-320.onnx";
pub const ULTRAFACE_MODEL_URL: &str =
    "https://github.com/onnx/models/raw/main/validated/vision/body_analysis/ultraface/models/version-RFB-320.onnx";

/// Preview stream resolution the detector expects.
pub const CAPTURE_WIDTH: u32 = 320;
pub const CAPTURE_HEIGHT: u32 = 240;

/// Frame rate requested from the camera for the preview stream.
pub const CAPTURE_FPS: u32 = 30;

/// Sampling cadence of the detection loop (~15 Hz).
pub const TICK_INTERVAL: Duration = Duration::from_millis(66);

/// Consecutive dropped ticks before the scheduler warns that detection
/// has stalled (~3 seconds at the default cadence).
pub const STALL_WARN_TICKS: u32 = 45;
