use std::fmt;

use thiserror::Error;

use crate::capture::domain::frame_source::FrameSource;
use crate::shared::constants::{CAPTURE_FPS, CAPTURE_HEIGHT, CAPTURE_WIDTH};
use crate::shared::frame::PixelFormat;

/// Identifies one attached camera. The index is the device's position in
/// enumeration order, which is what selection policy operates on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceId {
    pub index: u32,
    pub name: String,
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} ({})", self.index, self.name)
    }
}

/// Preview stream parameters requested from the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamConfig {
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            format: PixelFormat::Nv12,
            width: CAPTURE_WIDTH,
            height: CAPTURE_HEIGHT,
            fps: CAPTURE_FPS,
        }
    }
}

/// Startup-time capture failures.
///
/// Unlike [`crate::capture::domain::frame_source::CaptureError`], these
/// are fatal: the detection scheduler is never started when one occurs.
#[derive(Error, Debug)]
pub enum CaptureInitError {
    #[error("no capture devices found")]
    NoDevice,
    #[error("device index {index} out of range, {available} device(s) available")]
    BadDeviceIndex { index: usize, available: usize },
    #[error("device enumeration failed: {0}")]
    Enumerate(String),
    #[error("failed to open device {device}: {reason}")]
    Open { device: String, reason: String },
    #[error("failed to configure {width}x{height} {format} stream: {reason}")]
    Configure {
        width: u32,
        height: u32,
        format: PixelFormat,
        reason: String,
    },
    #[error("failed to start preview: {0}")]
    StartPreview(String),
}

/// Enumerates cameras and opens capture sessions on them.
pub trait CaptureBackend {
    fn enumerate_devices(&self) -> Result<Vec<DeviceId>, CaptureInitError>;

    /// Opens the device with its default stream; use
    /// [`CaptureSession::configure_stream`] to select the preview format
    /// afterwards.
    fn open(&self, device: &DeviceId) -> Result<Box<dyn CaptureSession>, CaptureInitError>;
}

/// An open capture device with a configurable preview stream.
///
/// Dropping the session releases the device.
pub trait CaptureSession: FrameSource {
    /// Applies new stream parameters. Restarts the stream if it was
    /// already running.
    fn configure_stream(&mut self, config: &StreamConfig) -> Result<(), CaptureInitError>;

    fn start_preview(&mut self) -> Result<(), CaptureInitError>;

    fn stop_preview(&mut self);
}

/// Picks the device an explicit index names, or the first one by default.
pub fn select_device(
    devices: &[DeviceId],
    preferred: Option<usize>,
) -> Result<&DeviceId, CaptureInitError> {
    if devices.is_empty() {
        return Err(CaptureInitError::NoDevice);
    }
    match preferred {
        None => Ok(&devices[0]),
        Some(index) => devices.get(index).ok_or(CaptureInitError::BadDeviceIndex {
            index,
            available: devices.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn device(index: u32, name: &str) -> DeviceId {
        DeviceId {
            index,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_select_device_defaults_to_first() {
        let devices = vec![device(0, "integrated"), device(1, "usb")];
        let picked = select_device(&devices, None).unwrap();
        assert_eq!(picked.index, 0);
    }

    #[test]
    fn test_select_device_honors_explicit_index() {
        let devices = vec![device(0, "integrated"), device(1, "usb")];
        let picked = select_device(&devices, Some(1)).unwrap();
        assert_eq!(picked.index, 1);
    }

    #[test]
    fn test_select_device_empty_is_no_device() {
        let err = select_device(&[], None).unwrap_err();
        assert!(matches!(err, CaptureInitError::NoDevice));
    }

    #[test]
    fn test_select_device_out_of_range() {
        let devices = vec![device(0, "integrated")];
        let err = select_device(&devices, Some(3)).unwrap_err();
        assert!(matches!(
            err,
            CaptureInitError::BadDeviceIndex {
                index: 3,
                available: 1
            }
        ));
    }

    #[test]
    fn test_startup_stops_before_open_when_no_devices() {
        // Mirrors host wiring: enumeration comes back empty, so selection
        // fails and `open` is never reached.
        struct EmptyBackend {
            opened: Cell<u32>,
        }

        impl CaptureBackend for EmptyBackend {
            fn enumerate_devices(&self) -> Result<Vec<DeviceId>, CaptureInitError> {
                Ok(Vec::new())
            }

            fn open(
                &self,
                _device: &DeviceId,
            ) -> Result<Box<dyn CaptureSession>, CaptureInitError> {
                self.opened.set(self.opened.get() + 1);
                Err(CaptureInitError::NoDevice)
            }
        }

        let backend = EmptyBackend {
            opened: Cell::new(0),
        };
        let devices = backend.enumerate_devices().unwrap();
        let result = select_device(&devices, None);
        assert!(matches!(result, Err(CaptureInitError::NoDevice)));
        assert_eq!(backend.opened.get(), 0);
    }

    #[test]
    fn test_default_stream_config() {
        let config = StreamConfig::default();
        assert_eq!(config.format, PixelFormat::Nv12);
        assert_eq!(config.width, 320);
        assert_eq!(config.height, 240);
        assert_eq!(config.fps, 30);
    }

    #[test]
    fn test_device_id_display() {
        assert_eq!(device(2, "usb cam").to_string(), "#2 (usb cam)");
    }
}
