use std::sync::{Arc, Mutex};

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
    Resolution,
};
use nokhwa::Camera;

use crate::capture::domain::capture_device::{
    CaptureBackend, CaptureInitError, CaptureSession, DeviceId, StreamConfig,
};
use crate::capture::domain::frame_source::{CaptureError, FrameSource};
use crate::capture::infrastructure::convert::{pack_rgb, rgb_to_bgra, rgb_to_nv12};
use crate::shared::frame::{Frame, PixelFormat};

/// Camera access through the `nokhwa` capture stack.
pub struct NokhwaBackend;

impl NokhwaBackend {
    /// Concrete-typed variant of [`CaptureBackend::open`], for hosts that
    /// also need a [`PreviewHandle`] for their display loop.
    pub fn open_session(&self, device: &DeviceId) -> Result<NokhwaCapture, CaptureInitError> {
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::None);
        let cam = Camera::new(CameraIndex::Index(device.index), requested).map_err(|e| {
            CaptureInitError::Open {
                device: device.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(NokhwaCapture {
            cam: Arc::new(Mutex::new(cam)),
            index: device.index,
            streaming: false,
        })
    }
}

impl CaptureBackend for NokhwaBackend {
    fn enumerate_devices(&self) -> Result<Vec<DeviceId>, CaptureInitError> {
        let devices = nokhwa::query(ApiBackend::Auto)
            .map_err(|e| CaptureInitError::Enumerate(e.to_string()))?;
        Ok(devices
            .iter()
            .enumerate()
            .map(|(index, info)| DeviceId {
                index: index as u32,
                name: info.human_name(),
            })
            .collect())
    }

    fn open(&self, device: &DeviceId) -> Result<Box<dyn CaptureSession>, CaptureInitError> {
        Ok(Box::new(self.open_session(device)?))
    }
}

/// An open nokhwa camera, shared between the detection loop and the
/// preview display.
///
/// The mutex serializes device reads; the stream is never reconfigured
/// while the scheduler is running.
pub struct NokhwaCapture {
    cam: Arc<Mutex<Camera>>,
    index: u32,
    streaming: bool,
}

impl NokhwaCapture {
    /// A read-only handle the display thread uses to pull preview frames.
    pub fn preview_handle(&self) -> PreviewHandle {
        PreviewHandle {
            cam: Arc::clone(&self.cam),
        }
    }
}

impl FrameSource for NokhwaCapture {
    fn fetch_frame(
        &mut self,
        format: PixelFormat,
        width: u32,
        height: u32,
    ) -> Result<Frame, CaptureError> {
        if !self.streaming {
            return Err(CaptureError::NotStreaming);
        }
        let raw = {
            let mut cam = self
                .cam
                .lock()
                .map_err(|_| CaptureError::Fetch("capture mutex poisoned".into()))?;
            cam.frame().map_err(|e| CaptureError::Fetch(e.to_string()))?
        };
        let rgb = raw
            .decode_image::<RgbFormat>()
            .map_err(|e| CaptureError::Decode(e.to_string()))?;
        let (got_w, got_h) = rgb.dimensions();
        let mut data = rgb.into_raw();

        // The device may deliver a nearby resolution; fit it to the one
        // the caller asked for.
        if (got_w, got_h) != (width, height) {
            let img = image::RgbImage::from_raw(got_w, got_h, data)
                .ok_or_else(|| CaptureError::Decode("camera returned a truncated frame".into()))?;
            data =
                image::imageops::resize(&img, width, height, image::imageops::FilterType::Triangle)
                    .into_raw();
        }

        let data = match format {
            PixelFormat::Rgb24 => data,
            PixelFormat::Nv12 => rgb_to_nv12(&data, width, height),
            PixelFormat::Bgra32 => rgb_to_bgra(&data),
        };
        Ok(Frame::new(data, format, width, height))
    }
}

impl CaptureSession for NokhwaCapture {
    fn configure_stream(&mut self, config: &StreamConfig) -> Result<(), CaptureInitError> {
        // Swap in a freshly opened stream; the device cannot be
        // reconfigured while frames are being pulled from it.
        if self.streaming {
            self.stop_preview();
        }
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            CameraFormat::new(
                Resolution::new(config.width, config.height),
                FrameFormat::YUYV,
                config.fps,
            ),
        ));
        let cam = Camera::new(CameraIndex::Index(self.index), requested).map_err(|e| {
            CaptureInitError::Configure {
                width: config.width,
                height: config.height,
                format: config.format,
                reason: e.to_string(),
            }
        })?;
        let mut slot = self.cam.lock().map_err(|_| CaptureInitError::Configure {
            width: config.width,
            height: config.height,
            format: config.format,
            reason: "capture mutex poisoned".into(),
        })?;
        *slot = cam;
        Ok(())
    }

    fn start_preview(&mut self) -> Result<(), CaptureInitError> {
        let mut cam = self
            .cam
            .lock()
            .map_err(|_| CaptureInitError::StartPreview("capture mutex poisoned".into()))?;
        cam.open_stream()
            .map_err(|e| CaptureInitError::StartPreview(e.to_string()))?;
        self.streaming = true;
        Ok(())
    }

    fn stop_preview(&mut self) {
        if let Ok(mut cam) = self.cam.lock() {
            if let Err(e) = cam.stop_stream() {
                log::warn!("failed to stop preview stream: {e}");
            }
        }
        self.streaming = false;
    }
}

impl Drop for NokhwaCapture {
    fn drop(&mut self) {
        if self.streaming {
            self.stop_preview();
        }
    }
}

/// Read-only view of the open camera for the display loop.
pub struct PreviewHandle {
    cam: Arc<Mutex<Camera>>,
}

impl PreviewHandle {
    /// Latest camera image as packed `0x00RRGGBB` pixels, with its
    /// dimensions.
    pub fn preview_pixels(&self) -> Result<(Vec<u32>, u32, u32), CaptureError> {
        let raw = {
            let mut cam = self
                .cam
                .lock()
                .map_err(|_| CaptureError::Fetch("capture mutex poisoned".into()))?;
            cam.frame().map_err(|e| CaptureError::Fetch(e.to_string()))?
        };
        let rgb = raw
            .decode_image::<RgbFormat>()
            .map_err(|e| CaptureError::Decode(e.to_string()))?;
        let (w, h) = rgb.dimensions();
        Ok((pack_rgb(&rgb.into_raw()), w, h))
    }
}
