//! System camera backend built on `nokhwa`.

use super::{CaptureUnavailable, CapturePort, DeviceInitError, Frame};
use crate::config::CaptureConfig;
use crate::pattern::{PixelBuffer, Resolution};
use nokhwa::pixel_format::LumaFormat;
use nokhwa::utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType};

/// Frame rate requested alongside the configured frame size.
const REQUESTED_FPS: u32 = 30;

/// UVC / platform camera decoded to 8-bit luma.
///
/// The stream is opened in the format closest to the configured frame size;
/// the driver may substitute a nearby mode, which is logged on open.
#[derive(Default)]
pub struct NokhwaCamera {
    camera: Option<nokhwa::Camera>,
    sequence: u64,
}

impl NokhwaCamera {
    /// An unopened camera; the device is chosen by `CaptureConfig::device_id`.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CapturePort for NokhwaCamera {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), DeviceInitError> {
        config
            .validate()
            .map_err(|e| DeviceInitError::InvalidConfig(e.to_string()))?;

        let wanted = CameraFormat::new_from(
            config.width,
            config.height,
            FrameFormat::GRAY,
            REQUESTED_FPS,
        );
        let format = RequestedFormat::new::<LumaFormat>(RequestedFormatType::Closest(wanted));
        let mut camera = nokhwa::Camera::new(CameraIndex::Index(config.device_id), format)
            .map_err(|e| DeviceInitError::NotFound(format!("camera {}: {e}", config.device_id)))?;
        camera
            .open_stream()
            .map_err(|e| DeviceInitError::OpenFailed(e.to_string()))?;

        tracing::info!(
            device = config.device_id,
            requested_width = config.width,
            requested_height = config.height,
            format = ?camera.camera_format(),
            "Camera stream opened"
        );
        self.camera = Some(camera);
        self.sequence = 0;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Frame, CaptureUnavailable> {
        let camera = self.camera.as_mut().ok_or(CaptureUnavailable::NotInitialized)?;
        let raw = camera
            .frame()
            .map_err(|e| CaptureUnavailable::CaptureFailed(e.to_string()))?;
        let decoded = raw
            .decode_image::<LumaFormat>()
            .map_err(|e| CaptureUnavailable::CaptureFailed(e.to_string()))?;

        let resolution = Resolution::new(decoded.width(), decoded.height());
        let image = PixelBuffer::from_raw(resolution, decoded.into_raw())
            .map_err(|_| CaptureUnavailable::Incomplete(self.sequence + 1))?;

        self.sequence += 1;
        Ok(Frame::new(image, self.sequence))
    }

    fn is_open(&self) -> bool {
        self.camera.is_some()
    }

    fn close(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            if let Err(e) = camera.stop_stream() {
                tracing::warn!("Failed to stop camera stream: {}", e);
            }
            tracing::info!("Camera closed");
        }
    }
}

impl Drop for NokhwaCamera {
    fn drop(&mut self) {
        self.close();
    }
}
