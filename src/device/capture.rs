//! Camera side of a sweep step.
//!
//! The sweep only needs the next frame after a pattern settles; anything
//! that can hand back an 8-bit frame implements [`CapturePort`].

use super::{DeviceInitError, Frame};
use crate::config::CaptureConfig;
use crate::pattern::{PixelBuffer, Resolution};
use std::collections::BTreeSet;
use thiserror::Error;

/// Reasons a frame could not be retrieved.
///
/// None of these are fatal to a sweep; the step simply has no capture artifact.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CaptureUnavailable {
    /// `next_frame` before `open`.
    #[error("camera not initialized")]
    NotInitialized,
    /// The device delivered a partial frame with this sequence number.
    #[error("frame {0} reported incomplete")]
    Incomplete(u64),
    /// No frame arrived in time.
    #[error("no frame available")]
    NoFrame,
    /// Driver or decode failure.
    #[error("failed to capture frame: {0}")]
    CaptureFailed(String),
}

/// A camera the sweep reads after each display update.
pub trait CapturePort {
    /// Opens and initializes the camera with the given configuration.
    fn open(&mut self, config: &CaptureConfig) -> Result<(), DeviceInitError>;

    /// Retrieves the next frame from the device.
    ///
    /// Devices that buffer frames may return one that predates the most
    /// recent display update; callers drain stale frames first.
    fn next_frame(&mut self) -> Result<Frame, CaptureUnavailable>;

    /// Checks if the camera is currently open.
    fn is_open(&self) -> bool;

    /// Closes the camera and releases resources.
    fn close(&mut self);
}

#[derive(Debug, Clone)]
enum MockSource {
    /// Deterministic gradient mixed with the sequence number.
    Synthetic,
    /// The same image on every call.
    Fixed(PixelBuffer),
}

/// Mock camera for testing.
///
/// Produces synthetic frames at the configured size, or a fixed image, and
/// can be scripted to report specific calls as unavailable.
#[derive(Debug)]
pub struct MockCamera {
    config: Option<CaptureConfig>,
    source: MockSource,
    sequence: u64,
    calls: u64,
    unavailable_calls: BTreeSet<u64>,
}

impl Default for MockCamera {
    fn default() -> Self {
        Self {
            config: None,
            source: MockSource::Synthetic,
            sequence: 0,
            calls: 0,
            unavailable_calls: BTreeSet::new(),
        }
    }
}

impl MockCamera {
    /// Synthetic frames at the configured capture size.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a clone of `image` on every successful call.
    pub fn with_frame(image: PixelBuffer) -> Self {
        Self {
            source: MockSource::Fixed(image),
            ..Self::default()
        }
    }

    /// Returns a 1x1 frame of `value` on every successful call.
    pub fn solid(value: u8) -> Self {
        Self::with_frame(PixelBuffer::filled(Resolution::new(1, 1), value))
    }

    /// Makes the given zero-based `next_frame` calls report an incomplete frame.
    pub fn unavailable_on(mut self, calls: impl IntoIterator<Item = u64>) -> Self {
        self.unavailable_calls.extend(calls);
        self
    }

    /// Total `next_frame` calls, including drained and failed ones.
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl CapturePort for MockCamera {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), DeviceInitError> {
        config
            .validate()
            .map_err(|e| DeviceInitError::InvalidConfig(e.to_string()))?;
        self.config = Some(config.clone());
        self.sequence = 0;
        self.calls = 0;
        tracing::info!(width = config.width, height = config.height, "MockCamera opened");
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Frame, CaptureUnavailable> {
        let config = self.config.as_ref().ok_or(CaptureUnavailable::NotInitialized)?;
        let call = self.calls;
        self.calls += 1;
        self.sequence += 1;

        if self.unavailable_calls.contains(&call) {
            return Err(CaptureUnavailable::Incomplete(self.sequence));
        }

        let image = match &self.source {
            MockSource::Fixed(image) => image.clone(),
            MockSource::Synthetic => {
                // Deterministic pattern mixed with sequence, only for exercising frame handling
                let sequence = self.sequence;
                PixelBuffer::from_fn(Resolution::new(config.width, config.height), |x, y| {
                    ((u64::from(x) + u64::from(y) + sequence) % 256) as u8
                })
            }
        };

        Ok(Frame::new(image, self.sequence))
    }

    fn is_open(&self) -> bool {
        self.config.is_some()
    }

    fn close(&mut self) {
        if self.config.take().is_some() {
            tracing::info!(calls = self.calls, "MockCamera closed");
        }
    }
}
