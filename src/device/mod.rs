//! Display and capture device ports.
//!
//! The sweep talks to hardware only through [`DisplayPort`] and
//! [`CapturePort`]. Vendor SDKs live behind these traits; the mocks here
//! stand in for them in tests and in the demonstration binary.

mod capture;
mod display;
mod frame;
#[cfg(feature = "camera")]
mod system_camera;

pub use capture::{CaptureUnavailable, CapturePort, MockCamera};
pub use display::{DisplayAck, DisplayError, DisplayPort, MockDisplay};
pub use frame::Frame;
#[cfg(feature = "camera")]
pub use system_camera::NokhwaCamera;

use thiserror::Error;

/// A device could not be brought up at session start.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeviceInitError {
    /// No device matched the requested identifier.
    #[error("device not found: {0}")]
    NotFound(String),
    /// The device exists but refused to open.
    #[error("failed to open device: {0}")]
    OpenFailed(String),
    /// The supplied configuration cannot be honoured.
    #[error("invalid device configuration: {0}")]
    InvalidConfig(String),
}
