//! Modulator display abstraction.
//!
//! This module provides a trait-based abstraction over SLM hardware,
//! allowing vendor SDK bindings and mock implementations for testing
//! to be swapped freely.

use super::DeviceInitError;
use crate::pattern::{PixelBuffer, Resolution};
use std::collections::BTreeSet;
use thiserror::Error;

/// Errors reported while showing a single pattern.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DisplayError {
    /// `show` before `open`.
    #[error("display not initialized")]
    NotInitialized,
    /// Buffer size differs from the opened resolution.
    #[error("pattern is {actual}, display expects {expected}")]
    ResolutionMismatch {
        /// Resolution the device was opened at.
        expected: Resolution,
        /// Resolution of the rejected buffer.
        actual: Resolution,
    },
    /// Upload to the device failed.
    #[error("failed to load pattern into display memory: {0}")]
    LoadFailed(String),
    /// The device did not switch to the pattern.
    #[error("failed to show pattern: {0}")]
    ShowFailed(String),
}

/// Confirmation that the device accepted and is showing a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayAck {
    /// Number of patterns shown since the device was opened, including this one.
    pub frame_number: u64,
}

/// Trait for display implementations.
pub trait DisplayPort {
    /// Opens the device and checks that it runs at `resolution`.
    fn open(&mut self, resolution: Resolution) -> Result<(), DeviceInitError>;

    /// Pushes `buffer` to the device and waits for it to be accepted.
    fn show(&mut self, buffer: &PixelBuffer) -> Result<DisplayAck, DisplayError>;

    /// Checks if the device is currently open.
    fn is_open(&self) -> bool;

    /// Closes the device and releases resources.
    fn close(&mut self);
}

/// In-memory display that records every pattern it is asked to show.
#[derive(Debug, Default)]
pub struct MockDisplay {
    resolution: Option<Resolution>,
    shown: Vec<PixelBuffer>,
    calls: u64,
    fail_open: bool,
    failing_calls: BTreeSet<u64>,
}

impl MockDisplay {
    /// A display that accepts every pattern.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `open` fail, as if no device were attached.
    pub fn unavailable() -> Self {
        Self {
            fail_open: true,
            ..Self::default()
        }
    }

    /// Makes the given zero-based `show` calls fail.
    pub fn failing_on(calls: impl IntoIterator<Item = u64>) -> Self {
        Self {
            failing_calls: calls.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Patterns successfully shown, in order.
    pub fn shown(&self) -> &[PixelBuffer] {
        &self.shown
    }

    /// Total `show` calls, successful or not.
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl DisplayPort for MockDisplay {
    fn open(&mut self, resolution: Resolution) -> Result<(), DeviceInitError> {
        if self.fail_open {
            return Err(DeviceInitError::NotFound("mock display".into()));
        }
        if resolution.is_empty() {
            return Err(DeviceInitError::InvalidConfig(format!(
                "display resolution {resolution}"
            )));
        }
        self.resolution = Some(resolution);
        self.calls = 0;
        self.shown.clear();
        tracing::info!(%resolution, "MockDisplay opened");
        Ok(())
    }

    fn show(&mut self, buffer: &PixelBuffer) -> Result<DisplayAck, DisplayError> {
        let expected = self.resolution.ok_or(DisplayError::NotInitialized)?;
        let call = self.calls;
        self.calls += 1;

        if buffer.resolution() != expected {
            return Err(DisplayError::ResolutionMismatch {
                expected,
                actual: buffer.resolution(),
            });
        }
        if self.failing_calls.contains(&call) {
            return Err(DisplayError::ShowFailed(format!("scripted failure on call {call}")));
        }

        self.shown.push(buffer.clone());
        Ok(DisplayAck {
            frame_number: self.shown.len() as u64,
        })
    }

    fn is_open(&self) -> bool {
        self.resolution.is_some()
    }

    fn close(&mut self) {
        if self.resolution.take().is_some() {
            tracing::info!(shown = self.shown.len(), "MockDisplay closed");
        }
    }
}
