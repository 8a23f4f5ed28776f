//! Paired display/capture sequencing.
//!
//! Each step of a [`SweepSession`] moves through
//!
//! ```text
//! GENERATE -> DISPLAY -> SETTLE -> CAPTURE (ok | unavailable) -> PERSIST -> next
//! ```
//!
//! Generation failures, device bring-up failures and a persistently
//! unwritable output directory abort the sweep. Everything else is recorded
//! against the step and the sweep continues.

mod controller;
mod report;
mod session;

pub use controller::{SweepController, SweepSettings};
pub use report::{ManifestError, StepRecord, SweepReport};
pub use session::SweepSession;

use crate::device::DeviceInitError;
use crate::output::WriteError;
use crate::pattern::{GenerationError, PatternDescriptor};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Handling of a step whose pattern the display did not accept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayFailurePolicy {
    /// Drop the step: no capture, no artifacts.
    SkipStep,
    /// Skip the capture but still write the generated pattern.
    #[default]
    PersistPattern,
    /// Settle, capture and persist as if the display had succeeded.
    CaptureAnyway,
}

/// Fatal sweep errors.
#[derive(Debug, Error)]
pub enum SweepError {
    /// A descriptor cannot be rendered at the display resolution.
    #[error("step {index} ({descriptor}) cannot be generated: {source}")]
    Generation {
        /// Step index.
        index: usize,
        /// Offending descriptor.
        descriptor: PatternDescriptor,
        /// Why it was rejected.
        #[source]
        source: GenerationError,
    },
    /// The display could not be opened.
    #[error("display initialization failed: {0}")]
    DisplayInit(#[source] DeviceInitError),
    /// The camera could not be opened.
    #[error("capture initialization failed: {0}")]
    CaptureInit(#[source] DeviceInitError),
    /// The output directory could not be prepared.
    #[error("output directory unavailable: {0}")]
    OutputUnavailable(#[source] WriteError),
    /// Too many consecutive artifact writes failed.
    #[error("giving up after {failures} consecutive write failures: {source}")]
    OutputUnwritable {
        /// Consecutive failures at the point of abort.
        failures: u32,
        /// The last write error.
        #[source]
        source: WriteError,
    },
}
