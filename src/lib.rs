//! SLM Calibration Sweep Library
//!
//! Drives a spatial light modulator through calibration sweeps (gray ramps,
//! half-gray splits, checkerboards, single-pixel Hadamard scans) while a
//! camera records the response, and writes both sides of every step to disk
//! under filenames that pair them.
//!
//! # Architecture
//!
//! ```text
//! pattern ──> sweep ──> device::DisplayPort
//!               │   <── device::CapturePort
//!               └────> output::ArtifactWriter
//! ```
//!
//! Devices and encoders are injected through traits; nothing in the sweep
//! loop depends on a particular vendor SDK.
//!
//! # Design Principles
//!
//! - **Deterministic patterns**: the same descriptor always renders the same bytes
//! - **Non-fatal per-step failures**: a dropped frame never ends a long scan
//! - **Scoped devices**: ports are closed before a sweep returns, even on abort
//!
//! # Example
//!
//! ```
//! use slm_sweep::{
//!     device::{MockCamera, MockDisplay},
//!     output::MemoryWriter,
//!     pattern::{PatternFamily, Resolution},
//!     sweep::{SweepController, SweepSession, SweepSettings},
//! };
//! use std::time::Duration;
//!
//! let settings = SweepSettings {
//!     resolution: Resolution::new(64, 48),
//!     settle: Duration::ZERO,
//!     ..SweepSettings::default()
//! };
//! let controller = SweepController::new(settings);
//!
//! let mut session = SweepSession::from_family(&PatternFamily::Ramp { steps: 3 }, "captures");
//! let mut display = MockDisplay::new();
//! let mut camera = MockCamera::solid(128);
//! let mut writer = MemoryWriter::new();
//!
//! let report = controller
//!     .run(&mut session, &mut display, Some(&mut camera), &mut writer)
//!     .unwrap();
//! assert_eq!(report.patterns_written, 3);
//! assert_eq!(report.captures_written, 3);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod config;
pub mod device;
pub mod laser;
pub mod metrics;
pub mod output;
pub mod pattern;
pub mod sweep;

// Re-export commonly used types at crate root
pub use config::SweepConfig;
pub use device::{CapturePort, DisplayPort, Frame, MockCamera, MockDisplay};
pub use output::{ArtifactWriter, ImageWriter};
pub use pattern::{generate, PatternDescriptor, PatternFamily, PixelBuffer, Resolution};
pub use sweep::{SweepController, SweepReport, SweepSession, SweepSettings};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
