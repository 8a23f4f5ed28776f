//! Prometheus metrics for sweep progress.
//!
//! Long Hadamard scans run for hours; these metrics let a dashboard follow
//! them. The registry is always available, and the `metrics` feature adds an
//! HTTP endpoint serving it.
//!
//! # Metrics Exposed
//!
//! - `slm_sweep_total_steps` / `slm_sweep_steps_completed` - session progress
//! - `slm_sweep_patterns_displayed_total` - patterns acknowledged by the display
//! - `slm_sweep_frames_captured_total` - frames retrieved from the camera
//! - `slm_sweep_display_failures_total` - display calls that failed
//! - `slm_sweep_capture_unavailable_total` - steps without a usable frame
//! - `slm_sweep_patterns_written_total` / `slm_sweep_captures_written_total` - files written
//! - `slm_sweep_write_failures_total` - artifact writes that failed
//!
//! # Example
//!
//! ```
//! use slm_sweep::metrics::{MetricsRegistry, MetricsSnapshot};
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//! registry.update(&MetricsSnapshot {
//!     total_steps: 64,
//!     steps_completed: 10,
//!     patterns_displayed: 10,
//!     frames_captured: 9,
//!     ..Default::default()
//! });
//! assert!(registry.encode().unwrap().contains("slm_sweep_steps_completed 10"));
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, ServerError};
