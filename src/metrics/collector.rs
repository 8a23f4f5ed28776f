//! Metrics collection and registry.

use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registration or encoding failure.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of sweep progress for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Steps in the session.
    pub total_steps: u64,
    /// Steps finished so far.
    pub steps_completed: u64,
    /// Patterns the display acknowledged.
    pub patterns_displayed: u64,
    /// Frames captured.
    pub frames_captured: u64,
    /// Display calls that failed.
    pub display_failures: u64,
    /// Capture attempts that produced no frame.
    pub capture_unavailable: u64,
    /// Pattern files written.
    pub patterns_written: u64,
    /// Capture files written.
    pub captures_written: u64,
    /// Artifact writes that failed.
    pub write_failures: u64,
}

/// Prometheus metrics registry for sweep monitoring.
pub struct MetricsRegistry {
    registry: Registry,

    // Progress
    total_steps: IntGauge,
    steps_completed: IntGauge,

    // Devices
    patterns_displayed: IntCounter,
    frames_captured: IntCounter,
    display_failures: IntCounter,
    capture_unavailable: IntCounter,

    // Output
    patterns_written: IntCounter,
    captures_written: IntCounter,
    write_failures: IntCounter,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all sweep metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let total_steps = IntGauge::new("slm_sweep_total_steps", "Number of steps in the session")?;
        let steps_completed =
            IntGauge::new("slm_sweep_steps_completed", "Number of steps finished so far")?;

        let patterns_displayed = IntCounter::new(
            "slm_sweep_patterns_displayed_total",
            "Patterns acknowledged by the display",
        )?;
        let frames_captured =
            IntCounter::new("slm_sweep_frames_captured_total", "Frames retrieved from the camera")?;
        let display_failures =
            IntCounter::new("slm_sweep_display_failures_total", "Display calls that failed")?;
        let capture_unavailable = IntCounter::new(
            "slm_sweep_capture_unavailable_total",
            "Steps where the camera returned no usable frame",
        )?;

        let patterns_written =
            IntCounter::new("slm_sweep_patterns_written_total", "Pattern files written")?;
        let captures_written =
            IntCounter::new("slm_sweep_captures_written_total", "Capture files written")?;
        let write_failures =
            IntCounter::new("slm_sweep_write_failures_total", "Artifact writes that failed")?;

        registry.register(Box::new(total_steps.clone()))?;
        registry.register(Box::new(steps_completed.clone()))?;
        registry.register(Box::new(patterns_displayed.clone()))?;
        registry.register(Box::new(frames_captured.clone()))?;
        registry.register(Box::new(display_failures.clone()))?;
        registry.register(Box::new(capture_unavailable.clone()))?;
        registry.register(Box::new(patterns_written.clone()))?;
        registry.register(Box::new(captures_written.clone()))?;
        registry.register(Box::new(write_failures.clone()))?;

        Ok(Self {
            registry,
            total_steps,
            steps_completed,
            patterns_displayed,
            frames_captured,
            display_failures,
            capture_unavailable,
            patterns_written,
            captures_written,
            write_failures,
        })
    }

    /// Updates all metrics from a snapshot of sweep state.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        self.total_steps.set(snapshot.total_steps as i64);
        self.steps_completed.set(snapshot.steps_completed as i64);

        // Counters only move forward, so increment by the difference
        advance(&self.patterns_displayed, snapshot.patterns_displayed);
        advance(&self.frames_captured, snapshot.frames_captured);
        advance(&self.display_failures, snapshot.display_failures);
        advance(&self.capture_unavailable, snapshot.capture_unavailable);
        advance(&self.patterns_written, snapshot.patterns_written);
        advance(&self.captures_written, snapshot.captures_written);
        advance(&self.write_failures, snapshot.write_failures);
    }

    /// Steps completed and steps in the session.
    pub fn progress(&self) -> (u64, u64) {
        (
            self.steps_completed.get().max(0) as u64,
            self.total_steps.get().max(0) as u64,
        )
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance(counter: &IntCounter, target: u64) {
    let current = counter.get();
    if target > current {
        counter.inc_by(target - current);
    }
}

impl MetricsSnapshot {
    /// Creates a snapshot from a (possibly partial) sweep report.
    pub fn from_report(report: &crate::sweep::SweepReport, total_steps: usize) -> Self {
        Self {
            total_steps: total_steps as u64,
            steps_completed: report.steps.len() as u64,
            patterns_displayed: report.patterns_displayed as u64,
            frames_captured: report.frames_captured as u64,
            display_failures: report.display_failures() as u64,
            capture_unavailable: report.capture_unavailable() as u64,
            patterns_written: report.patterns_written as u64,
            captures_written: report.captures_written as u64,
            write_failures: report.write_failures() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_metrics_update() {
        let registry = MetricsRegistry::new().unwrap();

        let snapshot = MetricsSnapshot {
            total_steps: 10,
            steps_completed: 4,
            patterns_displayed: 4,
            frames_captured: 3,
            capture_unavailable: 1,
            patterns_written: 4,
            captures_written: 3,
            ..Default::default()
        };

        registry.update(&snapshot);
        registry.update(&snapshot);

        let output = registry.encode().unwrap();
        assert!(output.contains("slm_sweep_total_steps 10"));
        assert!(output.contains("slm_sweep_steps_completed 4"));
        assert!(output.contains("slm_sweep_frames_captured_total 3"));
        assert!(output.contains("slm_sweep_capture_unavailable_total 1"));
        assert_eq!(registry.progress(), (4, 10));
    }

    #[test]
    fn test_metrics_encode() {
        let registry = MetricsRegistry::new().unwrap();
        let output = registry.encode().unwrap();

        assert!(output.contains("slm_sweep_patterns_displayed_total"));
        assert!(output.contains("slm_sweep_write_failures_total"));
    }
}
