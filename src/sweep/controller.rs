//! Sweep orchestration.

use super::{DisplayFailurePolicy, StepRecord, SweepError, SweepReport, SweepSession};
use crate::config::{CaptureConfig, SweepConfig};
use crate::device::{CapturePort, DisplayPort, Frame};
use crate::metrics::{MetricsRegistry, MetricsSnapshot};
use crate::output::{ArtifactKind, ArtifactWriter, FileNaming};
use crate::pattern::{self, PixelBuffer, Resolution};
use chrono::Local;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Parameters fixed for the lifetime of a controller.
#[derive(Debug, Clone)]
pub struct SweepSettings {
    /// Native display resolution; every pattern is rendered at this size.
    pub resolution: Resolution,
    /// Delay between a display update and the capture.
    pub settle: Duration,
    /// Camera configuration, including stale-frame draining and retries.
    pub capture: CaptureConfig,
    /// What to do with a step the display rejected.
    pub on_display_failure: DisplayFailurePolicy,
    /// Consecutive write failures tolerated before aborting.
    pub max_consecutive_write_failures: u32,
    /// Prefix filenames with the session start time.
    pub timestamp_prefix: bool,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self::from(&SweepConfig::default())
    }
}

impl From<&SweepConfig> for SweepSettings {
    fn from(config: &SweepConfig) -> Self {
        Self {
            resolution: config.display.resolution(),
            settle: config.timing.settle(),
            capture: config.capture.clone(),
            on_display_failure: config.display.on_failure,
            max_consecutive_write_failures: config.output.max_consecutive_write_failures.max(1),
            timestamp_prefix: config.output.timestamp_prefix,
        }
    }
}

/// Closes the display when the sweep leaves scope, including on error.
struct DisplayGuard<'a> {
    port: &'a mut dyn DisplayPort,
}

impl Drop for DisplayGuard<'_> {
    fn drop(&mut self) {
        self.port.close();
    }
}

/// Closes the camera when the sweep leaves scope, including on error.
struct CaptureGuard<'a> {
    port: &'a mut dyn CapturePort,
}

impl Drop for CaptureGuard<'_> {
    fn drop(&mut self) {
        self.port.close();
    }
}

/// What remains of a step after the display call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepPlan {
    Full,
    PatternOnly,
    Skip,
}

/// Runs sweep sessions against injected devices.
pub struct SweepController {
    settings: SweepSettings,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl SweepController {
    /// Controller without metrics.
    pub fn new(settings: SweepSettings) -> Self {
        Self {
            settings,
            metrics: None,
        }
    }

    /// Publishes progress to `registry` after every step.
    pub fn with_metrics(mut self, registry: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(registry);
        self
    }

    /// Settings applied to every run.
    pub fn settings(&self) -> &SweepSettings {
        &self.settings
    }

    /// Runs every remaining step of `session`.
    ///
    /// The display is opened first, then the camera (when one is given and
    /// capture is enabled). Both are closed before this returns, whether the
    /// sweep completes or aborts.
    pub fn run(
        &self,
        session: &mut SweepSession,
        display: &mut dyn DisplayPort,
        capture: Option<&mut dyn CapturePort>,
        writer: &mut dyn ArtifactWriter,
    ) -> Result<SweepReport, SweepError> {
        let resolution = self.settings.resolution;

        if let Err((index, source)) = session.validate(resolution) {
            return Err(SweepError::Generation {
                index,
                descriptor: session.descriptors()[index],
                source,
            });
        }

        display.open(resolution).map_err(SweepError::DisplayInit)?;
        let display = DisplayGuard { port: display };

        let mut camera = match capture {
            Some(port) if self.settings.capture.enabled => {
                port.open(&self.settings.capture)
                    .map_err(SweepError::CaptureInit)?;
                Some(CaptureGuard { port })
            }
            _ => None,
        };

        writer
            .prepare(session.output_dir())
            .map_err(SweepError::OutputUnavailable)?;

        let started_at = Local::now();
        let total = session.len();
        let mut naming = FileNaming::new(total, writer.format());
        if self.settings.timestamp_prefix {
            naming = naming.with_timestamp(started_at);
        }

        let output_dir = session.output_dir().to_path_buf();
        let mut report = SweepReport::new(started_at, output_dir.clone(), resolution);
        let mut consecutive_write_failures = 0u32;

        info!(
            steps = total,
            %resolution,
            capture = camera.is_some(),
            output = %output_dir.display(),
            "Starting sweep"
        );

        for (index, descriptor) in session.by_ref() {
            let pattern = pattern::generate(&descriptor, resolution).map_err(|source| {
                SweepError::Generation {
                    index,
                    descriptor,
                    source,
                }
            })?;
            let mut record = StepRecord::new(index, descriptor, pattern.digest());

            let plan = match display.port.show(&pattern) {
                Ok(ack) => {
                    report.patterns_displayed += 1;
                    record.displayed = true;
                    trace!(step = index, frame = ack.frame_number, "Pattern displayed");
                    StepPlan::Full
                }
                Err(e) => {
                    warn!(step = index, pattern = %descriptor, error = %e, "Display failed");
                    record.display_error = Some(e.to_string());
                    match self.settings.on_display_failure {
                        DisplayFailurePolicy::SkipStep => StepPlan::Skip,
                        DisplayFailurePolicy::PersistPattern => StepPlan::PatternOnly,
                        DisplayFailurePolicy::CaptureAnyway => StepPlan::Full,
                    }
                }
            };

            if plan == StepPlan::Skip {
                report.steps.push(record);
                self.publish(&report, total);
                continue;
            }

            let frame = if plan == StepPlan::Full {
                sleep(self.settings.settle);
                match camera.as_mut() {
                    Some(guard) => self.acquire(guard.port, index, &mut record),
                    None => None,
                }
            } else {
                None
            };

            let pattern_name = naming.file_name(ArtifactKind::Pattern, index, &descriptor);
            let written = self.persist(
                writer,
                &output_dir.join(&pattern_name),
                &pattern,
                &mut consecutive_write_failures,
                &mut record,
            )?;
            if written {
                report.patterns_written += 1;
                record.pattern_file = Some(pattern_name);
            }

            if let Some(frame) = frame {
                report.frames_captured += 1;
                record.frame_sequence = Some(frame.sequence());
                let capture_name = naming.file_name(ArtifactKind::Capture, index, &descriptor);
                let written = self.persist(
                    writer,
                    &output_dir.join(&capture_name),
                    frame.image(),
                    &mut consecutive_write_failures,
                    &mut record,
                )?;
                if written {
                    report.captures_written += 1;
                    record.capture_file = Some(capture_name);
                }
            }

            debug!(
                step = index + 1,
                of = total,
                pattern = %descriptor,
                captured = record.capture_file.is_some(),
                "Step complete"
            );
            report.steps.push(record);
            self.publish(&report, total);
        }

        info!(
            displayed = report.patterns_displayed,
            captured = report.frames_captured,
            patterns_written = report.patterns_written,
            captures_written = report.captures_written,
            display_failures = report.display_failures(),
            capture_unavailable = report.capture_unavailable(),
            "Sweep complete"
        );

        Ok(report)
    }

    /// Drains stale frames, then makes up to `attempts` retrievals.
    fn acquire(
        &self,
        camera: &mut dyn CapturePort,
        index: usize,
        record: &mut StepRecord,
    ) -> Option<Frame> {
        let capture = &self.settings.capture;

        for _ in 0..capture.drain_frames {
            match camera.next_frame() {
                Ok(stale) => trace!(step = index, sequence = stale.sequence(), "Drained stale frame"),
                Err(e) => trace!(step = index, error = %e, "Drain read returned nothing"),
            }
            sleep(capture.drain_interval());
        }

        let mut last_error = None;
        for attempt in 1..=capture.attempts.max(1) {
            match camera.next_frame() {
                Ok(frame) => return Some(frame),
                Err(e) => {
                    debug!(step = index, attempt, error = %e, "Capture attempt failed");
                    last_error = Some(e);
                }
            }
        }

        if let Some(e) = last_error {
            warn!(step = index, error = %e, "Capture unavailable");
            record.capture_error = Some(e.to_string());
        }
        None
    }

    /// Writes one artifact, escalating to a fatal error once the
    /// consecutive failure limit is reached.
    fn persist(
        &self,
        writer: &mut dyn ArtifactWriter,
        path: &Path,
        buffer: &PixelBuffer,
        consecutive_failures: &mut u32,
        record: &mut StepRecord,
    ) -> Result<bool, SweepError> {
        match writer.write(path, buffer) {
            Ok(()) => {
                *consecutive_failures = 0;
                Ok(true)
            }
            Err(e) => {
                *consecutive_failures += 1;
                warn!(
                    step = record.index,
                    error = %e,
                    consecutive = *consecutive_failures,
                    "Artifact write failed"
                );
                if *consecutive_failures >= self.settings.max_consecutive_write_failures {
                    return Err(SweepError::OutputUnwritable {
                        failures: *consecutive_failures,
                        source: e,
                    });
                }
                record.write_errors.push(e.to_string());
                Ok(false)
            }
        }
    }

    fn publish(&self, report: &SweepReport, total: usize) {
        if let Some(registry) = &self.metrics {
            registry.update(&MetricsSnapshot::from_report(report, total));
        }
    }
}

fn sleep(duration: Duration) {
    if !duration.is_zero() {
        std::thread::sleep(duration);
    }
}
