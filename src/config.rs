//! Sweep configuration.
//!
//! Every section has defaults matching the bench setup the sweeps were
//! written for (1024x768 modulator, 50 ms settle, five stale frames drained
//! before each capture), so an empty or missing file is a valid configuration.

use crate::output::ArtifactFormat;
use crate::pattern::{PatternFamily, Resolution};
use crate::sweep::DisplayFailurePolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Modulator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Native width in pixels.
    pub width: u32,
    /// Native height in pixels.
    pub height: u32,
    /// What to do with a step whose pattern the display refused.
    pub on_failure: DisplayFailurePolicy,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        let native = Resolution::default();
        Self {
            width: native.width,
            height: native.height,
            on_failure: DisplayFailurePolicy::default(),
        }
    }
}

impl DisplayConfig {
    /// Native resolution as a [`Resolution`].
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }
}

/// Configuration for camera capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Capture a response frame for every pattern. When false the sweep is
    /// display-only.
    pub enabled: bool,
    /// Camera device index.
    pub device_id: u32,
    /// Requested frame width in pixels.
    pub width: u32,
    /// Requested frame height in pixels.
    pub height: u32,
    /// Stale buffered frames discarded before the frame that is kept.
    pub drain_frames: u32,
    /// Pause between discarded frames, in milliseconds.
    pub drain_interval_ms: u64,
    /// Retrieval attempts for the kept frame.
    pub attempts: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            device_id: 0,
            width: 640,
            height: 480,
            drain_frames: 5,
            drain_interval_ms: 10,
            attempts: 1,
        }
    }
}

impl CaptureConfig {
    /// Creates a new configuration with the specified dimensions.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions("capture"));
        }
        if self.attempts == 0 {
            return Err(ConfigError::InvalidCaptureAttempts);
        }
        Ok(())
    }

    /// Pause between drained frames.
    pub fn drain_interval(&self) -> Duration {
        Duration::from_millis(self.drain_interval_ms)
    }
}

/// Timing between display and capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Delay after a pattern is shown before the camera is read, in milliseconds.
    pub settle_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self { settle_ms: 50 }
    }
}

impl TimingConfig {
    /// Settle delay after each display update.
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving pattern and capture files.
    pub directory: PathBuf,
    /// Image encoding for artifacts.
    pub format: ArtifactFormat,
    /// Prefix filenames with the session start time (`%Y%m%d_%H%M%S`).
    pub timestamp_prefix: bool,
    /// Consecutive write failures tolerated before the sweep aborts.
    pub max_consecutive_write_failures: u32,
    /// Write `manifest.toml` describing every step.
    pub manifest: bool,
    /// Metrics server port (0 to disable).
    pub metrics_port: u16,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("captures"),
            format: ArtifactFormat::Bmp,
            timestamp_prefix: false,
            max_consecutive_write_failures: 3,
            manifest: true,
            metrics_port: 0,
        }
    }
}

/// Serial link and power-up parameters for the diode laser controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaserConfig {
    /// Serial device, e.g. `/dev/ttyUSB0` or `COM3`.
    pub port: String,
    /// Line speed in baud.
    pub baud_rate: u32,
    /// Per-reply read timeout, in milliseconds.
    pub timeout_ms: u64,
    /// Wait after opening the port before the first command, in milliseconds.
    pub settle_ms: u64,
    /// Access level to unlock before changing the current.
    pub access_level: u8,
    /// Unlock code for `access_level`. Required by the power-up sequence.
    pub access_code: Option<u32>,
    /// Diode current to set, in milliamps.
    pub current_ma: u32,
}

impl Default for LaserConfig {
    fn default() -> Self {
        Self {
            port: String::from("/dev/ttyUSB0"),
            baud_rate: 115_200,
            timeout_ms: 1000,
            settle_ms: 2000,
            access_level: 3,
            access_code: None,
            current_ma: 79,
        }
    }
}

impl LaserConfig {
    /// Per-reply read timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Wait after opening the port.
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// A zero width or height in the named section.
    #[error("invalid {0} dimensions")]
    InvalidDimensions(&'static str),
    /// `capture.attempts` is zero.
    #[error("capture attempts must be at least 1")]
    InvalidCaptureAttempts,
    /// `output.max_consecutive_write_failures` is zero.
    #[error("max_consecutive_write_failures must be at least 1")]
    InvalidWriteFailureLimit,
    /// The pattern family expands to no descriptors.
    #[error("pattern family expands to no patterns")]
    EmptyPatternFamily,
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The file is not valid TOML for this layout.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SweepConfig {
    /// `[display]`: modulator size and failure policy.
    #[serde(default)]
    pub display: DisplayConfig,
    /// `[capture]`: camera and frame draining.
    #[serde(default)]
    pub capture: CaptureConfig,
    /// `[timing]`: settle delay.
    #[serde(default)]
    pub timing: TimingConfig,
    /// `[output]`: artifact directory, format and limits.
    #[serde(default)]
    pub output: OutputConfig,
    /// `[pattern]`: which sweep to run.
    #[serde(default)]
    pub pattern: PatternFamily,
    /// `[laser]`: controller link for the `laser` command.
    #[serde(default)]
    pub laser: LaserConfig,
}

impl SweepConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        let config: SweepConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the sections that the sweep depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.display.resolution().is_empty() {
            return Err(ConfigError::InvalidDimensions("display"));
        }
        if self.capture.enabled {
            self.capture.validate()?;
        }
        if self.output.max_consecutive_write_failures == 0 {
            return Err(ConfigError::InvalidWriteFailureLimit);
        }
        if self.pattern.is_empty() {
            return Err(ConfigError::EmptyPatternFamily);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = SweepConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.display.resolution(), Resolution::new(1024, 768));
        assert_eq!(config.timing.settle(), Duration::from_millis(50));
        assert_eq!(config.capture.drain_frames, 5);
        assert_eq!(config.pattern, PatternFamily::HalfSplit { steps: 1000 });
    }

    #[test]
    fn test_zero_dimensions_invalid() {
        let mut config = CaptureConfig::default();
        config.width = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDimensions("capture"))
        ));
    }

    #[test]
    fn test_disabled_capture_skips_validation() {
        let mut config = SweepConfig::default();
        config.capture.enabled = false;
        config.capture.attempts = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let toml = r#"
            [display]
            width = 1920
            height = 1080
            on_failure = "skip_step"

            [pattern]
            family = "checkerboard"
            squares_x = 16
            squares_y = 9

            [output]
            directory = "out"
            format = "png"
        "#;
        let config: SweepConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.display.on_failure, DisplayFailurePolicy::SkipStep);
        assert_eq!(config.output.format, ArtifactFormat::Png);
        assert_eq!(config.output.directory, PathBuf::from("out"));
        assert_eq!(config.timing.settle_ms, 50);
        assert_eq!(config.laser.baud_rate, 115_200);
    }

    #[test]
    fn test_from_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.toml");
        let mut config = SweepConfig::default();
        config.pattern = PatternFamily::Hadamard { order: 8 };
        config.laser.access_code = Some(1234);
        std::fs::write(&path, toml::to_string(&config).unwrap()).unwrap();

        let loaded = SweepConfig::from_file(&path).unwrap();
        assert_eq!(loaded.pattern, PatternFamily::Hadamard { order: 8 });
        assert_eq!(loaded.laser.access_code, Some(1234));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            SweepConfig::from_file("/nonexistent/sweep.toml"),
            Err(ConfigError::FileReadError(_))
        ));
    }
}
