//! Per-step outcomes and the sweep manifest.

use crate::pattern::{PatternDescriptor, Resolution};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while writing the manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The report could not be rendered as TOML.
    #[error("failed to serialize manifest: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// The manifest file could not be written.
    #[error("failed to write manifest {path}: {source}")]
    Io {
        /// Manifest path.
        path: PathBuf,
        /// Filesystem error.
        #[source]
        source: std::io::Error,
    },
}

/// What happened during one step.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    /// Zero-based step index.
    pub index: usize,
    /// BLAKE3 digest of the generated pattern.
    pub pattern_digest: String,
    /// Display acknowledged the pattern.
    pub displayed: bool,
    /// Pattern file name, when written.
    pub pattern_file: Option<String>,
    /// Capture file name, when written.
    pub capture_file: Option<String>,
    /// Camera sequence number of the persisted frame.
    pub frame_sequence: Option<u64>,
    /// Display failure for this step.
    pub display_error: Option<String>,
    /// Why no frame was kept.
    pub capture_error: Option<String>,
    /// Non-fatal write failures.
    pub write_errors: Vec<String>,
    /// Pattern shown at this step.
    pub descriptor: PatternDescriptor,
}

impl StepRecord {
    pub(crate) fn new(index: usize, descriptor: PatternDescriptor, pattern_digest: String) -> Self {
        Self {
            index,
            descriptor,
            pattern_digest,
            displayed: false,
            pattern_file: None,
            capture_file: None,
            frame_sequence: None,
            display_error: None,
            capture_error: None,
            write_errors: Vec::new(),
        }
    }
}

/// Totals and per-step records of a finished (or aborted) sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    /// Session start, local time.
    pub started_at: DateTime<Local>,
    /// Directory holding the artifacts.
    pub output_dir: PathBuf,
    /// Patterns the display acknowledged.
    pub patterns_displayed: usize,
    /// Frames retrieved and kept.
    pub frames_captured: usize,
    /// Pattern files written.
    pub patterns_written: usize,
    /// Capture files written.
    pub captures_written: usize,
    /// Display resolution every pattern was rendered at.
    pub resolution: Resolution,
    /// One record per step run, in order.
    pub steps: Vec<StepRecord>,
}

impl SweepReport {
    pub(crate) fn new(started_at: DateTime<Local>, output_dir: PathBuf, resolution: Resolution) -> Self {
        Self {
            started_at,
            output_dir,
            patterns_displayed: 0,
            frames_captured: 0,
            patterns_written: 0,
            captures_written: 0,
            resolution,
            steps: Vec::new(),
        }
    }

    /// Steps whose display call failed.
    pub fn display_failures(&self) -> usize {
        self.steps.iter().filter(|s| s.display_error.is_some()).count()
    }

    /// Steps where capture was attempted but no frame was kept.
    pub fn capture_unavailable(&self) -> usize {
        self.steps.iter().filter(|s| s.capture_error.is_some()).count()
    }

    /// Failed artifact writes across all steps.
    pub fn write_failures(&self) -> usize {
        self.steps.iter().map(|s| s.write_errors.len()).sum()
    }

    /// Writes the report as TOML to `path`.
    pub fn write_manifest(&self, path: &Path) -> Result<(), ManifestError> {
        let text = toml::to_string(self)?;
        std::fs::write(path, text).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_lists_steps() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = SweepReport::new(Local::now(), dir.path().to_path_buf(), Resolution::new(4, 4));
        let mut first = StepRecord::new(
            0,
            PatternDescriptor::Uniform { index: 0, steps: 2 },
            "abc".into(),
        );
        first.displayed = true;
        first.pattern_file = Some("pattern_0000_gray000.bmp".into());
        let mut second = StepRecord::new(
            1,
            PatternDescriptor::Uniform { index: 1, steps: 2 },
            "def".into(),
        );
        second.capture_error = Some("no frame available".into());
        report.steps = vec![first, second];

        let path = dir.path().join("manifest.toml");
        report.write_manifest(&path).unwrap();

        let parsed: toml::Value = std::fs::read_to_string(&path).unwrap().parse().unwrap();
        let steps = parsed["steps"].as_array().unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(
            steps[0]["pattern_file"].as_str(),
            Some("pattern_0000_gray000.bmp")
        );
        assert_eq!(steps[1]["descriptor"]["kind"].as_str(), Some("uniform"));
        assert_eq!(report.capture_unavailable(), 1);
    }
}
