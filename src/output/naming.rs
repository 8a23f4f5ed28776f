//! Deterministic artifact filenames.
//!
//! A step's pattern and capture files share everything except the leading
//! stem: `[<prefix>_]pattern_<index>_<tag>.<ext>` pairs with
//! `[<prefix>_]capture_<index>_<tag>.<ext>`.

use super::ArtifactFormat;
use crate::pattern::PatternDescriptor;
use chrono::{DateTime, Local};

/// Minimum zero-padding of the step index.
const MIN_INDEX_WIDTH: usize = 4;

/// Which side of a step an artifact records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// The generated pattern.
    Pattern,
    /// The camera frame taken while it was shown.
    Capture,
}

impl ArtifactKind {
    fn stem(&self) -> &'static str {
        match self {
            Self::Pattern => "pattern",
            Self::Capture => "capture",
        }
    }
}

/// Builds filenames for one session.
#[derive(Debug, Clone)]
pub struct FileNaming {
    prefix: Option<String>,
    index_width: usize,
    extension: &'static str,
}

impl FileNaming {
    /// Naming for a session of `steps` patterns.
    ///
    /// The index is padded to at least four digits, and wider when the
    /// session is long enough that four would not sort correctly.
    pub fn new(steps: usize, format: ArtifactFormat) -> Self {
        let digits = steps.saturating_sub(1).max(1).to_string().len();
        Self {
            prefix: None,
            index_width: digits.max(MIN_INDEX_WIDTH),
            extension: format.extension(),
        }
    }

    /// Prefixes every name with the session start time.
    pub fn with_timestamp(self, started: DateTime<Local>) -> Self {
        self.with_prefix(started.format("%Y%m%d_%H%M%S").to_string())
    }

    /// Prefixes every name with `prefix` and an underscore.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Filename for step `index`.
    pub fn file_name(&self, kind: ArtifactKind, index: usize, descriptor: &PatternDescriptor) -> String {
        let body = format!(
            "{}_{:0width$}_{}.{}",
            kind.stem(),
            index,
            descriptor.tag(),
            self.extension,
            width = self.index_width
        );
        match &self.prefix {
            Some(prefix) => format!("{prefix}_{body}"),
            None => body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const HALF: PatternDescriptor = PatternDescriptor::HalfSplit {
        index: 999,
        steps: 1000,
    };

    #[test]
    fn test_pattern_and_capture_pair() {
        let naming = FileNaming::new(1000, ArtifactFormat::Bmp);
        let pattern = naming.file_name(ArtifactKind::Pattern, 999, &HALF);
        let capture = naming.file_name(ArtifactKind::Capture, 999, &HALF);
        assert_eq!(pattern, "pattern_0999_halfgray255.bmp");
        assert_eq!(capture, "capture_0999_halfgray255.bmp");
        assert_eq!(
            pattern.trim_start_matches("pattern"),
            capture.trim_start_matches("capture")
        );
    }

    #[test]
    fn test_index_widens_for_long_sessions() {
        let naming = FileNaming::new(16384, ArtifactFormat::Png);
        let d = PatternDescriptor::Hadamard {
            order: 128,
            row: 0,
            col: 7,
        };
        assert_eq!(
            naming.file_name(ArtifactKind::Pattern, 7, &d),
            "pattern_00007_hadamard128x128_i00_j07.png"
        );
    }

    #[test]
    fn test_timestamp_prefix() {
        let started = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        let naming = FileNaming::new(3, ArtifactFormat::Bmp).with_timestamp(started);
        let d = PatternDescriptor::Uniform { index: 0, steps: 3 };
        assert_eq!(
            naming.file_name(ArtifactKind::Capture, 0, &d),
            "20240309_140500_capture_0000_gray000.bmp"
        );
    }
}
