//! Ordered descriptor sequence for one sweep invocation.

use crate::pattern::{GenerationError, PatternDescriptor, PatternFamily, Resolution};
use std::path::{Path, PathBuf};

/// The patterns to run and where their artifacts go.
///
/// The cursor is the only state that changes while a sweep runs.
#[derive(Debug, Clone)]
pub struct SweepSession {
    descriptors: Vec<PatternDescriptor>,
    output_dir: PathBuf,
    cursor: usize,
}

impl SweepSession {
    /// Session over `descriptors`, writing into `output_dir`.
    pub fn new(
        descriptors: impl IntoIterator<Item = PatternDescriptor>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            descriptors: descriptors.into_iter().collect(),
            output_dir: output_dir.into(),
            cursor: 0,
        }
    }

    /// Session covering every descriptor of `family`.
    pub fn from_family(family: &PatternFamily, output_dir: impl Into<PathBuf>) -> Self {
        Self::new(family.descriptors(), output_dir)
    }

    /// Total steps, including those already run.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// True when there is nothing to sweep.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Artifact directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// All descriptors in display order.
    pub fn descriptors(&self) -> &[PatternDescriptor] {
        &self.descriptors
    }

    /// Index of the next step to run.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Returns the first descriptor that cannot be rendered at `resolution`.
    pub fn validate(&self, resolution: Resolution) -> Result<(), (usize, GenerationError)> {
        self.descriptors
            .iter()
            .enumerate()
            .try_for_each(|(index, d)| d.validate(resolution).map_err(|e| (index, e)))
    }
}

impl Iterator for SweepSession {
    type Item = (usize, PatternDescriptor);

    fn next(&mut self) -> Option<Self::Item> {
        let descriptor = *self.descriptors.get(self.cursor)?;
        let index = self.cursor;
        self.cursor += 1;
        Some((index, descriptor))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.descriptors.len() - self.cursor;
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_advances() {
        let mut session = SweepSession::from_family(&PatternFamily::Ramp { steps: 2 }, "out");
        assert_eq!(session.len(), 2);
        assert_eq!(
            session.next(),
            Some((0, PatternDescriptor::Uniform { index: 0, steps: 2 }))
        );
        assert_eq!(session.position(), 1);
        assert_eq!(session.size_hint(), (1, Some(1)));
        assert!(session.next().is_some());
        assert!(session.next().is_none());
        assert_eq!(session.position(), 2);
    }

    #[test]
    fn test_validate_reports_first_bad_step() {
        let session = SweepSession::new(
            [
                PatternDescriptor::Uniform { index: 0, steps: 1 },
                PatternDescriptor::Hadamard {
                    order: 3,
                    row: 0,
                    col: 0,
                },
            ],
            "out",
        );
        let (index, err) = session.validate(Resolution::new(8, 8)).unwrap_err();
        assert_eq!(index, 1);
        assert_eq!(err, GenerationError::HadamardOrder(3));
    }
}
