//! Pattern families: the descriptor sequence of a whole sweep.

use super::PatternDescriptor;
use serde::{Deserialize, Serialize};

/// Selects which calibration sweep to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum PatternFamily {
    /// Uniform gray levels from black to white.
    Ramp {
        /// Number of gray levels.
        steps: u32,
    },
    /// Half-white/half-gray split with the gray half ramped.
    HalfSplit {
        /// Number of gray levels on the ramped half.
        steps: u32,
    },
    /// A single checkerboard frame.
    Checkerboard {
        /// Cells across.
        squares_x: u32,
        /// Cells down.
        squares_y: u32,
    },
    /// Every single-pixel basis element of `H(order)`, row-major.
    Hadamard {
        /// Matrix order, a power of two.
        order: u32,
    },
}

impl Default for PatternFamily {
    fn default() -> Self {
        Self::HalfSplit { steps: 1000 }
    }
}

impl PatternFamily {
    /// Number of descriptors the family expands to.
    pub fn len(&self) -> usize {
        match *self {
            Self::Ramp { steps } | Self::HalfSplit { steps } => steps as usize,
            Self::Checkerboard { .. } => 1,
            Self::Hadamard { order } => (order as usize) * (order as usize),
        }
    }

    /// True for a ramp of zero steps or a zero-order scan.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lazily yields the family's descriptors in display order.
    pub fn descriptors(&self) -> Box<dyn Iterator<Item = PatternDescriptor>> {
        match *self {
            Self::Ramp { steps } => {
                Box::new((0..steps).map(move |index| PatternDescriptor::Uniform { index, steps }))
            }
            Self::HalfSplit { steps } => {
                Box::new((0..steps).map(move |index| PatternDescriptor::HalfSplit { index, steps }))
            }
            Self::Checkerboard {
                squares_x,
                squares_y,
            } => Box::new(std::iter::once(PatternDescriptor::Checkerboard {
                squares_x,
                squares_y,
            })),
            Self::Hadamard { order } => Box::new((0..order).flat_map(move |row| {
                (0..order).map(move |col| PatternDescriptor::Hadamard { order, row, col })
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hadamard_family_is_row_major() {
        let family = PatternFamily::Hadamard { order: 2 };
        let got: Vec<_> = family.descriptors().collect();
        assert_eq!(got.len(), family.len());
        assert_eq!(
            got,
            vec![
                PatternDescriptor::Hadamard { order: 2, row: 0, col: 0 },
                PatternDescriptor::Hadamard { order: 2, row: 0, col: 1 },
                PatternDescriptor::Hadamard { order: 2, row: 1, col: 0 },
                PatternDescriptor::Hadamard { order: 2, row: 1, col: 1 },
            ]
        );
    }

    #[test]
    fn test_ramp_family_len() {
        let family = PatternFamily::Ramp { steps: 3 };
        assert_eq!(family.descriptors().count(), 3);
        assert!(PatternFamily::HalfSplit { steps: 0 }.is_empty());
    }

    #[test]
    fn test_family_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            pattern: PatternFamily,
        }
        let parsed: Wrapper =
            toml::from_str("[pattern]\nfamily = \"hadamard\"\norder = 16\n").unwrap();
        assert_eq!(parsed.pattern, PatternFamily::Hadamard { order: 16 });
    }
}
