//! Calibration pattern generation.
//!
//! Every generator is a pure function of a [`PatternDescriptor`] and the
//! display [`Resolution`]: the same inputs always give a bit-identical
//! [`PixelBuffer`]. Malformed descriptors fail with a [`GenerationError`]
//! before any pixel is produced.

mod buffer;
pub mod checkerboard;
mod family;
pub mod hadamard;
pub mod ramp;

pub use buffer::{BufferSizeError, PixelBuffer, Resolution};
pub use family::PatternFamily;
pub use hadamard::HadamardMatrix;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised for descriptors that cannot produce a pattern.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// A ramp of zero steps.
    #[error("ramp must have at least one step")]
    EmptyRamp,
    /// Ramp step past the end of the ramp.
    #[error("ramp index {index} out of range for {steps} steps")]
    RampIndexOutOfRange {
        /// Requested step.
        index: u32,
        /// Ramp length.
        steps: u32,
    },
    /// Checkerboard square count of zero or wider than the display.
    #[error("{axis} square count {squares} invalid for {dimension} px (must be 1..={dimension})")]
    InvalidSquareCount {
        /// `"horizontal"` or `"vertical"`.
        axis: &'static str,
        /// Requested count.
        squares: u32,
        /// Display size along `axis`.
        dimension: u32,
    },
    /// Hadamard order that is not a power of two.
    #[error("Hadamard order {0} is not a power of two")]
    HadamardOrder(u32),
    /// Hadamard order larger than either display dimension.
    #[error("Hadamard order {order} exceeds display resolution {resolution}")]
    HadamardExceedsDisplay {
        /// Requested order.
        order: u32,
        /// Display it was checked against.
        resolution: Resolution,
    },
    /// Basis element outside the matrix.
    #[error("Hadamard basis index ({row}, {col}) out of range for order {order}")]
    HadamardIndexOutOfRange {
        /// Matrix order.
        order: u32,
        /// Requested row.
        row: u32,
        /// Requested column.
        col: u32,
    },
    /// Display with no pixels.
    #[error("display resolution {0} has a zero dimension")]
    EmptyResolution(Resolution),
}

/// Identifies one pattern and its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PatternDescriptor {
    /// Whole field at ramp step `index` of `steps`.
    Uniform {
        /// Zero-based ramp step.
        index: u32,
        /// Ramp length; the last step is white.
        steps: u32,
    },
    /// Left half white, right half at ramp step `index` of `steps`.
    HalfSplit {
        /// Zero-based ramp step of the right half.
        index: u32,
        /// Ramp length.
        steps: u32,
    },
    /// Board of `squares_x` by `squares_y` cells, white origin.
    Checkerboard {
        /// Cells across.
        squares_x: u32,
        /// Cells down.
        squares_y: u32,
    },
    /// Single-pixel basis element `(row, col)` of `H(order)`.
    Hadamard {
        /// Matrix order, a power of two.
        order: u32,
        /// Basis row.
        row: u32,
        /// Basis column.
        col: u32,
    },
}

impl PatternDescriptor {
    /// Checks the descriptor against a display without generating pixels.
    pub fn validate(&self, resolution: Resolution) -> Result<(), GenerationError> {
        if resolution.is_empty() {
            return Err(GenerationError::EmptyResolution(resolution));
        }
        match *self {
            Self::Uniform { index, steps } | Self::HalfSplit { index, steps } => {
                ramp::ramp_level(index, steps).map(|_| ())
            }
            Self::Checkerboard {
                squares_x,
                squares_y,
            } => {
                if squares_x == 0 || squares_x > resolution.width {
                    return Err(GenerationError::InvalidSquareCount {
                        axis: "horizontal",
                        squares: squares_x,
                        dimension: resolution.width,
                    });
                }
                if squares_y == 0 || squares_y > resolution.height {
                    return Err(GenerationError::InvalidSquareCount {
                        axis: "vertical",
                        squares: squares_y,
                        dimension: resolution.height,
                    });
                }
                Ok(())
            }
            Self::Hadamard { order, row, col } => hadamard::check_basis(resolution, order, row, col),
        }
    }

    /// Short filename-safe label, e.g. `halfgray128` or `hadamard8x8_i02_j03`.
    pub fn tag(&self) -> String {
        match *self {
            Self::Uniform { index, steps } => match ramp::ramp_level(index, steps) {
                Ok(level) => format!("gray{level:03}"),
                Err(_) => format!("gray_step{index}"),
            },
            Self::HalfSplit { index, steps } => match ramp::ramp_level(index, steps) {
                Ok(level) => format!("halfgray{level:03}"),
                Err(_) => format!("halfgray_step{index}"),
            },
            Self::Checkerboard {
                squares_x,
                squares_y,
            } => format!("checker{squares_x}x{squares_y}"),
            Self::Hadamard { order, row, col } => {
                format!("hadamard{order}x{order}_i{row:02}_j{col:02}")
            }
        }
    }
}

impl std::fmt::Display for PatternDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Uniform { index, steps } => write!(f, "uniform step {index}/{steps}"),
            Self::HalfSplit { index, steps } => write!(f, "half-split step {index}/{steps}"),
            Self::Checkerboard {
                squares_x,
                squares_y,
            } => write!(f, "checkerboard {squares_x}x{squares_y}"),
            Self::Hadamard { order, row, col } => {
                write!(f, "Hadamard H({order}) basis ({row}, {col})")
            }
        }
    }
}

/// Renders `descriptor` at the display's native resolution.
pub fn generate(
    descriptor: &PatternDescriptor,
    resolution: Resolution,
) -> Result<PixelBuffer, GenerationError> {
    descriptor.validate(resolution)?;
    match *descriptor {
        PatternDescriptor::Uniform { index, steps } => ramp::uniform(resolution, index, steps),
        PatternDescriptor::HalfSplit { index, steps } => ramp::half_split(resolution, index, steps),
        PatternDescriptor::Checkerboard {
            squares_x,
            squares_y,
        } => checkerboard::generate(resolution, squares_x, squares_y),
        PatternDescriptor::Hadamard { order, row, col } => {
            hadamard::basis_pattern(resolution, order, row, col)
        }
    }
}
