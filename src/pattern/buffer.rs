//! Immutable 8-bit grayscale pixel buffer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Width and height of a modulator or sensor, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    /// Columns.
    pub width: u32,
    /// Rows.
    pub height: u32,
}

impl Resolution {
    /// Creates a resolution.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total number of pixels.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Returns true when either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl Default for Resolution {
    /// Native resolution of the HOLOEYE LC-R 1024 class of modulators.
    fn default() -> Self {
        Self::new(1024, 768)
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Raised when raw pixel data does not match the declared dimensions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("pixel data has {actual} bytes, expected {expected} for {resolution}")]
pub struct BufferSizeError {
    /// Declared dimensions.
    pub resolution: Resolution,
    /// `width * height`.
    pub expected: usize,
    /// Length of the supplied data.
    pub actual: usize,
}

/// A 2-D grid of 8-bit intensities stored row-major.
///
/// Buffers are immutable once built: there are no mutable accessors, so a
/// buffer handed to a display or writer is exactly the one that was generated.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    resolution: Resolution,
    pixels: Vec<u8>,
}

impl PixelBuffer {
    /// Creates a buffer where every pixel has the same intensity.
    pub fn filled(resolution: Resolution, value: u8) -> Self {
        Self {
            resolution,
            pixels: vec![value; resolution.pixel_count()],
        }
    }

    /// Creates a buffer by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(resolution: Resolution, mut f: impl FnMut(u32, u32) -> u8) -> Self {
        let mut pixels = Vec::with_capacity(resolution.pixel_count());
        for y in 0..resolution.height {
            for x in 0..resolution.width {
                pixels.push(f(x, y));
            }
        }
        Self { resolution, pixels }
    }

    /// Wraps existing row-major pixel data.
    pub fn from_raw(resolution: Resolution, pixels: Vec<u8>) -> Result<Self, BufferSizeError> {
        let expected = resolution.pixel_count();
        if pixels.len() != expected {
            return Err(BufferSizeError {
                resolution,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self { resolution, pixels })
    }

    /// Buffer dimensions.
    #[inline]
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.resolution.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.resolution.height
    }

    /// Row-major pixel data.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Consumes the buffer and returns its pixel data.
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Intensity at `(x, y)`, or `None` outside the buffer.
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.resolution.width || y >= self.resolution.height {
            return None;
        }
        let idx = (y as usize) * (self.resolution.width as usize) + x as usize;
        self.pixels.get(idx).copied()
    }

    /// Returns true when every pixel equals `value`.
    pub fn is_uniform(&self, value: u8) -> bool {
        self.pixels.iter().all(|&p| p == value)
    }

    /// BLAKE3 digest of the dimensions and pixel data, hex encoded.
    pub fn digest(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.resolution.width.to_le_bytes());
        hasher.update(&self.resolution.height.to_le_bytes());
        hasher.update(&self.pixels);
        hasher.finalize().to_hex().to_string()
    }
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.resolution.width)
            .field("height", &self.resolution.height)
            .field("pixel_bytes", &self.pixels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fn_is_row_major() {
        let buf = PixelBuffer::from_fn(Resolution::new(3, 2), |x, y| (y * 10 + x) as u8);
        assert_eq!(buf.pixels(), &[0, 1, 2, 10, 11, 12]);
        assert_eq!(buf.get(2, 1), Some(12));
        assert_eq!(buf.get(3, 0), None);
    }

    #[test]
    fn test_from_raw_rejects_wrong_length() {
        let err = PixelBuffer::from_raw(Resolution::new(4, 4), vec![0; 15]).unwrap_err();
        assert_eq!(err.expected, 16);
        assert_eq!(err.actual, 15);
    }

    #[test]
    fn test_digest_depends_on_shape() {
        let a = PixelBuffer::filled(Resolution::new(4, 1), 7);
        let b = PixelBuffer::filled(Resolution::new(1, 4), 7);
        assert_eq!(a.pixels(), b.pixels());
        assert_ne!(a.digest(), b.digest());
        assert_eq!(a.digest(), a.clone().digest());
    }
}
