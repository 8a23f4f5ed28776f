//! Frame type representing a captured image with metadata.

use crate::pattern::PixelBuffer;
use std::time::Instant;

/// A single frame retrieved from a capture device.
///
/// Wraps the 8-bit grayscale image along with the device sequence number
/// and the host time it was received.
#[derive(Clone)]
pub struct Frame {
    /// Grayscale image data.
    image: PixelBuffer,
    /// Host receive timestamp.
    timestamp: Instant,
    /// Monotonic sequence number assigned by the port.
    sequence: u64,
}

impl Frame {
    /// Creates a new frame stamped with the current time.
    pub fn new(image: PixelBuffer, sequence: u64) -> Self {
        Self {
            image,
            timestamp: Instant::now(),
            sequence,
        }
    }

    /// Returns the captured image.
    #[inline]
    pub fn image(&self) -> &PixelBuffer {
        &self.image
    }

    /// Consumes the frame and returns the captured image.
    pub fn into_image(self) -> PixelBuffer {
        self.image
    }

    /// Returns the receive timestamp.
    #[inline]
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// Returns the sequence number.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.image.width())
            .field("height", &self.image.height())
            .field("sequence", &self.sequence)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Resolution;

    #[test]
    fn test_frame_creation() {
        let image = PixelBuffer::filled(Resolution::new(640, 480), 12);
        let frame = Frame::new(image, 1);

        assert_eq!(frame.image().width(), 640);
        assert_eq!(frame.image().height(), 480);
        assert_eq!(frame.sequence(), 1);
        assert!(frame.into_image().is_uniform(12));
    }
}
