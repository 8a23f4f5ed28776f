//! Gray-level ramps: uniform fields and half-white/half-gray splits.

use super::{GenerationError, PixelBuffer, Resolution};

/// Intensity of step `index` in a ramp of `steps` levels spanning 0..=255.
///
/// Computes `round(index * 255 / (steps - 1))` with half-up rounding in
/// integer arithmetic. A single-step ramp is black.
pub fn ramp_level(index: u32, steps: u32) -> Result<u8, GenerationError> {
    if steps == 0 {
        return Err(GenerationError::EmptyRamp);
    }
    if index >= steps {
        return Err(GenerationError::RampIndexOutOfRange { index, steps });
    }
    if steps == 1 {
        return Ok(0);
    }

    let span = u64::from(steps - 1);
    let scaled = (2 * u64::from(index) * 255 + span) / (2 * span);
    Ok(scaled.min(255) as u8)
}

/// Whole-field gray level.
pub fn uniform(resolution: Resolution, index: u32, steps: u32) -> Result<PixelBuffer, GenerationError> {
    let level = ramp_level(index, steps)?;
    Ok(PixelBuffer::filled(resolution, level))
}

/// Left half saturated, right half at the ramp level.
///
/// The split column is `width / 2`; for odd widths the extra column is gray.
pub fn half_split(
    resolution: Resolution,
    index: u32,
    steps: u32,
) -> Result<PixelBuffer, GenerationError> {
    let level = ramp_level(index, steps)?;
    let split = resolution.width / 2;
    Ok(PixelBuffer::from_fn(resolution, |x, _| {
        if x < split {
            u8::MAX
        } else {
            level
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_three_step_ramp_rounds_midpoint_up() {
        let levels: Vec<u8> = (0..3).map(|i| ramp_level(i, 3).unwrap()).collect();
        assert_eq!(levels, vec![0, 128, 255]);
    }

    #[test]
    fn test_single_step_ramp_is_black() {
        assert_eq!(ramp_level(0, 1).unwrap(), 0);
    }

    #[test]
    fn test_degenerate_ramps_rejected() {
        assert!(matches!(ramp_level(0, 0), Err(GenerationError::EmptyRamp)));
        assert!(matches!(
            ramp_level(5, 5),
            Err(GenerationError::RampIndexOutOfRange { index: 5, steps: 5 })
        ));
    }

    #[test]
    fn test_thousand_step_ramp_matches_rounding() {
        // 1 * 255 / 999 = 0.255 -> 0, 2 * 255 / 999 = 0.51 -> 1
        assert_eq!(ramp_level(1, 1000).unwrap(), 0);
        assert_eq!(ramp_level(2, 1000).unwrap(), 1);
        assert_eq!(ramp_level(500, 1000).unwrap(), 128);
    }

    #[test]
    fn test_half_split_columns() {
        let buf = half_split(Resolution::new(5, 2), 1, 3).unwrap();
        for y in 0..2 {
            assert_eq!(buf.get(0, y), Some(255));
            assert_eq!(buf.get(1, y), Some(255));
            assert_eq!(buf.get(2, y), Some(128));
            assert_eq!(buf.get(4, y), Some(128));
        }
    }

    #[test]
    fn test_uniform_fills_every_pixel() {
        let buf = uniform(Resolution::new(8, 6), 2, 3).unwrap();
        assert!(buf.is_uniform(255));
    }

    proptest! {
        #[test]
        fn prop_ramp_endpoints(steps in 2u32..5000) {
            prop_assert_eq!(ramp_level(0, steps).unwrap(), 0);
            prop_assert_eq!(ramp_level(steps - 1, steps).unwrap(), 255);
        }

        #[test]
        fn prop_ramp_is_monotonic(steps in 2u32..2000, index in 0u32..1999) {
            prop_assume!(index + 1 < steps);
            prop_assert!(ramp_level(index, steps).unwrap() <= ramp_level(index + 1, steps).unwrap());
        }
    }
}
