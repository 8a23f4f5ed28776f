//! Checkerboard calibration target.

use super::{GenerationError, PixelBuffer, Resolution};

/// Generates a `squares_x` by `squares_y` checkerboard with a white origin cell.
///
/// Cell size is the integer quotient of each dimension by its square count.
/// Remainder pixels are folded into the last column and row of cells, so the
/// board always covers the whole display.
pub fn generate(
    resolution: Resolution,
    squares_x: u32,
    squares_y: u32,
) -> Result<PixelBuffer, GenerationError> {
    let cell_w = cell_extent(resolution.width, squares_x, "horizontal")?;
    let cell_h = cell_extent(resolution.height, squares_y, "vertical")?;

    Ok(PixelBuffer::from_fn(resolution, |x, y| {
        let cx = (x / cell_w).min(squares_x - 1);
        let cy = (y / cell_h).min(squares_y - 1);
        if (cx + cy) % 2 == 0 {
            u8::MAX
        } else {
            0
        }
    }))
}

fn cell_extent(dimension: u32, squares: u32, axis: &'static str) -> Result<u32, GenerationError> {
    if squares == 0 || squares > dimension {
        return Err(GenerationError::InvalidSquareCount {
            axis,
            squares,
            dimension,
        });
    }
    Ok(dimension / squares)
}
