//! Sylvester-construction Hadamard matrices and single-pixel basis patterns.
//!
//! The matrix is built by repeated doubling, `H(2k) = [[H, H], [H, -H]]`,
//! starting from `H(1) = [1]`. Entries map to display intensities with
//! `+1 -> 255` and `-1 -> 0`.

use super::{GenerationError, PixelBuffer, Resolution};

/// A square `{-1, +1}` Hadamard matrix of power-of-two order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HadamardMatrix {
    order: usize,
    entries: Vec<i8>,
}

impl HadamardMatrix {
    /// Builds `H(order)`.
    pub fn new(order: u32) -> Result<Self, GenerationError> {
        if order == 0 || !order.is_power_of_two() {
            return Err(GenerationError::HadamardOrder(order));
        }

        let mut size = 1usize;
        let mut entries = vec![1i8];
        while size < order as usize {
            let doubled = size * 2;
            let mut next = vec![0i8; doubled * doubled];
            for r in 0..size {
                for c in 0..size {
                    let v = entries[r * size + c];
                    next[r * doubled + c] = v;
                    next[r * doubled + c + size] = v;
                    next[(r + size) * doubled + c] = v;
                    next[(r + size) * doubled + c + size] = -v;
                }
            }
            entries = next;
            size = doubled;
        }

        Ok(Self {
            order: size,
            entries,
        })
    }

    /// Matrix order `n`.
    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    /// Entry at `(row, col)`; panics outside the matrix like slice indexing.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> i8 {
        self.entries[row * self.order + col]
    }

    /// Entry at `(row, col)` as a display intensity.
    #[inline]
    pub fn gray(&self, row: usize, col: usize) -> u8 {
        if self.get(row, col) > 0 {
            u8::MAX
        } else {
            0
        }
    }

    /// True when `H == Hᵀ`, which holds for every Sylvester order.
    pub fn is_symmetric(&self) -> bool {
        (0..self.order).all(|r| (0..r).all(|c| self.get(r, c) == self.get(c, r)))
    }

    /// Dot product of rows `a` and `b`.
    pub fn row_dot(&self, a: usize, b: usize) -> i64 {
        (0..self.order)
            .map(|c| i64::from(self.get(a, c)) * i64::from(self.get(b, c)))
            .sum()
    }
}

/// Single-pixel basis element `(row, col)` of `H(order)`, upsampled to the display.
///
/// The `order x order` field is zero except at `(row, col)`, which holds the
/// gray-mapped matrix entry. Upsampling is nearest-neighbour
/// (`src = dst * order / dim`), so block edges are exact and no intermediate
/// intensities appear.
pub fn basis_pattern(
    resolution: Resolution,
    order: u32,
    row: u32,
    col: u32,
) -> Result<PixelBuffer, GenerationError> {
    check_basis(resolution, order, row, col)?;
    let value = if sylvester_entry(row, col) > 0 { u8::MAX } else { 0 };
    Ok(upsample_single(resolution, order, row, col, value))
}

/// Entry `(row, col)` of any Sylvester matrix large enough to contain it.
///
/// Each doubling negates the bottom-right quadrant, so the sign flips once
/// for every bit set in both indices: `H[i][j] = (-1)^popcount(i & j)`.
#[inline]
pub fn sylvester_entry(row: u32, col: u32) -> i8 {
    if (row & col).count_ones() % 2 == 0 {
        1
    } else {
        -1
    }
}

/// Validates a basis descriptor without building the matrix.
pub(crate) fn check_basis(
    resolution: Resolution,
    order: u32,
    row: u32,
    col: u32,
) -> Result<(), GenerationError> {
    if order == 0 || !order.is_power_of_two() {
        return Err(GenerationError::HadamardOrder(order));
    }
    if order > resolution.width || order > resolution.height {
        return Err(GenerationError::HadamardExceedsDisplay { order, resolution });
    }
    if row >= order || col >= order {
        return Err(GenerationError::HadamardIndexOutOfRange { order, row, col });
    }
    Ok(())
}

fn upsample_single(resolution: Resolution, order: u32, row: u32, col: u32, value: u8) -> PixelBuffer {
    let n = u64::from(order);
    let (w, h) = (u64::from(resolution.width), u64::from(resolution.height));
    PixelBuffer::from_fn(resolution, |x, y| {
        let src_col = u64::from(x) * n / w;
        let src_row = u64::from(y) * n / h;
        if src_row == u64::from(row) && src_col == u64::from(col) {
            value
        } else {
            0
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_power_of_two() {
        for order in [0, 3, 6, 12, 100] {
            assert!(matches!(
                HadamardMatrix::new(order),
                Err(GenerationError::HadamardOrder(o)) if o == order
            ));
        }
    }

    #[test]
    fn test_order_one_and_two() {
        let h1 = HadamardMatrix::new(1).unwrap();
        assert_eq!(h1.get(0, 0), 1);

        let h2 = HadamardMatrix::new(2).unwrap();
        assert_eq!(
            [h2.get(0, 0), h2.get(0, 1), h2.get(1, 0), h2.get(1, 1)],
            [1, 1, 1, -1]
        );
    }

    #[test]
    fn test_symmetric_and_orthogonal() {
        for order in [2u32, 4, 8] {
            let h = HadamardMatrix::new(order).unwrap();
            assert!(h.is_symmetric());
            let n = h.order();
            for a in 0..n {
                for b in 0..n {
                    let expected = if a == b { n as i64 } else { 0 };
                    assert_eq!(h.row_dot(a, b), expected, "H({order}) rows {a},{b}");
                }
            }
        }
    }

    #[test]
    fn test_closed_form_entry_matches_construction() {
        for order in [1u32, 2, 8, 32] {
            let h = HadamardMatrix::new(order).unwrap();
            for r in 0..order {
                for c in 0..order {
                    assert_eq!(
                        sylvester_entry(r, c),
                        h.get(r as usize, c as usize),
                        "H({order})[{r}][{c}]"
                    );
                }
            }
        }
    }

    #[test]
    fn test_basis_agrees_with_matrix_gray() {
        let res = Resolution::new(64, 64);
        let h = HadamardMatrix::new(16).unwrap();
        for (r, c) in [(0, 0), (3, 5), (7, 7), (15, 9)] {
            let buf = basis_pattern(res, 16, r, c).unwrap();
            let lit = buf.get(c * 4, r * 4).unwrap();
            assert_eq!(lit, h.gray(r as usize, c as usize), "({r},{c})");
        }
    }

    #[test]
    fn test_gray_mapping() {
        let h = HadamardMatrix::new(2).unwrap();
        assert_eq!(h.gray(0, 0), 255);
        assert_eq!(h.gray(1, 1), 0);
    }

    #[test]
    fn test_basis_block_structure() {
        let res = Resolution::new(8, 4);
        let buf = basis_pattern(res, 4, 1, 2).unwrap();
        // H(4)[1][2] = +1, block spans columns 4..6 and row 1
        for y in 0..4 {
            for x in 0..8 {
                let lit = y == 1 && (4..6).contains(&x);
                assert_eq!(buf.get(x, y), Some(if lit { 255 } else { 0 }), "({x},{y})");
            }
        }
    }

    #[test]
    fn test_negative_entry_gives_dark_field() {
        // H(2)[1][1] = -1
        let buf = basis_pattern(Resolution::new(16, 16), 2, 1, 1).unwrap();
        assert!(buf.is_uniform(0));
    }

    #[test]
    fn test_non_dividing_resolution_uses_nearest_neighbour() {
        let buf = basis_pattern(Resolution::new(1024, 768), 8, 0, 0).unwrap();
        assert_eq!(buf.get(127, 95), Some(255));
        assert_eq!(buf.get(128, 0), Some(0));
        assert_eq!(buf.get(0, 96), Some(0));

        let odd = basis_pattern(Resolution::new(10, 10), 4, 3, 3).unwrap();
        // 10 * 3 / 4 = 7.5, so columns 8 and 9 map to source column 3
        assert_eq!(odd.get(7, 9), Some(0));
        assert_eq!(odd.get(8, 9), Some(255));
        assert_eq!(odd.pixels().iter().filter(|&&p| p == 255).count(), 4);
    }

    #[test]
    fn test_basis_bounds() {
        let res = Resolution::new(4, 4);
        assert!(matches!(
            basis_pattern(res, 8, 0, 0),
            Err(GenerationError::HadamardExceedsDisplay { order: 8, .. })
        ));
        assert!(matches!(
            basis_pattern(res, 4, 4, 0),
            Err(GenerationError::HadamardIndexOutOfRange { .. })
        ));
        assert!(matches!(
            basis_pattern(res, 5, 0, 0),
            Err(GenerationError::HadamardOrder(5))
        ));
    }
}
