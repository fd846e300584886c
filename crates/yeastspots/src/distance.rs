//! Chamfer distance transform on binary masks.
//!
//! Chessboard metric, computed with the classic two raster scans. The metric
//! is fixed crate-wide: the watershed seeds in `spot.rs` depend on where the
//! distance peaks sit, and mixing metrics would move them.

use ndarray::Array2;

const FAR: u32 = u32::MAX / 2;

/// Chessboard distance from every masked pixel to the nearest background
/// pixel. Background pixels (and everything outside the mask) are 0; pixels
/// of a mask region touching no background anywhere keep a saturated value.
pub fn chamfer(mask: &Array2<bool>) -> Array2<u32> {
    let (h, w) = mask.dim();
    let mut dist = Array2::from_shape_fn((h, w), |(r, c)| if mask[[r, c]] { FAR } else { 0 });

    // Forward scan: up-left, up, up-right, left.
    for r in 0..h {
        for c in 0..w {
            if dist[[r, c]] == 0 {
                continue;
            }
            let mut best = dist[[r, c]];
            if r > 0 {
                best = best.min(dist[[r - 1, c]] + 1);
                if c > 0 {
                    best = best.min(dist[[r - 1, c - 1]] + 1);
                }
                if c + 1 < w {
                    best = best.min(dist[[r - 1, c + 1]] + 1);
                }
            }
            if c > 0 {
                best = best.min(dist[[r, c - 1]] + 1);
            }
            dist[[r, c]] = best;
        }
    }

    // Backward scan: down-right, down, down-left, right.
    for r in (0..h).rev() {
        for c in (0..w).rev() {
            if dist[[r, c]] == 0 {
                continue;
            }
            let mut best = dist[[r, c]];
            if r + 1 < h {
                best = best.min(dist[[r + 1, c]] + 1);
                if c > 0 {
                    best = best.min(dist[[r + 1, c - 1]] + 1);
                }
                if c + 1 < w {
                    best = best.min(dist[[r + 1, c + 1]] + 1);
                }
            }
            if c + 1 < w {
                best = best.min(dist[[r, c + 1]] + 1);
            }
            dist[[r, c]] = best;
        }
    }

    dist
}
