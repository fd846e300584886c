//! Z-stack handling: focus-slice selection and maximum-intensity projection.

use ndarray::{s, Array2, Array3, Axis};

use crate::filters;

/// A fluorescence or brightfield acquisition: either a single 2D frame or a
/// stack of frames along axis 0.
#[derive(Debug, Clone)]
pub enum ZStack {
    /// A single 2D frame.
    Single(Array2<f32>),
    /// N slices × H × W.
    Stack(Array3<f32>),
}

impl ZStack {
    /// (height, width) of one frame.
    pub fn frame_shape(&self) -> (usize, usize) {
        match self {
            ZStack::Single(img) => img.dim(),
            ZStack::Stack(stack) => {
                let (_, h, w) = stack.dim();
                (h, w)
            }
        }
    }

    /// Number of slices (1 for a single frame).
    pub fn n_slices(&self) -> usize {
        match self {
            ZStack::Single(_) => 1,
            ZStack::Stack(stack) => stack.len_of(Axis(0)),
        }
    }

    /// Inclusive slice range centered on the sharpest slice.
    ///
    /// Sharpness is the variance of a 3×3 Laplacian response; ties resolve to
    /// the lowest slice index. A single frame is not a stack and yields the
    /// `(0, 0)` sentinel. The range is clamped to the stack bounds; a clamped
    /// range (narrower than `2 * around`) is a warning, not an error.
    pub fn focused_slice_range(&self, around: usize) -> (usize, usize) {
        let stack = match self {
            ZStack::Single(_) => return (0, 0),
            ZStack::Stack(stack) => stack,
        };
        let n = stack.len_of(Axis(0));
        if n == 0 {
            return (0, 0);
        }

        let mut best = 0usize;
        let mut best_score = f32::NEG_INFINITY;
        for slice in 0..n {
            let score = laplacian_variance(stack.index_axis(Axis(0), slice));
            if score > best_score {
                best_score = score;
                best = slice;
            }
        }

        let lo = best.saturating_sub(around);
        let hi = (best + around).min(n - 1);
        if hi - lo != 2 * around {
            tracing::warn!(
                focused = best,
                n_slices = n,
                "focused slice too close to the stack edge, range clamped"
            );
        }
        (lo, hi)
    }

    /// Per-pixel maximum across all slices.
    pub fn max_project(&self) -> Array2<f32> {
        match self {
            ZStack::Single(img) => img.clone(),
            ZStack::Stack(stack) => {
                let (n, h, w) = stack.dim();
                if n == 0 {
                    return Array2::zeros((h, w));
                }
                stack.map_axis(Axis(0), |lane| {
                    lane.fold(f32::NEG_INFINITY, |acc, &v| acc.max(v))
                })
            }
        }
    }

    /// Per-pixel maximum across the inclusive slice range `[lo, hi]`.
    pub fn max_project_range(&self, lo: usize, hi: usize) -> Array2<f32> {
        match self {
            ZStack::Single(img) => img.clone(),
            ZStack::Stack(stack) => {
                let n = stack.len_of(Axis(0));
                let hi = hi.min(n.saturating_sub(1));
                let lo = lo.min(hi);
                stack.slice(s![lo..=hi, .., ..]).map_axis(Axis(0), |lane| {
                    lane.fold(f32::NEG_INFINITY, |acc, &v| acc.max(v))
                })
            }
        }
    }
}

fn laplacian_variance(slice: ndarray::ArrayView2<'_, f32>) -> f32 {
    let resp = filters::laplacian(slice);
    let n = resp.len() as f32;
    let mean = resp.sum() / n;
    resp.iter().map(|&v| (v - mean) * (v - mean)).sum::<f32>() / n
}
