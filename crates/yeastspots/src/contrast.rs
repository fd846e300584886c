//! Intensity rescaling: full-range stretch and percentile stretch.
//!
//! Both variants return a new array; nothing is rescaled in place.

use ndarray::{Array2, ArrayView2};

/// Stretch the full dynamic range of `img` onto `0..=u16::MAX`.
///
/// Subtracts the minimum, divides by the range, scales to the u16 range and
/// truncates. A flat image has no range to stretch and maps to the all-zero
/// image instead of dividing by zero.
pub fn stretch_full_range(img: ArrayView2<'_, f32>) -> Array2<u16> {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &v in img.iter() {
        min = min.min(v);
        max = max.max(v);
    }
    let range = (max - min) as f64;
    if !range.is_finite() || range <= 0.0 {
        return Array2::zeros(img.dim());
    }
    img.mapv(|v| ((v - min) as f64 / range * f64::from(u16::MAX)) as u16)
}

/// Stretch `img` between the histogram values that cut off `tail_frac` of the
/// pixels on each side.
///
/// Values at or below the lower bound map to 0, values at or above the upper
/// bound map to `u16::MAX`, everything in between rescales linearly. With a
/// degenerate histogram (both bounds on the same bin) the all-zero image is
/// returned.
pub fn stretch_percentile(img: &Array2<u16>, tail_frac: f64) -> Array2<u16> {
    let total = img.len();
    if total == 0 {
        return img.clone();
    }

    let mut histogram = vec![0usize; usize::from(u16::MAX) + 1];
    for &v in img.iter() {
        histogram[usize::from(v)] += 1;
    }

    let tail = (tail_frac * total as f64).round() as usize;
    let mut lower = 0usize;
    let mut upper = usize::from(u16::MAX);
    let mut cumulative = 0usize;
    for (value, &count) in histogram.iter().enumerate() {
        let below = cumulative;
        cumulative += count;
        if below < tail && cumulative >= tail {
            lower = value;
        }
        if below < total - tail && cumulative >= total - tail {
            upper = value;
            break;
        }
    }

    if upper <= lower {
        return Array2::zeros(img.dim());
    }
    let span = (upper - lower) as f64;
    img.mapv(|v| {
        let v = usize::from(v);
        if v <= lower {
            0
        } else if v >= upper {
            u16::MAX
        } else {
            ((v - lower) as f64 / span * f64::from(u16::MAX)) as u16
        }
    })
}
