//! Automatic global thresholding on filter responses.

use ndarray::ArrayView2;

const BINS: usize = 256;

/// Isodata threshold: the value `t` with `t = (mean_below + mean_above) / 2`,
/// found by fixed-point iteration over a 256-bin histogram.
///
/// Returns the minimum of the image when it is flat (every pixel equal), so a
/// strict `< t` comparison then selects nothing.
pub fn isodata(values: ArrayView2<'_, f32>) -> f32 {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &v in values.iter() {
        min = min.min(v);
        max = max.max(v);
    }
    if !(max > min) {
        return min;
    }

    let width = (max - min) as f64 / BINS as f64;
    let mut histogram = [0usize; BINS];
    for &v in values.iter() {
        let bin = (((v - min) as f64 / width) as usize).min(BINS - 1);
        histogram[bin] += 1;
    }
    let center = |bin: usize| min as f64 + (bin as f64 + 0.5) * width;

    // Start from the histogram midpoint and iterate t -> mean of class means.
    let mut cut = BINS / 2;
    for _ in 0..BINS {
        let (mut n_lo, mut sum_lo) = (0usize, 0.0f64);
        let (mut n_hi, mut sum_hi) = (0usize, 0.0f64);
        for (bin, &count) in histogram.iter().enumerate() {
            if bin < cut {
                n_lo += count;
                sum_lo += count as f64 * center(bin);
            } else {
                n_hi += count;
                sum_hi += count as f64 * center(bin);
            }
        }
        if n_lo == 0 {
            cut += 1;
            continue;
        }
        if n_hi == 0 {
            cut -= 1;
            continue;
        }
        let midpoint = 0.5 * (sum_lo / n_lo as f64 + sum_hi / n_hi as f64);
        let next = (((midpoint - min as f64) / width) as usize).clamp(1, BINS - 1);
        if next == cut {
            break;
        }
        cut = next;
    }

    (min as f64 + cut as f64 * width) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn separates_a_bimodal_distribution() {
        let mut img = Array2::from_elem((10, 10), 10.0f32);
        for r in 0..10 {
            for c in 0..5 {
                img[[r, c]] = 200.0;
            }
        }
        let t = isodata(img.view());
        assert!(t > 10.0 && t < 200.0, "t = {t}");
        let below = img.iter().filter(|&&v| v < t).count();
        assert_eq!(below, 50);
    }

    #[test]
    fn flat_image_selects_nothing_below_threshold() {
        let img = Array2::from_elem((6, 6), -4.0f32);
        let t = isodata(img.view());
        assert_eq!(img.iter().filter(|&&v| v < t).count(), 0);
    }

    #[test]
    fn threshold_lies_between_class_means() {
        // Unbalanced classes around -50 and +5.
        let mut img = Array2::from_elem((8, 8), 5.0f32);
        img[[0, 0]] = -50.0;
        img[[0, 1]] = -48.0;
        img[[0, 2]] = -52.0;
        let t = isodata(img.view());
        assert!(t > -48.0 && t < 5.0, "t = {t}");
    }
}
