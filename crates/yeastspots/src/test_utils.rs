//! Shared synthetic rasters for image-based unit tests.

use ndarray::Array2;

use crate::LabelImage;

/// Paint a filled disk of `label` into a label image.
pub(crate) fn paint_disk(labels: &mut LabelImage, center: [usize; 2], radius: f64, label: u16) {
    let (h, w) = labels.dim();
    for r in 0..h {
        for c in 0..w {
            let dr = r as f64 - center[0] as f64;
            let dc = c as f64 - center[1] as f64;
            if dr * dr + dc * dc <= radius * radius {
                labels[[r, c]] = label;
            }
        }
    }
}

/// Add a Gaussian intensity bump onto an image.
pub(crate) fn gaussian_spot(img: &mut Array2<f32>, center: [usize; 2], sigma: f32, amplitude: f32) {
    let (h, w) = img.dim();
    for r in 0..h {
        for c in 0..w {
            let dr = r as f32 - center[0] as f32;
            let dc = c as f32 - center[1] as f32;
            img[[r, c]] += amplitude * (-(dr * dr + dc * dc) / (2.0 * sigma * sigma)).exp();
        }
    }
}
