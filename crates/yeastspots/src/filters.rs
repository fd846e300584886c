//! Raster filtering primitives shared by the focus selector and the spot
//! detector.
//!
//! Gaussian smoothing goes through `imageproc` on an `ImageBuffer<Luma<f32>>`;
//! the 3×3 kernels (Laplacian, median) are applied directly on the `ndarray`
//! side with clamped borders.

use image::{ImageBuffer, Luma};
use ndarray::{Array2, ArrayView2};

type LumaF32 = ImageBuffer<Luma<f32>, Vec<f32>>;

pub(crate) fn to_luma_f32(img: ArrayView2<'_, f32>) -> LumaF32 {
    let (h, w) = img.dim();
    let data: Vec<f32> = img.iter().copied().collect();
    ImageBuffer::from_raw(w as u32, h as u32, data).expect("buffer length matches dimensions")
}

pub(crate) fn from_luma_f32(img: &LumaF32) -> Array2<f32> {
    let (w, h) = img.dimensions();
    Array2::from_shape_vec((h as usize, w as usize), img.as_raw().clone())
        .expect("buffer length matches dimensions")
}

/// Gaussian blur with standard deviation `sigma`.
pub fn gaussian_blur(img: ArrayView2<'_, f32>, sigma: f32) -> Array2<f32> {
    let blurred = imageproc::filter::gaussian_blur_f32(&to_luma_f32(img), sigma);
    from_luma_f32(&blurred)
}

/// 3×3 Laplacian response (second-derivative edge filter), clamped borders.
pub fn laplacian(img: ArrayView2<'_, f32>) -> Array2<f32> {
    let (h, w) = img.dim();
    let at = |r: isize, c: isize| -> f32 {
        let r = r.clamp(0, h as isize - 1) as usize;
        let c = c.clamp(0, w as isize - 1) as usize;
        img[[r, c]]
    };
    Array2::from_shape_fn((h, w), |(r, c)| {
        let (r, c) = (r as isize, c as isize);
        at(r - 1, c) + at(r + 1, c) + at(r, c - 1) + at(r, c + 1) - 4.0 * at(r, c)
    })
}

/// Laplacian-of-Gaussian blob enhancement: smooth with `sigma`, then take the
/// 3×3 Laplacian. Bright blobs produce a negative response at their center.
pub fn log_response(img: ArrayView2<'_, f32>, sigma: f32) -> Array2<f32> {
    laplacian(gaussian_blur(img, sigma).view())
}

/// 3×3 median filter for shot-noise removal, clamped borders.
pub fn median3(img: &Array2<u16>) -> Array2<u16> {
    let (h, w) = img.dim();
    Array2::from_shape_fn((h, w), |(r, c)| {
        let mut window = [0u16; 9];
        let mut k = 0;
        for dr in -1isize..=1 {
            for dc in -1isize..=1 {
                let rr = (r as isize + dr).clamp(0, h as isize - 1) as usize;
                let cc = (c as isize + dc).clamp(0, w as isize - 1) as usize;
                window[k] = img[[rr, cc]];
                k += 1;
            }
        }
        window.sort_unstable();
        window[4]
    })
}
