//! Spot detection on a fluorescence channel.
//!
//! The detector reduces a stack to a max-intensity projection, enhances blobs
//! with a Laplacian-of-Gaussian response, thresholds the response, and splits
//! the resulting mask into instances with a watershed seeded at the peaks of
//! a chamfer distance map.

use ndarray::Array2;

use crate::{contrast, distance, filters, threshold, watershed, LabelImage, Point, ZStack};

/// Spot detector tuning.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SpotDetectConfig {
    /// Gaussian sigma of the blob-enhancement filter (pixels).
    pub log_sigma: f32,
    /// Minimum separation between two detected spot markers (pixels).
    pub min_distance: usize,
}

impl Default for SpotDetectConfig {
    fn default() -> Self {
        Self {
            log_sigma: 3.0,
            min_distance: 5,
        }
    }
}

/// Output of [`detect_spots`].
#[derive(Debug, Clone)]
pub struct SpotDetection {
    /// Marker centroids, one per spot instance, in detection order.
    pub points: Vec<Point>,
    /// Instance-labeled spot image; marker `i` owns label `i + 1`.
    pub labels: LabelImage,
    /// The unprocessed projection the detection ran on.
    pub projection: Array2<f32>,
}

/// Detect fluorescent spots in `stack`.
///
/// When a cell label image is supplied, markers falling on background are
/// discarded before the watershed. Zero surviving markers produce an empty
/// point set and an all-zero label image; that is a valid (empty) detection,
/// not an error.
pub fn detect_spots(
    stack: &ZStack,
    cells: Option<&LabelImage>,
    config: &SpotDetectConfig,
) -> SpotDetection {
    let projection = stack.max_project();
    if let Some(cells) = cells {
        debug_assert_eq!(cells.dim(), projection.dim());
    }

    let stretched = contrast::stretch_full_range(projection.view());
    let denoised = filters::median3(&stretched);
    let denoised = denoised.mapv(f32::from);

    let response = filters::log_response(denoised.view(), config.log_sigma);
    let cut = threshold::isodata(response.view());
    let mask = response.mapv(|v| v < cut);

    let dist = distance::chamfer(&mask);
    let mut points = distance_peaks(&dist, config.min_distance);
    if let Some(cells) = cells {
        points.retain(|&[r, c]| cells[[r, c]] > 0);
    }
    tracing::debug!(n_spots = points.len(), "spot markers placed");

    let markers = place_markers(projection.dim(), &points);
    let elevation = mask.mapv(|inside| u8::from(!inside));
    let labels = watershed::watershed_labels(&elevation, &markers, &mask);

    SpotDetection {
        points,
        labels,
        projection,
    }
}

/// Marker image with one pixel per point, valued `1..=k` in point order.
pub fn place_markers(shape: (usize, usize), points: &[Point]) -> LabelImage {
    let mut markers: LabelImage = Array2::zeros(shape);
    for (i, &[r, c]) in points.iter().enumerate() {
        markers[[r, c]] = (i + 1) as u16;
    }
    markers
}

/// Local maxima of `dist` with at least `min_distance` separation.
///
/// A pixel survives when no pixel within the separation disk is strictly
/// higher, with plateau ties resolved to the lowest linear index. Zero-valued
/// pixels (background) never seed a marker. Points come out in row-major
/// scan order.
pub(crate) fn distance_peaks(dist: &Array2<u32>, min_distance: usize) -> Vec<Point> {
    let (h, w) = dist.dim();
    let radius = min_distance as isize;
    let r_sq = (min_distance * min_distance) as isize;

    let mut offsets = Vec::new();
    for dr in -radius..=radius {
        for dc in -radius..=radius {
            if (dr == 0 && dc == 0) || dr * dr + dc * dc > r_sq {
                continue;
            }
            offsets.push((dr, dc));
        }
    }

    let mut peaks = Vec::new();
    for r in 0..h {
        for c in 0..w {
            let value = dist[[r, c]];
            if value == 0 {
                continue;
            }
            let index = r * w + c;
            let mut is_max = true;
            for &(dr, dc) in &offsets {
                let nr = r as isize + dr;
                let nc = c as isize + dc;
                if nr < 0 || nc < 0 || nr >= h as isize || nc >= w as isize {
                    continue;
                }
                let (nr, nc) = (nr as usize, nc as usize);
                let other = dist[[nr, nc]];
                if other > value || (other == value && nr * w + nc < index) {
                    is_max = false;
                    break;
                }
            }
            if is_max {
                peaks.push([r, c]);
            }
        }
    }
    peaks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{gaussian_spot, paint_disk};

    #[test]
    fn markers_cover_exactly_the_point_count() {
        let points = vec![[1, 1], [3, 4], [7, 2]];
        let markers = place_markers((9, 9), &points);
        let mut values: Vec<u16> = markers.iter().copied().collect();
        values.sort_unstable();
        values.dedup();
        assert_eq!(values, vec![0, 1, 2, 3]);
        assert_eq!(markers[[3, 4]], 2);
    }

    #[test]
    fn peaks_respect_the_separation_constraint() {
        let mut dist = Array2::zeros((12, 12));
        dist[[3, 3]] = 5u32;
        dist[[3, 5]] = 4; // inside the r=3 disk of the first peak
        dist[[9, 9]] = 6;
        let peaks = distance_peaks(&dist, 3);
        assert_eq!(peaks, vec![[3, 3], [9, 9]]);
    }

    #[test]
    fn plateau_ties_keep_the_first_pixel() {
        let mut dist = Array2::zeros((8, 8));
        dist[[2, 2]] = 3u32;
        dist[[2, 4]] = 3;
        let peaks = distance_peaks(&dist, 4);
        assert_eq!(peaks, vec![[2, 2]]);
    }

    #[test]
    fn flat_image_yields_an_empty_detection() {
        let stack = ZStack::Single(Array2::from_elem((32, 32), 40.0f32));
        let det = detect_spots(&stack, None, &SpotDetectConfig::default());
        assert!(det.points.is_empty());
        assert!(det.labels.iter().all(|&l| l == 0));
        assert_eq!(det.projection[[0, 0]], 40.0);
    }

    #[test]
    fn bright_blobs_are_detected_near_their_centers() {
        let mut img = Array2::from_elem((96, 96), 10.0f32);
        let centers = [[20usize, 20usize], [20, 70], [70, 45]];
        for &[r, c] in &centers {
            gaussian_spot(&mut img, [r, c], 2.5, 500.0);
        }
        let det = detect_spots(&ZStack::Single(img), None, &SpotDetectConfig::default());
        assert!(!det.points.is_empty());
        for &[r, c] in &det.points {
            let near = centers
                .iter()
                .any(|&[cr, cc]| r.abs_diff(cr) <= 6 && c.abs_diff(cc) <= 6);
            assert!(near, "spurious detection at ({r}, {c})");
            assert!(det.labels[[r, c]] > 0, "marker pixel must be labeled");
        }
    }

    #[test]
    fn markers_on_background_are_discarded() {
        let mut img = Array2::from_elem((64, 64), 10.0f32);
        gaussian_spot(&mut img, [16, 16], 2.5, 500.0);
        gaussian_spot(&mut img, [48, 48], 2.5, 500.0);

        // Only the first blob sits inside a cell.
        let mut cells: LabelImage = Array2::zeros((64, 64));
        paint_disk(&mut cells, [16, 16], 10.0, 1);

        let det = detect_spots(
            &ZStack::Single(img),
            Some(&cells),
            &SpotDetectConfig::default(),
        );
        for &[r, c] in &det.points {
            assert!(cells[[r, c]] > 0, "marker at ({r}, {c}) is on background");
        }
    }

    #[test]
    fn stack_input_is_projected_before_detection() {
        let mut stack = ndarray::Array3::from_elem((3, 48, 48), 10.0f32);
        // Blob only in slice 1.
        for r in 0..48usize {
            for c in 0..48usize {
                let dr = r as f32 - 24.0;
                let dc = c as f32 - 24.0;
                stack[[1, r, c]] += 500.0 * (-(dr * dr + dc * dc) / (2.0 * 2.5 * 2.5)).exp();
            }
        }
        let det = detect_spots(&ZStack::Stack(stack), None, &SpotDetectConfig::default());
        assert!(det
            .points
            .iter()
            .any(|&[r, c]| r.abs_diff(24) <= 6 && c.abs_diff(24) <= 6));
    }
}
