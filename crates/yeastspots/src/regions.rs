//! Per-instance measurements over a label image.

use ndarray::ArrayView2;

use crate::LabelImage;

/// Measurements of one labeled instance.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RegionProps {
    pub label: u16,
    /// Mean pixel coordinate (row, column).
    pub centroid: [f64; 2],
    /// Pixel count.
    pub area: f64,
    /// Exposed 4-neighbor faces (grid perimeter).
    pub perimeter: f64,
    /// Mean of the intensity image over the instance's pixels.
    pub intensity_mean: f64,
    /// Inclusive bounding box (min_row, min_col, max_row, max_col).
    pub bbox: [usize; 4],
    /// Area over bounding-box area.
    pub extent: f64,
    /// Area over convex-hull area (hull taken over pixel corners).
    pub solidity: f64,
}

struct Accumulator {
    area: usize,
    sum_r: f64,
    sum_c: f64,
    sum_intensity: f64,
    perimeter: usize,
    bbox: [usize; 4],
    boundary: Vec<[usize; 2]>,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            area: 0,
            sum_r: 0.0,
            sum_c: 0.0,
            sum_intensity: 0.0,
            perimeter: 0,
            bbox: [usize::MAX, usize::MAX, 0, 0],
            boundary: Vec::new(),
        }
    }
}

/// Measure every positive label of `labels`, in ascending label order.
///
/// `intensity` must have the same shape as `labels`.
pub fn region_props(labels: &LabelImage, intensity: ArrayView2<'_, f32>) -> Vec<RegionProps> {
    assert_eq!(labels.dim(), intensity.dim());
    let (h, w) = labels.dim();
    let max_label = labels.iter().copied().max().unwrap_or(0) as usize;
    if max_label == 0 {
        return Vec::new();
    }

    let mut acc: Vec<Accumulator> = (0..=max_label).map(|_| Accumulator::new()).collect();
    for ((r, c), &label) in labels.indexed_iter() {
        if label == 0 {
            continue;
        }
        let a = &mut acc[label as usize];
        a.area += 1;
        a.sum_r += r as f64;
        a.sum_c += c as f64;
        a.sum_intensity += f64::from(intensity[[r, c]]);
        a.bbox[0] = a.bbox[0].min(r);
        a.bbox[1] = a.bbox[1].min(c);
        a.bbox[2] = a.bbox[2].max(r);
        a.bbox[3] = a.bbox[3].max(c);

        let mut exposed = 0usize;
        for (nr, nc) in [
            (r.wrapping_sub(1), c),
            (r + 1, c),
            (r, c.wrapping_sub(1)),
            (r, c + 1),
        ] {
            if nr >= h || nc >= w || labels[[nr, nc]] != label {
                exposed += 1;
            }
        }
        a.perimeter += exposed;
        if exposed > 0 {
            a.boundary.push([r, c]);
        }
    }

    acc.iter()
        .enumerate()
        .skip(1)
        .filter(|(_, a)| a.area > 0)
        .map(|(label, a)| {
            let area = a.area as f64;
            let bbox_area = ((a.bbox[2] - a.bbox[0] + 1) * (a.bbox[3] - a.bbox[1] + 1)) as f64;
            let hull_area = convex_hull_area(&a.boundary);
            RegionProps {
                label: label as u16,
                centroid: [a.sum_r / area, a.sum_c / area],
                area,
                perimeter: a.perimeter as f64,
                intensity_mean: a.sum_intensity / area,
                bbox: a.bbox,
                extent: area / bbox_area,
                solidity: if hull_area > 0.0 { area / hull_area } else { 1.0 },
            }
        })
        .collect()
}

/// Area of the convex hull over the four corners of every boundary pixel.
///
/// Corner points make the hull enclose whole pixel squares, so a rectangular
/// region gets solidity exactly 1.
fn convex_hull_area(boundary: &[[usize; 2]]) -> f64 {
    let mut corners: Vec<[i64; 2]> = Vec::with_capacity(boundary.len() * 4);
    for &[r, c] in boundary {
        let (r, c) = (r as i64, c as i64);
        corners.extend_from_slice(&[[r, c], [r, c + 1], [r + 1, c], [r + 1, c + 1]]);
    }
    corners.sort_unstable();
    corners.dedup();
    if corners.len() < 3 {
        return 0.0;
    }

    // Andrew monotone chain: lower hull, then upper hull.
    let cross = |o: [i64; 2], a: [i64; 2], b: [i64; 2]| -> i64 {
        (a[0] - o[0]) * (b[1] - o[1]) - (a[1] - o[1]) * (b[0] - o[0])
    };
    let mut hull: Vec<[i64; 2]> = Vec::with_capacity(corners.len() + 1);
    for &p in &corners {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower_len = hull.len() + 1;
    for &p in corners.iter().rev().skip(1) {
        while hull.len() >= lower_len && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0 {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop();

    // Shoelace.
    let mut twice_area = 0i64;
    for i in 0..hull.len() {
        let a = hull[i];
        let b = hull[(i + 1) % hull.len()];
        twice_area += a[0] * b[1] - b[0] * a[1];
    }
    (twice_area.abs() as f64) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    fn rect_label(shape: (usize, usize), top: usize, left: usize, h: usize, w: usize) -> LabelImage {
        let mut labels: LabelImage = Array2::zeros(shape);
        for r in top..top + h {
            for c in left..left + w {
                labels[[r, c]] = 1;
            }
        }
        labels
    }

    #[test]
    fn square_region_measurements() {
        let labels = rect_label((10, 10), 2, 3, 4, 4);
        let intensity = Array2::from_elem((10, 10), 2.0f32);
        let props = region_props(&labels, intensity.view());
        assert_eq!(props.len(), 1);
        let p = &props[0];
        assert_eq!(p.label, 1);
        assert_relative_eq!(p.centroid[0], 3.5);
        assert_relative_eq!(p.centroid[1], 4.5);
        assert_relative_eq!(p.area, 16.0);
        assert_relative_eq!(p.perimeter, 16.0);
        assert_relative_eq!(p.intensity_mean, 2.0);
        assert_eq!(p.bbox, [2, 3, 5, 6]);
        assert_relative_eq!(p.extent, 1.0);
        assert_relative_eq!(p.solidity, 1.0);
    }

    #[test]
    fn labels_come_out_in_ascending_order() {
        let mut labels: LabelImage = Array2::zeros((6, 6));
        labels[[5, 5]] = 9;
        labels[[0, 0]] = 4;
        labels[[2, 2]] = 7;
        let intensity = Array2::zeros((6, 6));
        let props = region_props(&labels, intensity.view());
        let order: Vec<u16> = props.iter().map(|p| p.label).collect();
        assert_eq!(order, vec![4, 7, 9]);
    }

    #[test]
    fn intensity_mean_is_per_region() {
        let mut labels: LabelImage = Array2::zeros((4, 4));
        labels[[0, 0]] = 1;
        labels[[0, 1]] = 1;
        labels[[3, 3]] = 2;
        let mut intensity = Array2::zeros((4, 4));
        intensity[[0, 0]] = 10.0f32;
        intensity[[0, 1]] = 20.0;
        intensity[[3, 3]] = 5.0;
        let props = region_props(&labels, intensity.view());
        assert_relative_eq!(props[0].intensity_mean, 15.0);
        assert_relative_eq!(props[1].intensity_mean, 5.0);
    }

    #[test]
    fn l_shape_has_solidity_below_one() {
        // 3x3 square with one corner missing.
        let mut labels = rect_label((6, 6), 1, 1, 3, 3);
        labels[[1, 3]] = 0;
        let intensity = Array2::zeros((6, 6));
        let props = region_props(&labels, intensity.view());
        let p = &props[0];
        assert_relative_eq!(p.area, 8.0);
        assert!(p.solidity < 1.0, "solidity = {}", p.solidity);
        assert!(p.solidity > 0.8);
        assert!(p.extent < 1.0);
    }

    #[test]
    fn single_pixel_region_is_fully_solid() {
        let mut labels: LabelImage = Array2::zeros((3, 3));
        labels[[1, 1]] = 1;
        let intensity = Array2::zeros((3, 3));
        let props = region_props(&labels, intensity.view());
        assert_relative_eq!(props[0].solidity, 1.0);
        assert_relative_eq!(props[0].perimeter, 4.0);
    }
}
