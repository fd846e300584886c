//! Marker-controlled watershed, restricted to a binary mask.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ndarray::Array2;

use crate::LabelImage;

/// Flood `markers` across `mask` in order of rising `elevation`, ties broken
/// by insertion order (first queued floods first). 4-connectivity.
///
/// Markers outside the mask are dropped; pixels outside the mask stay 0. The
/// usual call inverts a binary spot mask into the elevation so every masked
/// pixel sits at the same level and each basin becomes the set of pixels
/// reached first from its marker.
pub fn watershed_labels(
    elevation: &Array2<u8>,
    markers: &LabelImage,
    mask: &Array2<bool>,
) -> LabelImage {
    let (h, w) = mask.dim();
    let mut labels: LabelImage = Array2::zeros((h, w));
    let mut heap: BinaryHeap<Reverse<(u8, u64, usize, usize, u16)>> = BinaryHeap::new();
    let mut seq = 0u64;

    for ((r, c), &marker) in markers.indexed_iter() {
        if marker > 0 && mask[[r, c]] {
            labels[[r, c]] = marker;
            heap.push(Reverse((elevation[[r, c]], seq, r, c, marker)));
            seq += 1;
        }
    }

    while let Some(Reverse((_, _, r, c, label))) = heap.pop() {
        let neighbors = [
            (r.wrapping_sub(1), c),
            (r + 1, c),
            (r, c.wrapping_sub(1)),
            (r, c + 1),
        ];
        for (nr, nc) in neighbors {
            if nr >= h || nc >= w || !mask[[nr, nc]] || labels[[nr, nc]] != 0 {
                continue;
            }
            labels[[nr, nc]] = label;
            heap.push(Reverse((elevation[[nr, nc]], seq, nr, nc, label)));
            seq += 1;
        }
    }

    labels
}
