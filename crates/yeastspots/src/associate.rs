//! Assignment of detected spot instances to their owning cells.

use std::collections::BTreeSet;

use ndarray::ArrayView2;

use crate::{regions, LabelImage, Ownership, SpotRecord};

/// Geometric gates applied to spot instances before association. `None`
/// disables a gate.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AssociateConfig {
    /// Minimum spot area (pixels).
    pub min_area: Option<f64>,
    /// Maximum spot area (pixels).
    pub max_area: Option<f64>,
    /// Minimum extent (area over bounding-box area).
    pub min_extent: Option<f64>,
    /// Minimum solidity (area over convex-hull area).
    pub min_solidity: Option<f64>,
    /// A cell carrying at least this many surviving spots is flagged dead.
    pub death_spot_count: Option<usize>,
}

/// Output of [`associate_spots`].
#[derive(Debug, Clone)]
pub struct Association {
    /// One entry per positive cell label, holding the spots it owns.
    pub ownership: Ownership,
    /// Spot label image with removed instances zeroed out.
    pub spot_labels: LabelImage,
    /// Cells whose spot count reached the death threshold, ascending.
    pub dead_cells: Vec<u16>,
}

/// Measure every spot instance and append it to the cell under its centroid.
///
/// Spots whose rounded centroid lands on background, and spots failing a
/// configured geometric gate, are removed: they are absent from the
/// ownership lists and zeroed in the returned label image. Every positive
/// label of `cells` keys the ownership map even when it owns nothing.
pub fn associate_spots(
    cells: &LabelImage,
    spots: LabelImage,
    fluo: ArrayView2<'_, f32>,
    config: &AssociateConfig,
) -> Association {
    let mut ownership = Ownership::new();
    for &label in cells.iter() {
        if label > 0 {
            ownership.entry(label).or_default();
        }
    }

    let mut spots = spots;
    let mut removed: BTreeSet<u16> = BTreeSet::new();
    for prop in regions::region_props(&spots, fluo) {
        if !passes_gates(&prop, config) {
            removed.insert(prop.label);
            continue;
        }
        let r = prop.centroid[0] as usize;
        let c = prop.centroid[1] as usize;
        let owner = cells[[r, c]];
        if owner == 0 {
            removed.insert(prop.label);
            continue;
        }
        ownership
            .entry(owner)
            .or_default()
            .push(SpotRecord {
                location: [r, c],
                intensity_mean: prop.intensity_mean,
                area: prop.area,
                perimeter: prop.perimeter,
            });
    }

    if !removed.is_empty() {
        tracing::debug!(n_removed = removed.len(), "spots removed during association");
        for v in spots.iter_mut() {
            if removed.contains(v) {
                *v = 0;
            }
        }
    }

    let dead_cells = match config.death_spot_count {
        Some(threshold) => ownership
            .iter()
            .filter(|(_, spots)| spots.len() >= threshold)
            .map(|(&label, _)| label)
            .collect(),
        None => Vec::new(),
    };

    Association {
        ownership,
        spot_labels: spots,
        dead_cells,
    }
}

fn passes_gates(prop: &regions::RegionProps, config: &AssociateConfig) -> bool {
    if config.min_area.is_some_and(|min| prop.area < min) {
        return false;
    }
    if config.max_area.is_some_and(|max| prop.area > max) {
        return false;
    }
    if config.min_extent.is_some_and(|min| prop.extent < min) {
        return false;
    }
    if config.min_solidity.is_some_and(|min| prop.solidity < min) {
        return false;
    }
    true
}
