//! Resolution of cell/nucleus label overlaps into a consistent cell→nucleus
//! mapping.
//!
//! Cells and nuclei are segmented independently, so their label images
//! disagree: a nucleus can straddle two cells, a merged cell can be covered
//! by a single nucleus, and border debris produces nuclei over background.
//! The resolver runs five passes over the pair of label images:
//!
//! 1. coverage filter — a cell mostly covered by one nucleus is a merge
//!    artifact and is discarded;
//! 2. centroid ownership — each nucleus belongs to the cell under its
//!    centroid, and is tentatively offered to every other cell it overlaps;
//! 3. usage counting — a nucleus referenced by no cell, or by more than two,
//!    is discarded (a real nucleus sits in one cell, or two when it
//!    straddles a boundary);
//! 4. isolation pruning — a cell with no nucleus and no neighbors in the
//!    adjacency graph is an orphan and is discarded;
//! 5. propagation — discarded labels are zeroed out of fresh label images
//!    and pruned out of a fresh graph.
//!
//! Tie-breaks are part of the contract: a centroid owner always beats a
//! non-owner candidate, and the first non-owner candidate written (nuclei
//! traversed in ascending label order, overlapped cells in ascending label
//! order) is never displaced by a later one.

use std::collections::{BTreeMap, BTreeSet};

use ndarray::Zip;

use crate::{CellGraph, LabelImage};

/// Output of [`assign_nuclei`].
#[derive(Debug, Clone)]
pub struct NucleusAssignment {
    /// Cell label image with discarded cells zeroed.
    pub cells: LabelImage,
    /// Nucleus label image with discarded nuclei zeroed.
    pub nuclei: LabelImage,
    /// Adjacency graph without the discarded cells, when one was supplied.
    pub graph: Option<CellGraph>,
    /// Indexed by cell label: the nucleus assigned to that cell and whether
    /// the cell owns the nucleus centroid. `(0, false)` means unassigned.
    pub table: Vec<(u16, bool)>,
    /// Indexed by nucleus label: how many cells reference that nucleus.
    pub usage: Vec<u32>,
}

/// Resolve the overlap relation between `cells` and `nuclei`.
///
/// `covering_threshold` is the fraction of a cell's area that a single
/// nucleus may cover before the cell is treated as mis-segmented. Pass-1
/// discards stay visible to the later passes; labels are only zeroed during
/// propagation, so the assignment table reflects the original label images.
pub fn assign_nuclei(
    cells: &LabelImage,
    nuclei: &LabelImage,
    covering_threshold: f64,
    graph: Option<&CellGraph>,
) -> NucleusAssignment {
    assert_eq!(cells.dim(), nuclei.dim());
    let max_cell = cells.iter().copied().max().unwrap_or(0) as usize;
    let max_nucleus = nuclei.iter().copied().max().unwrap_or(0) as usize;

    // One joint scan collects cell areas, per-nucleus centroid accumulators
    // and (nucleus, cell) overlap counts.
    let mut cell_area = vec![0usize; max_cell + 1];
    let mut nucleus_area = vec![0usize; max_nucleus + 1];
    let mut nucleus_coord_sum = vec![[0u64; 2]; max_nucleus + 1];
    let mut overlap: BTreeMap<(u16, u16), usize> = BTreeMap::new();
    Zip::indexed(cells).and(nuclei).for_each(|(r, c), &cl, &nl| {
        if cl > 0 {
            cell_area[cl as usize] += 1;
        }
        if nl > 0 {
            nucleus_area[nl as usize] += 1;
            nucleus_coord_sum[nl as usize][0] += r as u64;
            nucleus_coord_sum[nl as usize][1] += c as u64;
            if cl > 0 {
                *overlap.entry((nl, cl)).or_insert(0) += 1;
            }
        }
    });

    let mut discarded_cells: BTreeSet<u16> = BTreeSet::new();
    let mut discarded_nuclei: BTreeSet<u16> = BTreeSet::new();

    // Pass 1: coverage filter.
    for (&(_, cell), &count) in &overlap {
        let area = cell_area[cell as usize];
        if area > 0 && count as f64 / area as f64 > covering_threshold {
            discarded_cells.insert(cell);
        }
    }

    // Pass 2: centroid ownership and non-owner candidacy.
    let mut table = vec![(0u16, false); max_cell + 1];
    for nucleus in 1..=max_nucleus {
        let area = nucleus_area[nucleus];
        if area == 0 {
            continue;
        }
        let r = (nucleus_coord_sum[nucleus][0] / area as u64) as usize;
        let c = (nucleus_coord_sum[nucleus][1] / area as u64) as usize;
        let owner = cells[[r, c]];
        if owner == 0 {
            discarded_nuclei.insert(nucleus as u16);
            continue;
        }
        table[owner as usize] = (nucleus as u16, true);

        let range = (nucleus as u16, 1)..=(nucleus as u16, u16::MAX);
        for (&(_, cell), _) in overlap.range(range) {
            if cell == owner {
                continue;
            }
            if table[cell as usize] == (0, false) {
                table[cell as usize] = (nucleus as u16, false);
            }
        }
    }

    // Pass 3: usage counting.
    let mut usage = vec![0u32; max_nucleus + 1];
    for &(nucleus, _) in &table {
        usage[nucleus as usize] += 1;
    }
    for nucleus in 1..=max_nucleus {
        if nucleus_area[nucleus] == 0 {
            continue;
        }
        if !(1..=2).contains(&usage[nucleus]) {
            discarded_nuclei.insert(nucleus as u16);
        }
    }

    // Pass 4: isolation pruning.
    if let Some(graph) = graph {
        for cell in 1..=max_cell {
            if cell_area[cell] == 0 || table[cell].0 != 0 {
                continue;
            }
            if let Some(node) = graph.get(cell as u16) {
                if node.neighbors.is_empty() {
                    discarded_cells.insert(cell as u16);
                }
            }
        }
    }

    tracing::debug!(
        n_cells = discarded_cells.len(),
        n_nuclei = discarded_nuclei.len(),
        "labels discarded during nucleus assignment"
    );

    // Pass 5: propagation into fresh label images and a fresh graph.
    let cells_out = cells.mapv(|l| if discarded_cells.contains(&l) { 0 } else { l });
    let nuclei_out = nuclei.mapv(|l| if discarded_nuclei.contains(&l) { 0 } else { l });
    let graph_out = graph.map(|g| g.pruned(&discarded_cells));

    NucleusAssignment {
        cells: cells_out,
        nuclei: nuclei_out,
        graph: graph_out,
        table,
        usage,
    }
}
