//! yeastspots — quantitative analysis of fluorescent spots in yeast microscopy.
//!
//! Takes the in-memory channels of a microscopy acquisition (a fluorescence
//! z-stack, a cell label image from an external instance-segmentation model,
//! optionally a nucleus label image and a cell-adjacency graph) and produces
//! per-cell spot measurements and a consistent cell→nucleus mapping.
//!
//! The pipeline stages are:
//!
//! 1. **Stack** – focus-slice selection, maximum-intensity projection.
//! 2. **Contrast** – full-range and percentile intensity stretching.
//! 3. **Spot** – median denoising, Laplacian-of-Gaussian enhancement,
//!    isodata thresholding, chamfer distance peaks, marker-controlled
//!    watershed into spot instances.
//! 4. **Uniformity** – grid chi-squared gate rejecting detections that look
//!    like uniform spatial noise.
//! 5. **Associate** – spot instances measured and assigned to the cell under
//!    their centroid; background spots removed.
//! 6. **Nucleus** – multi-pass resolution of cell/nucleus overlaps into a
//!    clean cell→nucleus assignment table.
//!
//! # Public API
//! [`analyze`] and [`analyze_batch`] run the whole pipeline over an
//! [`ImageChannels`] context; the individual stages are exported for callers
//! that only need part of it.
//!
//! Every stage returns freshly allocated arrays; no stage writes through its
//! inputs. Each image is processed independently — nothing is shared between
//! two runs.

mod associate;
mod contrast;
mod distance;
mod export;
mod filters;
mod graph;
mod nucleus;
mod pipeline;
mod regions;
mod spot;
mod stack;
mod threshold;
mod uniformity;
mod watershed;

#[cfg(test)]
pub(crate) mod test_utils;

pub use associate::{associate_spots, AssociateConfig, Association};
pub use contrast::{stretch_full_range, stretch_percentile};
pub use export::{
    ownership_from_json, ownership_to_json, points_from_csv, points_to_csv, PointParseError,
};
pub use graph::{CellGraph, CellNode};
pub use nucleus::{assign_nuclei, NucleusAssignment};
pub use pipeline::{
    analyze, analyze_batch, AnalysisConfig, AnalysisError, AnalysisReport, ImageChannels,
};
pub use regions::{region_props, RegionProps};
pub use spot::{detect_spots, place_markers, SpotDetectConfig, SpotDetection};
pub use stack::ZStack;
pub use uniformity::{grid_chi_squared, UniformityOutcome};

/// Instance label raster: 0 is background, each positive value is one
/// connected instance (cell, nucleus or spot). Labels are not required to
/// stay contiguous after instances are removed.
pub type LabelImage = ndarray::Array2<u16>;

/// Integer (row, column) image coordinate.
pub type Point = [usize; 2];

/// Ownership map: one entry per positive cell label, holding the measured
/// spots whose centroid falls inside that cell.
pub type Ownership = std::collections::BTreeMap<u16, Vec<SpotRecord>>;

/// Measurements of one detected spot, in the wire shape consumed by the
/// persistence layer.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SpotRecord {
    /// Rounded centroid (row, column) in projection coordinates.
    pub location: [usize; 2],
    /// Mean fluorescence intensity over the spot's pixels.
    pub intensity_mean: f64,
    /// Pixel count.
    pub area: f64,
    /// Grid perimeter (exposed 4-neighbor faces).
    pub perimeter: f64,
}
