//! Per-image pipeline glue: context struct, stage order, batch loop.
//!
//! The stages themselves live in `spot`, `uniformity`, `associate` and
//! `nucleus`; this layer owns stage boundaries, the shape checks between
//! channels, and the skip-and-continue batch policy. Each call gets its own
//! immutable [`ImageChannels`] context — there is no shared pipeline state
//! between images.

use ndarray::Array2;

use crate::{
    assign_nuclei, associate_spots, detect_spots, grid_chi_squared, AssociateConfig, Association,
    CellGraph, LabelImage, NucleusAssignment, Point, SpotDetectConfig, UniformityOutcome, ZStack,
};

/// Structural input errors. These skip the affected image; they never abort
/// a batch.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("{channel} label image is {found:?} but the fluorescence frame is {expected:?}")]
    ShapeMismatch {
        channel: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error("fluorescence stack is empty")]
    EmptyStack,
}

/// All in-memory channels of one acquisition. The cell label image comes
/// from the external instance-segmentation model, the adjacency graph from
/// the external boundary scan; both are consumed as-is.
#[derive(Debug, Clone)]
pub struct ImageChannels {
    pub fluorescence: ZStack,
    pub cells: LabelImage,
    pub nuclei: Option<LabelImage>,
    pub graph: Option<CellGraph>,
}

/// Pipeline tuning for one analysis run.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub detect: SpotDetectConfig,
    /// Grid size of the uniformity gate.
    pub uniformity_grid: usize,
    pub associate: AssociateConfig,
    /// Coverage fraction beyond which a cell counts as mis-segmented.
    pub covering_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            detect: SpotDetectConfig::default(),
            uniformity_grid: 50,
            associate: AssociateConfig::default(),
            covering_threshold: 0.7,
        }
    }
}

/// Everything the pipeline produces for one image.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// Detected spot centroids, in detection order.
    pub points: Vec<Point>,
    /// The unprocessed fluorescence projection.
    pub projection: Array2<f32>,
    /// Uniformity gate outcome.
    pub uniformity: UniformityOutcome,
    /// Whether the gate rejected the detection as likely noise.
    pub rejected: bool,
    /// Spot ownership; empty lists (but full key set) when rejected.
    pub association: Association,
    /// Nucleus resolution, when a nucleus channel was supplied.
    pub nuclei: Option<NucleusAssignment>,
}

/// Run the full pipeline on one image.
pub fn analyze(
    channels: &ImageChannels,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, AnalysisError> {
    let frame = channels.fluorescence.frame_shape();
    if channels.fluorescence.n_slices() == 0 {
        return Err(AnalysisError::EmptyStack);
    }
    if channels.cells.dim() != frame {
        return Err(AnalysisError::ShapeMismatch {
            channel: "cell",
            expected: frame,
            found: channels.cells.dim(),
        });
    }
    if let Some(nuclei) = &channels.nuclei {
        if nuclei.dim() != frame {
            return Err(AnalysisError::ShapeMismatch {
                channel: "nucleus",
                expected: frame,
                found: nuclei.dim(),
            });
        }
    }

    let detection = detect_spots(&channels.fluorescence, Some(&channels.cells), &config.detect);
    let uniformity = grid_chi_squared(&detection.points, frame, config.uniformity_grid);
    let rejected = uniformity.looks_uniform();

    let association = if rejected {
        tracing::warn!(
            statistic = uniformity.statistic,
            "spot distribution looks uniform, dropping the detection"
        );
        // Keep the per-cell key set, with nothing to own.
        associate_spots(
            &channels.cells,
            Array2::zeros(frame),
            detection.projection.view(),
            &config.associate,
        )
    } else {
        associate_spots(
            &channels.cells,
            detection.labels,
            detection.projection.view(),
            &config.associate,
        )
    };

    let nuclei = channels.nuclei.as_ref().map(|nuclei| {
        assign_nuclei(
            &channels.cells,
            nuclei,
            config.covering_threshold,
            channels.graph.as_ref(),
        )
    });

    Ok(AnalysisReport {
        points: detection.points,
        projection: detection.projection,
        uniformity,
        rejected,
        association,
        nuclei,
    })
}

/// Run the pipeline over a queue of images, strictly one at a time.
///
/// A failed image is logged and skipped; its error stays in the output so
/// the caller can account for it. Nothing here aborts the batch.
pub fn analyze_batch<I>(
    images: I,
    config: &AnalysisConfig,
) -> Vec<Result<AnalysisReport, AnalysisError>>
where
    I: IntoIterator<Item = ImageChannels>,
{
    images
        .into_iter()
        .enumerate()
        .map(|(index, channels)| {
            let result = analyze(&channels, config);
            if let Err(err) = &result {
                tracing::warn!(index, %err, "image skipped");
            }
            result
        })
        .collect()
}
