//! Spot-distribution sanity gate.
//!
//! A detection whose points are scattered like uniform spatial noise is more
//! likely a background artifact than a set of real spots. The gate bins the
//! points into a G×G grid and computes the chi-squared statistic against the
//! uniform expectation; the caller rejects the detection when the statistic
//! does not exceed the degrees of freedom. One test, one polarity — this is
//! a quality gate, not a correctness proof.

use crate::Point;

/// Chi-squared outcome of the uniformity gate.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct UniformityOutcome {
    /// `Σ (observed − expected)² / expected` over the grid cells.
    pub statistic: f64,
    /// Grid cell count minus one.
    pub degrees_of_freedom: usize,
}

impl UniformityOutcome {
    /// `true` when the points look uniformly scattered and the detection
    /// should be rejected as likely noise.
    pub fn looks_uniform(&self) -> bool {
        self.statistic <= self.degrees_of_freedom as f64
    }
}

/// Bin `points` into a `grid`×`grid` partition of `shape` and compute the
/// chi-squared statistic against a uniform distribution.
///
/// An empty point set returns `(0.0, 0)`, which the caller policy treats as
/// uniform (reject).
pub fn grid_chi_squared(points: &[Point], shape: (usize, usize), grid: usize) -> UniformityOutcome {
    if points.is_empty() || grid == 0 {
        return UniformityOutcome {
            statistic: 0.0,
            degrees_of_freedom: 0,
        };
    }

    let mut counts = vec![0usize; grid * grid];
    for &[r, c] in points {
        let gr = (grid * r / shape.0).min(grid - 1);
        let gc = (grid * c / shape.1).min(grid - 1);
        counts[gr * grid + gc] += 1;
    }

    let expected = points.len() as f64 / (grid * grid) as f64;
    let statistic = counts
        .iter()
        .map(|&observed| {
            let d = observed as f64 - expected;
            d * d / expected
        })
        .sum();

    UniformityOutcome {
        statistic,
        degrees_of_freedom: grid * grid - 1,
    }
}
