// src/data_analysis/histogram.rs

//! Weighted 2D binning over a throttle-like `x` axis (0..100) and an arbitrary `y` axis,
//! with the `x` occupancy used to normalize out time spent at each throttle level.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::constants::{HISTOGRAM_EPSILON, THROTTLE_RANGE};
use crate::data_analysis::signal_utils::linspace;
use crate::error::{AnalysisError, AnalysisResult};

/// Uniform bins over a closed range. The right edge belongs to the last bin.
#[derive(Debug, Clone)]
pub struct UniformBins {
    edges: Array1<f64>,
}

impl UniformBins {
    /// Bins over `[lo, hi]`. An empty range is widened by 0.5 on each side.
    pub fn new(lo: f64, hi: f64, count: usize) -> Self {
        let (lo, hi) = if lo == hi { (lo - 0.5, hi + 0.5) } else { (lo, hi) };
        Self { edges: linspace(lo, hi, count + 1) }
    }

    pub fn count(&self) -> usize {
        self.edges.len().saturating_sub(1)
    }

    pub fn edges(&self) -> &Array1<f64> {
        &self.edges
    }

    /// Bin index of `value`, or `None` when it falls outside the range (or is NaN).
    pub fn locate(&self, value: f64) -> Option<usize> {
        let n = self.count();
        if n == 0 || !value.is_finite() {
            return None;
        }
        let lo = self.edges[0];
        let hi = self.edges[n];
        if value < lo || value > hi {
            return None;
        }
        if value == hi {
            return Some(n - 1);
        }
        let edges = self.edges.as_slice()?;
        let idx = edges.partition_point(|&e| e <= value);
        Some(idx.saturating_sub(1).min(n - 1))
    }
}

/// Raw and occupancy-normalized 2D histogram.
///
/// Matrices are laid out `[y_bin, x_bin]` so a column is one throttle bin.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram2D {
    pub raw: Array2<f64>,
    pub normalized: Array2<f64>,
    /// Count of `x` samples per bin over 0..100.
    pub occupancy: Array1<f64>,
    /// Bin edges of `occupancy`.
    pub occupancy_edges: Array1<f64>,
}

impl Histogram2D {
    pub fn total(&self) -> f64 {
        self.raw.sum()
    }
}

/// Builds a weighted 2D histogram of `(x[i], y[j])` pairs with weight `weights[[i, j]]`.
///
/// `bins = [bx, by]`. The `x` range is fixed to 0..100, the `y` range spans `y[0]..y[last]`.
/// Signed weights are accumulated and the absolute value of each bin is kept. The occupancy
/// of `x` uses `bx` bins over the same range and divides every column of the normalized
/// histogram (plus a small epsilon so empty throttle bins stay finite).
pub fn histogram2d(
    x: ArrayView1<f64>,
    y: ArrayView1<f64>,
    weights: ArrayView2<f64>,
    bins: [usize; 2],
) -> AnalysisResult<Histogram2D> {
    let [bx, by] = bins;
    if bx == 0 || by == 0 {
        return Err(AnalysisError::InvalidConfig(format!(
            "histogram bins must be non-zero, got [{}, {}]",
            bx, by
        )));
    }
    if weights.dim() != (x.len(), y.len()) {
        return Err(AnalysisError::ChannelLengthMismatch {
            channel: "histogram weights".to_string(),
            expected: x.len() * y.len(),
            actual: weights.len(),
        });
    }

    let x_bins = UniformBins::new(THROTTLE_RANGE[0], THROTTLE_RANGE[1], bx);
    let mut raw = Array2::<f64>::zeros((by, bx));
    let mut occupancy = Array1::<f64>::zeros(bx);

    if !y.is_empty() {
        let y_bins = UniformBins::new(y[0], y[y.len() - 1], by);
        let y_index: Vec<Option<usize>> = y.iter().map(|&v| y_bins.locate(v)).collect();

        for (i, &xv) in x.iter().enumerate() {
            let Some(xi) = x_bins.locate(xv) else { continue };
            occupancy[xi] += 1.0;
            for (j, yi) in y_index.iter().enumerate() {
                if let Some(yi) = *yi {
                    raw[[yi, xi]] += weights[[i, j]];
                }
            }
        }
    } else {
        for &xv in x.iter() {
            if let Some(xi) = x_bins.locate(xv) {
                occupancy[xi] += 1.0;
            }
        }
    }

    raw.mapv_inplace(f64::abs);
    let mut normalized = raw.clone();
    for (mut column, &count) in normalized.columns_mut().into_iter().zip(occupancy.iter()) {
        column.mapv_inplace(|v| v / (count + HISTOGRAM_EPSILON));
    }

    Ok(Histogram2D {
        raw,
        normalized,
        occupancy,
        occupancy_edges: x_bins.edges().clone(),
    })
}

/// Density histogram of `values` over 0..100 with `edges_count - 1` bins.
pub fn throttle_density(values: ArrayView1<f64>, edges_count: usize) -> Array1<f64> {
    let bins = UniformBins::new(THROTTLE_RANGE[0], THROTTLE_RANGE[1], edges_count.saturating_sub(1));
    let mut counts = Array1::<f64>::zeros(bins.count());
    for &v in values.iter() {
        if let Some(i) = bins.locate(v) {
            counts[i] += 1.0;
        }
    }
    let total = counts.sum();
    if total > 0.0 {
        let width = (THROTTLE_RANGE[1] - THROTTLE_RANGE[0]) / bins.count() as f64;
        counts.mapv_inplace(|c| c / (total * width));
    }
    counts
}
