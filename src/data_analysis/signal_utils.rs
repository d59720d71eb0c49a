// src/data_analysis/signal_utils.rs

use ndarray::{Array1, Array2, ArrayView1, Axis, Zip};
use ndarray_stats::QuantileExt;

/// Boundary handling for `gaussian_filter1d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryMode {
    /// Half-sample symmetric extension: (d c b a | a b c d | d c b a)
    Reflect,
    /// Zero padding outside the signal.
    Constant,
}

/// Makes a Hann window (Tukey with alpha = 1.0).
pub fn hann_window(num: usize) -> Array1<f64> {
    if num == 0 {
        return Array1::zeros(0);
    }
    if num == 1 {
        return Array1::ones(1);
    }
    let denom = num as f64 - 1.0;
    Array1::from_shape_fn(num, |i| 0.5 * (1.0 - (2.0 * std::f64::consts::PI * i as f64 / denom).cos()))
}

/// Evenly spaced samples over `[start, stop]`, with the last sample pinned to `stop`.
pub fn linspace(start: f64, stop: f64, num: usize) -> Array1<f64> {
    match num {
        0 => Array1::zeros(0),
        1 => Array1::from_elem(1, start),
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            let mut out = Array1::from_shape_fn(num, |i| i as f64 * step + start);
            out[num - 1] = stop;
            out
        }
    }
}

/// Shifts values to start at 0 and scales them to end at 1.
///
/// A constant (or empty, or non-finite) input has no range to normalize and maps to zeros.
pub fn min_max_normalize(values: ArrayView1<f64>) -> Array1<f64> {
    let (lo, hi) = match (values.min(), values.max()) {
        (Ok(&lo), Ok(&hi)) => (lo, hi),
        _ => return Array1::zeros(values.len()),
    };
    let range = hi - lo;
    if !range.is_finite() || range <= 0.0 {
        return Array1::zeros(values.len());
    }
    values.mapv(|v| (v - lo) / range)
}

/// Cumulative sum along each row.
pub fn cumulative_sum_rows(data: &Array2<f64>) -> Array2<f64> {
    let mut out = data.to_owned();
    for mut row in out.rows_mut() {
        let mut running = 0.0;
        for v in row.iter_mut() {
            running += *v;
            *v = running;
        }
    }
    out
}

/// Discrete Gaussian kernel truncated at four standard deviations.
fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (4.0 * sigma + 0.5) as usize;
    let two_sigma_sq = 2.0 * sigma * sigma;
    let mut kernel: Vec<f64> = (0..=2 * radius)
        .map(|k| {
            let x = k as f64 - radius as f64;
            (-(x * x) / two_sigma_sq).exp()
        })
        .collect();
    let sum: f64 = kernel.iter().sum();
    for w in kernel.iter_mut() {
        *w /= sum;
    }
    kernel
}

fn reflect_index(i: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let m = i.rem_euclid(period) as usize;
    if m < n {
        m
    } else {
        2 * n - 1 - m
    }
}

/// One-dimensional Gaussian smoothing.
///
/// Non-positive `sigma` returns the input unchanged.
pub fn gaussian_filter1d(data: ArrayView1<f64>, sigma: f64, mode: BoundaryMode) -> Array1<f64> {
    let n = data.len();
    if n == 0 || !(sigma > 0.0) || !sigma.is_finite() {
        return data.to_owned();
    }
    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as isize;

    Array1::from_shape_fn(n, |i| {
        let mut acc = 0.0;
        for (k, &w) in kernel.iter().enumerate() {
            let j = i as isize + k as isize - radius;
            let sample = if j >= 0 && (j as usize) < n {
                data[j as usize]
            } else {
                match mode {
                    BoundaryMode::Constant => 0.0,
                    BoundaryMode::Reflect => data[reflect_index(j, n)],
                }
            };
            acc += w * sample;
        }
        acc
    })
}

/// Applies `gaussian_filter1d` to every lane of `data` along `axis`.
pub fn gaussian_filter_axis(data: &Array2<f64>, sigma: f64, axis: Axis, mode: BoundaryMode) -> Array2<f64> {
    let mut out = Array2::<f64>::zeros(data.raw_dim());
    Zip::from(out.lanes_mut(axis))
        .and(data.lanes(axis))
        .for_each(|mut dst, src| dst.assign(&gaussian_filter1d(src, sigma, mode)));
    out
}
