// src/data_analysis/input_delay.rs

use ndarray::ArrayView1;

use crate::constants::{MAX_DELAY_FRACTION, MAX_DELAY_SAMPLES, MIN_DELAY_CORRELATION, MIN_SAMPLES_FOR_DELAY};

/// Lag at which the measured rate best matches the commanded input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayEstimate {
    pub samples: usize,
    pub ms: f64,
    pub correlation: f64,
}

/// Pearson correlation of `lagged[i + delay]` against `reference[i]`.
fn lagged_correlation(lagged: ArrayView1<f64>, reference: ArrayView1<f64>, delay: usize) -> Option<f64> {
    let len = lagged.len() - delay;
    let mut sum_xy = 0.0;
    let mut sum_x2 = 0.0;
    let mut sum_y2 = 0.0;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    for i in 0..len {
        let x = lagged[i + delay];
        let y = reference[i];
        sum_xy += x * y;
        sum_x2 += x * x;
        sum_y2 += y * y;
        sum_x += x;
        sum_y += y;
    }
    let n = len as f64;
    let denominator = ((n * sum_x2 - sum_x * sum_x) * (n * sum_y2 - sum_y * sum_y)).sqrt();
    if denominator > 1e-10 {
        Some((n * sum_xy - sum_x * sum_y) / denominator)
    } else {
        None
    }
}

/// Estimates how many samples `gyro` trails `input` by cross-correlation.
///
/// Searches lags from one sample up to a tenth of the record (at most 200 samples).
/// Returns `None` for short or mismatched records and when the best correlation is
/// weaker than 0.3.
pub fn estimate_input_delay(input: ArrayView1<f64>, gyro: ArrayView1<f64>, sample_rate: f64) -> Option<DelayEstimate> {
    let n = gyro.len();
    if input.len() != n || n < MIN_SAMPLES_FOR_DELAY || !(sample_rate > 0.0) {
        return None;
    }
    let max_delay = (n / MAX_DELAY_FRACTION).min(MAX_DELAY_SAMPLES);

    let mut best: Option<(usize, f64)> = None;
    for delay in 1..max_delay {
        if n - delay < MIN_SAMPLES_FOR_DELAY {
            break;
        }
        if let Some(correlation) = lagged_correlation(gyro, input, delay) {
            if best.map_or(true, |(_, c)| correlation > c) {
                best = Some((delay, correlation));
            }
        }
    }

    match best {
        Some((samples, correlation)) if correlation > MIN_DELAY_CORRELATION => Some(DelayEstimate {
            samples,
            ms: samples as f64 / sample_rate * 1000.0,
            correlation,
        }),
        _ => None,
    }
}


// src/data_analysis/input_delay.rs
