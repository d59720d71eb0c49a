// src/data_analysis/equalize.rs

use ndarray::{Array1, ArrayView1};
use tracing::debug;

use crate::data_analysis::signal_utils::linspace;
use crate::data_input::axis_record::AxisRecord;
use crate::error::{AnalysisError, AnalysisResult};

/// An axis record resampled onto a uniform time grid, with the derived input signal.
#[derive(Debug, Clone, PartialEq)]
pub struct EqualizedRecord {
    pub name: String,
    pub time: Array1<f64>,
    pub gyro: Array1<f64>,
    pub input: Array1<f64>,
    pub p_err: Array1<f64>,
    pub d_err: Array1<f64>,
    pub debug: Array1<f64>,
    pub throttle: Array1<f64>,
    /// `time[0] - time[1]`: the uniform step with a negative sign.
    pub dt: f64,
}

impl EqualizedRecord {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Positive sample period of the uniform grid.
    pub fn sample_period(&self) -> f64 {
        self.dt.abs()
    }

    /// Sample count closest to `duration` seconds on this grid.
    pub fn samples_for(&self, duration: f64) -> usize {
        (duration / self.sample_period()).round() as usize
    }
}

fn validate_time(time: ArrayView1<f64>) -> AnalysisResult<()> {
    if time.is_empty() {
        return Err(AnalysisError::insufficient("time", "no samples"));
    }
    if time.len() < 2 {
        return Err(AnalysisError::insufficient("time", "at least two samples are required"));
    }
    for (i, pair) in time.windows(2).into_iter().enumerate() {
        if !(pair[1] > pair[0]) {
            return Err(AnalysisError::NonMonotonicTime { index: i + 1 });
        }
    }
    Ok(())
}

/// Linear interpolation of `values` sampled at `time` onto `new_time`.
///
/// `time` must be strictly increasing and `new_time` sorted and inside `time`'s span.
fn interpolate(time: ArrayView1<f64>, values: ArrayView1<f64>, new_time: ArrayView1<f64>) -> Array1<f64> {
    let n = time.len();
    if n < 2 {
        return Array1::from_elem(new_time.len(), values.iter().next().copied().unwrap_or(0.0));
    }
    let mut seg = 0usize;
    new_time
        .iter()
        .map(|&t| {
            while seg + 2 < n && time[seg + 1] <= t {
                seg += 1;
            }
            let (x_lo, x_hi) = (time[seg], time[seg + 1]);
            let (y_lo, y_hi) = (values[seg], values[seg + 1]);
            let slope = (y_hi - y_lo) / (x_hi - x_lo);
            slope * (t - x_lo) + y_lo
        })
        .collect()
}

/// Resamples one channel onto `n` uniform samples spanning `[time[0], time[last]]`.
pub fn equalize(time: ArrayView1<f64>, data: ArrayView1<f64>) -> AnalysisResult<(Array1<f64>, Array1<f64>)> {
    validate_time(time)?;
    if data.is_empty() {
        return Err(AnalysisError::insufficient("data", "no samples"));
    }
    if data.len() != time.len() {
        return Err(AnalysisError::ChannelLengthMismatch {
            channel: "data".to_string(),
            expected: time.len(),
            actual: data.len(),
        });
    }
    let new_time = linspace(time[0], time[time.len() - 1], time.len());
    let resampled = interpolate(time, data, new_time.view());
    Ok((new_time, resampled))
}

/// Resamples every channel of `record` onto a uniform grid and derives the input signal.
pub fn equalize_record(record: &AxisRecord, p_gain_scale: f64) -> AnalysisResult<EqualizedRecord> {
    validate_time(record.time.view())?;
    for (channel, data) in record.channels() {
        if data.is_empty() {
            return Err(AnalysisError::insufficient(channel, "no samples"));
        }
    }
    record.check_lengths()?;

    let input_raw = record.input_signal(p_gain_scale)?;
    let n = record.len();
    let time = linspace(record.time[0], record.time[n - 1], n);
    let resample = |values: &Array1<f64>| interpolate(record.time.view(), values.view(), time.view());

    let equalized = EqualizedRecord {
        name: record.name.clone(),
        gyro: resample(&record.gyro),
        input: resample(&input_raw),
        p_err: resample(&record.p_err),
        d_err: resample(&record.d_err),
        debug: resample(&record.debug),
        throttle: resample(&record.throttle),
        dt: time[0] - time[1],
        time,
    };
    debug!(
        axis = %equalized.name,
        samples = n,
        sample_rate_hz = 1.0 / equalized.sample_period(),
        "equalized time base"
    );
    Ok(equalized)
}
