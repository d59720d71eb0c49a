// src/data_analysis/calc_step_response.rs

use ndarray::{s, Array1, Array2, ArrayView1, Axis};
use tracing::{debug, warn};

use crate::config::AnalysisConfig;
use crate::constants::REGULARIZATION_EPSILON;
use crate::data_analysis::equalize::EqualizedRecord;
use crate::data_analysis::histogram::{histogram2d, Histogram2D, UniformBins};
use crate::data_analysis::signal_utils::{
    gaussian_filter_axis, hann_window, linspace, min_max_normalize, BoundaryMode,
};
use crate::data_analysis::wiener::{stack_response, StepResponseStack};
use crate::data_analysis::window_stacker::ResponseFrames;
use crate::error::{AnalysisError, AnalysisResult};

/// Splits frames by `signal <= threshold` into complementary 0/1 masks.
///
/// The high mask is cleared entirely when it selects fewer than `min_high_frames` frames.
pub fn low_high_mask(signal: ArrayView1<f64>, threshold: f64, min_high_frames: usize) -> (Array1<f64>, Array1<f64>) {
    let low = signal.mapv(|v| if v <= threshold { 1.0 } else { 0.0 });
    let mut high = low.mapv(|v| 1.0 - v);
    if high.sum() < min_high_frames as f64 {
        high.fill(0.0);
    }
    (low, high)
}

/// Most probable step response over a selection of frames.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseCurve {
    /// Seconds since frame start, one entry per response sample.
    pub time: Array1<f64>,
    /// Value grid of the response axis, one entry per bin.
    pub response_axis: Array1<f64>,
    /// Smoothed, column-normalized density laid out `[value_bin, time_sample]`.
    pub density: Array2<f64>,
    pub mode: Array1<f64>,
    /// Binarized spread of the unsmoothed histogram, in response units.
    pub error_width: Array1<f64>,
}

/// Extracts the mode trace of `responses` (frames x samples) with per-frame `weights`.
///
/// Columns of the histogram follow the response samples one to one. Each column is
/// smoothed along the value axis, scaled to a unit maximum, and the mode is the average
/// bin value weighted by the squared density. An empty selection gives an all-zero trace.
pub fn weighted_mode_avr(
    responses: &Array2<f64>,
    weights: ArrayView1<f64>,
    time_resp: ArrayView1<f64>,
    config: &AnalysisConfig,
) -> AnalysisResult<ResponseCurve> {
    let (frames, samples) = responses.dim();
    if weights.len() != frames {
        return Err(AnalysisError::ChannelLengthMismatch {
            channel: "frame weights".to_string(),
            expected: frames,
            actual: weights.len(),
        });
    }
    if time_resp.len() != samples {
        return Err(AnalysisError::ChannelLengthMismatch {
            channel: "response time".to_string(),
            expected: samples,
            actual: time_resp.len(),
        });
    }

    let [lo, hi] = config.response_range;
    let bins = config.response_bins;
    let response_axis = linspace(lo, hi, bins);
    let value_bins = UniformBins::new(lo, hi, bins);

    let mut hist = Array2::<f64>::zeros((bins, samples));
    for (row, &w) in responses.rows().into_iter().zip(weights.iter()) {
        if w == 0.0 {
            continue;
        }
        for (j, &v) in row.iter().enumerate() {
            if let Some(b) = value_bins.locate(v) {
                hist[[b, j]] += w;
            }
        }
    }

    let (density, mode) = if hist.sum() != 0.0 {
        let mut smoothed = gaussian_filter_axis(&hist, config.mode_smoothing_sigma, Axis(0), BoundaryMode::Constant);
        for (column, mut lane) in smoothed.columns_mut().into_iter().enumerate() {
            let peak = lane.iter().fold(0.0f64, |m, &v| m.max(v));
            if peak > 0.0 {
                lane.mapv_inplace(|v| v / peak);
            } else {
                let error = AnalysisError::DegenerateHistogram { column };
                warn!(%error, "zero-filled response column");
                lane.fill(0.0);
            }
        }
        let mode = smoothed
            .columns()
            .into_iter()
            .map(|lane| {
                let (num, den) = lane
                    .iter()
                    .zip(response_axis.iter())
                    .fold((0.0, 0.0), |(num, den), (&d, &y)| (num + y * d * d, den + d * d));
                if den > 0.0 {
                    num / den
                } else {
                    0.0
                }
            })
            .collect::<Array1<f64>>();
        (smoothed, mode)
    } else {
        (hist.clone(), Array1::zeros(samples))
    };

    let bin_width = 0.5 / (bins as f64 / (hi - lo));
    let error_width = hist.map_axis(Axis(0), |lane| {
        lane.iter()
            .filter(|&&v| v > config.error_width_threshold)
            .count() as f64
            * bin_width
    });

    Ok(ResponseCurve {
        time: time_resp.to_owned(),
        response_axis,
        density,
        mode,
        error_width,
    })
}

/// Per-frame consistency with `reference`: 1 for frames within half a unit of it on
/// average, falling to 0 for the worst frames.
pub fn response_quality(responses: &Array2<f64>, reference: ArrayView1<f64>) -> Array1<f64> {
    let deviation = responses.map_axis(Axis(1), |row| {
        let total: f64 = row.iter().zip(reference.iter()).map(|(r, m)| (r - m).abs()).sum();
        let mean = if row.is_empty() { 0.0 } else { total / row.len() as f64 };
        mean.clamp(0.5 - REGULARIZATION_EPSILON, 0.5)
    });
    min_max_normalize(deviation.view()).mapv(|v| 1.0 - v)
}

/// Everything the step-response pass derives for one axis.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseAnalysis {
    pub time_resp: Array1<f64>,
    pub stack: StepResponseStack,
    pub low_mask: Array1<f64>,
    pub high_mask: Array1<f64>,
    /// Frames whose peak input clears the minimum threshold.
    pub not_too_low: Array1<f64>,
    /// Mode over all not-too-low frames, used to score quality.
    pub reference: ResponseCurve,
    pub quality: Array1<f64>,
    pub thr_response: Histogram2D,
    pub resp_low: ResponseCurve,
    pub resp_high: Option<ResponseCurve>,
}

/// Runs the deconvolution, frame classification and mode extraction for one axis.
pub fn calc_step_response(record: &EqualizedRecord, config: &AnalysisConfig) -> AnalysisResult<ResponseAnalysis> {
    let frame_len = record.samples_for(config.frame_length_s);
    let response_len = record.samples_for(config.response_length_s);
    if response_len == 0 || response_len > record.len() {
        return Err(AnalysisError::insufficient(
            "time",
            format!("{} samples cannot hold a {} s response", record.len(), config.response_length_s),
        ));
    }
    let frames = ResponseFrames::from_record(record, frame_len, config.superposition)?;
    if frames.count() == 0 {
        return Err(AnalysisError::insufficient(
            "time",
            format!("record of {} samples is shorter than one analysis frame", record.len()),
        ));
    }

    let time_resp = record.time.slice(s![..response_len]).mapv(|t| t - record.time[0]);
    let window = hann_window(frame_len);
    let stack = stack_response(&frames, &window, record.dt, response_len, config)?;
    let features = &stack.features;

    let (low_mask, high_mask) = low_high_mask(
        features.max_abs_input.view(),
        config.high_input_threshold,
        config.min_high_frames,
    );
    let (_, not_too_low) = low_high_mask(
        features.max_abs_input.view(),
        config.min_input_threshold,
        config.min_high_frames,
    );

    let reference = weighted_mode_avr(&stack.responses, not_too_low.view(), time_resp.view(), config)?;
    let quality = response_quality(&stack.responses, reference.mode.view());

    // Rejected frames land at negative throttle and drop out of the histogram
    let signed_throttle = &features.max_throttle * &(&not_too_low * &quality).mapv(|q| 2.0 * q - 1.0);
    let weighted = &stack.responses * &not_too_low.view().insert_axis(Axis(1));
    let thr_response = histogram2d(
        signed_throttle.view(),
        time_resp.view(),
        weighted.view(),
        [config.throttle_bins, response_len],
    )?;

    let resp_low = weighted_mode_avr(&stack.responses, (&low_mask * &not_too_low).view(), time_resp.view(), config)?;
    let resp_high = if high_mask.sum() > 0.0 {
        Some(weighted_mode_avr(
            &stack.responses,
            (&high_mask * &not_too_low).view(),
            time_resp.view(),
            config,
        )?)
    } else {
        None
    };

    debug!(
        axis = %record.name,
        frames = stack.frame_count(),
        response_len,
        low_frames = low_mask.sum(),
        high_frames = high_mask.sum(),
        usable_frames = not_too_low.sum(),
        "step response classified"
    );

    Ok(ResponseAnalysis {
        time_resp,
        stack,
        low_mask,
        high_mask,
        not_too_low,
        reference,
        quality,
        thr_response,
        resp_low,
        resp_high,
    })
}


// src/data_analysis/calc_step_response.rs
