// src/data_analysis/wiener.rs

use ndarray::{s, Array1, Array2, Axis};
use num_complex::Complex64;
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::constants::REGULARIZATION_EPSILON;
use crate::data_analysis::fft_utils::{abs_fftfreq, padded_length, ComplexFftPair};
use crate::data_analysis::signal_utils::{cumulative_sum_rows, gaussian_filter1d, min_max_normalize, BoundaryMode};
use crate::data_analysis::window_stacker::ResponseFrames;
use crate::error::{AnalysisError, AnalysisResult};

/// Per-frame scalars computed from the windowed frames.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameFeatures {
    pub max_throttle: Array1<f64>,
    pub mean_abs_input: Array1<f64>,
    pub max_abs_input: Array1<f64>,
    pub mean_time: Array1<f64>,
}

/// Step response estimate for every frame of one axis.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResponseStack {
    /// `frames x response_len`
    pub responses: Array2<f64>,
    pub features: FrameFeatures,
}

impl StepResponseStack {
    pub fn frame_count(&self) -> usize {
        self.responses.len_of(Axis(0))
    }
}

/// Signal-to-noise gain per FFT bin: large below `cutoff_hz`, near zero above it.
///
/// `|fftfreq|` is clipped to a narrow band at the cutoff and min-max normalized into a step
/// mask, the mask is Gaussian-smoothed with a width of one sixth of its low-frequency bin
/// count, and the result is mapped to `gain * (1 - mask + eps)`.
pub fn regularization_gain(padded_len: usize, dt: f64, cutoff_hz: f64, gain: f64) -> Array1<f64> {
    let freq = abs_fftfreq(padded_len, dt);
    let clipped = freq.mapv(|f| f.clamp(cutoff_hz - REGULARIZATION_EPSILON, cutoff_hz));
    let mask = min_max_normalize(clipped.view());
    let low_bins: f64 = mask.iter().map(|v| 1.0 - v).sum();
    let smoothed = gaussian_filter1d(mask.view(), low_bins / 6.0, BoundaryMode::Reflect);
    let mask = min_max_normalize(smoothed.view());
    mask.mapv(|v| gain * (1.0 - v + REGULARIZATION_EPSILON))
}

/// Regularized frequency-domain deconvolution of `output` by `input`, row by row.
///
/// Rows are zero-padded to the next multiple of `fft_block_len`; the returned rows keep
/// the full padded length.
pub fn wiener_deconvolution(
    input: &Array2<f64>,
    output: &Array2<f64>,
    dt: f64,
    config: &AnalysisConfig,
) -> AnalysisResult<Array2<f64>> {
    if input.dim() != output.dim() {
        return Err(AnalysisError::ChannelLengthMismatch {
            channel: "gyro frames".to_string(),
            expected: input.len(),
            actual: output.len(),
        });
    }
    let (frames, frame_len) = input.dim();
    let padded_len = padded_length(frame_len, config.fft_block_len);
    let sn = regularization_gain(padded_len, dt, config.cutoff_freq_hz, config.regularization_gain);
    let inv_sn: Vec<f64> = sn.iter().map(|v| 1.0 / v).collect();
    let fft = ComplexFftPair::new(padded_len);

    let mut deconvolved = Array2::<f64>::zeros((frames, padded_len));
    for ((in_row, out_row), mut dst) in input
        .rows()
        .into_iter()
        .zip(output.rows())
        .zip(deconvolved.rows_mut())
    {
        let h = fft.forward_real(in_row)?;
        let g = fft.forward_real(out_row)?;
        let spectrum: Vec<Complex64> = h
            .iter()
            .zip(g.iter())
            .zip(inv_sn.iter())
            .map(|((h, g), inv)| {
                let h_conj = h.conj();
                let denominator = (h * h_conj).re + inv;
                (g * h_conj) / denominator
            })
            .collect();
        let impulse = fft.inverse_real(spectrum)?;
        dst.assign(&Array1::from(impulse));
    }
    debug!(frames, frame_len, padded_len, "wiener deconvolution");
    Ok(deconvolved)
}

fn row_max_abs(data: &Array2<f64>) -> Array1<f64> {
    data.map_axis(Axis(1), |row| row.iter().fold(0.0f64, |m, v| m.max(v.abs())))
}

fn row_mean(data: &Array2<f64>) -> Array1<f64> {
    data.map_axis(Axis(1), |row| row.mean().unwrap_or(0.0))
}

/// Windows every frame, deconvolves gyro by input, and integrates the first
/// `response_len` samples of each impulse response into a step response.
pub fn stack_response(
    frames: &ResponseFrames,
    window: &Array1<f64>,
    dt: f64,
    response_len: usize,
    config: &AnalysisConfig,
) -> AnalysisResult<StepResponseStack> {
    if window.len() != frames.layout.frame_len {
        return Err(AnalysisError::ChannelLengthMismatch {
            channel: "window".to_string(),
            expected: frames.layout.frame_len,
            actual: window.len(),
        });
    }
    if response_len > frames.layout.frame_len {
        return Err(AnalysisError::InvalidConfig(format!(
            "response length {} exceeds frame length {}",
            response_len, frames.layout.frame_len
        )));
    }

    let inp = &frames.input * window;
    let outp = &frames.gyro * window;
    let thr = &frames.throttle * window;

    let deconvolved = wiener_deconvolution(&inp, &outp, dt, config)?;
    let impulse = deconvolved.slice(s![.., ..response_len]).to_owned();
    let responses = cumulative_sum_rows(&impulse);

    let features = FrameFeatures {
        max_throttle: row_max_abs(&thr),
        mean_abs_input: row_mean(&inp.mapv(f64::abs)),
        max_abs_input: row_max_abs(&inp),
        mean_time: row_mean(&frames.time),
    };
    Ok(StepResponseStack { responses, features })
}


// src/data_analysis/wiener.rs
