// src/data_analysis/spectral_analysis.rs

//! Noise spectra against throttle: per-frame amplitude spectra are binned by the frame's
//! peak throttle, normalized by time spent at each throttle level and smoothed.

use ndarray::{Array1, Array2, Axis};
use tracing::{debug, warn};

use crate::config::AnalysisConfig;
use crate::constants::REGULARIZATION_EPSILON;
use crate::data_analysis::equalize::EqualizedRecord;
use crate::data_analysis::fft_utils::{padded_length, rfft_rows_ortho, rfftfreq};
use crate::data_analysis::histogram::histogram2d;
use crate::data_analysis::signal_utils::{gaussian_filter_axis, hann_window, min_max_normalize, BoundaryMode};
use crate::data_analysis::window_stacker::NoiseFrames;
use crate::error::{AnalysisError, AnalysisResult};

/// Noise density of one channel over frequency and throttle.
///
/// Matrices are laid out `[frequency_bin, throttle_bin]`.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseProfile {
    /// Every `noise_freq_decimation`-th frequency of the padded spectrum (Hz).
    pub freq_axis: Array1<f64>,
    /// Frames per throttle bin.
    pub occupancy: Array1<f64>,
    pub throttle_edges: Array1<f64>,
    pub hist_raw: Array2<f64>,
    pub hist_norm: Array2<f64>,
    pub hist_smoothed: Array2<f64>,
    /// Largest smoothed density above `noise_freq_threshold_hz`.
    pub peak: f64,
}

impl NoiseProfile {
    pub fn freq_bins(&self) -> usize {
        self.freq_axis.len()
    }
}

/// Builds the noise profile of `trace` from frames already stacked alongside `throttle`.
///
/// `dt` is the positive sample period. Frame spectra use orthonormal scaling and the
/// magnitude of their real part as histogram weight.
pub fn stack_spectrum(
    throttle: &Array2<f64>,
    trace: &Array2<f64>,
    window: &Array1<f64>,
    dt: f64,
    config: &AnalysisConfig,
) -> AnalysisResult<NoiseProfile> {
    if throttle.dim() != trace.dim() {
        return Err(AnalysisError::ChannelLengthMismatch {
            channel: "throttle frames".to_string(),
            expected: trace.len(),
            actual: throttle.len(),
        });
    }
    let frame_len = trace.len_of(Axis(1));
    if window.len() != frame_len {
        return Err(AnalysisError::ChannelLengthMismatch {
            channel: "window".to_string(),
            expected: frame_len,
            actual: window.len(),
        });
    }

    let windowed = trace * window;
    let thr = throttle * window;

    let padded_len = padded_length(frame_len, config.fft_block_len);
    let freq = rfftfreq(padded_len, dt);
    let spectrum = rfft_rows_ortho(&windowed, padded_len)?;
    let weights = spectrum.mapv(|c| c.re.abs());
    let max_thr = thr.map_axis(Axis(1), |row| row.iter().fold(0.0f64, |m, v| m.max(v.abs())));

    let freq_bins = freq.len() / config.noise_freq_decimation;
    let hist = histogram2d(
        max_thr.view(),
        freq.view(),
        weights.view(),
        [config.throttle_bins, freq_bins],
    )?;
    let hist_smoothed = gaussian_filter_axis(
        &hist.normalized,
        config.noise_smoothing_sigma,
        Axis(0),
        BoundaryMode::Constant,
    );

    let freq_axis = Array1::from_shape_fn(freq_bins, |k| freq[k * config.noise_freq_decimation]);
    let threshold = config.noise_freq_threshold_hz;
    let mask = min_max_normalize(
        freq_axis
            .mapv(|f| f.clamp(threshold - REGULARIZATION_EPSILON, threshold))
            .view(),
    );
    let peak = hist_smoothed
        .rows()
        .into_iter()
        .zip(mask.iter())
        .flat_map(|(row, &m)| row.into_iter().map(move |v| v * m))
        .fold(0.0f64, f64::max);

    Ok(NoiseProfile {
        freq_axis,
        occupancy: hist.occupancy,
        throttle_edges: hist.occupancy_edges,
        hist_raw: hist.raw,
        hist_norm: hist.normalized,
        hist_smoothed,
        peak,
    })
}

/// Occupancy-weighted throttle average of each frequency row of `hist`.
fn throttle_average(hist: &Array2<f64>, thr_mask: &Array1<f64>) -> Array1<f64> {
    let total: f64 = thr_mask.sum();
    if total <= 0.0 {
        return Array1::zeros(hist.len_of(Axis(0)));
    }
    hist.dot(thr_mask) / total
}

/// Ratio of gyro to debug noise per frequency bin, averaged over the throttle levels the
/// flight actually visited.
///
/// With the debug channel holding pre-filter gyro this approximates the filter's
/// magnitude response. An empty debug histogram gives all zeros, as does any bin whose
/// debug average is zero.
pub fn filter_transmission(gyro: &NoiseProfile, debug_noise: &NoiseProfile) -> Array1<f64> {
    let bins = gyro.hist_raw.len_of(Axis(0));
    if debug_noise.hist_raw.sum() <= 0.0 || debug_noise.hist_raw.dim() != gyro.hist_raw.dim() {
        return Array1::zeros(bins);
    }
    let thr_mask = gyro.occupancy.mapv(|c| c.clamp(0.0, 1.0));
    let filtered = throttle_average(&gyro.hist_raw, &thr_mask);
    let unfiltered = throttle_average(&debug_noise.hist_raw, &thr_mask);
    filtered
        .iter()
        .zip(unfiltered.iter())
        .map(|(&g, &d)| if d != 0.0 { g / d } else { 0.0 })
        .collect()
}

/// Noise profiles of the three noise channels of one axis.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseAnalysis {
    pub gyro: NoiseProfile,
    pub d_term: NoiseProfile,
    pub debug: NoiseProfile,
    pub filter_trans: Array1<f64>,
}

/// Stacks noise frames (without the landing tail) and profiles gyro, D term and debug.
pub fn calc_noise(record: &EqualizedRecord, config: &AnalysisConfig) -> AnalysisResult<NoiseAnalysis> {
    let frame_len = record.samples_for(config.noise_frame_length_s);
    let tail = config.noise_tail_frames();
    let frames = NoiseFrames::from_record(record, frame_len, config.noise_superposition, tail)?;
    if frames.count() == 0 {
        warn!(
            axis = %record.name,
            tail_frames = tail,
            "record too short for noise frames after dropping the tail; noise profiles are empty"
        );
    }
    let window = hann_window(frame_len);
    let dt = record.sample_period();

    let gyro = stack_spectrum(&frames.throttle, &frames.gyro, &window, dt, config)?;
    let d_term = stack_spectrum(&frames.throttle, &frames.d_err, &window, dt, config)?;
    let debug_noise = stack_spectrum(&frames.throttle, &frames.debug, &window, dt, config)?;
    let filter_trans = filter_transmission(&gyro, &debug_noise);

    debug!(
        axis = %record.name,
        frames = frames.count(),
        freq_bins = gyro.freq_bins(),
        gyro_peak = gyro.peak,
        d_term_peak = d_term.peak,
        debug_peak = debug_noise.peak,
        "noise spectra"
    );

    Ok(NoiseAnalysis {
        gyro,
        d_term,
        debug: debug_noise,
        filter_trans,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_analysis::window_stacker::FrameLayout;
    use ndarray::ArrayView1;

    const DT: f64 = 0.001;
    const FRAME: usize = 300;

    fn stacked(signal: ArrayView1<f64>) -> Array2<f64> {
        let layout = FrameLayout::new(signal.len(), FRAME, 16).unwrap();
        layout.stack(signal).unwrap()
    }

    fn sine(freq_hz: f64, amplitude: f64, n: usize) -> Array1<f64> {
        Array1::from_shape_fn(n, |i| amplitude * (2.0 * std::f64::consts::PI * freq_hz * i as f64 * DT).sin())
    }

    fn profile_of(signal: &Array1<f64>) -> NoiseProfile {
        let frames = stacked(signal.view());
        let throttle = Array2::from_elem(frames.dim(), 50.0);
        stack_spectrum(&throttle, &frames, &hann_window(FRAME), DT, &AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn test_profile_shapes() {
        let profile = profile_of(&sine(200.0, 10.0, 3000));
        // 300 samples pad to 1024: 513 rfft bins, 128 after decimation
        assert_eq!(profile.freq_bins(), 128);
        assert_eq!(profile.hist_raw.dim(), (128, 101));
        assert_eq!(profile.hist_smoothed.dim(), (128, 101));
        assert_eq!(profile.occupancy.len(), 101);
        assert!((profile.freq_axis[1] - 4.0 * 1000.0 / 1024.0).abs() < 1e-9);
    }

    #[test]
    fn test_sine_energy_lands_in_its_frequency_row() {
        let profile = profile_of(&sine(200.0, 10.0, 3000));
        let (column, _) = profile
            .occupancy
            .iter()
            .enumerate()
            .fold((0, 0.0), |best, (i, &c)| if c > best.1 { (i, c) } else { best });
        let row = profile
            .hist_raw
            .column(column)
            .iter()
            .enumerate()
            .fold((0, 0.0), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
            .0;
        // 500 Hz over 128 bins: 200 Hz falls in bin 51
        assert!((50..=52).contains(&row), "peak row {}", row);
        assert!(profile.peak > 0.0);
    }

    #[test]
    fn test_peak_ignores_low_frequency_noise() {
        let high = profile_of(&sine(200.0, 10.0, 3000));
        let low = profile_of(&sine(50.0, 10.0, 3000));
        assert!(low.peak < 0.01 * high.peak, "low {} high {}", low.peak, high.peak);
    }

    #[test]
    fn test_filter_transmission_of_scaled_copy() {
        let debug_signal = sine(200.0, 10.0, 3000) + sine(120.0, 4.0, 3000);
        let gyro_signal = debug_signal.mapv(|v| 0.5 * v);
        let gyro = profile_of(&gyro_signal);
        let debug_noise = profile_of(&debug_signal);
        let ratio = filter_transmission(&gyro, &debug_noise);
        assert_eq!(ratio.len(), 128);
        let mut checked = 0;
        for (k, r) in ratio.iter().enumerate() {
            if debug_noise.hist_raw.row(k).sum() > 0.0 {
                assert!((r - 0.5).abs() < 1e-9, "bin {} ratio {}", k, r);
                checked += 1;
            } else {
                assert_eq!(*r, 0.0);
            }
        }
        assert!(checked > 0);
    }

    #[test]
    fn test_filter_transmission_without_debug_is_zero() {
        let gyro = profile_of(&sine(200.0, 10.0, 3000));
        let debug_noise = profile_of(&Array1::zeros(3000));
        assert_eq!(debug_noise.hist_raw.sum(), 0.0);
        let ratio = filter_transmission(&gyro, &debug_noise);
        assert_eq!(ratio.len(), gyro.freq_bins());
        assert!(ratio.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_no_frames_gives_empty_profile() {
        let frames = Array2::<f64>::zeros((0, FRAME));
        let profile = stack_spectrum(&frames, &frames, &hann_window(FRAME), DT, &AnalysisConfig::default()).unwrap();
        assert_eq!(profile.freq_bins(), 128);
        assert_eq!(profile.peak, 0.0);
        assert_eq!(profile.occupancy.sum(), 0.0);
        assert!(profile.hist_smoothed.iter().all(|v| *v == 0.0));
    }
}

// src/data_analysis/spectral_analysis.rs
