// src/config.rs

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{AnalysisError, AnalysisResult};

/// Tuning parameters for every stage of the per-axis pipeline.
///
/// `Default` reproduces the values in `constants.rs`. Stages take the config
/// explicitly so tests can override single fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub frame_length_s: f64,
    pub response_length_s: f64,
    pub cutoff_freq_hz: f64,
    pub superposition: usize,
    pub min_input_threshold: f64,
    pub high_input_threshold: f64,
    pub min_high_frames: usize,
    pub noise_frame_length_s: f64,
    pub noise_superposition: usize,
    pub noise_tail_s: f64,
    pub p_gain_scale: f64,
    pub response_range: [f64; 2],
    pub response_bins: usize,
    pub mode_smoothing_sigma: f64,
    pub error_width_threshold: f64,
    pub noise_smoothing_sigma: f64,
    pub noise_freq_threshold_hz: f64,
    pub noise_freq_decimation: usize,
    pub throttle_bins: usize,
    pub fft_block_len: usize,
    pub regularization_gain: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            frame_length_s: FRAME_LENGTH_S,
            response_length_s: RESPONSE_LENGTH_S,
            cutoff_freq_hz: CUTOFF_FREQ_HZ,
            superposition: SUPERPOSITION_FACTOR,
            min_input_threshold: MIN_INPUT_THRESHOLD,
            high_input_threshold: HIGH_INPUT_THRESHOLD,
            min_high_frames: MIN_HIGH_FRAMES,
            noise_frame_length_s: NOISE_FRAME_LENGTH_S,
            noise_superposition: NOISE_SUPERPOSITION_FACTOR,
            noise_tail_s: NOISE_TAIL_S,
            p_gain_scale: P_GAIN_SCALE,
            response_range: RESPONSE_RANGE,
            response_bins: RESPONSE_BINS,
            mode_smoothing_sigma: MODE_SMOOTHING_SIGMA,
            error_width_threshold: ERROR_WIDTH_THRESHOLD,
            noise_smoothing_sigma: NOISE_SMOOTHING_SIGMA,
            noise_freq_threshold_hz: NOISE_FREQ_THRESHOLD_HZ,
            noise_freq_decimation: NOISE_FREQ_DECIMATION,
            throttle_bins: THROTTLE_BINS,
            fft_block_len: FFT_BLOCK_LEN,
            regularization_gain: REGULARIZATION_GAIN,
        }
    }
}

impl AnalysisConfig {
    /// Checks that lengths, counts and ranges are usable before any stage runs.
    pub fn validate(&self) -> AnalysisResult<()> {
        let positive = [
            ("frame_length_s", self.frame_length_s),
            ("response_length_s", self.response_length_s),
            ("cutoff_freq_hz", self.cutoff_freq_hz),
            ("noise_frame_length_s", self.noise_frame_length_s),
            ("p_gain_scale", self.p_gain_scale),
            ("regularization_gain", self.regularization_gain),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(AnalysisError::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        let counts = [
            ("superposition", self.superposition),
            ("noise_superposition", self.noise_superposition),
            ("response_bins", self.response_bins),
            ("noise_freq_decimation", self.noise_freq_decimation),
            ("throttle_bins", self.throttle_bins),
            ("fft_block_len", self.fft_block_len),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(AnalysisError::InvalidConfig(format!("{} must be non-zero", name)));
            }
        }

        if self.response_length_s > self.frame_length_s {
            return Err(AnalysisError::InvalidConfig(format!(
                "response_length_s ({}) exceeds frame_length_s ({})",
                self.response_length_s, self.frame_length_s
            )));
        }
        let [lo, hi] = self.response_range;
        if !(lo.is_finite() && hi.is_finite() && lo < hi) {
            return Err(AnalysisError::InvalidConfig(format!(
                "response_range [{}, {}] is empty",
                lo, hi
            )));
        }
        if self.noise_tail_s < 0.0 {
            return Err(AnalysisError::InvalidConfig("noise_tail_s must not be negative".to_string()));
        }
        Ok(())
    }

    /// Number of trailing noise frames dropped to exclude landing artifacts.
    pub fn noise_tail_frames(&self) -> usize {
        (self.noise_superposition as f64 * self.noise_tail_s / self.noise_frame_length_s).floor() as usize
    }
}
