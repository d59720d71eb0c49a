// tests/common/mod.rs
// Synthetic flight records shared by the integration tests

#![allow(dead_code)]

use ndarray::Array1;

use BlackBox_PID_Analyzer::{AxisRecord, FirmwareFamily};

pub const P_GAIN: f64 = 45.0;
pub const P_SCALE: f64 = 0.032029;

/// Piecewise-constant pseudo-random levels in `[-amplitude / 2, amplitude / 2)`.
pub fn stepped_input(n: usize, hold: usize, amplitude: f64) -> Array1<f64> {
    let mut state: u64 = 12345;
    let mut level = 0.0;
    Array1::from_shape_fn(n, |i| {
        if i % hold == 0 {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            level = ((state >> 33) as f64 / (1u64 << 31) as f64 - 0.5) * amplitude;
        }
        level
    })
}

/// Toggles between 0 and `amplitude` every `half_period` samples, starting low.
pub fn square_wave(n: usize, half_period: usize, amplitude: f64) -> Array1<f64> {
    Array1::from_shape_fn(n, |i| if (i / half_period) % 2 == 1 { amplitude } else { 0.0 })
}

/// `signal` delayed by `delay` samples, zero before the delay.
pub fn delayed(signal: &Array1<f64>, delay: usize) -> Array1<f64> {
    Array1::from_shape_fn(signal.len(), |i| if i >= delay { signal[i - delay] } else { 0.0 })
}

pub fn sine(n: usize, sample_rate: f64, freq_hz: f64, amplitude: f64) -> Array1<f64> {
    Array1::from_shape_fn(n, |i| {
        amplitude * (2.0 * std::f64::consts::PI * freq_hz * i as f64 / sample_rate).sin()
    })
}

/// Record whose derived input equals `input` and whose gyro is `gyro`.
pub fn record_from(
    name: &str,
    sample_rate: f64,
    time_offset: f64,
    input: &Array1<f64>,
    gyro: &Array1<f64>,
    debug: Array1<f64>,
    throttle: f64,
) -> AxisRecord {
    let n = input.len();
    let time = Array1::from_shape_fn(n, |i| time_offset + i as f64 / sample_rate);
    let p_err = (input - gyro).mapv(|v| v * P_SCALE * P_GAIN);
    AxisRecord::new(
        name,
        time,
        gyro.clone(),
        p_err,
        Array1::zeros(n),
        debug,
        Array1::from_elem(n, throttle),
        P_GAIN,
        FirmwareFamily::Betaflight,
    )
    .unwrap()
}

/// First index where `curve` reaches half of its mean over `steady`.
pub fn half_rise_index(curve: &[f64], steady: std::ops::Range<usize>) -> (usize, f64) {
    let level = curve[steady.clone()].iter().sum::<f64>() / steady.len() as f64;
    let index = curve.iter().position(|&v| v >= 0.5 * level).unwrap_or(curve.len());
    (index, level)
}

// tests/common/mod.rs
