// src/data_analysis/synthetic.rs

//! Artificial gyro traces with a known system response, for benchmarking the pipeline.

use ndarray::{s, Array1, ArrayView1};

use crate::error::{AnalysisError, AnalysisResult};

/// Contamination added on top of the ideal response.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ToyNoise {
    #[default]
    None,
    Sine { amplitude: f64, freq_hz: f64 },
    /// Uniform white noise in `[-amplitude / 2, amplitude / 2)`, reproducible per seed.
    Uniform { amplitude: f64, seed: u64 },
}

/// Linear congruential generator, enough for repeatable benchmark noise.
fn uniform_noise(n: usize, amplitude: f64, seed: u64) -> Array1<f64> {
    let mut state = seed;
    Array1::from_shape_fn(n, |_| {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((state >> 33) as f64 / (1u64 << 31) as f64 - 0.5) * amplitude
    })
}

/// Output of a system that waits `delay_s` and then averages the input over `length_s`.
///
/// The impulse response is a boxcar of unit area starting after the delay, so a step
/// input settles at its own level `delay_s + length_s` later.
pub fn toy_response(
    input: ArrayView1<f64>,
    sample_rate: f64,
    delay_s: f64,
    length_s: f64,
    noise: ToyNoise,
) -> AnalysisResult<Array1<f64>> {
    if !(sample_rate > 0.0) || delay_s < 0.0 || !(length_s > 0.0) {
        return Err(AnalysisError::InvalidConfig(format!(
            "toy response needs positive rate and length, got rate {} delay {} length {}",
            sample_rate, delay_s, length_s
        )));
    }
    let delay = (delay_s * sample_rate) as usize;
    let total = ((delay_s + length_s) * sample_rate) as usize;
    if total <= delay {
        return Err(AnalysisError::InvalidConfig(format!(
            "toy response length {} s is shorter than one sample",
            length_s
        )));
    }
    let tap = 1.0 / (total - delay) as f64;

    let mut out = Array1::<f64>::zeros(input.len());
    for (i, slot) in out.iter_mut().enumerate() {
        // Taps delay..total of the boxcar see input[i - k]
        let hi = i.checked_sub(delay);
        let lo = i.saturating_sub(total - 1);
        if let Some(hi) = hi {
            if lo <= hi {
                *slot = input.slice(s![lo..=hi]).sum() * tap;
            }
        }
    }

    match noise {
        ToyNoise::None => {}
        ToyNoise::Sine { amplitude, freq_hz } => {
            for (i, v) in out.iter_mut().enumerate() {
                let t = i as f64 / sample_rate;
                *v += amplitude * (2.0 * std::f64::consts::PI * freq_hz * t).sin();
            }
        }
        ToyNoise::Uniform { amplitude, seed } => out += &uniform_noise(out.len(), amplitude, seed),
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_settles_after_delay_and_length() {
        let input = Array1::from_shape_fn(100, |i| if i >= 10 { 2.0 } else { 0.0 });
        let out = toy_response(input.view(), 1000.0, 0.005, 0.010, ToyNoise::None).unwrap();
        // Nothing before step + delay
        assert!(out.iter().take(15).all(|v| *v == 0.0));
        assert!(out[15] > 0.0);
        // Fully settled once the boxcar has passed the step
        assert!((out[25] - 2.0).abs() < 1e-12);
        assert!((out[99] - 2.0).abs() < 1e-12);
        assert!(out[20] > 0.0 && out[20] < 2.0);
    }

    #[test]
    fn test_sine_noise_is_added() {
        let input = Array1::<f64>::zeros(8);
        let out = toy_response(
            input.view(),
            8.0,
            0.0,
            0.5,
            ToyNoise::Sine {
                amplitude: 1.0,
                freq_hz: 2.0,
            },
        )
        .unwrap();
        assert!(out[0].abs() < 1e-12);
        assert!((out[1] - 1.0).abs() < 1e-12);
        assert!((out[3] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_uniform_noise_is_bounded_and_repeatable() {
        let input = Array1::<f64>::zeros(500);
        let noise = ToyNoise::Uniform { amplitude: 4.0, seed: 7 };
        let a = toy_response(input.view(), 1000.0, 0.0, 0.01, noise).unwrap();
        let b = toy_response(input.view(), 1000.0, 0.0, 0.01, noise).unwrap();
        assert_eq!(a, b);
        assert!(a.iter().all(|v| (-2.0..2.0).contains(v)));
        assert!(a.iter().any(|v| *v > 1.0) && a.iter().any(|v| *v < -1.0));
        assert!(a.mean().unwrap().abs() < 0.3);

        let other = toy_response(input.view(), 1000.0, 0.0, 0.01, ToyNoise::Uniform { amplitude: 4.0, seed: 8 }).unwrap();
        assert_ne!(a, other);
    }

    #[test]
    fn test_invalid_parameters_are_rejected() {
        let input = Array1::<f64>::zeros(8);
        assert!(toy_response(input.view(), 0.0, 0.0, 0.1, ToyNoise::None).is_err());
        assert!(toy_response(input.view(), 1000.0, 0.0, 0.0, ToyNoise::None).is_err());
    }
}

// src/data_analysis/synthetic.rs
