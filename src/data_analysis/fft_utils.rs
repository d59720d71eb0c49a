// src/data_analysis/fft_utils.rs

use std::sync::Arc;

use ndarray::{Array1, Array2, ArrayView1, Axis};
use num_complex::Complex64;
use realfft::RealFftPlanner;
use rustfft::{Fft, FftPlanner};

use crate::error::{AnalysisError, AnalysisResult};

/// Length after zero-padding `len` up to the next multiple of `block`.
///
/// A length that is already a multiple still receives one full extra block, which keeps
/// the deconvolved response clear of circular wrap-around.
pub fn padded_length(len: usize, block: usize) -> usize {
    len + (block - len % block)
}

/// Absolute sample frequencies of a full complex FFT of length `n` (numpy `|fftfreq|`).
pub fn abs_fftfreq(n: usize, d: f64) -> Array1<f64> {
    if n == 0 || d == 0.0 {
        return Array1::zeros(n);
    }
    let scale = 1.0 / (n as f64 * d.abs());
    let half = (n + 1) / 2; // count of non-negative frequencies
    Array1::from_shape_fn(n, |k| {
        let signed = if k < half { k as f64 } else { k as f64 - n as f64 };
        signed.abs() * scale
    })
}

/// Sample frequencies of a real FFT of length `n`.
pub fn rfftfreq(n: usize, d: f64) -> Array1<f64> {
    if n == 0 || d == 0.0 {
        return Array1::zeros(0);
    }
    let scale = 1.0 / (n as f64 * d.abs());
    Array1::from_shape_fn(n / 2 + 1, |k| k as f64 * scale)
}

/// Reusable forward/inverse complex FFT pair for frames of one padded length.
pub struct ComplexFftPair {
    len: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl ComplexFftPair {
    pub fn new(len: usize) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        Self {
            len,
            forward: planner.plan_fft_forward(len),
            inverse: planner.plan_fft_inverse(len),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Zero-pads a real frame to the planned length and transforms it.
    pub fn forward_real(&self, frame: ArrayView1<f64>) -> AnalysisResult<Vec<Complex64>> {
        if frame.len() > self.len {
            return Err(AnalysisError::Fft(format!(
                "frame of {} samples does not fit padded length {}",
                frame.len(),
                self.len
            )));
        }
        let mut buffer = vec![Complex64::new(0.0, 0.0); self.len];
        for (dst, &src) in buffer.iter_mut().zip(frame.iter()) {
            *dst = Complex64::new(src, 0.0);
        }
        self.forward.process(&mut buffer);
        Ok(buffer)
    }

    /// Inverse transform normalized by 1/N, returning the real part.
    pub fn inverse_real(&self, mut spectrum: Vec<Complex64>) -> AnalysisResult<Vec<f64>> {
        if spectrum.len() != self.len {
            return Err(AnalysisError::Fft(format!(
                "inverse length mismatch: expected {}, got {}",
                self.len,
                spectrum.len()
            )));
        }
        self.inverse.process(&mut spectrum);
        let scale = 1.0 / self.len as f64;
        Ok(spectrum.iter().map(|c| c.re * scale).collect())
    }
}

/// Orthonormally scaled real FFT of every row of `frames`, each zero-padded to `padded_len`.
///
/// Returns a `rows x (padded_len / 2 + 1)` complex matrix.
pub fn rfft_rows_ortho(frames: &Array2<f64>, padded_len: usize) -> AnalysisResult<Array2<Complex64>> {
    let rows = frames.len_of(Axis(0));
    let cols = frames.len_of(Axis(1));
    if cols > padded_len || padded_len == 0 {
        return Err(AnalysisError::Fft(format!(
            "cannot pad {} samples to {}",
            cols, padded_len
        )));
    }
    let planner = RealFftPlanner::<f64>::new().plan_fft_forward(padded_len);
    let num_bins = padded_len / 2 + 1;
    let scale = 1.0 / (padded_len as f64).sqrt();
    let mut out = Array2::<Complex64>::zeros((rows, num_bins));
    let mut input = planner.make_input_vec();
    let mut output = planner.make_output_vec();

    for (frame, mut dst) in frames.rows().into_iter().zip(out.rows_mut()) {
        input.iter_mut().for_each(|v| *v = 0.0);
        for (slot, &v) in input.iter_mut().zip(frame.iter()) {
            *slot = v;
        }
        planner
            .process(&mut input, &mut output)
            .map_err(|e| AnalysisError::Fft(e.to_string()))?;
        for (d, s) in dst.iter_mut().zip(output.iter()) {
            *d = *s * scale;
        }
    }
    Ok(out)
}


// src/data_analysis/fft_utils.rs
