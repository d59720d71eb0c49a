// src/data_analysis/window_stacker.rs

use ndarray::{s, Array2, ArrayView1};
use tracing::debug;

use crate::data_analysis::equalize::EqualizedRecord;
use crate::error::{AnalysisError, AnalysisResult};

/// Geometry shared by every channel of one frame stack.
///
/// Frame `i` covers samples `[i * shift, i * shift + frame_len)`. Using one layout for all
/// channels keeps per-frame cross-channel operations aligned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    pub frame_len: usize,
    pub shift: usize,
    pub count: usize,
}

impl FrameLayout {
    /// Overlapping frames of `frame_len` samples with stride `frame_len / superposition`.
    ///
    /// The count is `total_len / shift - superposition`, capped so no frame runs past the end.
    pub fn new(total_len: usize, frame_len: usize, superposition: usize) -> AnalysisResult<Self> {
        if frame_len == 0 || superposition == 0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "frame length {} and superposition {} must be non-zero",
                frame_len, superposition
            )));
        }
        let shift = frame_len / superposition;
        if shift == 0 {
            return Err(AnalysisError::insufficient(
                "time",
                format!(
                    "a frame of {} samples cannot be split into {} sub-windows",
                    frame_len, superposition
                ),
            ));
        }
        let nominal = (total_len / shift).saturating_sub(superposition);
        let in_bounds = if total_len >= frame_len { (total_len - frame_len) / shift + 1 } else { 0 };
        Ok(Self {
            frame_len,
            shift,
            count: nominal.min(in_bounds),
        })
    }

    pub fn start(&self, frame: usize) -> usize {
        frame * self.shift
    }

    /// The same layout without its last `frames` frames.
    pub fn without_tail(&self, frames: usize) -> Self {
        Self {
            count: self.count.saturating_sub(frames),
            ..*self
        }
    }

    /// Copies one channel into a pre-sized `count x frame_len` matrix.
    pub fn stack(&self, channel: ArrayView1<f64>) -> AnalysisResult<Array2<f64>> {
        let needed = if self.count == 0 { 0 } else { self.start(self.count - 1) + self.frame_len };
        if channel.len() < needed {
            return Err(AnalysisError::ChannelLengthMismatch {
                channel: "frame source".to_string(),
                expected: needed,
                actual: channel.len(),
            });
        }
        let mut stacked = Array2::<f64>::zeros((self.count, self.frame_len));
        for (i, mut row) in stacked.rows_mut().into_iter().enumerate() {
            let start = self.start(i);
            row.assign(&channel.slice(s![start..start + self.frame_len]));
        }
        Ok(stacked)
    }
}

/// Frames for the deconvolution pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseFrames {
    pub layout: FrameLayout,
    pub time: Array2<f64>,
    pub input: Array2<f64>,
    pub gyro: Array2<f64>,
    pub throttle: Array2<f64>,
}

impl ResponseFrames {
    pub fn from_record(record: &EqualizedRecord, frame_len: usize, superposition: usize) -> AnalysisResult<Self> {
        let layout = FrameLayout::new(record.len(), frame_len, superposition)?;
        debug!(
            axis = %record.name,
            frames = layout.count,
            frame_len = layout.frame_len,
            shift = layout.shift,
            "stacked response frames"
        );
        Ok(Self {
            layout,
            time: layout.stack(record.time.view())?,
            input: layout.stack(record.input.view())?,
            gyro: layout.stack(record.gyro.view())?,
            throttle: layout.stack(record.throttle.view())?,
        })
    }

    pub fn count(&self) -> usize {
        self.layout.count
    }
}

/// Frames for the noise pass, with the landing tail already removed.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseFrames {
    pub layout: FrameLayout,
    pub time: Array2<f64>,
    pub gyro: Array2<f64>,
    pub throttle: Array2<f64>,
    pub d_err: Array2<f64>,
    pub debug: Array2<f64>,
}

impl NoiseFrames {
    pub fn from_record(
        record: &EqualizedRecord,
        frame_len: usize,
        superposition: usize,
        tail_frames: usize,
    ) -> AnalysisResult<Self> {
        let layout = FrameLayout::new(record.len(), frame_len, superposition)?.without_tail(tail_frames);
        debug!(
            axis = %record.name,
            frames = layout.count,
            frame_len = layout.frame_len,
            dropped_tail = tail_frames,
            "stacked noise frames"
        );
        Ok(Self {
            layout,
            time: layout.stack(record.time.view())?,
            gyro: layout.stack(record.gyro.view())?,
            throttle: layout.stack(record.throttle.view())?,
            d_err: layout.stack(record.d_err.view())?,
            debug: layout.stack(record.debug.view())?,
        })
    }

    pub fn count(&self) -> usize {
        self.layout.count
    }
}


// src/data_analysis/window_stacker.rs
