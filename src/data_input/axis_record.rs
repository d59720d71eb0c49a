// src/data_input/axis_record.rs

use ndarray::Array1;

use crate::error::{AnalysisError, AnalysisResult};

/// Firmware family, used to decide whether the logged P gain scales the P term.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FirmwareFamily {
    #[default]
    Betaflight,
    Kiss,
    Raceflight,
    Other(String),
}

impl FirmwareFamily {
    /// Detects the family from a firmware type string such as "Cleanflight" or "KISS".
    pub fn detect(firmware_type: &str) -> Self {
        if firmware_type.contains("KISS") {
            FirmwareFamily::Kiss
        } else if firmware_type.contains("Raceflight") {
            FirmwareFamily::Raceflight
        } else if firmware_type.to_lowercase().contains("betaflight") || firmware_type.is_empty() {
            FirmwareFamily::Betaflight
        } else {
            FirmwareFamily::Other(firmware_type.to_string())
        }
    }

    /// KISS and Raceflight log a P term that is already in rate units.
    pub fn uses_unit_p_gain(&self) -> bool {
        matches!(self, FirmwareFamily::Kiss | FirmwareFamily::Raceflight)
    }
}

/// One flight axis of one session, as delivered by the log reader.
///
/// All channels share the length of `time`. Time must be strictly increasing but may be
/// irregularly spaced; the equalizer resamples it.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisRecord {
    pub name: String,
    pub time: Array1<f64>,     // Seconds
    pub gyro: Array1<f64>,     // Measured rate
    pub p_err: Array1<f64>,    // Proportional term
    pub d_err: Array1<f64>,    // Derivative term
    pub debug: Array1<f64>,    // Pre-filter gyro on most firmwares
    pub throttle: Array1<f64>, // 0..100 %
    pub p_gain: f64,
    pub firmware: FirmwareFamily,
}

impl AxisRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        time: Array1<f64>,
        gyro: Array1<f64>,
        p_err: Array1<f64>,
        d_err: Array1<f64>,
        debug: Array1<f64>,
        throttle: Array1<f64>,
        p_gain: f64,
        firmware: FirmwareFamily,
    ) -> AnalysisResult<Self> {
        let record = Self {
            name: name.into(),
            time,
            gyro,
            p_err,
            d_err,
            debug,
            throttle,
            p_gain,
            firmware,
        };
        record.check_lengths()?;
        Ok(record)
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Channels other than time, by name.
    pub fn channels(&self) -> [(&'static str, &Array1<f64>); 5] {
        [
            ("gyro", &self.gyro),
            ("p_err", &self.p_err),
            ("d_err", &self.d_err),
            ("debug", &self.debug),
            ("throttle", &self.throttle),
        ]
    }

    pub fn check_lengths(&self) -> AnalysisResult<()> {
        let expected = self.time.len();
        for (channel, data) in self.channels() {
            if data.len() != expected {
                return Err(AnalysisError::ChannelLengthMismatch {
                    channel: channel.to_string(),
                    expected,
                    actual: data.len(),
                });
            }
        }
        Ok(())
    }

    /// P gain after the firmware rule is applied.
    pub fn effective_p_gain(&self) -> f64 {
        if self.firmware.uses_unit_p_gain() {
            1.0
        } else {
            self.p_gain
        }
    }

    /// Commanded rate implied by the P term: `gyro + p_err / (scale * P)`.
    pub fn input_signal(&self, p_gain_scale: f64) -> AnalysisResult<Array1<f64>> {
        let p = self.effective_p_gain();
        let divisor = p_gain_scale * p;
        if !divisor.is_finite() || divisor == 0.0 {
            return Err(AnalysisError::InvalidGain {
                axis: self.name.clone(),
                gain: p,
            });
        }
        Ok(&self.gyro + &self.p_err.mapv(|v| v / divisor))
    }
}


// src/data_input/axis_record.rs
