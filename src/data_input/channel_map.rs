// src/data_input/channel_map.rs

use std::collections::HashMap;

use ndarray::{Array1, ArrayView1};
use tracing::{debug, warn};

use crate::axis_names::AXIS_NAMES;
use crate::constants::RC_THROTTLE_MIN;
use crate::data_input::axis_record::AxisRecord;
use crate::data_input::session_metadata::SessionMetadata;
use crate::error::{AnalysisError, AnalysisResult};
use crate::types::AxisRecords;

/// Channels the adapter looks up, each with the header names it accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Time,
    Throttle,
    Gyro,
    PTerm,
    DTerm,
    Debug,
}

impl ChannelKind {
    /// Header names in lookup order. The first entry is the canonical name.
    pub fn aliases(&self, axis: usize) -> Vec<String> {
        match self {
            ChannelKind::Time => vec!["time".to_string(), "time (us)".to_string()],
            ChannelKind::Throttle => vec!["throttle".to_string(), "rcCommand[3]".to_string()],
            ChannelKind::Gyro => ["gyro", "gyroADC", "gyroData", "ugyroADC"]
                .iter()
                .map(|base| format!("{}[{}]", base, axis))
                .collect(),
            ChannelKind::PTerm => vec![format!("axisP[{}]", axis)],
            ChannelKind::DTerm => vec![format!("axisD[{}]", axis)],
            ChannelKind::Debug => vec![format!("debug[{}]", axis)],
        }
    }

    /// Time, throttle and gyro cannot be substituted. Throttle positions every frame on the
    /// throttle axis of the noise and response histograms; zeros would pile all frames
    /// into the first bin.
    pub fn is_mandatory(&self) -> bool {
        matches!(self, ChannelKind::Time | ChannelKind::Throttle | ChannelKind::Gyro)
    }
}

/// Where the values of a resolved channel came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelSource {
    /// Logged under this header name.
    Logged(String),
    /// Not logged; replaced by zeros of the time base length.
    ZeroFilled,
}

/// Decoded log columns keyed by header name.
#[derive(Debug, Clone, Default)]
pub struct ChannelMap {
    columns: HashMap<String, Array1<f64>>,
}

impl ChannelMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Array1<f64>) {
        self.columns.insert(name.into(), values);
    }

    pub fn get(&self, name: &str) -> Option<&Array1<f64>> {
        self.columns.get(name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn find(&self, kind: ChannelKind, axis: usize) -> Option<(String, &Array1<f64>)> {
        kind.aliases(axis)
            .into_iter()
            .find_map(|name| self.columns.get(&name).map(|values| (name, values)))
    }

    /// Looks up a channel, zero-filling optional channels that were not logged.
    pub fn resolve(&self, kind: ChannelKind, axis: usize, samples: usize) -> AnalysisResult<(Array1<f64>, ChannelSource)> {
        match self.find(kind, axis) {
            Some((name, values)) => Ok((values.clone(), ChannelSource::Logged(name))),
            None if kind.is_mandatory() => {
                let canonical = kind.aliases(axis).into_iter().next().unwrap_or_default();
                Err(AnalysisError::MissingChannel(canonical))
            }
            None => {
                let canonical = kind.aliases(axis).into_iter().next().unwrap_or_default();
                warn!(channel = %canonical, "No {} trace found, using zeros", canonical);
                Ok((Array1::zeros(samples), ChannelSource::ZeroFilled))
            }
        }
    }
}

/// Scales raw RC throttle to percent of the range between 1000 and `max_throttle`.
pub fn scale_throttle(raw: ArrayView1<f64>, max_throttle: f64) -> AnalysisResult<Array1<f64>> {
    let span = max_throttle - RC_THROTTLE_MIN;
    if !(span.is_finite() && span > 0.0) {
        return Err(AnalysisError::InvalidConfig(format!(
            "maxThrottle {} must exceed {}",
            max_throttle, RC_THROTTLE_MIN
        )));
    }
    Ok(raw.mapv(|v| (v - RC_THROTTLE_MIN) / span * 100.0))
}

/// Assembles one `AxisRecord` per axis from decoded columns and header metadata.
///
/// Time is expected in microseconds and converted to seconds. Throttle is shared by all
/// axes and scaled with the session's `maxThrottle`.
pub fn build_axis_records(channels: &ChannelMap, session: &SessionMetadata) -> AnalysisResult<AxisRecords> {
    let (time_us, _) = channels.resolve(ChannelKind::Time, 0, 0)?;
    let time = time_us.mapv(|t| t * 1e-6);
    let samples = time.len();

    let max_throttle = session
        .max_throttle
        .ok_or_else(|| AnalysisError::InvalidConfig("maxThrottle missing from header".to_string()))?;
    let (raw_throttle, _) = channels.resolve(ChannelKind::Throttle, 0, samples)?;
    let throttle = scale_throttle(raw_throttle.view(), max_throttle)?;

    let build = |axis: usize| -> AnalysisResult<AxisRecord> {
        let (gyro, gyro_source) = channels.resolve(ChannelKind::Gyro, axis, samples)?;
        let (p_err, _) = channels.resolve(ChannelKind::PTerm, axis, samples)?;
        let (d_err, _) = channels.resolve(ChannelKind::DTerm, axis, samples)?;
        let (debug_trace, _) = channels.resolve(ChannelKind::Debug, axis, samples)?;
        debug!(axis = AXIS_NAMES[axis], gyro = ?gyro_source, samples, "assembled axis record");
        AxisRecord::new(
            AXIS_NAMES[axis],
            time.clone(),
            gyro,
            p_err,
            d_err,
            debug_trace,
            throttle.clone(),
            session.p_gain(axis),
            session.firmware.clone(),
        )
    };

    Ok([build(0)?, build(1)?, build(2)?])
}


// src/data_input/channel_map.rs
