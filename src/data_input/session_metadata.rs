// src/data_input/session_metadata.rs

use std::collections::HashMap;

use tracing::warn;

use crate::axis_names::{pid_header_key, AXIS_COUNT, AXIS_NAMES};
use crate::constants::RC_THROTTLE_MIN;
use crate::data_input::axis_record::FirmwareFamily;
use crate::types::HeaderMetadata;

/// Gains of a single axis as logged in the `<axis>PID` header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxisGains {
    pub p: Option<f64>,
    pub i: Option<f64>,
    pub d: Option<f64>,
}

/// Session-level values the analysis needs from the log header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionMetadata {
    pub firmware_type: String,
    pub firmware: FirmwareFamily,
    pub firmware_revision: Option<String>,
    pub craft_name: Option<String>,
    /// Raw RC command value of full throttle.
    pub max_throttle: Option<f64>,
    pub min_throttle: Option<f64>,
    /// Raw RC command value where throttle PID attenuation starts; 0 when absent.
    pub tpa_breakpoint: f64,
    pub debug_mode: Option<String>,
    pub gains: [AxisGains; AXIS_COUNT],
}

impl SessionMetadata {
    /// TPA breakpoint as percent of the stick range. KISS and Raceflight report 0.
    pub fn tpa_percent(&self) -> f64 {
        if self.firmware.uses_unit_p_gain() {
            0.0
        } else {
            (self.tpa_breakpoint - RC_THROTTLE_MIN) / 10.0
        }
    }

    /// P gain of axis `index` after the firmware rule; 0 when the header lacks it.
    pub fn p_gain(&self, index: usize) -> f64 {
        if self.firmware.uses_unit_p_gain() {
            return 1.0;
        }
        match self.gains.get(index).and_then(|g| g.p) {
            Some(p) => p,
            None => {
                warn!(axis = AXIS_NAMES.get(index).copied().unwrap_or("?"), "No P gain in header; input signal cannot be derived");
                0.0
            }
        }
    }
}

/// Lowercases, trims and drops a trailing colon so "Firmware type:" matches "firmware type".
fn normalize_key(key: &str) -> String {
    key.trim().trim_end_matches(':').trim().to_lowercase()
}

fn parse_comma_separated_values(value_str: &str) -> Vec<Option<f64>> {
    value_str.split(',').map(|s| s.trim().parse::<f64>().ok()).collect()
}

fn parse_axis_gains(pid_str: &str) -> AxisGains {
    let values = parse_comma_separated_values(pid_str);
    AxisGains {
        p: values.first().copied().flatten(),
        i: values.get(1).copied().flatten(),
        d: values.get(2).copied().flatten(),
    }
}

fn parse_number(header_map: &HashMap<String, String>, key: &str) -> Option<f64> {
    header_map.get(key).and_then(|v| v.trim().parse::<f64>().ok())
}

/// Parse session metadata from header key-value pairs
/// Missing entries stay `None` (or 0 for the TPA breakpoint)
pub fn parse_session_metadata(header_metadata: &HeaderMetadata) -> SessionMetadata {
    let mut session = SessionMetadata::default();
    if header_metadata.is_empty() {
        return session;
    }

    // Build once, use everywhere
    let header_map: HashMap<String, String> = header_metadata
        .iter()
        .map(|(k, v)| (normalize_key(k), v.trim().to_string()))
        .collect();

    if let Some(fw) = header_map.get("firmware type").or_else(|| header_map.get("fwtype")) {
        session.firmware_type = fw.clone();
        session.firmware = FirmwareFamily::detect(fw);
    }
    session.firmware_revision = header_map.get("firmware revision").cloned();
    session.craft_name = header_map.get("craft name").cloned();
    session.debug_mode = header_map.get("debug_mode").cloned();
    session.max_throttle = parse_number(&header_map, "maxthrottle");
    session.min_throttle = parse_number(&header_map, "minthrottle");
    session.tpa_breakpoint = parse_number(&header_map, "tpa_breakpoint").unwrap_or(0.0);

    for (index, gains) in session.gains.iter_mut().enumerate() {
        let Some(key) = pid_header_key(index) else { continue };
        if let Some(pid_str) = header_map.get(&key.to_lowercase()) {
            *gains = parse_axis_gains(pid_str);
        }
    }
    session
}


// src/data_input/session_metadata.rs
