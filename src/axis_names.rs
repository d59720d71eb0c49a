// src/axis_names.rs

/// Centralized axis naming
///
/// Record names, header keys and channel indices all follow this order.
pub const AXIS_COUNT: usize = 3;

/// Axis names as used for record names and `<axis>PID` header keys.
pub const AXIS_NAMES: [&str; AXIS_COUNT] = ["roll", "pitch", "yaw"];

/// Get the axis name for a given index (0=roll, 1=pitch, 2=yaw)
pub fn axis_name(index: usize) -> Option<&'static str> {
    AXIS_NAMES.get(index).copied()
}

/// Header key holding the comma-separated P,I,D gains of an axis, e.g. `rollPID`.
pub fn pid_header_key(index: usize) -> Option<String> {
    axis_name(index).map(|name| format!("{}PID", name))
}


// src/axis_names.rs
