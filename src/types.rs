// src/types.rs
// Type aliases shared by the input adapter and the batch driver

use crate::axis_names::AXIS_COUNT;
use crate::data_input::axis_record::AxisRecord;

// Compile-time assertion: the adapter produces exactly one record per axis.
const _: () = assert!(AXIS_COUNT == 3, "AXIS_COUNT must be 3");

/// Header key/value pairs in file order, as delivered by the log reader.
pub type HeaderMetadata = [(String, String)];

/// One record per flight axis, in `AXIS_NAMES` order.
pub type AxisRecords = [AxisRecord; AXIS_COUNT];

// src/types.rs
