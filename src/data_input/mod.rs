// src/data_input/mod.rs

pub mod axis_record;
pub mod channel_map;
pub mod session_metadata;

// src/data_input/mod.rs
