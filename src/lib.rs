// src/lib.rs - Library interface for the PID step-response and noise analysis engine

#![allow(non_snake_case)]

pub mod analysis;
pub mod axis_names;
pub mod config;
pub mod constants;
pub mod data_analysis;
pub mod data_input;
pub mod error;
pub mod types;

pub use analysis::{analyze_axis, analyze_session, AxisAnalysis, AxisOutcome, SessionAnalysis};
pub use config::AnalysisConfig;
pub use data_input::axis_record::{AxisRecord, FirmwareFamily};
pub use error::{AnalysisError, AnalysisResult};

pub fn crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
