// src/data_analysis/mod.rs

pub mod calc_step_response;
pub mod equalize;
pub mod fft_utils;
pub mod histogram;
pub mod input_delay;
pub mod signal_utils;
pub mod spectral_analysis;
pub mod synthetic;
pub mod wiener;
pub mod window_stacker;

// src/data_analysis/mod.rs
