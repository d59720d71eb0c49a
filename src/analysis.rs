// src/analysis.rs

//! Per-axis pipeline and the session batch driver.

use ndarray::{Array1, Array2};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::AnalysisConfig;
use crate::data_analysis::calc_step_response::{calc_step_response, ResponseAnalysis, ResponseCurve};
use crate::data_analysis::equalize::equalize_record;
use crate::data_analysis::histogram::{throttle_density, Histogram2D};
use crate::data_analysis::input_delay::{estimate_input_delay, DelayEstimate};
use crate::data_analysis::spectral_analysis::{calc_noise, NoiseAnalysis, NoiseProfile};
use crate::data_analysis::wiener::FrameFeatures;
use crate::data_input::axis_record::AxisRecord;
use crate::error::{AnalysisError, AnalysisResult};

/// Everything computed for one flight axis.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisAnalysis {
    pub name: String,
    // Equalized time base
    pub time: Array1<f64>,
    pub gyro: Array1<f64>,
    pub input: Array1<f64>,
    pub throttle: Array1<f64>,
    /// `time[0] - time[1]`, negative.
    pub dt: f64,
    /// Seconds since frame start for each response sample.
    pub time_resp: Array1<f64>,
    pub features: FrameFeatures,
    /// Step response of every frame, `frames x time_resp.len()`.
    pub responses: Array2<f64>,
    pub low_mask: Array1<f64>,
    pub high_mask: Array1<f64>,
    pub not_too_low: Array1<f64>,
    pub quality: Array1<f64>,
    pub reference: ResponseCurve,
    pub resp_low: ResponseCurve,
    pub resp_high: Option<ResponseCurve>,
    pub thr_response: Histogram2D,
    pub noise_gyro: NoiseProfile,
    pub noise_d: NoiseProfile,
    pub noise_debug: NoiseProfile,
    pub filter_trans: Array1<f64>,
    /// Density of throttle over 0..100 %, 100 bins.
    pub throttle_hist: Array1<f64>,
    pub input_delay: Option<DelayEstimate>,
}

/// Runs the full analysis of one axis.
///
/// Pure and deterministic: the same record and config always give the same result.
pub fn analyze_axis(record: &AxisRecord, config: &AnalysisConfig) -> AnalysisResult<AxisAnalysis> {
    config.validate()?;
    let equalized = equalize_record(record, config.p_gain_scale)?;

    let ResponseAnalysis {
        time_resp,
        stack,
        low_mask,
        high_mask,
        not_too_low,
        reference,
        quality,
        thr_response,
        resp_low,
        resp_high,
    } = calc_step_response(&equalized, config)?;
    let NoiseAnalysis {
        gyro: noise_gyro,
        d_term: noise_d,
        debug: noise_debug,
        filter_trans,
    } = calc_noise(&equalized, config)?;

    let throttle_hist = throttle_density(equalized.throttle.view(), config.throttle_bins);
    let input_delay = estimate_input_delay(
        equalized.input.view(),
        equalized.gyro.view(),
        1.0 / equalized.sample_period(),
    );

    Ok(AxisAnalysis {
        name: equalized.name,
        time: equalized.time,
        gyro: equalized.gyro,
        input: equalized.input,
        throttle: equalized.throttle,
        dt: equalized.dt,
        time_resp,
        features: stack.features,
        responses: stack.responses,
        low_mask,
        high_mask,
        not_too_low,
        quality,
        reference,
        resp_low,
        resp_high,
        thr_response,
        noise_gyro,
        noise_d,
        noise_debug,
        filter_trans,
        throttle_hist,
        input_delay,
    })
}

/// Result of one axis inside a session.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisOutcome {
    pub name: String,
    pub result: AnalysisResult<AxisAnalysis>,
}

/// Results of every axis of a session, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionAnalysis {
    pub outcomes: Vec<AxisOutcome>,
}

impl SessionAnalysis {
    pub fn succeeded(&self) -> impl Iterator<Item = &AxisAnalysis> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &AnalysisError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.name.as_str(), e)))
    }

    pub fn get(&self, name: &str) -> Option<&AxisOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }
}

/// Analyzes every axis in parallel. A failing axis is reported and does not stop the others.
pub fn analyze_session(records: &[AxisRecord], config: &AnalysisConfig) -> SessionAnalysis {
    let outcomes = records
        .par_iter()
        .map(|record| {
            let result = analyze_axis(record, config);
            match &result {
                Ok(analysis) => info!(
                    axis = %record.name,
                    frames = analysis.responses.nrows(),
                    high_input = analysis.resp_high.is_some(),
                    "axis analyzed"
                ),
                Err(e) => warn!(axis = %record.name, error = %e, "axis analysis failed"),
            }
            AxisOutcome {
                name: record.name.clone(),
                result,
            }
        })
        .collect();
    SessionAnalysis { outcomes }
}

// src/analysis.rs
