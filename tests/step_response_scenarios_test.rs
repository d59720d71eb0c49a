// tests/step_response_scenarios_test.rs
// End-to-end step response behaviour on synthetic records with a known system

mod common;

use ndarray::{Array1, Axis};

use BlackBox_PID_Analyzer::{analyze_axis, AnalysisConfig, AnalysisError};
use common::{delayed, half_rise_index, record_from, square_wave, stepped_input};

const RATE: f64 = 1000.0;
const SAMPLES: usize = 10_240;
const DELAY: usize = 20;

fn delayed_system(amplitude: f64) -> BlackBox_PID_Analyzer::AxisRecord {
    let input = stepped_input(SAMPLES, 3, amplitude);
    let gyro = delayed(&input, DELAY);
    record_from("roll", RATE, 0.0, &input, &gyro, Array1::zeros(SAMPLES), 50.0)
}

#[test]
fn test_pure_delay_is_recovered() {
    let analysis = analyze_axis(&delayed_system(600.0), &AnalysisConfig::default()).unwrap();

    assert_eq!(analysis.time_resp.len(), 500);
    // 10240 / 62 - 16 frames of 1000 samples
    assert_eq!(analysis.responses.dim(), (149, 500));
    assert!(analysis.responses.iter().all(|v| v.is_finite()));

    // Single outlier frames drag the plain mean's tail, so only its rise is checked
    let mean = analysis.responses.mean_axis(Axis(0)).unwrap();
    let (rise, _) = half_rise_index(mean.as_slice().unwrap(), DELAY + 60..DELAY + 160);
    assert!(
        (DELAY - 1..=DELAY + 1).contains(&rise),
        "mean response rises at sample {}",
        rise
    );

    let (mode_rise, mode_level) = half_rise_index(analysis.resp_low.mode.as_slice().unwrap(), DELAY + 60..DELAY + 160);
    assert!((0.85..1.15).contains(&mode_level), "mode steady state {}", mode_level);
    assert!(
        (DELAY - 2..=DELAY + 2).contains(&mode_rise),
        "mode rises at sample {}",
        mode_rise
    );

    let delay = analysis.input_delay.expect("delay estimate");
    assert_eq!(delay.samples, DELAY);
    assert!((delay.ms - 20.0).abs() < 0.01);
}

#[test]
fn test_delayed_square_wave_step_is_recovered() {
    let input = square_wave(SAMPLES, 400, 300.0);
    let gyro = delayed(&input, DELAY);
    let record = record_from("roll", RATE, 0.0, &input, &gyro, Array1::zeros(SAMPLES), 50.0);
    let analysis = analyze_axis(&record, &AnalysisConfig::default()).unwrap();

    assert_eq!(analysis.not_too_low.sum(), analysis.responses.nrows() as f64);
    let (rise, level) = half_rise_index(analysis.resp_low.mode.as_slice().unwrap(), 80..180);
    assert!((0.85..1.15).contains(&level), "mode steady state {}", level);
    assert!(
        (DELAY - 1..=DELAY + 1).contains(&rise),
        "mode rises at sample {}",
        rise
    );
}

#[test]
fn test_small_inputs_have_no_high_response() {
    let analysis = analyze_axis(&delayed_system(600.0), &AnalysisConfig::default()).unwrap();
    // Inputs stay within +-300, below the 500 threshold
    assert!(analysis.features.max_abs_input.iter().all(|v| *v <= 500.0));
    assert!(analysis.resp_high.is_none());
    assert_eq!(analysis.high_mask.sum(), 0.0);
    assert_eq!(analysis.low_mask.sum(), 149.0);
    assert_eq!(analysis.not_too_low.sum(), 149.0);
}

#[test]
fn test_large_inputs_produce_high_response() {
    let analysis = analyze_axis(&delayed_system(3000.0), &AnalysisConfig::default()).unwrap();
    assert!(analysis.high_mask.sum() >= 10.0);
    for (low, high) in analysis.low_mask.iter().zip(analysis.high_mask.iter()) {
        assert_eq!(low + high, 1.0);
    }
    let high = analysis.resp_high.as_ref().expect("high input response");
    assert_eq!(high.mode.len(), 500);
    let (rise, _) = half_rise_index(high.mode.as_slice().unwrap(), DELAY + 60..DELAY + 160);
    assert!((DELAY - 2..=DELAY + 2).contains(&rise), "high mode rises at sample {}", rise);
}

#[test]
fn test_quality_and_throttle_histogram() {
    let analysis = analyze_axis(&delayed_system(600.0), &AnalysisConfig::default()).unwrap();
    assert!(analysis.quality.iter().all(|q| (0.0..=1.0).contains(q)));

    let thr = &analysis.thr_response;
    assert_eq!(thr.raw.dim(), (500, 101));
    assert_eq!(thr.occupancy.len(), 101);
    assert!(thr.normalized.iter().all(|v| v.is_finite()));
    // Accepted frames sit at the windowed peak throttle, just below 50 %
    let accepted = analysis.quality.iter().filter(|q| **q >= 0.5).count() as f64;
    assert_eq!(thr.occupancy.sum(), accepted);

    assert_eq!(analysis.throttle_hist.len(), 100);
    assert!((analysis.throttle_hist.sum() - 1.0).abs() < 1e-9);
}

#[test]
fn test_time_offset_does_not_change_results() {
    // 1024 Hz keeps both time bases exact in binary
    let rate = 1024.0;
    let input = stepped_input(SAMPLES, 3, 600.0);
    let gyro = delayed(&input, DELAY);
    let base = record_from("pitch", rate, 0.0, &input, &gyro, Array1::zeros(SAMPLES), 40.0);
    let shifted = record_from("pitch", rate, 8.0, &input, &gyro, Array1::zeros(SAMPLES), 40.0);

    let config = AnalysisConfig::default();
    let a = analyze_axis(&base, &config).unwrap();
    let b = analyze_axis(&shifted, &config).unwrap();

    assert_eq!(a.dt, b.dt);
    assert_eq!(a.time_resp, b.time_resp);
    assert_eq!(a.responses, b.responses);
    assert_eq!(a.resp_low, b.resp_low);
    assert_eq!(a.resp_high, b.resp_high);
    assert_eq!(a.quality, b.quality);
    assert_eq!(a.thr_response, b.thr_response);
    assert_eq!(a.noise_gyro, b.noise_gyro);
    assert_eq!(a.filter_trans, b.filter_trans);
    let offset = &b.features.mean_time - &a.features.mean_time;
    assert!(offset.iter().all(|v| (v - 8.0).abs() < 1e-9));
}

#[test]
fn test_analysis_is_idempotent() {
    let record = delayed_system(600.0);
    let config = AnalysisConfig::default();
    let first = analyze_axis(&record, &config).unwrap();
    let second = analyze_axis(&record, &config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_record_shorter_than_a_frame_is_rejected() {
    let input = stepped_input(800, 3, 600.0);
    let gyro = delayed(&input, DELAY);
    let record = record_from("yaw", RATE, 0.0, &input, &gyro, Array1::zeros(800), 50.0);
    let err = analyze_axis(&record, &AnalysisConfig::default()).unwrap_err();
    assert!(matches!(err, AnalysisError::InsufficientData { .. }), "{:?}", err);
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = AnalysisConfig {
        superposition: 0,
        ..AnalysisConfig::default()
    };
    let err = analyze_axis(&delayed_system(600.0), &config).unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidConfig(_)));
}

// tests/step_response_scenarios_test.rs
