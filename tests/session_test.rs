// tests/session_test.rs
// Session assembly from decoded columns and the parallel batch driver

mod common;

use ndarray::Array1;

use BlackBox_PID_Analyzer::data_input::channel_map::{build_axis_records, ChannelMap};
use BlackBox_PID_Analyzer::data_input::session_metadata::parse_session_metadata;
use BlackBox_PID_Analyzer::{analyze_session, AnalysisConfig, AnalysisError};
use common::{delayed, stepped_input, P_GAIN, P_SCALE};

const SAMPLES: usize = 6000;

fn decoded_log() -> ChannelMap {
    let mut map = ChannelMap::new();
    map.insert("time (us)", Array1::from_shape_fn(SAMPLES, |i| 5_000_000.0 + i as f64 * 1000.0));
    map.insert("rcCommand[3]", Array1::from_elem(SAMPLES, 1500.0));
    for axis in 0..3 {
        let input = stepped_input(SAMPLES, 3 + axis, 600.0);
        let gyro = delayed(&input, 15);
        let p_term = (&input - &gyro).mapv(|v| v * P_SCALE * P_GAIN);
        map.insert(format!("gyroADC[{}]", axis), gyro);
        map.insert(format!("axisP[{}]", axis), p_term);
    }
    map
}

fn header(with_yaw: bool) -> Vec<(String, String)> {
    let mut pairs = vec![
        ("Firmware type", "Cleanflight"),
        ("Firmware revision", "Betaflight 4.3.1"),
        ("rollPID", "45,80,30"),
        ("pitchPID", "45,84,34"),
        ("maxthrottle", "2000"),
    ];
    if with_yaw {
        pairs.push(("yawPID", "45,80,0"));
    }
    pairs.into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn test_full_session_analyzes_every_axis() {
    let session = parse_session_metadata(&header(true));
    let records = build_axis_records(&decoded_log(), &session).unwrap();
    assert!(records.iter().all(|r| (r.throttle[0] - 50.0).abs() < 1e-12));

    let analysis = analyze_session(&records, &AnalysisConfig::default());
    let names: Vec<&str> = analysis.outcomes.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, ["roll", "pitch", "yaw"]);
    assert_eq!(analysis.succeeded().count(), 3);
    assert_eq!(analysis.failed().count(), 0);

    for axis in analysis.succeeded() {
        let delay = axis.input_delay.as_ref().expect("delay estimate");
        assert_eq!(delay.samples, 15, "{}", axis.name);
        assert!(axis.resp_high.is_none());
    }
}

#[test]
fn test_missing_gain_only_fails_that_axis() {
    let session = parse_session_metadata(&header(false));
    let records = build_axis_records(&decoded_log(), &session).unwrap();
    assert_eq!(records[2].p_gain, 0.0);

    let analysis = analyze_session(&records, &AnalysisConfig::default());
    assert_eq!(analysis.outcomes.len(), 3);
    assert_eq!(analysis.outcomes[2].name, "yaw");
    assert!(analysis.get("roll").unwrap().result.is_ok());
    assert!(analysis.get("pitch").unwrap().result.is_ok());

    let failed: Vec<_> = analysis.failed().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].0, "yaw");
    assert!(matches!(failed[0].1, AnalysisError::InvalidGain { .. }));
}

#[test]
fn test_missing_max_throttle_stops_assembly() {
    let header: Vec<(String, String)> = header(true)
        .into_iter()
        .filter(|(k, _)| k != "maxthrottle")
        .collect();
    let session = parse_session_metadata(&header);
    let err = build_axis_records(&decoded_log(), &session).unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidConfig(_)));
}

// tests/session_test.rs
