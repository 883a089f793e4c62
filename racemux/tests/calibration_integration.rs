//! Calibrator → arbiter feedback loop.
//!
//! Run with: `cargo test --test calibration_integration`

use std::sync::Arc;
use std::time::Instant;

use racemux::arbiter::{Arbiter, ArbiterConfig, MappingConfig};
use racemux::calibration::{
    CalibrationDecision, CalibrationLogger, CalibrationRecord, CalibratorConfig, ThrottleCalibrator,
    CSV_HEADER,
};
use racemux::command::{Command, ControlEvent, Message};
use racemux::diagnostics::DiagnosticCounters;
use racemux::telemetry::ObservationSample;

const STEP: f32 = 0.001;

fn arbiter_with_floor(min_high_anchor: f32) -> Arbiter {
    let mapping = MappingConfig::default()
        .with_anchors(0.33, 0.34)
        .with_anchor_bounds(min_high_anchor, 0.48);
    Arbiter::new(ArbiterConfig::default().with_mapping(mapping), Arc::new(DiagnosticCounters::new()))
}

fn calibrator() -> ThrottleCalibrator {
    let config = CalibratorConfig::default()
        .with_window_size(16)
        .with_speed_threshold(3.2)
        .with_steps(STEP, STEP);
    ThrottleCalibrator::new(config, Arc::new(DiagnosticCounters::new()))
}

fn sample(observed: f32, i: usize) -> ObservationSample {
    ObservationSample {
        commanded_speed: 5.0,
        observed_speed: observed,
        timestamp: i as f64 * 0.033,
    }
}

/// Feed `count` samples, forwarding every requested adjustment to the arbiter.
fn drive(calibrator: &mut ThrottleCalibrator, arbiter: &mut Arbiter, observed: f32, count: usize) -> usize {
    let now = Instant::now();
    let mut events = 0;
    for i in 0..count {
        if let Some(evaluation) = calibrator.observe(sample(observed, i)) {
            if let Some(event) = evaluation.event {
                events += 1;
                arbiter.on_message(Message::Event(event), now);
            }
        }
    }
    events
}

#[test]
fn test_overspeed_window_lowers_high_anchor_once() {
    let mut arbiter = arbiter_with_floor(0.25);
    arbiter.on_message(Message::Event(ControlEvent::ModeToggle), Instant::now());
    let mut calibrator = calibrator();

    let mut evaluations = Vec::new();
    for i in 0..16 {
        if let Some(evaluation) = calibrator.observe(sample(4.0, i)) {
            evaluations.push(evaluation);
        }
    }

    assert_eq!(evaluations.len(), 1);
    assert_eq!(evaluations[0].decision, CalibrationDecision::Decrease);
    assert_eq!(evaluations[0].event, Some(ControlEvent::CalibrationAdjust(-STEP)));

    let event = evaluations[0].event.unwrap();
    let adjustment = arbiter
        .on_message(Message::Event(event), Instant::now())
        .unwrap();
    assert!(!adjustment.clamped);
    assert!((arbiter.calibration().high_anchor() - (0.34 - STEP)).abs() < 1e-6);
    assert!((arbiter.calibration().low_anchor() - (0.33 - STEP)).abs() < 1e-6);
}

#[test]
fn test_convergence_bounded_by_window_count() {
    let mut arbiter = arbiter_with_floor(0.25);
    let mut calibrator = calibrator();
    let start = arbiter.calibration().high_anchor();

    for windows in 1..=5usize {
        drive(&mut calibrator, &mut arbiter, 4.0, 16);
        let dropped = start - arbiter.calibration().high_anchor();
        assert!(dropped <= windows as f32 * STEP + 1e-6);
        assert!(dropped >= 0.0);
    }
}

#[test]
fn test_convergence_stops_at_floor() {
    let floor = 0.3375;
    let mut arbiter = arbiter_with_floor(floor);
    let mut calibrator = calibrator();

    let events = drive(&mut calibrator, &mut arbiter, 4.0, 16 * 10);
    assert_eq!(events, 10);
    assert!((arbiter.calibration().high_anchor() - floor).abs() < 1e-6);
}

#[test]
fn test_stall_raises_high_anchor() {
    let mut arbiter = arbiter_with_floor(0.25);
    let mut calibrator = calibrator();

    let events = drive(&mut calibrator, &mut arbiter, 0.2, 32);
    assert_eq!(events, 2);
    assert!((arbiter.calibration().high_anchor() - (0.34 + 2.0 * STEP)).abs() < 1e-6);
}

#[test]
fn test_adjusted_anchor_changes_mapped_throttle() {
    let mut arbiter = arbiter_with_floor(0.25);
    arbiter.on_message(Message::Event(ControlEvent::ModeToggle), Instant::now());
    let before = arbiter.map_speed_to_throttle(5.0);

    arbiter.on_message(Message::Event(ControlEvent::CalibrationAdjust(-0.01)), Instant::now());
    let after = arbiter.map_speed_to_throttle(5.0);
    assert!(after < before);

    let now = Instant::now();
    arbiter.on_message(Command::network(0.0, 5.0, 1.0).into(), now);
    assert_eq!(arbiter.tick(now).actuation.throttle, after);
}

#[test]
fn test_evaluations_and_adjustments_share_one_csv() {
    let dir = tempfile::tempdir().unwrap();
    let mut logger = CalibrationLogger::create_in(dir.path(), "network").unwrap();
    let mut arbiter = arbiter_with_floor(0.25);
    let mut calibrator = calibrator();

    for i in 0..16 {
        if let Some(evaluation) = calibrator.observe(sample(4.0, i)) {
            logger
                .record(&CalibrationRecord::evaluation(&evaluation, calibrator.config()).with_lost_packets(2))
                .unwrap();
            let adjustment = arbiter
                .on_message(Message::Event(evaluation.event.unwrap()), Instant::now())
                .unwrap();
            logger.record(&CalibrationRecord::adjustment(&adjustment)).unwrap();
        }
    }

    let contents = std::fs::read_to_string(logger.path()).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], CSV_HEADER);
    assert!(lines[1].contains("decrease"));
    assert!(lines[2].contains("adjust"));
    assert!(lines[2].contains("0.3390"));
}
