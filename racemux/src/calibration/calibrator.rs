//! Discrete-step integral controller over the observed-speed window.
//!
//! ```text
//!   sample ──► validate ──► cruising? ──► SpeedWindow ──► (full && paced?)
//!                 │             │                               │
//!              dropped     no: clear                      mean(window)
//!             (counted)     window                              │
//!                          ┌────────────────────────────────────┼───────────┐
//!                          ▼                                    ▼           ▼
//!                 mean > threshold           near max && mean <= stall  otherwise
//!                    Decrease                        Increase             Hold
//!              Adjust(-decrement)               Adjust(+increment)
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use super::window::SpeedWindow;
use crate::command::ControlEvent;
use crate::diagnostics::DiagnosticCounters;
use crate::telemetry::ObservationSample;

/// Tuning parameters for [`ThrottleCalibrator`].
#[derive(Debug, Clone, PartialEq)]
pub struct CalibratorConfig {
    /// Whether the network producer runs the calibrator at all.
    pub enabled: bool,

    /// Number of samples per evaluation window.
    pub window_size: usize,

    /// Minimum commanded speed for an evaluation to count.
    pub cruise_threshold: f32,

    /// Mean observed speed (m/s) above which the anchor is lowered.
    pub speed_threshold: f32,

    /// Mean observed speed (m/s) at or below which the car is considered stalled.
    pub stall_floor: f32,

    /// Largest speed intent the network link sends.
    pub speed_max: f32,

    /// Distance below `speed_max` still considered "near max".
    pub near_max_margin: f32,

    /// Magnitude of an upward adjustment.
    pub increment_step: f32,

    /// Magnitude of a downward adjustment.
    pub decrement_step: f32,

    /// Observations above this (m/s) are sensor glitches.
    pub max_observed_speed: f32,
}

impl Default for CalibratorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_size: 16,
            cruise_threshold: 0.5,
            speed_threshold: 3.2,
            stall_floor: 0.5,
            speed_max: 5.0,
            near_max_margin: 0.5,
            increment_step: 0.001,
            decrement_step: 0.001,
            max_observed_speed: 20.0,
        }
    }
}

impl CalibratorConfig {
    /// Set the window size.
    pub fn with_window_size(mut self, size: usize) -> Self {
        self.window_size = size;
        self
    }

    /// Set the over-speed threshold.
    pub fn with_speed_threshold(mut self, threshold: f32) -> Self {
        self.speed_threshold = threshold;
        self
    }

    /// Set both step magnitudes.
    pub fn with_steps(mut self, increment: f32, decrement: f32) -> Self {
        self.increment_step = increment.abs();
        self.decrement_step = decrement.abs();
        self
    }
}

/// Outcome of one window evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationDecision {
    /// The car is too fast; lower the high anchor.
    Decrease,
    /// The car is stalled at near-max intent; raise the high anchor.
    Increase,
    /// No change.
    Hold,
}

impl CalibrationDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalibrationDecision::Decrease => "decrease",
            CalibrationDecision::Increase => "increase",
            CalibrationDecision::Hold => "hold",
        }
    }
}

impl fmt::Display for CalibrationDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A completed evaluation and the event it asks the arbiter to apply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub decision: CalibrationDecision,
    pub average_observed: f32,
    pub commanded_speed: f32,
    pub event: Option<ControlEvent>,
}

impl Evaluation {
    /// Signed anchor change requested, `0.0` for [`CalibrationDecision::Hold`].
    pub fn delta(&self) -> f32 {
        match self.event {
            Some(ControlEvent::CalibrationAdjust(delta)) => delta,
            _ => 0.0,
        }
    }
}

/// Sliding-window throttle calibrator.
///
/// Fed one [`ObservationSample`] per telemetry poll. Evaluations happen at
/// most once per window: after each one, `window_size` fresh samples must
/// arrive before the next. Only cruising samples fill the window; a sample
/// commanded below `cruise_threshold` empties it.
#[derive(Debug)]
pub struct ThrottleCalibrator {
    config: CalibratorConfig,
    window: SpeedWindow,
    since_evaluation: usize,
    diagnostics: Arc<DiagnosticCounters>,
}

impl ThrottleCalibrator {
    pub fn new(config: CalibratorConfig, diagnostics: Arc<DiagnosticCounters>) -> Self {
        let window = SpeedWindow::new(config.window_size);
        Self {
            config,
            window,
            since_evaluation: 0,
            diagnostics,
        }
    }

    pub fn config(&self) -> &CalibratorConfig {
        &self.config
    }

    /// Samples currently in the window.
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Whether an observed speed may enter the window.
    pub fn accepts(&self, observed: f32) -> bool {
        observed.is_finite() && observed >= 0.0 && observed <= self.config.max_observed_speed
    }

    /// Record one sample and evaluate if the window is due.
    pub fn observe(&mut self, sample: ObservationSample) -> Option<Evaluation> {
        if !self.accepts(sample.observed_speed) {
            self.diagnostics.sample_dropped();
            debug!(
                observed = sample.observed_speed,
                "Dropping out-of-range speed sample"
            );
            return None;
        }

        if sample.commanded_speed.is_nan() || sample.commanded_speed < self.config.cruise_threshold {
            if !self.window.is_empty() {
                debug!(
                    commanded = sample.commanded_speed,
                    discarded = self.window.len(),
                    "Below cruise, restarting calibration window"
                );
                self.window.clear();
            }
            self.since_evaluation = 0;
            return None;
        }

        self.window.push(sample.observed_speed);
        self.since_evaluation = self.since_evaluation.saturating_add(1);

        if !self.window.is_full() || self.since_evaluation < self.window.capacity() {
            return None;
        }

        let average = self.window.mean()?;
        self.since_evaluation = 0;
        let evaluation = self.evaluate(average, sample.commanded_speed);

        match evaluation.decision {
            CalibrationDecision::Hold => debug!(
                average_observed = format!("{:.2}", average),
                commanded = format!("{:.2}", sample.commanded_speed),
                "Calibration hold"
            ),
            decision => info!(
                decision = %decision,
                average_observed = format!("{:.2}", average),
                commanded = format!("{:.2}", sample.commanded_speed),
                delta = format!("{:+.4}", evaluation.delta()),
                "Calibration adjustment requested"
            ),
        }

        Some(evaluation)
    }

    fn evaluate(&self, average: f32, commanded: f32) -> Evaluation {
        let near_max = commanded >= self.config.speed_max - self.config.near_max_margin;

        let (decision, event) = if average > self.config.speed_threshold {
            (
                CalibrationDecision::Decrease,
                Some(ControlEvent::CalibrationAdjust(-self.config.decrement_step)),
            )
        } else if near_max && average <= self.config.stall_floor {
            (
                CalibrationDecision::Increase,
                Some(ControlEvent::CalibrationAdjust(self.config.increment_step)),
            )
        } else {
            (CalibrationDecision::Hold, None)
        };

        Evaluation {
            decision,
            average_observed: average,
            commanded_speed: commanded,
            event,
        }
    }
}
