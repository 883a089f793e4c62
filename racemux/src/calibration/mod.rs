//! Closed-loop tuning of the speed-to-throttle mapping.
//!
//! The calibrator runs inside the network producer. It never touches the
//! mapping directly: it only emits [`ControlEvent::CalibrationAdjust`] events
//! that travel through the IPC channel like any other message, so the arbiter
//! applies them in order with the commands that read the anchors.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────── network producer ─────────────────┐
//! │                                                     │
//! │  TelemetrySource ──► ThrottleCalibrator ──► Evaluation ──► CalibrationLogger
//! │                        (SpeedWindow)          │                             │
//! └───────────────────────────────────────────────┼─────────────────────────────┘
//!                                                 │ CalibrationAdjust(delta)
//!                                                 ▼
//!                                   arbiter ──► CalibrationState
//! ```
//!
//! [`ControlEvent::CalibrationAdjust`]: crate::command::ControlEvent::CalibrationAdjust

mod calibrator;
mod logger;
mod window;

pub use calibrator::{CalibrationDecision, CalibratorConfig, Evaluation, ThrottleCalibrator};
pub use logger::{CalibrationLogger, CalibrationRecord, LogError, RecordKind, CSV_HEADER};
pub use window::SpeedWindow;
