//! racemux - Command arbitration and throttle calibration for RC ground vehicles
//!
//! This library provides the control core for a remote-controlled vehicle
//! driven by several independent command sources (a local joystick and a
//! network link). Producers publish normalized commands over a local datagram
//! socket, and a single-threaded arbiter picks the authoritative source each
//! tick, maps abstract speed intents to ESC throttle, and drives the actuator.
//!
//! # Architecture
//!
//! ```text
//! Joystick device ──► JoystickProducer ─┐
//!                                       ├──► IPC socket ──► ArbiterService ──► Actuator
//! UDP wire packet ──► NetworkProducer ──┘          ▲              │
//!                          │                       │              ▼
//! Telemetry ──────► ThrottleCalibrator ── CalibrationAdjust   CalibrationState
//! ```
//!
//! # Modules
//!
//! - [`command`] - Commands, control events and the IPC message codec
//! - [`arbiter`] - Source selection, speed mapping and the arbiter loop
//! - [`actuator`] - Actuator contract, ESC profile and neutral guard
//! - [`calibration`] - Sliding-window throttle calibrator and CSV log
//! - [`producer`] - Joystick and network command producers
//! - [`telemetry`] - Observed speed / battery voltage collaborator
//! - [`diagnostics`] - Lock-free diagnostic counters
//! - [`error`] - Service setup errors
//! - [`config`] - INI configuration file
//! - [`logging`] - Tracing subscriber setup

pub mod actuator;
pub mod arbiter;
pub mod calibration;
pub mod clock;
pub mod command;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod producer;
pub mod telemetry;

/// Crate version, as reported by the CLI banner.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
