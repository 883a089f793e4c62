//! Command arbitration: source selection, speed mapping and fail-safe policy.
//!
//! The arbiter is the only process that touches the actuator. Every tick it
//! picks one authoritative command (or none), converts it into actuator
//! units, and applies it. All state lives in a single task, so calibration
//! adjustments and the mapping that reads them never race.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────── ArbiterService ────────────────────────────┐
//! │                                                                         │
//! │  UnixDatagram ──► decode ──► Arbiter::on_message ──► ArbiterState       │
//! │                                     │                 (mode, e-stop,    │
//! │                                     │                  last commands)   │
//! │                                     ▼                                   │
//! │                              CalibrationState ◄── CalibrationAdjust     │
//! │                                     │                                   │
//! │  ticker ──► Arbiter::tick ──► ThrottleMap ──► compensation ──► Actuator │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Freshness
//!
//! | Source | Timeout | Measured from |
//! |--------|---------|---------------|
//! | Joystick | 0.5 s | arbiter receipt time |
//! | Network | 1.2 s | arbiter receipt time |
//!
//! # Example
//!
//! ```ignore
//! use racemux::arbiter::{ArbiterConfig, ArbiterService};
//! use racemux::actuator::{EscProfile, TracingActuator};
//!
//! let config = ArbiterConfig::default();
//! let actuator = TracingActuator::new(config.mapping.esc);
//! let service = ArbiterService::bind(config, actuator, diagnostics)?;
//! let snapshot = service.run(shutdown).await?;
//! ```

mod config;
mod core;
mod mapping;
mod service;
mod state;

pub use config::{
    ArbiterConfig, CompensationConfig, MappingConfig, DEFAULT_JOYSTICK_TIMEOUT, DEFAULT_MAX_DRAIN,
    DEFAULT_NETWORK_TIMEOUT, DEFAULT_SOCKET_PATH, DEFAULT_TICK_INTERVAL,
};
pub use self::core::{ActuationReason, Arbiter, TickOutput};
pub use mapping::{AnchorAdjustment, CalibrationState, ThrottleMap};
pub use service::ArbiterService;
pub use state::{ArbiterState, Mode, StoredCommand};
