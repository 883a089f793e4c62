//! The arbiter's decision logic, free of I/O.
//!
//! [`Arbiter`] is driven by two calls from the service loop:
//!
//! - [`Arbiter::on_message`] for every datagram drained this tick
//! - [`Arbiter::tick`] exactly once afterwards, returning the one actuation
//!   to apply
//!
//! Time is passed in explicitly, which keeps every property of the arbiter
//! testable without sleeping.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::config::ArbiterConfig;
use super::mapping::{AnchorAdjustment, CalibrationState, ThrottleMap};
use super::state::{ArbiterState, Mode, StoredCommand};
use crate::actuator::Actuation;
use crate::command::{Command, CommandSource, ControlEvent, Drive, Message};
use crate::diagnostics::DiagnosticCounters;

/// Why a tick produced its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuationReason {
    /// A fresh command from this source was applied.
    Command(CommandSource),
    /// Emergency stop is engaged.
    EmergencyStop,
    /// The active source has no fresh command.
    Stale,
}

impl fmt::Display for ActuationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActuationReason::Command(source) => write!(f, "{}", source),
            ActuationReason::EmergencyStop => write!(f, "emergency-stop"),
            ActuationReason::Stale => write!(f, "stale"),
        }
    }
}

/// Output of one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutput {
    pub actuation: Actuation,
    pub reason: ActuationReason,
}

impl TickOutput {
    fn neutral(reason: ActuationReason) -> Self {
        Self {
            actuation: Actuation::NEUTRAL,
            reason,
        }
    }
}

/// Source selection, speed mapping and fail-safe policy.
#[derive(Debug)]
pub struct Arbiter {
    config: ArbiterConfig,
    state: ArbiterState,
    calibration: CalibrationState,
    map: ThrottleMap,
    diagnostics: Arc<DiagnosticCounters>,
    last_reason: Option<ActuationReason>,
}

impl Arbiter {
    /// Create an arbiter in the initial `Joystick × Running` state.
    pub fn new(config: ArbiterConfig, diagnostics: Arc<DiagnosticCounters>) -> Self {
        let calibration = CalibrationState::new(&config.mapping);
        let map = ThrottleMap::new(&config.mapping);
        Self {
            config,
            state: ArbiterState::new(),
            calibration,
            map,
            diagnostics,
            last_reason: None,
        }
    }

    /// Current state (mode, e-stop, stored commands).
    pub fn state(&self) -> &ArbiterState {
        &self.state
    }

    /// Current calibration anchors.
    pub fn calibration(&self) -> &CalibrationState {
        &self.calibration
    }

    /// Configuration in use.
    pub fn config(&self) -> &ArbiterConfig {
        &self.config
    }

    /// Map a speed intent with the current anchors.
    pub fn map_speed_to_throttle(&self, speed: f32) -> f32 {
        self.map.speed_to_throttle(speed, &self.calibration)
    }

    /// Apply one message received at `now`.
    ///
    /// Returns the anchor change when the message was a calibration
    /// adjustment, so the caller can record it.
    pub fn on_message(&mut self, message: Message, now: Instant) -> Option<AnchorAdjustment> {
        match message {
            Message::Command(command) => {
                self.store_command(command, now);
                None
            }
            Message::Event(event) => self.on_event(event),
        }
    }

    fn store_command(&mut self, command: Command, now: Instant) {
        let slot = self.state.slot_mut(command.source);

        if let Some(stored) = slot {
            if command.timestamp < stored.command.timestamp {
                self.diagnostics.command_reordered();
                debug!(
                    source = %command.source,
                    timestamp = command.timestamp,
                    stored_timestamp = stored.command.timestamp,
                    "Dropping reordered command"
                );
                return;
            }
        }

        *slot = Some(StoredCommand {
            command,
            received_at: now,
        });
    }

    fn on_event(&mut self, event: ControlEvent) -> Option<AnchorAdjustment> {
        match event {
            ControlEvent::ModeToggle => {
                let mode = self.state.toggle_mode();
                info!(mode = %mode, "Mode toggled");
                None
            }
            ControlEvent::EmergencyStopToggle => {
                let engaged = self.state.toggle_emergency_stop();
                if engaged {
                    warn!("Emergency stop ENGAGED");
                } else {
                    info!("Emergency stop released");
                }
                None
            }
            ControlEvent::CalibrationAdjust(delta) => {
                let adjustment = self.calibration.adjust(delta);
                if adjustment.clamped {
                    self.diagnostics.adjustment_clamped();
                    warn!(
                        delta = format!("{:+.4}", delta),
                        high_anchor = format!("{:.4}", adjustment.current),
                        "Calibration adjustment clamped at anchor bound"
                    );
                } else {
                    debug!(
                        delta = format!("{:+.4}", delta),
                        from = format!("{:.4}", adjustment.previous),
                        to = format!("{:.4}", adjustment.current),
                        "Calibration adjustment applied"
                    );
                }
                if adjustment.current != adjustment.previous {
                    self.diagnostics.adjustment_applied();
                }
                Some(adjustment)
            }
        }
    }

    /// Select and compute this tick's single actuation.
    pub fn tick(&mut self, now: Instant) -> TickOutput {
        let output = self.select(now);
        self.note_reason(output.reason);
        output
    }

    fn select(&self, now: Instant) -> TickOutput {
        if self.state.emergency_stop {
            self.diagnostics.estop_tick();
            return TickOutput::neutral(ActuationReason::EmergencyStop);
        }

        let source = self.state.mode.source();
        let timeout = self.config.timeout_for(source);
        let candidate = self
            .state
            .last_command(source)
            .filter(|stored| stored.age(now) < timeout);

        let Some(stored) = candidate else {
            self.diagnostics.stale_tick();
            return TickOutput::neutral(ActuationReason::Stale);
        };

        let command = stored.command;
        let throttle = match command.drive {
            Drive::Speed(speed) => self.map_speed_to_throttle(speed),
            Drive::Throttle(throttle) => throttle,
        };
        let throttle = self.config.compensation.apply(command.steering, throttle);

        self.diagnostics.command_applied();
        TickOutput {
            actuation: Actuation::new(command.steering, throttle),
            reason: ActuationReason::Command(source),
        }
    }

    /// Log transitions between reasons once instead of every tick.
    fn note_reason(&mut self, reason: ActuationReason) {
        if self.last_reason == Some(reason) {
            return;
        }
        match reason {
            ActuationReason::Command(source) => info!(source = %source, "Driving from source"),
            ActuationReason::Stale => {
                let mode: Mode = self.state.mode;
                if self.last_reason.is_some() {
                    warn!(mode = %mode, "No fresh command, holding neutral");
                } else {
                    info!(mode = %mode, "Waiting for commands, holding neutral");
                }
            }
            ActuationReason::EmergencyStop => warn!("Holding neutral for emergency stop"),
        }
        self.last_reason = Some(reason);
    }
}
