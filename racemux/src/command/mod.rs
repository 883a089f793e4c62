//! Commands and control events exchanged between producers and the arbiter.
//!
//! Every producer normalizes its raw input into a [`Command`] and sends it to
//! the arbiter as a [`Message`]. Discrete, edge-triggered inputs become
//! [`ControlEvent`]s and travel through the same channel, which is what
//! serializes calibration adjustments with the commands that read them.
//!
//! # Drive semantics
//!
//! The two sources speak different units:
//!
//! | Source | Drive | Range |
//! |--------|-------|-------|
//! | Joystick | normalized throttle | -1.0 ..= 1.0 |
//! | Network | abstract speed intent | 0.0 ..= speed max |
//!
//! [`Drive`] makes "exactly one of throttle/speed" a property of the type.

mod message;

pub use message::{decode, encode, MessageError, MAX_MESSAGE_BYTES};

use std::fmt;

/// Origin of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandSource {
    /// Local joystick / gamepad.
    Joystick,
    /// Remote driver over the UDP link.
    Network,
}

impl CommandSource {
    /// Name used on the IPC wire and in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandSource::Joystick => "joystick",
            CommandSource::Network => "network",
        }
    }
}

impl fmt::Display for CommandSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Longitudinal part of a command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Drive {
    /// Actuator-normalized throttle, applied as-is.
    Throttle(f32),
    /// Abstract speed intent, mapped through the calibration anchors.
    Speed(f32),
}

/// A normalized instruction from one input source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Command {
    /// Which producer sent this command.
    pub source: CommandSource,

    /// Steering in `[-1, 1]` (negative is left).
    pub steering: f32,

    /// Throttle or speed, depending on the source.
    pub drive: Drive,

    /// Producer's monotonic timestamp (seconds, see [`crate::clock`]).
    pub timestamp: f64,
}

impl Command {
    /// Create a joystick command carrying normalized throttle.
    pub fn joystick(steering: f32, throttle: f32, timestamp: f64) -> Self {
        Self {
            source: CommandSource::Joystick,
            steering,
            drive: Drive::Throttle(throttle),
            timestamp,
        }
    }

    /// Create a network command carrying a speed intent.
    pub fn network(steering: f32, speed: f32, timestamp: f64) -> Self {
        Self {
            source: CommandSource::Network,
            steering,
            drive: Drive::Speed(speed),
            timestamp,
        }
    }

    /// Speed intent, if this command carries one.
    pub fn speed(&self) -> Option<f32> {
        match self.drive {
            Drive::Speed(speed) => Some(speed),
            Drive::Throttle(_) => None,
        }
    }

    /// Normalized throttle, if this command carries one.
    pub fn throttle_norm(&self) -> Option<f32> {
        match self.drive {
            Drive::Throttle(throttle) => Some(throttle),
            Drive::Speed(_) => None,
        }
    }
}

/// Discrete control event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlEvent {
    /// Switch the authoritative source (joystick ⇄ network).
    ModeToggle,
    /// Enter or leave the emergency-stopped state.
    EmergencyStopToggle,
    /// Signed change to the high calibration anchor.
    CalibrationAdjust(f32),
}

impl ControlEvent {
    /// Short name used in log fields.
    pub fn name(&self) -> &'static str {
        match self {
            ControlEvent::ModeToggle => "mode_toggle",
            ControlEvent::EmergencyStopToggle => "estop_toggle",
            ControlEvent::CalibrationAdjust(_) => "calibration_adjust",
        }
    }
}

/// Anything that travels over the IPC channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Message {
    Command(Command),
    Event(ControlEvent),
}

impl From<Command> for Message {
    fn from(command: Command) -> Self {
        Message::Command(command)
    }
}

impl From<ControlEvent> for Message {
    fn from(event: ControlEvent) -> Self {
        Message::Event(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joystick_command_carries_throttle_only() {
        let cmd = Command::joystick(0.2, 0.5, 1.0);
        assert_eq!(cmd.source, CommandSource::Joystick);
        assert_eq!(cmd.throttle_norm(), Some(0.5));
        assert_eq!(cmd.speed(), None);
    }

    #[test]
    fn test_network_command_carries_speed_only() {
        let cmd = Command::network(-0.1, 3.0, 1.0);
        assert_eq!(cmd.source, CommandSource::Network);
        assert_eq!(cmd.speed(), Some(3.0));
        assert_eq!(cmd.throttle_norm(), None);
    }

    #[test]
    fn test_source_display() {
        assert_eq!(CommandSource::Joystick.to_string(), "joystick");
        assert_eq!(CommandSource::Network.to_string(), "network");
    }
}
