//! Line-delimited JSON codec for the IPC channel.
//!
//! One datagram carries one JSON object terminated by `\n`:
//!
//! ```text
//! {"src":"joystick","steer":0.10,"throttle":0.05,"ts":1234.5}
//! {"src":"network","steer":-0.2,"speed":3.0,"ts":1234.6}
//! {"src":"joystick","event":"toggle"}
//! {"src":"joystick","event":"estop"}
//! {"src":"network","event":"adjust","delta":-0.001}
//! ```
//!
//! Decoding is strict: anything that does not describe exactly one valid
//! command or event is a [`MessageError`], which the arbiter drops and counts.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Command, CommandSource, ControlEvent, Drive, Message};

/// Largest datagram the arbiter reads; longer messages are truncated and
/// therefore fail to decode.
pub const MAX_MESSAGE_BYTES: usize = 512;

const EVENT_TOGGLE: &str = "toggle";
const EVENT_ESTOP: &str = "estop";
const EVENT_ADJUST: &str = "adjust";

/// Errors produced while decoding an IPC message.
#[derive(Debug, Error)]
pub enum MessageError {
    /// Payload is not valid JSON for the message schema.
    #[error("invalid message JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A required field is absent.
    #[error("missing field '{0}'")]
    MissingField(&'static str),

    /// `src` names no known producer.
    #[error("unknown source '{0}'")]
    UnknownSource(String),

    /// `event` names no known control event.
    #[error("unknown event '{0}'")]
    UnknownEvent(String),

    /// A numeric field is NaN, infinite or outside its domain.
    #[error("field '{field}' has invalid value {value}")]
    InvalidValue { field: &'static str, value: f64 },

    /// The command's drive field does not match its source.
    #[error("{origin} commands must carry '{expected}'")]
    DriveMismatch {
        origin: CommandSource,
        expected: &'static str,
    },
}

/// Flat wire representation shared by commands and events.
#[derive(Debug, Default, Serialize, Deserialize)]
struct WireMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    steer: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    throttle: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    speed: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    delta: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ts: Option<f64>,
}

/// Encode a message as one newline-terminated JSON line.
///
/// `origin` fills the `src` field of events so the arbiter can attribute them
/// in logs; commands always use their own source.
pub fn encode(message: &Message, origin: CommandSource) -> Vec<u8> {
    let wire = match message {
        Message::Command(cmd) => {
            let (throttle, speed) = match cmd.drive {
                Drive::Throttle(t) => (Some(t), None),
                Drive::Speed(s) => (None, Some(s)),
            };
            WireMessage {
                src: Some(cmd.source.as_str().to_string()),
                steer: Some(cmd.steering),
                throttle,
                speed,
                ts: Some(cmd.timestamp),
                ..Default::default()
            }
        }
        Message::Event(event) => {
            let (name, delta) = match event {
                ControlEvent::ModeToggle => (EVENT_TOGGLE, None),
                ControlEvent::EmergencyStopToggle => (EVENT_ESTOP, None),
                ControlEvent::CalibrationAdjust(delta) => (EVENT_ADJUST, Some(*delta)),
            };
            WireMessage {
                src: Some(origin.as_str().to_string()),
                event: Some(name.to_string()),
                delta,
                ..Default::default()
            }
        }
    };

    // Infallible for this struct; non-finite floats are written as null.
    let mut bytes = serde_json::to_vec(&wire).unwrap_or_default();
    bytes.push(b'\n');
    bytes
}

/// Decode one datagram into a message.
pub fn decode(bytes: &[u8]) -> Result<Message, MessageError> {
    let wire: WireMessage = serde_json::from_slice(trim_ascii(bytes))?;

    if let Some(event) = wire.event.as_deref() {
        return decode_event(event, wire.delta).map(Message::Event);
    }

    let source = match wire.src.as_deref() {
        Some("joystick") => CommandSource::Joystick,
        // "udp" is accepted as an alias for "network".
        Some("network") | Some("udp") => CommandSource::Network,
        Some(other) => return Err(MessageError::UnknownSource(other.to_string())),
        None => return Err(MessageError::MissingField("src")),
    };

    let steering = wire.steer.ok_or(MessageError::MissingField("steer"))?;
    let steering = finite("steer", steering)?.clamp(-1.0, 1.0);
    let timestamp = wire.ts.ok_or(MessageError::MissingField("ts"))?;
    if !timestamp.is_finite() {
        return Err(MessageError::InvalidValue {
            field: "ts",
            value: timestamp,
        });
    }

    let drive = match (source, wire.throttle, wire.speed) {
        (CommandSource::Joystick, Some(throttle), None) => {
            Drive::Throttle(finite("throttle", throttle)?.clamp(-1.0, 1.0))
        }
        (CommandSource::Network, None, Some(speed)) => {
            let speed = finite("speed", speed)?;
            if speed < 0.0 {
                return Err(MessageError::InvalidValue {
                    field: "speed",
                    value: speed as f64,
                });
            }
            Drive::Speed(speed)
        }
        (CommandSource::Joystick, _, _) => {
            return Err(MessageError::DriveMismatch {
                origin: source,
                expected: "throttle",
            })
        }
        (CommandSource::Network, _, _) => {
            return Err(MessageError::DriveMismatch {
                origin: source,
                expected: "speed",
            })
        }
    };

    Ok(Message::Command(Command {
        source,
        steering,
        drive,
        timestamp,
    }))
}

fn decode_event(name: &str, delta: Option<f32>) -> Result<ControlEvent, MessageError> {
    match name {
        EVENT_TOGGLE => Ok(ControlEvent::ModeToggle),
        EVENT_ESTOP => Ok(ControlEvent::EmergencyStopToggle),
        EVENT_ADJUST => {
            let delta = delta.ok_or(MessageError::MissingField("delta"))?;
            Ok(ControlEvent::CalibrationAdjust(finite("delta", delta)?))
        }
        other => Err(MessageError::UnknownEvent(other.to_string())),
    }
}

fn finite(field: &'static str, value: f32) -> Result<f32, MessageError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(MessageError::InvalidValue {
            field,
            value: value as f64,
        })
    }
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}
