//! Fixed 12-byte wire packet sent by the remote driver station.
//!
//! ```text
//!  0        4        8        12
//!  ┌────────┬────────┬────────┬ ─ ─ ─ ─ ─
//!  │ steer  │ speed  │  seq   │ ignored
//!  │ f32 BE │f32|i32 │ u32 BE │
//!  └────────┴────────┴────────┴ ─ ─ ─ ─ ─
//! ```

use std::fmt;
use std::str::FromStr;

use bytes::{Buf, BufMut};
use thiserror::Error;

/// Length of a valid packet; trailing bytes are ignored.
pub const WIRE_PACKET_LEN: usize = 12;

/// Sequence numbers above this, followed by one below
/// [`SEQUENCE_RESTART_FLOOR`], mean the sender restarted.
pub const SEQUENCE_RESTART_CEILING: u32 = 100_000;

/// See [`SEQUENCE_RESTART_CEILING`].
pub const SEQUENCE_RESTART_FLOOR: u32 = 100;

/// How the speed field is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeedEncoding {
    /// IEEE-754 `f32`.
    Float,
    /// Signed 32-bit integer.
    #[default]
    Int,
}

impl SpeedEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeedEncoding::Float => "float",
            SpeedEncoding::Int => "int",
        }
    }
}

impl fmt::Display for SpeedEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpeedEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "float" | "f32" => Ok(SpeedEncoding::Float),
            "int" | "i32" => Ok(SpeedEncoding::Int),
            other => Err(format!("unknown speed encoding '{}' (expected float or int)", other)),
        }
    }
}

/// Reasons a packet is rejected.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PacketError {
    #[error("packet too short: {len} bytes (need {})", WIRE_PACKET_LEN)]
    TooShort { len: usize },

    #[error("steering is not finite: {0}")]
    NonFiniteSteering(f32),

    #[error("speed {value} outside [0, {max}]")]
    SpeedOutOfRange { value: f32, max: f32 },
}

/// A decoded wire packet, before steering shaping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WirePacket {
    pub steering: f32,
    pub speed: f32,
    pub sequence: u32,
}

impl WirePacket {
    /// Decode and validate a packet.
    pub fn decode(
        bytes: &[u8],
        encoding: SpeedEncoding,
        max_speed: f32,
    ) -> Result<Self, PacketError> {
        if bytes.len() < WIRE_PACKET_LEN {
            return Err(PacketError::TooShort { len: bytes.len() });
        }

        let mut buf = &bytes[..WIRE_PACKET_LEN];
        let steering = buf.get_f32();
        let speed = match encoding {
            SpeedEncoding::Float => buf.get_f32(),
            SpeedEncoding::Int => buf.get_i32() as f32,
        };
        let sequence = buf.get_u32();

        if !steering.is_finite() {
            return Err(PacketError::NonFiniteSteering(steering));
        }
        if !speed.is_finite() || speed < 0.0 || speed > max_speed {
            return Err(PacketError::SpeedOutOfRange {
                value: speed,
                max: max_speed,
            });
        }

        Ok(Self {
            steering,
            speed,
            sequence,
        })
    }

    /// Encode as the driver station would.
    pub fn encode(&self, encoding: SpeedEncoding) -> Vec<u8> {
        let mut buf = Vec::with_capacity(WIRE_PACKET_LEN);
        buf.put_f32(self.steering);
        match encoding {
            SpeedEncoding::Float => buf.put_f32(self.speed),
            SpeedEncoding::Int => buf.put_i32(self.speed.round() as i32),
        }
        buf.put_u32(self.sequence);
        buf
    }
}

/// Classification of an incoming sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceCheck {
    /// First packet since start or reset.
    First,
    /// Exactly the next number.
    InOrder,
    /// Newer, with this many numbers missing.
    Gap(u64),
    /// Not newer than the last accepted packet.
    Stale,
    /// The sender restarted its counter.
    Restart,
}

impl SequenceCheck {
    /// Whether the packet should be used.
    pub fn is_accepted(&self) -> bool {
        !matches!(self, SequenceCheck::Stale)
    }
}

/// Tracks the last accepted sequence number.
#[derive(Debug, Clone, Default)]
pub struct SequenceTracker {
    last: Option<u32>,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<u32> {
        self.last
    }

    /// Classify `sequence` and record it when accepted.
    pub fn check(&mut self, sequence: u32) -> SequenceCheck {
        let result = match self.last {
            None => SequenceCheck::First,
            Some(last) if last > SEQUENCE_RESTART_CEILING && sequence < SEQUENCE_RESTART_FLOOR => {
                SequenceCheck::Restart
            }
            Some(last) if sequence <= last => SequenceCheck::Stale,
            Some(last) => match u64::from(sequence - last - 1) {
                0 => SequenceCheck::InOrder,
                gap => SequenceCheck::Gap(gap),
            },
        };
        if result.is_accepted() {
            self.last = Some(sequence);
        }
        result
    }

    /// Forget the last sequence number.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(steer: f32, speed_bits: [u8; 4], seq: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.put_f32(steer);
        buf.put_slice(&speed_bits);
        buf.put_u32(seq);
        buf
    }

    #[test]
    fn test_decode_int_speed() {
        let bytes = raw(-0.5, 5i32.to_be_bytes(), 42);
        let packet = WirePacket::decode(&bytes, SpeedEncoding::Int, 10.0).unwrap();
        assert_eq!(
            packet,
            WirePacket {
                steering: -0.5,
                speed: 5.0,
                sequence: 42
            }
        );
    }

    #[test]
    fn test_decode_float_speed_ignores_trailing_bytes() {
        let mut bytes = raw(0.25, 2.5f32.to_be_bytes(), 7);
        bytes.extend_from_slice(&[0xde, 0xad]);
        let packet = WirePacket::decode(&bytes, SpeedEncoding::Float, 10.0).unwrap();
        assert_eq!(packet.speed, 2.5);
        assert_eq!(packet.sequence, 7);
    }

    #[test]
    fn test_decode_rejects_short_packet() {
        assert_eq!(
            WirePacket::decode(&[0u8; 11], SpeedEncoding::Int, 10.0),
            Err(PacketError::TooShort { len: 11 })
        );
    }

    #[test]
    fn test_decode_rejects_bad_values() {
        let nan_steer = raw(f32::NAN, 1i32.to_be_bytes(), 1);
        assert!(matches!(
            WirePacket::decode(&nan_steer, SpeedEncoding::Int, 10.0),
            Err(PacketError::NonFiniteSteering(_))
        ));

        let negative = raw(0.0, (-1i32).to_be_bytes(), 1);
        assert!(WirePacket::decode(&negative, SpeedEncoding::Int, 10.0).is_err());

        let too_fast = raw(0.0, 11i32.to_be_bytes(), 1);
        assert!(WirePacket::decode(&too_fast, SpeedEncoding::Int, 10.0).is_err());

        let inf = raw(0.0, f32::INFINITY.to_be_bytes(), 1);
        assert!(WirePacket::decode(&inf, SpeedEncoding::Float, 10.0).is_err());
    }

    #[test]
    fn test_encode_matches_decode_layout() {
        let packet = WirePacket {
            steering: 0.1,
            speed: 3.0,
            sequence: 9,
        };
        let bytes = packet.encode(SpeedEncoding::Int);
        assert_eq!(bytes.len(), WIRE_PACKET_LEN);
        assert_eq!(&bytes[4..8], &3i32.to_be_bytes());
    }

    #[test]
    fn test_speed_encoding_parse() {
        assert_eq!("float".parse::<SpeedEncoding>(), Ok(SpeedEncoding::Float));
        assert_eq!(" INT ".parse::<SpeedEncoding>(), Ok(SpeedEncoding::Int));
        assert!("double".parse::<SpeedEncoding>().is_err());
    }

    #[test]
    fn test_sequence_tracker() {
        let mut tracker = SequenceTracker::new();
        assert_eq!(tracker.check(10), SequenceCheck::First);
        assert_eq!(tracker.check(11), SequenceCheck::InOrder);
        assert_eq!(tracker.check(15), SequenceCheck::Gap(3));
        assert_eq!(tracker.check(15), SequenceCheck::Stale);
        assert_eq!(tracker.check(12), SequenceCheck::Stale);
        assert_eq!(tracker.last(), Some(15));
    }

    #[test]
    fn test_sequence_restart_detection() {
        let mut tracker = SequenceTracker::new();
        tracker.check(100_001);
        assert_eq!(tracker.check(3), SequenceCheck::Restart);
        assert_eq!(tracker.check(4), SequenceCheck::InOrder);

        let mut tracker = SequenceTracker::new();
        tracker.check(50_000);
        assert_eq!(tracker.check(3), SequenceCheck::Stale);

        tracker.reset();
        assert_eq!(tracker.check(3), SequenceCheck::First);
    }
}
