//! Command producers.
//!
//! A producer turns one raw input into [`Command`](crate::command::Command)s
//! and [`ControlEvent`](crate::command::ControlEvent)s and sends them to the
//! arbiter over the IPC socket. Each runs as its own process and keeps going
//! whether or not the arbiter is listening.
//!
//! # Module Structure
//!
//! - [`link`] - `IpcSender`, the producer end of the IPC channel
//! - [`device`] - `JoystickDevice` and the Linux joystick reader
//! - [`joystick`] - axis shaping, debounced buttons, `JoystickProducer`
//! - [`packet`] - 12-byte UDP wire packet and sequence tracking
//! - [`network`] - `NetworkProducer` with watchdog and calibrator

pub mod device;
pub mod joystick;
pub mod link;
pub mod network;
pub mod packet;

pub use device::{JoystickDevice, LinuxJoystick};
pub use joystick::{EdgeDetector, JoystickConfig, JoystickProducer};
pub use link::IpcSender;
pub use network::{LinkMonitor, NetworkConfig, NetworkProducer, Publish};
pub use packet::{PacketError, SequenceCheck, SequenceTracker, SpeedEncoding, WirePacket};
