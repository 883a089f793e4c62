//! Safety / mode state machine.
//!
//! # State Machine
//!
//! ```text
//!                 ModeToggle
//!   Joystick × Running ◄──────► Network × Running
//!          ▲   │                      ▲   │
//!  EStop   │   │ EStop         EStop  │   │ EStop
//!          │   ▼                      │   ▼
//!   Joystick × EStopped ◄─────► Network × EStopped
//!                 ModeToggle
//! ```
//!
//! The two dimensions are independent. Emergency stop forces neutral output
//! but does not stop message processing, so commands received while stopped
//! are still stored and mode toggles still take effect.

use std::fmt;
use std::time::Instant;

use crate::command::{Command, CommandSource};

/// Which source is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Joystick,
    Network,
}

impl Mode {
    /// The command source this mode listens to.
    pub fn source(&self) -> CommandSource {
        match self {
            Mode::Joystick => CommandSource::Joystick,
            Mode::Network => CommandSource::Network,
        }
    }

    /// The other mode.
    pub fn toggled(&self) -> Self {
        match self {
            Mode::Joystick => Mode::Network,
            Mode::Network => Mode::Joystick,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source())
    }
}

/// A command together with the arbiter's receipt time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoredCommand {
    pub command: Command,
    pub received_at: Instant,
}

impl StoredCommand {
    /// Age of the command at `now`.
    pub fn age(&self, now: Instant) -> std::time::Duration {
        now.saturating_duration_since(self.received_at)
    }
}

/// Mutable arbiter state. Never persisted; a restart begins at
/// `Joystick × Running` with no stored commands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArbiterState {
    pub mode: Mode,
    pub emergency_stop: bool,
    pub last_joystick: Option<StoredCommand>,
    pub last_network: Option<StoredCommand>,
}

impl ArbiterState {
    /// Initial state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the authoritative source; returns the new mode.
    pub fn toggle_mode(&mut self) -> Mode {
        self.mode = self.mode.toggled();
        self.mode
    }

    /// Flip the emergency stop; returns whether it is now engaged.
    pub fn toggle_emergency_stop(&mut self) -> bool {
        self.emergency_stop = !self.emergency_stop;
        self.emergency_stop
    }

    /// Last stored command for `source`.
    pub fn last_command(&self, source: CommandSource) -> Option<&StoredCommand> {
        match source {
            CommandSource::Joystick => self.last_joystick.as_ref(),
            CommandSource::Network => self.last_network.as_ref(),
        }
    }

    /// Mutable slot for `source`.
    pub fn slot_mut(&mut self, source: CommandSource) -> &mut Option<StoredCommand> {
        match source {
            CommandSource::Joystick => &mut self.last_joystick,
            CommandSource::Network => &mut self.last_network,
        }
    }
}
