//! `racemux event` - send one control event, for manual overrides and tests.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, ValueEnum};
use racemux::command::{CommandSource, ControlEvent};
use racemux::diagnostics::DiagnosticCounters;
use racemux::producer::IpcSender;

use crate::error::CliError;
use crate::runner::CliRunner;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EventKind {
    /// Switch between joystick and network control
    Toggle,
    /// Toggle the emergency stop
    Estop,
    /// Move the high calibration anchor by --delta
    Adjust,
}

#[derive(Debug, Args)]
pub struct EventArgs {
    /// Event to send
    #[arg(value_enum)]
    pub kind: EventKind,

    /// Signed anchor change for `adjust`
    #[arg(long, allow_negative_numbers = true)]
    pub delta: Option<f32>,

    /// Arbiter IPC socket (overrides [ipc] socket_path)
    #[arg(long, value_name = "PATH")]
    pub socket: Option<PathBuf>,
}

impl EventArgs {
    fn event(&self) -> Result<ControlEvent, CliError> {
        match self.kind {
            EventKind::Toggle => Ok(ControlEvent::ModeToggle),
            EventKind::Estop => Ok(ControlEvent::EmergencyStopToggle),
            EventKind::Adjust => match self.delta {
                Some(delta) if delta.is_finite() => Ok(ControlEvent::CalibrationAdjust(delta)),
                Some(delta) => Err(CliError::Config(format!("--delta must be finite, got {}", delta))),
                None => Err(CliError::Config("adjust requires --delta".to_string())),
            },
        }
    }
}

pub fn run(runner: CliRunner, args: EventArgs) -> Result<(), CliError> {
    let event = args.event()?;
    let socket = args
        .socket
        .clone()
        .unwrap_or_else(|| runner.config().socket_path().to_path_buf());

    let mut sender = IpcSender::new(&socket, CommandSource::Joystick, Arc::new(DiagnosticCounters::new()))?;
    if !sender.send(&event.into()) {
        return Err(CliError::Send(format!(
            "arbiter on {} did not accept the event",
            socket.display()
        )));
    }
    println!("Sent {} to {}", event.name(), socket.display());
    Ok(())
}
