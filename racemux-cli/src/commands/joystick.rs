//! `racemux joystick` - run the joystick producer.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use racemux::command::CommandSource;
use racemux::diagnostics::DiagnosticCounters;
use racemux::error::ServiceError;
use racemux::producer::{IpcSender, JoystickProducer, LinuxJoystick};

use crate::error::CliError;
use crate::runner::CliRunner;

#[derive(Debug, Args)]
pub struct JoystickArgs {
    /// Joystick device node (overrides [joystick] device)
    #[arg(long, value_name = "PATH")]
    pub device: Option<PathBuf>,

    /// Arbiter IPC socket (overrides [ipc] socket_path)
    #[arg(long, value_name = "PATH")]
    pub socket: Option<PathBuf>,
}

pub fn run(runner: CliRunner, args: JoystickArgs) -> Result<(), CliError> {
    let file = runner.config();
    let mut config = file.joystick.clone();
    if let Some(device) = args.device {
        config.device = device;
    }
    let socket = args.socket.unwrap_or_else(|| file.socket_path().to_path_buf());

    let device = LinuxJoystick::open(&config.device).map_err(|source| ServiceError::Device {
        path: config.device.clone(),
        source,
    })?;

    println!("racemux joystick v{}", racemux::VERSION);
    println!("Device: {}", config.device.display());
    println!("Socket: {}", socket.display());
    println!(
        "Buttons: toggle={} estop={}",
        config.toggle_button, config.estop_button
    );
    println!();

    let shutdown = runner.shutdown_token()?;
    let diagnostics = Arc::new(DiagnosticCounters::new());
    let runtime = runner.runtime()?;

    runtime.block_on(async move {
        let sender = IpcSender::new(socket, CommandSource::Joystick, Arc::clone(&diagnostics))?;
        JoystickProducer::new(config, device, sender, diagnostics)
            .run(shutdown)
            .await
    })?;
    Ok(())
}
