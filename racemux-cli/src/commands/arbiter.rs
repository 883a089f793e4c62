//! `racemux arbiter` - run the arbiter process.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use racemux::actuator::TracingActuator;
use racemux::arbiter::ArbiterService;
use racemux::calibration::CalibrationLogger;
use racemux::diagnostics::DiagnosticCounters;

use crate::error::CliError;
use crate::runner::CliRunner;

#[derive(Debug, Args)]
pub struct ArbiterArgs {
    /// IPC socket to bind (overrides [ipc] socket_path)
    #[arg(long, value_name = "PATH")]
    pub socket: Option<PathBuf>,

    /// Log actuator output instead of driving hardware (required)
    #[arg(long)]
    pub dry_run: bool,
}

impl ArbiterArgs {
    /// Fail unless the tracing actuator was asked for.
    fn require_dry_run(&self) -> Result<(), CliError> {
        if self.dry_run {
            Ok(())
        } else {
            Err(CliError::NoActuator)
        }
    }
}

pub fn run(runner: CliRunner, args: ArbiterArgs) -> Result<(), CliError> {
    args.require_dry_run()?;
    let file = runner.config();
    let mut config = file.arbiter.clone();
    if let Some(socket) = args.socket {
        config.socket_path = socket;
    }

    let actuator = TracingActuator::new(config.mapping.esc).with_telemetry(Box::new(file.telemetry.source()));

    let calibration_log = file
        .calibration_log_dir
        .as_deref()
        .map(|dir| CalibrationLogger::create_in(dir, "arbiter"))
        .transpose()?;

    println!("racemux arbiter v{}", racemux::VERSION);
    println!("Socket:  {}", config.socket_path.display());
    println!(
        "Timeouts: joystick {} ms, network {} ms",
        config.joystick_timeout.as_millis(),
        config.network_timeout.as_millis()
    );
    println!("Press Ctrl+C to stop");
    println!();

    let shutdown = runner.shutdown_token()?;
    let diagnostics = Arc::new(DiagnosticCounters::new());
    let runtime = runner.runtime()?;

    let snapshot = runtime.block_on(async move {
        let mut service = ArbiterService::bind(config, actuator, diagnostics)?;
        if let Some(logger) = calibration_log {
            service = service.with_calibration_log(logger);
        }
        service.run(shutdown).await
    })?;

    println!();
    println!(
        "Stopped: {} messages, {} dropped, {} stale ticks",
        snapshot.messages_received, snapshot.messages_dropped, snapshot.stale_ticks
    );
    Ok(())
}
