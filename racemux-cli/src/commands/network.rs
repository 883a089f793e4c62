//! `racemux network` - run the network producer and throttle calibrator.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use racemux::calibration::{CalibrationLogger, ThrottleCalibrator};
use racemux::command::CommandSource;
use racemux::diagnostics::DiagnosticCounters;
use racemux::producer::{IpcSender, NetworkProducer};

use crate::error::CliError;
use crate::runner::CliRunner;

#[derive(Debug, Args)]
pub struct NetworkArgs {
    /// UDP listen address (overrides [network] bind_addr)
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Arbiter IPC socket (overrides [ipc] socket_path)
    #[arg(long, value_name = "PATH")]
    pub socket: Option<PathBuf>,

    /// Do not run the throttle calibrator
    #[arg(long)]
    pub no_calibration: bool,
}

pub fn run(runner: CliRunner, args: NetworkArgs) -> Result<(), CliError> {
    let file = runner.config();
    let mut config = file.network.clone();
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    let socket = args.socket.unwrap_or_else(|| file.socket_path().to_path_buf());
    let calibrate = file.calibration.enabled && !args.no_calibration;
    let calibrator_config = file.calibration.clone();
    let telemetry = file.telemetry.source();

    let calibration_log = match (&file.calibration_log_dir, calibrate) {
        (Some(dir), true) => Some(CalibrationLogger::create_in(dir, "network")?),
        _ => None,
    };

    println!("racemux network v{}", racemux::VERSION);
    println!("Listen:      {} ({} speed)", config.bind_addr, config.speed_encoding);
    println!("Socket:      {}", socket.display());
    println!("Watchdog:    {} ms", config.watchdog.as_millis());
    if calibrate {
        println!(
            "Calibration: window {} samples, threshold {:.2} m/s",
            calibrator_config.window_size, calibrator_config.speed_threshold
        );
    } else {
        println!("Calibration: disabled");
    }
    println!();

    let shutdown = runner.shutdown_token()?;
    let diagnostics = Arc::new(DiagnosticCounters::new());
    let runtime = runner.runtime()?;

    runtime.block_on(async move {
        let sender = IpcSender::new(socket, CommandSource::Network, Arc::clone(&diagnostics))?;
        let mut producer =
            NetworkProducer::bind(config, sender, telemetry, Arc::clone(&diagnostics)).await?;
        if calibrate {
            producer = producer.with_calibrator(ThrottleCalibrator::new(
                calibrator_config,
                Arc::clone(&diagnostics),
            ));
        }
        if let Some(logger) = calibration_log {
            producer = producer.with_calibration_log(logger);
        }
        producer.run(shutdown).await
    })?;
    Ok(())
}
