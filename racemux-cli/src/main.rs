//! racemux CLI - one subcommand per process role
//!
//! ```text
//! racemux arbiter --dry-run  # owns the actuator (logs output)
//! racemux joystick           # gamepad producer
//! racemux network            # UDP producer + throttle calibrator
//! racemux event estop        # manual control event
//! racemux config list        # effective configuration
//! ```

mod commands;
mod error;
mod runner;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use commands::arbiter::ArbiterArgs;
use commands::config::ConfigCommands;
use commands::event::EventArgs;
use commands::joystick::JoystickArgs;
use commands::network::NetworkArgs;
use error::CliError;
use runner::CliRunner;

#[derive(Debug, Parser)]
#[command(name = "racemux", version, about = "Command arbitration and throttle calibration for RC vehicles")]
struct Cli {
    /// Configuration file (default: ~/.config/racemux/config.ini)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log filter, e.g. `info` or `debug,racemux::arbiter=trace`
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the arbiter: select a source each tick and drive the actuator
    Arbiter(ArbiterArgs),

    /// Run the joystick producer
    Joystick(JoystickArgs),

    /// Run the network producer and throttle calibrator
    Network(NetworkArgs),

    /// Send a single control event to the arbiter
    Event(EventArgs),

    /// Inspect or edit the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let Cli {
        config,
        log_level,
        command,
    } = cli;

    match command {
        Commands::Config { command } => commands::config::run(command, config.as_deref()),
        Commands::Arbiter(args) => {
            commands::arbiter::run(CliRunner::new(config, log_level, "arbiter")?, args)
        }
        Commands::Joystick(args) => {
            commands::joystick::run(CliRunner::new(config, log_level, "joystick")?, args)
        }
        Commands::Network(args) => {
            commands::network::run(CliRunner::new(config, log_level, "network")?, args)
        }
        Commands::Event(args) => commands::event::run(CliRunner::new(config, log_level, "event")?, args),
    }
}
