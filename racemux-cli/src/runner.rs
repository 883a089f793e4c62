//! Shared setup for the long-running subcommands.
//!
//! Every process role needs the same three things before it can start:
//! configuration, logging and a single-threaded runtime with a shutdown
//! token wired to Ctrl-C / SIGTERM.

use std::path::PathBuf;

use racemux::config::{config_file_path, ConfigFile};
use racemux::logging::{init_logging, LoggingGuard};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::CliError;

/// Loaded configuration plus the logging guard for one process.
pub struct CliRunner {
    config: ConfigFile,
    config_path: PathBuf,
    role: &'static str,
    _logging: LoggingGuard,
}

impl CliRunner {
    /// Load configuration and install logging.
    ///
    /// `log_level` overrides `[logging] level`.
    pub fn new(
        config_path: Option<PathBuf>,
        log_level: Option<String>,
        role: &'static str,
    ) -> Result<Self, CliError> {
        let config_path = config_path.unwrap_or_else(config_file_path);
        let config = ConfigFile::load_from(&config_path)?;

        let level = log_level.unwrap_or_else(|| config.logging.level.clone());
        let logging = init_logging(&level, config.logging.dir.as_deref(), role)?;

        let runner = Self {
            config,
            config_path,
            role,
            _logging: logging,
        };
        runner.log_startup();
        Ok(runner)
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    fn log_startup(&self) {
        info!(
            role = self.role,
            version = racemux::VERSION,
            config = %self.config_path.display(),
            "racemux starting"
        );
    }

    /// Single-threaded runtime; the control loops are cooperative.
    pub fn runtime(&self) -> Result<Runtime, CliError> {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| CliError::Runtime(e.to_string()))
    }

    /// Token cancelled on Ctrl-C or SIGTERM.
    pub fn shutdown_token(&self) -> Result<CancellationToken, CliError> {
        let token = CancellationToken::new();
        let trigger = token.clone();
        ctrlc::set_handler(move || {
            info!("Received shutdown signal");
            trigger.cancel();
        })
        .map_err(|e| CliError::Signal(e.to_string()))?;
        Ok(token)
    }
}
