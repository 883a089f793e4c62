//! CLI error type.

use std::fmt;

use racemux::config::ConfigError;
use racemux::error::ServiceError;
use racemux::logging::LoggingError;

/// Errors reported to the user by `main`.
#[derive(Debug)]
pub enum CliError {
    /// Invalid or unreadable configuration.
    Config(String),

    /// Logging could not be set up.
    Logging(LoggingError),

    /// A service failed to start or stopped with an error.
    Service(ServiceError),

    /// The Tokio runtime could not be created.
    Runtime(String),

    /// The Ctrl-C / SIGTERM handler could not be installed.
    Signal(String),

    /// A control event could not be delivered.
    Send(String),

    /// Hardware output was requested but no driver is built in.
    NoActuator,
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Logging(e) => write!(f, "Logging error: {}", e),
            CliError::Service(e) => write!(f, "{}", e),
            CliError::Runtime(msg) => write!(f, "Failed to create Tokio runtime: {}", msg),
            CliError::Signal(msg) => write!(f, "Failed to set signal handler: {}", msg),
            CliError::Send(msg) => write!(f, "Failed to send event: {}", msg),
            CliError::NoActuator => write!(
                f,
                "No hardware actuator driver is available; pass --dry-run to log actuator output"
            ),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Logging(e) => Some(e),
            CliError::Service(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<ServiceError> for CliError {
    fn from(e: ServiceError) -> Self {
        CliError::Service(e)
    }
}

impl From<racemux::calibration::LogError> for CliError {
    fn from(e: racemux::calibration::LogError) -> Self {
        CliError::Service(ServiceError::Log(e))
    }
}
