//! Process-level errors.
//!
//! Only setup can fail: binding sockets, opening devices and log files. Once a
//! loop is running, every per-message or per-tick fault is handled locally
//! and surfaces as a log line and a diagnostic counter instead.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::calibration::LogError;

/// Errors that stop a service from starting or running.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The IPC socket could not be bound.
    #[error("Failed to bind IPC socket {path}: {source}")]
    BindSocket { path: PathBuf, source: io::Error },

    /// The UDP listener could not be bound.
    #[error("Failed to bind UDP socket {addr}: {source}")]
    BindUdp { addr: String, source: io::Error },

    /// The input device could not be opened.
    #[error("Failed to open input device {path}: {source}")]
    Device { path: PathBuf, source: io::Error },

    /// The calibration log could not be opened.
    #[error("Calibration log error: {0}")]
    Log(#[from] LogError),

    /// Any other I/O error during setup.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result alias for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_error_names_path() {
        let err = ServiceError::BindSocket {
            path: PathBuf::from("/tmp/racemux_ctrl.sock"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/racemux_ctrl.sock"));
        assert!(msg.contains("denied"));
    }
}
