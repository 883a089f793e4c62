//! The arbiter process loop.
//!
//! # Loop
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────┐
//!   │ wait: tick interval ─┬─ or ─ shutdown ──► exit (neutral)  │
//!   │                      ▼                                    │
//!   │ drain ≤ max_drain datagrams (non-blocking)                │
//!   │   decode ──► Arbiter::on_message   (bad → drop + count)   │
//!   │                      ▼                                    │
//!   │ Arbiter::tick ──► Actuator::apply (exactly once)          │
//!   └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The actuator is held by a [`NeutralGuard`] for the whole run, so it is
//! left at neutral whether the loop returns, errors or unwinds. The socket
//! file is removed when the service is dropped.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::net::UnixDatagram;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::ArbiterConfig;
use super::core::Arbiter;
use super::mapping::AnchorAdjustment;
use crate::actuator::{Actuator, NeutralGuard};
use crate::calibration::{CalibrationLogger, CalibrationRecord};
use crate::command::{decode, MAX_MESSAGE_BYTES};
use crate::diagnostics::{DiagnosticCounters, DiagnosticsSnapshot};
use crate::error::{Result, ServiceError};

/// Removes the bound socket path when dropped.
#[derive(Debug)]
struct SocketFile {
    path: PathBuf,
}

impl Drop for SocketFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed IPC socket file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove IPC socket file"),
        }
    }
}

/// Owns the IPC socket, the actuator and the [`Arbiter`].
pub struct ArbiterService<A: Actuator> {
    arbiter: Arbiter,
    socket: UnixDatagram,
    socket_file: SocketFile,
    actuator: A,
    calibration_log: Option<CalibrationLogger>,
    diagnostics: Arc<DiagnosticCounters>,
}

impl<A: Actuator> ArbiterService<A> {
    /// Bind the IPC socket, replacing a stale socket file left by a crashed run.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn bind(config: ArbiterConfig, actuator: A, diagnostics: Arc<DiagnosticCounters>) -> Result<Self> {
        let path = config.socket_path.clone();
        remove_stale_socket(&path)?;

        let socket = UnixDatagram::bind(&path).map_err(|source| ServiceError::BindSocket {
            path: path.clone(),
            source,
        })?;

        info!(
            socket = %path.display(),
            tick_ms = config.tick_interval.as_millis() as u64,
            joystick_timeout_ms = config.joystick_timeout.as_millis() as u64,
            network_timeout_ms = config.network_timeout.as_millis() as u64,
            high_anchor = format!("{:.4}", config.mapping.high_anchor),
            "Arbiter listening"
        );

        Ok(Self {
            arbiter: Arbiter::new(config, Arc::clone(&diagnostics)),
            socket,
            socket_file: SocketFile { path },
            actuator,
            calibration_log: None,
            diagnostics,
        })
    }

    /// Record applied anchor changes to `logger`.
    pub fn with_calibration_log(mut self, logger: CalibrationLogger) -> Self {
        self.calibration_log = Some(logger);
        self
    }

    /// Path the service is bound to.
    pub fn socket_path(&self) -> &Path {
        &self.socket_file.path
    }

    /// The decision logic, for inspection.
    pub fn arbiter(&self) -> &Arbiter {
        &self.arbiter
    }

    /// Run until `shutdown` is cancelled, returning the final counters.
    pub async fn run(self, shutdown: CancellationToken) -> Result<DiagnosticsSnapshot> {
        let Self {
            mut arbiter,
            socket,
            socket_file,
            actuator,
            mut calibration_log,
            diagnostics,
        } = self;

        let mut actuator = NeutralGuard::new(actuator);
        let tick_interval = arbiter.config().tick_interval.max(Duration::from_millis(1));
        let max_drain = arbiter.config().max_drain.max(1);
        let diagnostics_interval = arbiter.config().diagnostics_interval;

        let mut ticker = tokio::time::interval(tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_report = Instant::now();
        let mut buf = vec![0u8; MAX_MESSAGE_BYTES];

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let now = Instant::now();
            for _ in 0..max_drain {
                let len = match socket.try_recv(&mut buf) {
                    Ok(len) => len,
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                    Err(e) => {
                        warn!(error = %e, "IPC receive failed");
                        break;
                    }
                };
                diagnostics.message_received();

                match decode(&buf[..len]) {
                    Ok(message) => {
                        if let Some(adjustment) = arbiter.on_message(message, now) {
                            record_adjustment(&mut calibration_log, &adjustment);
                        }
                    }
                    Err(e) => {
                        diagnostics.message_dropped();
                        warn!(error = %e, bytes = len, "Dropping malformed message");
                    }
                }
            }

            let output = arbiter.tick(now);
            actuator.apply(output.actuation);

            if now.duration_since(last_report) >= diagnostics_interval {
                last_report = now;
                debug!(
                    mode = %arbiter.state().mode,
                    estop = arbiter.state().emergency_stop,
                    reason = %output.reason,
                    high_anchor = format!("{:.4}", arbiter.calibration().high_anchor()),
                    diagnostics = ?diagnostics.snapshot(),
                    "Arbiter status"
                );
            }
        }

        info!("Arbiter stopping, setting actuator to neutral");
        drop(actuator);
        drop(socket);
        drop(socket_file);

        let snapshot = diagnostics.snapshot();
        snapshot.log("arbiter");
        Ok(snapshot)
    }
}

fn remove_stale_socket(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            info!(path = %path.display(), "Removed stale IPC socket file");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(ServiceError::BindSocket {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn record_adjustment(log: &mut Option<CalibrationLogger>, adjustment: &AnchorAdjustment) {
    let Some(logger) = log else {
        return;
    };
    if let Err(e) = logger.record(&CalibrationRecord::adjustment(adjustment)) {
        warn!(error = %e, "Calibration log write failed, disabling log");
        *log = None;
    }
}
