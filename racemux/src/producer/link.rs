//! Producer end of the IPC channel.

use std::io;
use std::os::unix::net::UnixDatagram;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::command::{encode, CommandSource, Message};
use crate::diagnostics::DiagnosticCounters;
use crate::error::Result;

/// Fire-and-forget sender of [`Message`]s to the arbiter socket.
///
/// Sends never fail or wait from the caller's point of view: when the arbiter
/// is not listening the message is counted as a send failure and dropped. The
/// first failure of a streak is logged at `warn`, later ones at `debug`.
#[derive(Debug)]
pub struct IpcSender {
    socket: UnixDatagram,
    target: PathBuf,
    origin: CommandSource,
    diagnostics: Arc<DiagnosticCounters>,
    failing: bool,
}

impl IpcSender {
    /// Create an unbound, non-blocking sender targeting `target`.
    pub fn new(
        target: impl Into<PathBuf>,
        origin: CommandSource,
        diagnostics: Arc<DiagnosticCounters>,
    ) -> Result<Self> {
        let socket = UnixDatagram::unbound()?;
        socket.set_nonblocking(true)?;
        Ok(Self {
            socket,
            target: target.into(),
            origin,
            diagnostics,
            failing: false,
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn origin(&self) -> CommandSource {
        self.origin
    }

    /// Send one message without waiting. Returns whether it was handed to
    /// the kernel.
    ///
    /// A full arbiter queue drops the message and counts it in
    /// `sends_dropped`.
    pub fn send(&mut self, message: &Message) -> bool {
        let bytes = encode(message, self.origin);
        match self.socket.send_to(&bytes, &self.target) {
            Ok(_) => {
                if self.failing {
                    info!(target_path = %self.target.display(), "Arbiter socket reachable again");
                    self.failing = false;
                }
                true
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                self.diagnostics.send_dropped();
                debug!(target_path = %self.target.display(), "Arbiter queue full, message dropped");
                false
            }
            Err(e) => {
                self.diagnostics.send_failed();
                if self.failing {
                    debug!(error = %e, "IPC send failed");
                } else {
                    warn!(
                        target_path = %self.target.display(),
                        error = %e,
                        "IPC send failed, is the arbiter running?"
                    );
                    self.failing = true;
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use tokio::net::UnixDatagram as AsyncDatagram;

    use crate::command::{decode, ControlEvent};

    #[tokio::test]
    async fn test_send_reaches_bound_socket() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ctrl.sock");
        let receiver = AsyncDatagram::bind(&path).unwrap();

        let mut sender =
            IpcSender::new(&path, CommandSource::Joystick, Arc::default()).unwrap();
        assert!(sender.send(&ControlEvent::ModeToggle.into()));

        let mut buf = [0u8; 512];
        let len = receiver.recv(&mut buf).await.unwrap();
        assert_eq!(decode(&buf[..len]).unwrap(), ControlEvent::ModeToggle.into());
    }

    #[tokio::test]
    async fn test_send_without_listener_counts_failure() {
        let dir = tempfile::tempdir().unwrap();
        let diagnostics = Arc::new(DiagnosticCounters::new());
        let mut sender = IpcSender::new(
            dir.path().join("absent.sock"),
            CommandSource::Network,
            Arc::clone(&diagnostics),
        )
        .unwrap();

        assert!(!sender.send(&ControlEvent::EmergencyStopToggle.into()));
        assert!(!sender.send(&ControlEvent::EmergencyStopToggle.into()));
        assert_eq!(diagnostics.snapshot().send_failures, 2);
    }

    #[test]
    fn test_send_to_stalled_receiver_drops_instead_of_waiting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stalled.sock");
        let _receiver = UnixDatagram::bind(&path).unwrap();
        let diagnostics = Arc::new(DiagnosticCounters::new());
        let mut sender =
            IpcSender::new(&path, CommandSource::Joystick, Arc::clone(&diagnostics)).unwrap();

        let event: Message = ControlEvent::ModeToggle.into();
        let started = Instant::now();
        let delivered = (0..1000).filter(|_| sender.send(&event)).count();

        assert!(started.elapsed() < Duration::from_secs(1));
        let snap = diagnostics.snapshot();
        assert!(delivered < 1000);
        assert_eq!(snap.sends_dropped as usize, 1000 - delivered);
        assert_eq!(snap.send_failures, 0);
    }
}
