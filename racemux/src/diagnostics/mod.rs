//! Diagnostic counters for the control processes.
//!
//! Faults in this system never surface as errors to the driver; the vehicle
//! just goes to neutral. Counters are how an operator finds out *why*. They
//! are lock-free atomics so the hot paths (arbiter tick, packet decode) pay a
//! single relaxed increment.
//!
//! # Architecture
//!
//! ```text
//! Arbiter / Producers ─────► DiagnosticCounters ─────► DiagnosticsSnapshot ─────► log lines
//!                            (atomic counters)         (point-in-time copy)
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters shared by a process's components.
#[derive(Debug, Default)]
pub struct DiagnosticCounters {
    messages_received: AtomicU64,
    messages_dropped: AtomicU64,
    commands_reordered: AtomicU64,
    commands_applied: AtomicU64,
    stale_ticks: AtomicU64,
    estop_ticks: AtomicU64,
    adjustments_applied: AtomicU64,
    adjustments_clamped: AtomicU64,
    packets_received: AtomicU64,
    packets_rejected: AtomicU64,
    sequence_gaps: AtomicU64,
    samples_dropped: AtomicU64,
    send_failures: AtomicU64,
    sends_dropped: AtomicU64,
}

macro_rules! counter {
    ($field:ident, $inc:ident, $doc:literal) => {
        #[doc = $doc]
        pub fn $inc(&self) {
            self.$field.fetch_add(1, Ordering::Relaxed);
        }
    };
}

impl DiagnosticCounters {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    counter!(messages_received, message_received, "An IPC datagram arrived.");
    counter!(messages_dropped, message_dropped, "An IPC datagram failed to decode.");
    counter!(commands_reordered, command_reordered, "A command older than the stored one was ignored.");
    counter!(commands_applied, command_applied, "A tick actuated a fresh command.");
    counter!(stale_ticks, stale_tick, "A tick fell back to neutral for lack of a fresh command.");
    counter!(estop_ticks, estop_tick, "A tick was forced to neutral by the emergency stop.");
    counter!(adjustments_applied, adjustment_applied, "A calibration adjustment changed the anchor.");
    counter!(adjustments_clamped, adjustment_clamped, "A calibration adjustment hit the anchor bounds.");
    counter!(packets_received, packet_received, "A wire packet was accepted.");
    counter!(packets_rejected, packet_rejected, "A wire packet failed validation or was stale.");
    counter!(samples_dropped, sample_dropped, "A telemetry sample was rejected before the window.");
    counter!(send_failures, send_failed, "A producer could not hand a message to the arbiter.");
    counter!(sends_dropped, send_dropped, "A message was dropped because the arbiter's queue was full.");

    /// Add `gap` missing sequence numbers.
    pub fn sequence_gap(&self, gap: u64) {
        self.sequence_gaps.fetch_add(gap, Ordering::Relaxed);
    }

    /// Take a point-in-time copy of all counters.
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            commands_reordered: self.commands_reordered.load(Ordering::Relaxed),
            commands_applied: self.commands_applied.load(Ordering::Relaxed),
            stale_ticks: self.stale_ticks.load(Ordering::Relaxed),
            estop_ticks: self.estop_ticks.load(Ordering::Relaxed),
            adjustments_applied: self.adjustments_applied.load(Ordering::Relaxed),
            adjustments_clamped: self.adjustments_clamped.load(Ordering::Relaxed),
            packets_received: self.packets_received.load(Ordering::Relaxed),
            packets_rejected: self.packets_rejected.load(Ordering::Relaxed),
            sequence_gaps: self.sequence_gaps.load(Ordering::Relaxed),
            samples_dropped: self.samples_dropped.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            sends_dropped: self.sends_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`DiagnosticCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosticsSnapshot {
    pub messages_received: u64,
    pub messages_dropped: u64,
    pub commands_reordered: u64,
    pub commands_applied: u64,
    pub stale_ticks: u64,
    pub estop_ticks: u64,
    pub adjustments_applied: u64,
    pub adjustments_clamped: u64,
    pub packets_received: u64,
    pub packets_rejected: u64,
    pub sequence_gaps: u64,
    pub samples_dropped: u64,
    pub send_failures: u64,
    pub sends_dropped: u64,
}

impl DiagnosticsSnapshot {
    /// Emit the snapshot as one structured log line.
    pub fn log(&self, role: &str) {
        tracing::info!(
            role,
            messages_received = self.messages_received,
            messages_dropped = self.messages_dropped,
            commands_reordered = self.commands_reordered,
            commands_applied = self.commands_applied,
            stale_ticks = self.stale_ticks,
            estop_ticks = self.estop_ticks,
            adjustments_applied = self.adjustments_applied,
            adjustments_clamped = self.adjustments_clamped,
            packets_received = self.packets_received,
            packets_rejected = self.packets_rejected,
            sequence_gaps = self.sequence_gaps,
            samples_dropped = self.samples_dropped,
            send_failures = self.send_failures,
            sends_dropped = self.sends_dropped,
            "Diagnostics"
        );
    }
}
