//! Network producer: UDP wire packets to speed commands, plus calibration.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────── NetworkProducer ─────────────────────────────┐
//! │                                                                           │
//! │  UdpSocket ──► WirePacket::decode ──► LinkMonitor ──► Command(speed) ──┐  │
//! │   (drain all)        │ bad              (sequence,      or neutral     │  │
//! │                      ▼                   coalesce,      (watchdog)     │  │
//! │                   counted                watchdog)                      ├──► IpcSender
//! │                                                                         │  │
//! │  TelemetrySource ──► ThrottleCalibrator ──► CalibrationAdjust ─────────┘  │
//! │                              │                                            │
//! │                              └──► CalibrationLogger (optional)            │
//! └───────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each cycle publishes at most one command: the latest accepted packet. The
//! watchdog publishes a single neutral command when packets stop, well before
//! the arbiter's own network timeout would expire.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::net::UdpSocket;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::joystick::DEFAULT_PUBLISH_INTERVAL;
use super::link::IpcSender;
use super::packet::{SequenceCheck, SequenceTracker, SpeedEncoding, WirePacket};
use crate::calibration::{CalibrationLogger, CalibrationRecord, ThrottleCalibrator};
use crate::clock::monotonic_secs;
use crate::command::{Command, Message};
use crate::diagnostics::{DiagnosticCounters, DiagnosticsSnapshot};
use crate::error::{Result, ServiceError};
use crate::telemetry::{ObservationSample, TelemetrySource};

/// Default UDP listen address.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5555";

/// Default silence after which the watchdog publishes neutral.
pub const DEFAULT_WATCHDOG: Duration = Duration::from_secs(1);

const MAX_DATAGRAM: usize = 64;

/// Network producer settings.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkConfig {
    pub bind_addr: String,
    pub speed_encoding: SpeedEncoding,
    pub steer_gain: f32,
    pub invert_steering: bool,

    /// Packets with a larger speed are rejected.
    pub max_speed: f32,

    pub publish_interval: Duration,
    pub watchdog: Duration,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            speed_encoding: SpeedEncoding::default(),
            steer_gain: 1.0,
            invert_steering: false,
            max_speed: 10.0,
            publish_interval: DEFAULT_PUBLISH_INTERVAL,
            watchdog: DEFAULT_WATCHDOG,
        }
    }
}

impl NetworkConfig {
    pub fn with_bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    pub fn with_watchdog(mut self, watchdog: Duration) -> Self {
        self.watchdog = watchdog;
        self
    }

    /// Apply gain and inversion to raw packet steering.
    pub fn shape_steering(&self, raw: f32) -> f32 {
        let sign = if self.invert_steering { -1.0 } else { 1.0 };
        (raw * self.steer_gain * sign).clamp(-1.0, 1.0)
    }
}

/// What to publish at the end of a cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Publish {
    /// The newest packet accepted this cycle.
    Packet(WirePacket),
    /// The watchdog expired; send neutral once.
    Neutral,
    /// Nothing new.
    Idle,
}

/// Sequence handling, coalescing and the link watchdog.
#[derive(Debug)]
pub struct LinkMonitor {
    tracker: SequenceTracker,
    pending: Option<WirePacket>,
    last_accepted: Instant,
    watchdog: Duration,
    watchdog_fired: bool,
    diagnostics: Arc<DiagnosticCounters>,
}

impl LinkMonitor {
    /// Start monitoring; the watchdog counts from `now`.
    pub fn new(watchdog: Duration, now: Instant, diagnostics: Arc<DiagnosticCounters>) -> Self {
        Self {
            tracker: SequenceTracker::new(),
            pending: None,
            last_accepted: now,
            watchdog,
            watchdog_fired: false,
            diagnostics,
        }
    }

    /// Offer a decoded packet. Returns whether it was accepted.
    pub fn offer(&mut self, packet: WirePacket, now: Instant) -> bool {
        match self.tracker.check(packet.sequence) {
            SequenceCheck::Stale => {
                self.diagnostics.packet_rejected();
                debug!(sequence = packet.sequence, "Dropping stale packet");
                return false;
            }
            SequenceCheck::Gap(gap) => {
                self.diagnostics.sequence_gap(gap);
                debug!(sequence = packet.sequence, gap, "Sequence gap");
            }
            SequenceCheck::Restart => {
                info!(sequence = packet.sequence, "Sender restarted its sequence");
            }
            SequenceCheck::First | SequenceCheck::InOrder => {}
        }

        self.diagnostics.packet_received();
        if self.watchdog_fired {
            info!(sequence = packet.sequence, "Network link restored");
            self.watchdog_fired = false;
        }
        self.pending = Some(packet);
        self.last_accepted = now;
        true
    }

    /// Decide what this cycle publishes.
    pub fn take(&mut self, now: Instant) -> Publish {
        if let Some(packet) = self.pending.take() {
            return Publish::Packet(packet);
        }
        if !self.watchdog_fired && now.saturating_duration_since(self.last_accepted) >= self.watchdog {
            self.watchdog_fired = true;
            self.tracker.reset();
            warn!(
                silence_ms = now.saturating_duration_since(self.last_accepted).as_millis() as u64,
                "Network watchdog expired, sending neutral"
            );
            return Publish::Neutral;
        }
        Publish::Idle
    }

    /// Whether packets are currently arriving.
    pub fn is_live(&self) -> bool {
        !self.watchdog_fired
    }
}

/// Receives wire packets, publishes speed commands and runs the calibrator.
pub struct NetworkProducer<T: TelemetrySource> {
    config: NetworkConfig,
    socket: UdpSocket,
    sender: IpcSender,
    telemetry: T,
    calibrator: Option<ThrottleCalibrator>,
    calibration_log: Option<CalibrationLogger>,
    diagnostics: Arc<DiagnosticCounters>,
}

impl<T: TelemetrySource> NetworkProducer<T> {
    /// Bind the UDP listener.
    pub async fn bind(
        config: NetworkConfig,
        sender: IpcSender,
        telemetry: T,
        diagnostics: Arc<DiagnosticCounters>,
    ) -> Result<Self> {
        let socket = UdpSocket::bind(&config.bind_addr)
            .await
            .map_err(|source| ServiceError::BindUdp {
                addr: config.bind_addr.clone(),
                source,
            })?;
        Ok(Self {
            config,
            socket,
            sender,
            telemetry,
            calibrator: None,
            calibration_log: None,
            diagnostics,
        })
    }

    /// Run `calibrator` on telemetry while packets are live.
    pub fn with_calibrator(mut self, calibrator: ThrottleCalibrator) -> Self {
        self.calibrator = Some(calibrator);
        self
    }

    /// Record calibrator evaluations to `logger`.
    pub fn with_calibration_log(mut self, logger: CalibrationLogger) -> Self {
        self.calibration_log = Some(logger);
        self
    }

    /// Address the UDP listener is bound to.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Publish until `shutdown` is cancelled.
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<DiagnosticsSnapshot> {
        info!(
            bind = %self.config.bind_addr,
            socket = %self.sender.target().display(),
            encoding = %self.config.speed_encoding,
            calibration = self.calibrator.is_some(),
            "Network producer started"
        );

        let mut monitor = LinkMonitor::new(
            self.config.watchdog,
            Instant::now(),
            Arc::clone(&self.diagnostics),
        );
        let mut ticker = tokio::time::interval(self.config.publish_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut commanded_speed: Option<f32> = None;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let now = Instant::now();
            self.drain(&mut monitor, now);

            match monitor.take(now) {
                Publish::Packet(packet) => {
                    let steering = self.config.shape_steering(packet.steering);
                    commanded_speed = Some(packet.speed);
                    let command = Command::network(steering, packet.speed, monotonic_secs());
                    self.sender.send(&command.into());
                }
                Publish::Neutral => {
                    commanded_speed = None;
                    let command = Command::network(0.0, 0.0, monotonic_secs());
                    self.sender.send(&command.into());
                }
                Publish::Idle => {}
            }

            if monitor.is_live() {
                if let Some(speed) = commanded_speed {
                    self.calibrate(speed);
                }
            }
        }

        info!("Network producer stopped");
        let snapshot = self.diagnostics.snapshot();
        snapshot.log("network");
        Ok(snapshot)
    }

    fn drain(&mut self, monitor: &mut LinkMonitor, now: Instant) {
        let mut buf = [0u8; MAX_DATAGRAM];
        loop {
            let len = match self.socket.try_recv_from(&mut buf) {
                Ok((len, _)) => len,
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => return,
                Err(e) => {
                    warn!(error = %e, "UDP receive failed");
                    return;
                }
            };
            match WirePacket::decode(&buf[..len], self.config.speed_encoding, self.config.max_speed) {
                Ok(packet) => {
                    monitor.offer(packet, now);
                }
                Err(e) => {
                    self.diagnostics.packet_rejected();
                    debug!(error = %e, "Rejecting wire packet");
                }
            }
        }
    }

    fn calibrate(&mut self, commanded_speed: f32) {
        let Some(calibrator) = self.calibrator.as_mut() else {
            return;
        };
        let reading = self.telemetry.read();
        let Some(observed) = reading.observed_speed else {
            return;
        };

        let sample = ObservationSample {
            commanded_speed,
            observed_speed: observed,
            timestamp: monotonic_secs(),
        };
        let Some(evaluation) = calibrator.observe(sample) else {
            return;
        };

        if let Some(logger) = self.calibration_log.as_mut() {
            let record = CalibrationRecord::evaluation(&evaluation, calibrator.config())
                .with_battery_voltage(reading.battery_voltage)
                .with_lost_packets(self.diagnostics.snapshot().sequence_gaps);
            if let Err(e) = logger.record(&record) {
                warn!(error = %e, "Calibration log write failed, disabling log");
                self.calibration_log = None;
            }
        }

        if let Some(event) = evaluation.event {
            self.sender.send(&Message::Event(event));
        }
    }
}
