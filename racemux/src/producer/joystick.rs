//! Joystick producer: gamepad axes and buttons to commands and events.
//!
//! # Axis shaping
//!
//! ```text
//!  raw ──► deadzone ──► invert? ──► scale ──► clamp [-1, 1]
//!
//!  throttle > 0:  thr × throttle_scale
//!  throttle < 0:  reverse_start + thr × throttle_scale   (ESC needs a kick to engage reverse)
//!  throttle = 0:  0
//! ```
//!
//! Buttons are edge-triggered: holding a button sends one event, and a
//! second press within the debounce window is ignored.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::device::JoystickDevice;
use super::link::IpcSender;
use crate::clock::monotonic_secs;
use crate::command::{Command, ControlEvent, Message};
use crate::diagnostics::{DiagnosticCounters, DiagnosticsSnapshot};
use crate::error::{Result, ServiceError};

/// Default joystick device node.
pub const DEFAULT_JOYSTICK_DEVICE: &str = "/dev/input/js0";

/// Default producer cadence (~30 Hz).
pub const DEFAULT_PUBLISH_INTERVAL: Duration = Duration::from_millis(33);

/// Joystick producer settings.
#[derive(Debug, Clone, PartialEq)]
pub struct JoystickConfig {
    pub device: PathBuf,
    pub steer_axis: u8,
    pub throttle_axis: u8,
    pub invert_steering: bool,
    pub invert_throttle: bool,
    pub deadzone: f32,
    pub steer_scale: f32,
    pub throttle_scale: f32,

    /// Normalized throttle at which the ESC starts reversing.
    pub reverse_start: f32,

    pub toggle_button: u8,
    pub estop_button: u8,

    /// Minimum time between accepted presses of the same button.
    pub debounce: Duration,

    pub publish_interval: Duration,
}

impl Default for JoystickConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from(DEFAULT_JOYSTICK_DEVICE),
            steer_axis: 0,
            throttle_axis: 4,
            invert_steering: false,
            invert_throttle: true,
            deadzone: 0.08,
            steer_scale: 1.0,
            throttle_scale: 0.125,
            reverse_start: -0.25,
            toggle_button: 5,
            estop_button: 4,
            debounce: Duration::from_millis(200),
            publish_interval: DEFAULT_PUBLISH_INTERVAL,
        }
    }
}

impl JoystickConfig {
    pub fn with_device(mut self, device: impl Into<PathBuf>) -> Self {
        self.device = device.into();
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Shape a raw steering axis reading.
    pub fn shape_steering(&self, raw: f32) -> f32 {
        let mut steer = apply_deadzone(raw, self.deadzone);
        if self.invert_steering {
            steer = -steer;
        }
        (steer * self.steer_scale).clamp(-1.0, 1.0)
    }

    /// Shape a raw throttle axis reading into normalized throttle.
    pub fn shape_throttle(&self, raw: f32) -> f32 {
        let mut thr = apply_deadzone(raw, self.deadzone);
        if self.invert_throttle {
            thr = -thr;
        }
        let throttle = if thr > 0.0 {
            thr * self.throttle_scale
        } else if thr < 0.0 {
            self.reverse_start + thr * self.throttle_scale
        } else {
            0.0
        };
        throttle.clamp(-1.0, 1.0)
    }
}

fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    if !value.is_finite() || value.abs() < deadzone {
        0.0
    } else {
        value
    }
}

/// Debounced rising-edge detector for one button.
#[derive(Debug, Clone)]
pub struct EdgeDetector {
    debounce: Duration,
    pressed: bool,
    last_accepted: Option<Instant>,
}

impl EdgeDetector {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            pressed: false,
            last_accepted: None,
        }
    }

    /// Feed the current button level; returns `true` on an accepted press.
    pub fn update(&mut self, pressed: bool, now: Instant) -> bool {
        let rising = pressed && !self.pressed;
        self.pressed = pressed;
        if !rising {
            return false;
        }
        let settled = self
            .last_accepted
            .map_or(true, |at| now.saturating_duration_since(at) >= self.debounce);
        if settled {
            self.last_accepted = Some(now);
        }
        settled
    }
}

/// Reads a [`JoystickDevice`] and publishes to the arbiter.
pub struct JoystickProducer<D: JoystickDevice> {
    config: JoystickConfig,
    device: D,
    sender: IpcSender,
    toggle: EdgeDetector,
    estop: EdgeDetector,
    diagnostics: Arc<DiagnosticCounters>,
}

impl<D: JoystickDevice> JoystickProducer<D> {
    pub fn new(
        config: JoystickConfig,
        device: D,
        sender: IpcSender,
        diagnostics: Arc<DiagnosticCounters>,
    ) -> Self {
        let toggle = EdgeDetector::new(config.debounce);
        let estop = EdgeDetector::new(config.debounce);
        Self {
            config,
            device,
            sender,
            toggle,
            estop,
            diagnostics,
        }
    }

    /// Turn the device's current state into events and one command.
    ///
    /// Events come first so an e-stop press is never queued behind the
    /// command sampled in the same cycle.
    pub fn sample(&mut self, now: Instant, timestamp: f64) -> Vec<Message> {
        let mut out = Vec::with_capacity(3);

        if self.toggle.update(self.device.button(self.config.toggle_button), now) {
            info!("Mode toggle pressed");
            out.push(ControlEvent::ModeToggle.into());
        }
        if self.estop.update(self.device.button(self.config.estop_button), now) {
            warn!("Emergency stop pressed");
            out.push(ControlEvent::EmergencyStopToggle.into());
        }

        let steering = self.config.shape_steering(self.device.axis(self.config.steer_axis));
        let throttle = self.config.shape_throttle(self.device.axis(self.config.throttle_axis));
        out.push(Command::joystick(steering, throttle, timestamp).into());
        out
    }

    /// Publish until `shutdown` is cancelled or the device disappears.
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<DiagnosticsSnapshot> {
        info!(
            device = %self.config.device.display(),
            socket = %self.sender.target().display(),
            interval_ms = self.config.publish_interval.as_millis() as u64,
            "Joystick producer started"
        );

        let mut ticker = tokio::time::interval(self.config.publish_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let outcome = loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break Ok(()),
                _ = ticker.tick() => {}
            }

            if let Err(source) = self.device.poll() {
                break Err(ServiceError::Device {
                    path: self.config.device.clone(),
                    source,
                });
            }

            for message in self.sample(Instant::now(), monotonic_secs()) {
                if let Message::Command(cmd) = &message {
                    debug!(
                        steering = format!("{:+.3}", cmd.steering),
                        throttle = format!("{:+.3}", cmd.throttle_norm().unwrap_or_default()),
                        "Joystick command"
                    );
                }
                self.sender.send(&message);
            }
        };

        let snapshot = self.diagnostics.snapshot();
        match &outcome {
            Ok(()) => info!("Joystick producer stopped"),
            Err(e) => warn!(error = %e, "Joystick producer lost its device"),
        }
        snapshot.log("joystick");
        outcome.map(|()| snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandSource;
    use std::io;

    #[derive(Default)]
    struct FakePad {
        axes: [f32; 8],
        buttons: [bool; 8],
    }

    impl JoystickDevice for FakePad {
        fn poll(&mut self) -> io::Result<()> {
            Ok(())
        }
        fn axis(&self, index: u8) -> f32 {
            self.axes[usize::from(index)]
        }
        fn button(&self, index: u8) -> bool {
            self.buttons[usize::from(index)]
        }
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_deadzone_and_scaling() {
        let config = JoystickConfig::default();
        assert_eq!(config.shape_steering(0.05), 0.0);
        assert!(approx(config.shape_steering(0.5), 0.5));
        assert_eq!(config.shape_throttle(-0.07), 0.0);
    }

    #[test]
    fn test_throttle_is_inverted_by_default() {
        let config = JoystickConfig::default();
        // Stick pushed forward reads negative on most pads.
        assert!(approx(config.shape_throttle(-1.0), 0.125));
        assert!(approx(config.shape_throttle(1.0), -0.25 - 0.125));
    }

    #[test]
    fn test_steering_inversion_and_clamp() {
        let config = JoystickConfig {
            invert_steering: true,
            steer_scale: 2.0,
            ..JoystickConfig::default()
        };
        assert_eq!(config.shape_steering(0.9), -1.0);
        assert_eq!(config.shape_steering(f32::NAN), 0.0);
    }

    #[test]
    fn test_edge_detector_fires_once_per_press() {
        let t0 = Instant::now();
        let mut edge = EdgeDetector::new(Duration::from_millis(200));
        assert!(edge.update(true, t0));
        assert!(!edge.update(true, t0 + Duration::from_millis(30)));
        assert!(!edge.update(false, t0 + Duration::from_millis(60)));
    }

    #[test]
    fn test_edge_detector_debounces_rapid_presses() {
        let t0 = Instant::now();
        let mut edge = EdgeDetector::new(Duration::from_millis(200));
        assert!(edge.update(true, t0));
        edge.update(false, t0 + Duration::from_millis(50));
        assert!(!edge.update(true, t0 + Duration::from_millis(100)));
        edge.update(false, t0 + Duration::from_millis(150));
        assert!(edge.update(true, t0 + Duration::from_millis(250)));
    }

    #[tokio::test]
    async fn test_sample_emits_events_before_command() {
        let dir = tempfile::tempdir().unwrap();
        let sender = IpcSender::new(dir.path().join("ctrl.sock"), CommandSource::Joystick, Arc::default()).unwrap();
        let mut pad = FakePad::default();
        pad.buttons[4] = true;
        pad.axes[0] = 0.4;
        let mut producer = JoystickProducer::new(JoystickConfig::default(), pad, sender, Arc::default());

        let messages = producer.sample(Instant::now(), 12.5);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], ControlEvent::EmergencyStopToggle.into());
        assert_eq!(messages[1], Command::joystick(0.4, 0.0, 12.5).into());

        let again = producer.sample(Instant::now(), 12.6);
        assert_eq!(again.len(), 1);
    }
}
