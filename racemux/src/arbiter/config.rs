//! Configuration for the arbiter process.
//!
//! # Example Configuration (INI)
//!
//! ```ini
//! [arbiter]
//! tick_ms = 10
//! joystick_timeout_ms = 500
//! network_timeout_ms = 1200
//!
//! [mapping]
//! low_anchor = 0.331
//! high_anchor = 0.341
//! min_high_anchor = 0.25
//! max_high_anchor = 0.48
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::actuator::EscProfile;
use crate::command::CommandSource;

/// Default IPC socket path shared by the arbiter and all producers.
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/racemux_ctrl.sock";

/// Default arbiter tick period.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(10);

/// Default freshness window for joystick commands.
///
/// The joystick sits on a local link that publishes at ~30 Hz, so half a
/// second of silence means the producer is gone.
pub const DEFAULT_JOYSTICK_TIMEOUT: Duration = Duration::from_millis(500);

/// Default freshness window for network commands.
///
/// Longer than the joystick's: Wi-Fi drops bursts of packets routinely, and it
/// must exceed the network producer's own watchdog (1.0 s) so the producer's
/// neutral command arrives before the arbiter declares the source stale.
pub const DEFAULT_NETWORK_TIMEOUT: Duration = Duration::from_millis(1200);

/// Default cap on datagrams processed per tick.
pub const DEFAULT_MAX_DRAIN: usize = 64;

/// Configuration for the arbiter process.
#[derive(Debug, Clone)]
pub struct ArbiterConfig {
    /// IPC socket the arbiter binds.
    pub socket_path: PathBuf,

    /// Period of the actuation loop.
    pub tick_interval: Duration,

    /// Maximum age of an authoritative joystick command.
    pub joystick_timeout: Duration,

    /// Maximum age of an authoritative network command.
    pub network_timeout: Duration,

    /// Upper bound on datagrams drained per tick.
    pub max_drain: usize,

    /// How often diagnostics are logged while running.
    pub diagnostics_interval: Duration,

    /// Speed-to-throttle mapping and anchor bounds.
    pub mapping: MappingConfig,

    /// Steering-to-throttle compensation.
    pub compensation: CompensationConfig,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            tick_interval: DEFAULT_TICK_INTERVAL,
            joystick_timeout: DEFAULT_JOYSTICK_TIMEOUT,
            network_timeout: DEFAULT_NETWORK_TIMEOUT,
            max_drain: DEFAULT_MAX_DRAIN,
            diagnostics_interval: Duration::from_secs(5),
            mapping: MappingConfig::default(),
            compensation: CompensationConfig::default(),
        }
    }
}

impl ArbiterConfig {
    /// Freshness window for commands from `source`.
    pub fn timeout_for(&self, source: CommandSource) -> Duration {
        match source {
            CommandSource::Joystick => self.joystick_timeout,
            CommandSource::Network => self.network_timeout,
        }
    }

    /// Set the IPC socket path.
    pub fn with_socket_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.socket_path = path.into();
        self
    }

    /// Set the tick period.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Set both freshness windows.
    pub fn with_timeouts(mut self, joystick: Duration, network: Duration) -> Self {
        self.joystick_timeout = joystick;
        self.network_timeout = network;
        self
    }

    /// Replace the mapping configuration.
    pub fn with_mapping(mut self, mapping: MappingConfig) -> Self {
        self.mapping = mapping;
        self
    }

    /// Replace the compensation configuration.
    pub fn with_compensation(mut self, compensation: CompensationConfig) -> Self {
        self.compensation = compensation;
        self
    }
}

/// Speed-to-throttle mapping parameters.
///
/// Anchors are physical ESC values measured on the vehicle: at `low_speed`
/// the car needs `low_anchor`, at `high_speed` it needs `high_anchor`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MappingConfig {
    /// Speed intent of the low anchor.
    pub low_speed: f32,

    /// Speed intent of the high anchor.
    pub high_speed: f32,

    /// Physical throttle at `low_speed`.
    pub low_anchor: f32,

    /// Physical throttle at `high_speed` (the calibrated parameter).
    pub high_anchor: f32,

    /// Lowest value calibration may push `high_anchor` to.
    pub min_high_anchor: f32,

    /// Highest value calibration may push `high_anchor` to.
    pub max_high_anchor: f32,

    /// ESC neutral/gain used to normalize physical values.
    pub esc: EscProfile,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            low_speed: 1.0,
            high_speed: 5.0,
            low_anchor: 0.331,
            high_anchor: 0.341,
            min_high_anchor: 0.25,
            max_high_anchor: 0.48,
            esc: EscProfile::default(),
        }
    }
}

impl MappingConfig {
    /// Set both anchors.
    pub fn with_anchors(mut self, low: f32, high: f32) -> Self {
        self.low_anchor = low;
        self.high_anchor = high;
        self
    }

    /// Set the bounds calibration may move the high anchor within.
    pub fn with_anchor_bounds(mut self, min: f32, max: f32) -> Self {
        self.min_high_anchor = min;
        self.max_high_anchor = max;
        self
    }
}

/// Direction-specific throttle boost while steering.
///
/// Scrubbing the front tyres through a turn costs speed; past `deadband`,
/// positive throttle is increased by `gain × (|steering| − deadband)`.
/// Left and right differ because the steering linkage is not symmetric.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CompensationConfig {
    /// Steering magnitude below which no compensation is applied.
    pub deadband: f32,

    /// Gain for negative (left) steering.
    pub left_gain: f32,

    /// Gain for positive (right) steering.
    pub right_gain: f32,
}

impl CompensationConfig {
    /// Whether compensation would ever change the throttle.
    pub fn is_enabled(&self) -> bool {
        self.left_gain != 0.0 || self.right_gain != 0.0
    }

    /// Compensated throttle for the given steering.
    pub fn apply(&self, steering: f32, throttle: f32) -> f32 {
        if !self.is_enabled() || throttle <= 0.0 {
            return throttle;
        }
        let excess = steering.abs() - self.deadband;
        if excess <= 0.0 {
            return throttle;
        }
        let gain = if steering < 0.0 {
            self.left_gain
        } else {
            self.right_gain
        };
        throttle + gain * excess
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts_are_asymmetric() {
        let config = ArbiterConfig::default();
        assert!(config.network_timeout > config.joystick_timeout);
        assert_eq!(config.timeout_for(CommandSource::Joystick), Duration::from_millis(500));
        assert_eq!(config.timeout_for(CommandSource::Network), Duration::from_millis(1200));
    }

    #[test]
    fn test_builder_methods() {
        let config = ArbiterConfig::default()
            .with_socket_path("/tmp/x.sock")
            .with_tick_interval(Duration::from_millis(20))
            .with_timeouts(Duration::from_millis(100), Duration::from_millis(300))
            .with_mapping(MappingConfig::default().with_anchors(0.33, 0.34));

        assert_eq!(config.socket_path, PathBuf::from("/tmp/x.sock"));
        assert_eq!(config.tick_interval, Duration::from_millis(20));
        assert_eq!(config.joystick_timeout, Duration::from_millis(100));
        assert_eq!(config.mapping.low_anchor, 0.33);
        assert_eq!(config.mapping.high_anchor, 0.34);
    }

    #[test]
    fn test_compensation_disabled_by_default() {
        let comp = CompensationConfig::default();
        assert!(!comp.is_enabled());
        assert_eq!(comp.apply(0.9, 0.3), 0.3);
    }

    #[test]
    fn test_compensation_is_direction_specific() {
        let comp = CompensationConfig {
            deadband: 0.2,
            left_gain: 0.1,
            right_gain: 0.05,
        };
        assert_eq!(comp.apply(0.1, 0.3), 0.3);
        assert!((comp.apply(-0.6, 0.3) - 0.34).abs() < 1e-6);
        assert!((comp.apply(0.6, 0.3) - 0.32).abs() < 1e-6);
    }

    #[test]
    fn test_compensation_never_applies_to_braking() {
        let comp = CompensationConfig {
            deadband: 0.0,
            left_gain: 0.5,
            right_gain: 0.5,
        };
        assert_eq!(comp.apply(1.0, 0.0), 0.0);
        assert_eq!(comp.apply(1.0, -0.2), -0.2);
    }
}
