//! INI configuration file.
//!
//! Every process reads the same file, by default
//! `$XDG_CONFIG_HOME/racemux/config.ini`. A missing file means defaults,
//! unknown keys are ignored, and a value that does not parse is an error
//! naming its `section.key`.
//!
//! # Example
//!
//! ```ini
//! [ipc]
//! socket_path = /tmp/racemux_ctrl.sock
//!
//! [mapping]
//! high_anchor = 0.341
//!
//! [calibration]
//! window_size = 16
//! decrement_step = 0.001
//! log_dir = /var/log/racemux
//!
//! [network]
//! bind_addr = 0.0.0.0:5555
//! speed_encoding = int
//! ```
//!
//! Values are addressed from the CLI as `section.key` through [`ConfigKey`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use crate::arbiter::ArbiterConfig;
use crate::calibration::CalibratorConfig;
use crate::producer::{JoystickConfig, NetworkConfig, SpeedEncoding};
use crate::telemetry::{FileTelemetry, DEFAULT_SPEED_PATH, DEFAULT_VOLTAGE_PATH};

/// Errors loading, saving or editing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read { path: PathBuf, source: ini::Error },

    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Default config file location.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("racemux")
        .join("config.ini")
}

/// Telemetry file locations.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySettings {
    pub speed_path: PathBuf,
    pub voltage_path: PathBuf,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            speed_path: PathBuf::from(DEFAULT_SPEED_PATH),
            voltage_path: PathBuf::from(DEFAULT_VOLTAGE_PATH),
        }
    }
}

impl TelemetrySettings {
    pub fn source(&self) -> FileTelemetry {
        FileTelemetry::new(&self.speed_path, &self.voltage_path)
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Default filter directive; `RUST_LOG` overrides it.
    pub level: String,
    /// Also write daily log files here.
    pub dir: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
        }
    }
}

/// Complete configuration for every process role.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    /// Arbiter settings; its `socket_path` is the shared IPC socket.
    pub arbiter: ArbiterConfig,
    pub calibration: CalibratorConfig,
    /// Write calibration CSV logs here.
    pub calibration_log_dir: Option<PathBuf>,
    pub network: NetworkConfig,
    pub joystick: JoystickConfig,
    pub telemetry: TelemetrySettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Load from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::default();
        if !path.exists() {
            return Ok(config);
        }

        let ini = Ini::load_from_file(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        for key in ConfigKey::all() {
            if let Some(value) = ini.get_from(Some(key.section()), key.key_name()) {
                key.set(&mut config, value)?;
            }
        }
        Ok(config)
    }

    /// Save to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_file_path())
    }

    /// Write every set value to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            let value = key.get(self);
            if !value.is_empty() {
                ini.with_section(Some(key.section())).set(key.key_name(), value);
            }
        }

        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        ini.write_to_file(path).map_err(write_err)
    }

    /// Shared IPC socket path.
    pub fn socket_path(&self) -> &Path {
        &self.arbiter.socket_path
    }
}

const KEYS: &[(&str, &str)] = &[
    ("ipc", "socket_path"),
    ("arbiter", "tick_ms"),
    ("arbiter", "joystick_timeout_ms"),
    ("arbiter", "network_timeout_ms"),
    ("arbiter", "max_drain"),
    ("arbiter", "diagnostics_interval_secs"),
    ("mapping", "low_speed"),
    ("mapping", "high_speed"),
    ("mapping", "low_anchor"),
    ("mapping", "high_anchor"),
    ("mapping", "min_high_anchor"),
    ("mapping", "max_high_anchor"),
    ("mapping", "esc_neutral"),
    ("mapping", "esc_gain"),
    ("mapping", "max_throttle"),
    ("mapping", "steering_gain"),
    ("mapping", "steering_offset"),
    ("mapping", "voltage_compensation"),
    ("mapping", "reference_voltage"),
    ("compensation", "deadband"),
    ("compensation", "left_gain"),
    ("compensation", "right_gain"),
    ("calibration", "enabled"),
    ("calibration", "window_size"),
    ("calibration", "cruise_threshold"),
    ("calibration", "speed_threshold"),
    ("calibration", "stall_floor"),
    ("calibration", "speed_max"),
    ("calibration", "near_max_margin"),
    ("calibration", "increment_step"),
    ("calibration", "decrement_step"),
    ("calibration", "max_observed_speed"),
    ("calibration", "log_dir"),
    ("network", "bind_addr"),
    ("network", "speed_encoding"),
    ("network", "steer_gain"),
    ("network", "invert_steering"),
    ("network", "max_speed"),
    ("network", "publish_ms"),
    ("network", "watchdog_ms"),
    ("joystick", "device"),
    ("joystick", "steer_axis"),
    ("joystick", "throttle_axis"),
    ("joystick", "invert_steering"),
    ("joystick", "invert_throttle"),
    ("joystick", "deadzone"),
    ("joystick", "steer_scale"),
    ("joystick", "throttle_scale"),
    ("joystick", "reverse_start"),
    ("joystick", "toggle_button"),
    ("joystick", "estop_button"),
    ("joystick", "debounce_ms"),
    ("joystick", "publish_ms"),
    ("telemetry", "speed_path"),
    ("telemetry", "voltage_path"),
    ("logging", "level"),
    ("logging", "dir"),
];

/// A `section.key` configuration address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigKey {
    section: &'static str,
    key: &'static str,
}

impl ConfigKey {
    /// Every known key, in file order.
    pub fn all() -> impl Iterator<Item = ConfigKey> {
        KEYS.iter().map(|&(section, key)| ConfigKey { section, key })
    }

    pub fn section(&self) -> &'static str {
        self.section
    }

    pub fn key_name(&self) -> &'static str {
        self.key
    }

    /// `section.key`.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section, self.key)
    }

    /// Current value as a string; empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        let a = &config.arbiter;
        let m = &a.mapping;
        let c = &config.calibration;
        let n = &config.network;
        let j = &config.joystick;

        match (self.section, self.key) {
            ("ipc", "socket_path") => a.socket_path.display().to_string(),
            ("arbiter", "tick_ms") => millis(a.tick_interval),
            ("arbiter", "joystick_timeout_ms") => millis(a.joystick_timeout),
            ("arbiter", "network_timeout_ms") => millis(a.network_timeout),
            ("arbiter", "max_drain") => a.max_drain.to_string(),
            ("arbiter", "diagnostics_interval_secs") => a.diagnostics_interval.as_secs().to_string(),
            ("mapping", "low_speed") => m.low_speed.to_string(),
            ("mapping", "high_speed") => m.high_speed.to_string(),
            ("mapping", "low_anchor") => m.low_anchor.to_string(),
            ("mapping", "high_anchor") => m.high_anchor.to_string(),
            ("mapping", "min_high_anchor") => m.min_high_anchor.to_string(),
            ("mapping", "max_high_anchor") => m.max_high_anchor.to_string(),
            ("mapping", "esc_neutral") => m.esc.neutral.to_string(),
            ("mapping", "esc_gain") => m.esc.gain.to_string(),
            ("mapping", "max_throttle") => m.esc.max_throttle.to_string(),
            ("mapping", "steering_gain") => m.esc.steering_gain.to_string(),
            ("mapping", "steering_offset") => m.esc.steering_offset.to_string(),
            ("mapping", "voltage_compensation") => m.esc.voltage_compensation.to_string(),
            ("mapping", "reference_voltage") => m.esc.reference_voltage.to_string(),
            ("compensation", "deadband") => a.compensation.deadband.to_string(),
            ("compensation", "left_gain") => a.compensation.left_gain.to_string(),
            ("compensation", "right_gain") => a.compensation.right_gain.to_string(),
            ("calibration", "enabled") => c.enabled.to_string(),
            ("calibration", "window_size") => c.window_size.to_string(),
            ("calibration", "cruise_threshold") => c.cruise_threshold.to_string(),
            ("calibration", "speed_threshold") => c.speed_threshold.to_string(),
            ("calibration", "stall_floor") => c.stall_floor.to_string(),
            ("calibration", "speed_max") => c.speed_max.to_string(),
            ("calibration", "near_max_margin") => c.near_max_margin.to_string(),
            ("calibration", "increment_step") => c.increment_step.to_string(),
            ("calibration", "decrement_step") => c.decrement_step.to_string(),
            ("calibration", "max_observed_speed") => c.max_observed_speed.to_string(),
            ("calibration", "log_dir") => optional_path(&config.calibration_log_dir),
            ("network", "bind_addr") => n.bind_addr.clone(),
            ("network", "speed_encoding") => n.speed_encoding.to_string(),
            ("network", "steer_gain") => n.steer_gain.to_string(),
            ("network", "invert_steering") => n.invert_steering.to_string(),
            ("network", "max_speed") => n.max_speed.to_string(),
            ("network", "publish_ms") => millis(n.publish_interval),
            ("network", "watchdog_ms") => millis(n.watchdog),
            ("joystick", "device") => j.device.display().to_string(),
            ("joystick", "steer_axis") => j.steer_axis.to_string(),
            ("joystick", "throttle_axis") => j.throttle_axis.to_string(),
            ("joystick", "invert_steering") => j.invert_steering.to_string(),
            ("joystick", "invert_throttle") => j.invert_throttle.to_string(),
            ("joystick", "deadzone") => j.deadzone.to_string(),
            ("joystick", "steer_scale") => j.steer_scale.to_string(),
            ("joystick", "throttle_scale") => j.throttle_scale.to_string(),
            ("joystick", "reverse_start") => j.reverse_start.to_string(),
            ("joystick", "toggle_button") => j.toggle_button.to_string(),
            ("joystick", "estop_button") => j.estop_button.to_string(),
            ("joystick", "debounce_ms") => millis(j.debounce),
            ("joystick", "publish_ms") => millis(j.publish_interval),
            ("telemetry", "speed_path") => config.telemetry.speed_path.display().to_string(),
            ("telemetry", "voltage_path") => config.telemetry.voltage_path.display().to_string(),
            ("logging", "level") => config.logging.level.clone(),
            ("logging", "dir") => optional_path(&config.logging.dir),
            _ => String::new(),
        }
    }

    /// Parse `value` and store it.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<()> {
        let value = value.trim();
        let a = &mut config.arbiter;

        match (self.section, self.key) {
            ("ipc", "socket_path") => a.socket_path = PathBuf::from(value),
            ("arbiter", "tick_ms") => a.tick_interval = self.parse_millis(value)?,
            ("arbiter", "joystick_timeout_ms") => a.joystick_timeout = self.parse_millis(value)?,
            ("arbiter", "network_timeout_ms") => a.network_timeout = self.parse_millis(value)?,
            ("arbiter", "max_drain") => a.max_drain = self.parse_positive(value)?,
            ("arbiter", "diagnostics_interval_secs") => {
                a.diagnostics_interval = Duration::from_secs(self.parse_positive(value)?)
            }
            ("mapping", "low_speed") => a.mapping.low_speed = self.parse_finite(value)?,
            ("mapping", "high_speed") => a.mapping.high_speed = self.parse_finite(value)?,
            ("mapping", "low_anchor") => a.mapping.low_anchor = self.parse_finite(value)?,
            ("mapping", "high_anchor") => a.mapping.high_anchor = self.parse_finite(value)?,
            ("mapping", "min_high_anchor") => a.mapping.min_high_anchor = self.parse_finite(value)?,
            ("mapping", "max_high_anchor") => a.mapping.max_high_anchor = self.parse_finite(value)?,
            ("mapping", "esc_neutral") => a.mapping.esc.neutral = self.parse_finite(value)?,
            ("mapping", "esc_gain") => a.mapping.esc.gain = self.parse_nonzero(value)?,
            ("mapping", "max_throttle") => a.mapping.esc.max_throttle = self.parse_non_negative(value)?,
            ("mapping", "steering_gain") => a.mapping.esc.steering_gain = self.parse_finite(value)?,
            ("mapping", "steering_offset") => a.mapping.esc.steering_offset = self.parse_finite(value)?,
            ("mapping", "voltage_compensation") => a.mapping.esc.voltage_compensation = self.parse_bool(value)?,
            ("mapping", "reference_voltage") => a.mapping.esc.reference_voltage = self.parse_non_negative(value)?,
            ("compensation", "deadband") => a.compensation.deadband = self.parse_non_negative(value)?,
            ("compensation", "left_gain") => a.compensation.left_gain = self.parse_finite(value)?,
            ("compensation", "right_gain") => a.compensation.right_gain = self.parse_finite(value)?,
            ("calibration", "enabled") => config.calibration.enabled = self.parse_bool(value)?,
            ("calibration", "window_size") => config.calibration.window_size = self.parse_positive(value)?,
            ("calibration", "cruise_threshold") => {
                config.calibration.cruise_threshold = self.parse_non_negative(value)?
            }
            ("calibration", "speed_threshold") => {
                config.calibration.speed_threshold = self.parse_non_negative(value)?
            }
            ("calibration", "stall_floor") => config.calibration.stall_floor = self.parse_non_negative(value)?,
            ("calibration", "speed_max") => config.calibration.speed_max = self.parse_non_negative(value)?,
            ("calibration", "near_max_margin") => {
                config.calibration.near_max_margin = self.parse_non_negative(value)?
            }
            ("calibration", "increment_step") => {
                config.calibration.increment_step = self.parse_non_negative(value)?
            }
            ("calibration", "decrement_step") => {
                config.calibration.decrement_step = self.parse_non_negative(value)?
            }
            ("calibration", "max_observed_speed") => {
                config.calibration.max_observed_speed = self.parse_non_negative(value)?
            }
            ("calibration", "log_dir") => config.calibration_log_dir = optional(value),
            ("network", "bind_addr") => config.network.bind_addr = value.to_string(),
            ("network", "speed_encoding") => {
                config.network.speed_encoding = value
                    .parse::<SpeedEncoding>()
                    .map_err(|reason| self.invalid(value, reason))?
            }
            ("network", "steer_gain") => config.network.steer_gain = self.parse_finite(value)?,
            ("network", "invert_steering") => config.network.invert_steering = self.parse_bool(value)?,
            ("network", "max_speed") => config.network.max_speed = self.parse_non_negative(value)?,
            ("network", "publish_ms") => config.network.publish_interval = self.parse_millis(value)?,
            ("network", "watchdog_ms") => config.network.watchdog = self.parse_millis(value)?,
            ("joystick", "device") => config.joystick.device = PathBuf::from(value),
            ("joystick", "steer_axis") => config.joystick.steer_axis = self.parse(value)?,
            ("joystick", "throttle_axis") => config.joystick.throttle_axis = self.parse(value)?,
            ("joystick", "invert_steering") => config.joystick.invert_steering = self.parse_bool(value)?,
            ("joystick", "invert_throttle") => config.joystick.invert_throttle = self.parse_bool(value)?,
            ("joystick", "deadzone") => config.joystick.deadzone = self.parse_non_negative(value)?,
            ("joystick", "steer_scale") => config.joystick.steer_scale = self.parse_finite(value)?,
            ("joystick", "throttle_scale") => config.joystick.throttle_scale = self.parse_finite(value)?,
            ("joystick", "reverse_start") => config.joystick.reverse_start = self.parse_finite(value)?,
            ("joystick", "toggle_button") => config.joystick.toggle_button = self.parse(value)?,
            ("joystick", "estop_button") => config.joystick.estop_button = self.parse(value)?,
            ("joystick", "debounce_ms") => {
                config.joystick.debounce = Duration::from_millis(self.parse(value)?)
            }
            ("joystick", "publish_ms") => config.joystick.publish_interval = self.parse_millis(value)?,
            ("telemetry", "speed_path") => config.telemetry.speed_path = PathBuf::from(value),
            ("telemetry", "voltage_path") => config.telemetry.voltage_path = PathBuf::from(value),
            ("logging", "level") => config.logging.level = value.to_string(),
            ("logging", "dir") => config.logging.dir = optional(value),
            _ => return Err(ConfigError::UnknownKey(self.name())),
        }
        Ok(())
    }

    fn invalid(&self, value: &str, reason: impl Into<String>) -> ConfigError {
        ConfigError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    fn parse<T>(&self, value: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        value.parse::<T>().map_err(|e| self.invalid(value, e.to_string()))
    }

    fn parse_finite(&self, value: &str) -> Result<f32> {
        let v: f32 = self.parse(value)?;
        if v.is_finite() {
            Ok(v)
        } else {
            Err(self.invalid(value, "must be a finite number"))
        }
    }

    fn parse_non_negative(&self, value: &str) -> Result<f32> {
        let v = self.parse_finite(value)?;
        if v >= 0.0 {
            Ok(v)
        } else {
            Err(self.invalid(value, "must not be negative"))
        }
    }

    fn parse_nonzero(&self, value: &str) -> Result<f32> {
        let v = self.parse_finite(value)?;
        if v != 0.0 {
            Ok(v)
        } else {
            Err(self.invalid(value, "must not be zero"))
        }
    }

    fn parse_positive<T>(&self, value: &str) -> Result<T>
    where
        T: FromStr + PartialOrd + Default,
        T::Err: fmt::Display,
    {
        let v: T = self.parse(value)?;
        if v > T::default() {
            Ok(v)
        } else {
            Err(self.invalid(value, "must be greater than zero"))
        }
    }

    fn parse_millis(&self, value: &str) -> Result<Duration> {
        self.parse_positive::<u64>(value).map(Duration::from_millis)
    }

    fn parse_bool(&self, value: &str) -> Result<bool> {
        match value.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(self.invalid(value, "expected true or false")),
        }
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (section, key) = s
            .split_once('.')
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))?;
        ConfigKey::all()
            .find(|k| k.section == section && k.key == key)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section, self.key)
    }
}

fn millis(d: Duration) -> String {
    d.as_millis().to_string()
}

fn optional_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}

fn optional(value: &str) -> Option<PathBuf> {
    if value.is_empty() {
        None
    } else {
        Some(PathBuf::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigFile::load_from(&dir.path().join("absent.ini")).unwrap();
        assert_eq!(config.arbiter.mapping.high_anchor, 0.341);
        assert_eq!(config.calibration.window_size, 16);
        assert_eq!(config.network.bind_addr, "0.0.0.0:5555");
    }

    #[test]
    fn test_load_overrides_and_ignores_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(
            &path,
            "[ipc]\nsocket_path = /tmp/test.sock\n\n\
             [arbiter]\nnetwork_timeout_ms = 1500\nmystery = 1\n\n\
             [network]\nspeed_encoding = float\n\n\
             [calibration]\ndecrement_step = 0.002\nlog_dir = /tmp/cal\n",
        )
        .unwrap();

        let config = ConfigFile::load_from(&path).unwrap();
        assert_eq!(config.socket_path(), Path::new("/tmp/test.sock"));
        assert_eq!(config.arbiter.network_timeout, Duration::from_millis(1500));
        assert_eq!(config.network.speed_encoding, SpeedEncoding::Float);
        assert_eq!(config.calibration.decrement_step, 0.002);
        assert_eq!(config.calibration_log_dir, Some(PathBuf::from("/tmp/cal")));
    }

    #[test]
    fn test_invalid_value_names_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[calibration]\nwindow_size = many\n").unwrap();

        let err = ConfigFile::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("calibration.window_size"));
    }

    #[test]
    fn test_semantic_validation() {
        let mut config = ConfigFile::default();
        let tick: ConfigKey = "arbiter.tick_ms".parse().unwrap();
        assert!(tick.set(&mut config, "0").is_err());
        let gain: ConfigKey = "mapping.esc_gain".parse().unwrap();
        assert!(gain.set(&mut config, "0").is_err());
        let step: ConfigKey = "calibration.increment_step".parse().unwrap();
        assert!(step.set(&mut config, "-0.001").is_err());
        assert!(step.set(&mut config, "NaN").is_err());
    }

    #[test]
    fn test_save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        "mapping.high_anchor".parse::<ConfigKey>().unwrap().set(&mut config, "0.35").unwrap();
        "joystick.debounce_ms".parse::<ConfigKey>().unwrap().set(&mut config, "150").unwrap();
        config.save_to(&path).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded.arbiter.mapping.high_anchor, 0.35);
        assert_eq!(loaded.joystick.debounce, Duration::from_millis(150));
        assert_eq!(loaded.calibration_log_dir, None);
    }

    #[test]
    fn test_every_key_round_trips_its_default() {
        let config = ConfigFile::default();
        for key in ConfigKey::all() {
            let value = key.get(&config);
            let mut copy = ConfigFile::default();
            key.set(&mut copy, &value)
                .unwrap_or_else(|e| panic!("{} rejected its own default: {}", key, e));
            assert_eq!(key.get(&copy), value, "{}", key);
        }
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!("arbiter.warp_drive".parse::<ConfigKey>().is_err());
        assert!("nodot".parse::<ConfigKey>().is_err());
        assert_eq!(
            "network.watchdog_ms".parse::<ConfigKey>().unwrap().name(),
            "network.watchdog_ms"
        );
    }
}
