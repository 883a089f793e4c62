//! Telemetry collaborator: observed speed and battery voltage.
//!
//! Sensors are owned by other processes (the battery monitor, the speed
//! estimator). They publish their latest reading as a plain-text float in a
//! RAM-backed file, and consumers poll those files. A missing file, an empty
//! file or a value that does not parse is reported as `None`, never as an
//! error, so a dead sensor process degrades calibration instead of stopping
//! the vehicle.
//!
//! ```text
//! battery monitor ──► /dev/shm/racemux_voltage ──┐
//!                                                ├──► FileTelemetry ──► calibrator / ESC profile
//! speed estimator ──► /dev/shm/racemux_speed ────┘
//! ```

use std::fs;
use std::path::{Path, PathBuf};

/// Default location of the observed-speed file (m/s).
pub const DEFAULT_SPEED_PATH: &str = "/dev/shm/racemux_speed";

/// Default location of the battery-voltage file (V).
pub const DEFAULT_VOLTAGE_PATH: &str = "/dev/shm/racemux_voltage";

/// One poll of every telemetry channel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TelemetryReading {
    /// Measured ground speed (m/s), if available.
    pub observed_speed: Option<f32>,
    /// Battery pack voltage (V), if available.
    pub battery_voltage: Option<f32>,
}

/// A single observation fed to the throttle calibrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservationSample {
    /// Speed intent in force when the observation was taken.
    pub commanded_speed: f32,
    /// Measured ground speed (m/s).
    pub observed_speed: f32,
    /// Monotonic timestamp (seconds).
    pub timestamp: f64,
}

/// Source of telemetry readings.
pub trait TelemetrySource: Send {
    /// Latest observed ground speed (m/s).
    fn observed_speed(&mut self) -> Option<f32>;

    /// Latest battery voltage (V).
    fn battery_voltage(&mut self) -> Option<f32>;

    /// Poll both channels.
    fn read(&mut self) -> TelemetryReading {
        TelemetryReading {
            observed_speed: self.observed_speed(),
            battery_voltage: self.battery_voltage(),
        }
    }
}

impl<T: TelemetrySource + ?Sized> TelemetrySource for Box<T> {
    fn observed_speed(&mut self) -> Option<f32> {
        (**self).observed_speed()
    }

    fn battery_voltage(&mut self) -> Option<f32> {
        (**self).battery_voltage()
    }
}

/// Telemetry source with no sensors attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTelemetry;

impl TelemetrySource for NoTelemetry {
    fn observed_speed(&mut self) -> Option<f32> {
        None
    }

    fn battery_voltage(&mut self) -> Option<f32> {
        None
    }
}

/// Reads telemetry from plain-text float files.
#[derive(Debug, Clone)]
pub struct FileTelemetry {
    speed_path: PathBuf,
    voltage_path: PathBuf,
}

impl Default for FileTelemetry {
    fn default() -> Self {
        Self::new(DEFAULT_SPEED_PATH, DEFAULT_VOLTAGE_PATH)
    }
}

impl FileTelemetry {
    /// Create a reader for the given files.
    pub fn new(speed_path: impl Into<PathBuf>, voltage_path: impl Into<PathBuf>) -> Self {
        Self {
            speed_path: speed_path.into(),
            voltage_path: voltage_path.into(),
        }
    }

    /// Path of the observed-speed file.
    pub fn speed_path(&self) -> &Path {
        &self.speed_path
    }

    /// Path of the battery-voltage file.
    pub fn voltage_path(&self) -> &Path {
        &self.voltage_path
    }
}

impl TelemetrySource for FileTelemetry {
    fn observed_speed(&mut self) -> Option<f32> {
        read_float_file(&self.speed_path)
    }

    fn battery_voltage(&mut self) -> Option<f32> {
        read_float_file(&self.voltage_path)
    }
}

/// Parse the first whitespace-trimmed float in `path`.
pub fn read_float_file(path: &Path) -> Option<f32> {
    let raw = fs::read_to_string(path).ok()?;
    raw.trim().parse::<f32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_float_file_parses_trimmed_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("speed");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "  3.25 ").unwrap();
        assert_eq!(read_float_file(&path), Some(3.25));
    }

    #[test]
    fn test_read_float_file_missing_or_garbage_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_float_file(&dir.path().join("absent")), None);

        let path = dir.path().join("garbage");
        fs::write(&path, "volts").unwrap();
        assert_eq!(read_float_file(&path), None);
    }

    #[test]
    fn test_file_telemetry_reads_both_channels() {
        let dir = tempfile::tempdir().unwrap();
        let speed = dir.path().join("speed");
        let voltage = dir.path().join("voltage");
        fs::write(&speed, "1.5").unwrap();
        fs::write(&voltage, "7.9\n").unwrap();

        let mut telemetry = FileTelemetry::new(&speed, &voltage);
        assert_eq!(
            telemetry.read(),
            TelemetryReading {
                observed_speed: Some(1.5),
                battery_voltage: Some(7.9),
            }
        );
    }

    #[test]
    fn test_no_telemetry_is_empty() {
        assert_eq!(NoTelemetry.read(), TelemetryReading::default());
    }
}
