//! Append-only CSV record of calibration decisions and anchor changes.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::calibrator::{CalibratorConfig, Evaluation};
use crate::arbiter::AnchorAdjustment;

/// CSV header, one column per [`CalibrationRecord`] field.
pub const CSV_HEADER: &str =
    "timestamp,type,obs_value,threshold,cmd_speed,value,inc,dec,battery_v,lost_packets";

/// Errors opening or writing the calibration log.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("Failed to create log directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("Failed to open calibration log {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("Failed to write calibration log {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

pub type Result<T> = std::result::Result<T, LogError>;

/// Row type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Decrease,
    Increase,
    Hold,
    /// The arbiter moved the high anchor.
    Adjust,
    /// The arbiter moved the high anchor but hit a bound.
    Clamped,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Decrease => "decrease",
            RecordKind::Increase => "increase",
            RecordKind::Hold => "hold",
            RecordKind::Adjust => "adjust",
            RecordKind::Clamped => "clamped",
        }
    }
}

/// One CSV row. Absent values are written as empty cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationRecord {
    pub kind: RecordKind,
    pub observed: Option<f32>,
    pub threshold: Option<f32>,
    pub commanded_speed: Option<f32>,
    pub value: Option<f32>,
    pub increment: Option<f32>,
    pub decrement: Option<f32>,
    pub battery_voltage: Option<f32>,
    pub lost_packets: Option<u64>,
}

impl CalibrationRecord {
    /// An empty row of the given kind.
    pub fn new(kind: RecordKind) -> Self {
        Self {
            kind,
            observed: None,
            threshold: None,
            commanded_speed: None,
            value: None,
            increment: None,
            decrement: None,
            battery_voltage: None,
            lost_packets: None,
        }
    }

    /// Row for a calibrator evaluation; `value` is the signed delta requested.
    pub fn evaluation(evaluation: &Evaluation, config: &CalibratorConfig) -> Self {
        let kind = match evaluation.decision {
            super::CalibrationDecision::Decrease => RecordKind::Decrease,
            super::CalibrationDecision::Increase => RecordKind::Increase,
            super::CalibrationDecision::Hold => RecordKind::Hold,
        };
        Self {
            observed: Some(evaluation.average_observed),
            threshold: Some(config.speed_threshold),
            commanded_speed: Some(evaluation.commanded_speed),
            value: Some(evaluation.delta()),
            increment: Some(config.increment_step),
            decrement: Some(config.decrement_step),
            ..Self::new(kind)
        }
    }

    /// Row for an anchor change applied by the arbiter; `value` is the new high anchor.
    pub fn adjustment(adjustment: &AnchorAdjustment) -> Self {
        let kind = if adjustment.clamped {
            RecordKind::Clamped
        } else {
            RecordKind::Adjust
        };
        Self {
            value: Some(adjustment.current),
            ..Self::new(kind)
        }
    }

    pub fn with_battery_voltage(mut self, voltage: Option<f32>) -> Self {
        self.battery_voltage = voltage;
        self
    }

    pub fn with_lost_packets(mut self, lost: u64) -> Self {
        self.lost_packets = Some(lost);
        self
    }

    fn to_csv(&self, timestamp: &str) -> String {
        fn cell(value: Option<f32>) -> String {
            value.map(|v| format!("{:.4}", v)).unwrap_or_default()
        }
        format!(
            "{},{},{},{},{},{},{},{},{},{}",
            timestamp,
            self.kind.as_str(),
            cell(self.observed),
            cell(self.threshold),
            cell(self.commanded_speed),
            cell(self.value),
            cell(self.increment),
            cell(self.decrement),
            cell(self.battery_voltage),
            self.lost_packets.map(|n| n.to_string()).unwrap_or_default(),
        )
    }
}

/// Appends [`CalibrationRecord`]s to a CSV file, flushing every row.
#[derive(Debug)]
pub struct CalibrationLogger {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl CalibrationLogger {
    /// Create a new timestamped log in `dir`: `calibration_<role>_<YYYYmmdd_HHMMSS>.csv`.
    pub fn create_in(dir: &Path, role: &str) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|source| LogError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        Self::open(dir.join(format!("calibration_{}_{}.csv", role, stamp)))
    }

    /// Open `path` for appending, writing the header if the file is empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| LogError::Open {
                path: path.clone(),
                source,
            })?;
        let is_empty = file
            .metadata()
            .map(|meta| meta.len() == 0)
            .map_err(|source| LogError::Open {
                path: path.clone(),
                source,
            })?;

        let mut logger = Self {
            path,
            writer: BufWriter::new(file),
        };
        if is_empty {
            logger.write_line(CSV_HEADER)?;
        }
        tracing::info!(path = %logger.path.display(), "Calibration log opened");
        Ok(logger)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row stamped with the local wall-clock time.
    pub fn record(&mut self, record: &CalibrationRecord) -> Result<()> {
        let timestamp = chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f").to_string();
        let line = record.to_csv(&timestamp);
        self.write_line(&line)
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{}", line)
            .and_then(|_| self.writer.flush())
            .map_err(|source| LogError::Write {
                path: self.path.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CalibrationDecision;
    use crate::command::ControlEvent;

    #[test]
    fn test_new_log_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cal.csv");
        let mut logger = CalibrationLogger::open(&path).unwrap();
        logger
            .record(&CalibrationRecord::new(RecordKind::Hold).with_lost_packets(3))
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert!(lines[1].ends_with(",hold,,,,,,,,3"));
    }

    #[test]
    fn test_reopen_appends_without_second_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cal.csv");
        CalibrationLogger::open(&path)
            .unwrap()
            .record(&CalibrationRecord::new(RecordKind::Adjust))
            .unwrap();
        CalibrationLogger::open(&path)
            .unwrap()
            .record(&CalibrationRecord::new(RecordKind::Adjust))
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("timestamp,").count(), 1);
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_evaluation_row_columns() {
        let eval = Evaluation {
            decision: CalibrationDecision::Decrease,
            average_observed: 4.0,
            commanded_speed: 5.0,
            event: Some(ControlEvent::CalibrationAdjust(-0.001)),
        };
        let record = CalibrationRecord::evaluation(&eval, &CalibratorConfig::default())
            .with_battery_voltage(Some(7.8));
        let row = record.to_csv("T");
        assert_eq!(row, "T,decrease,4.0000,3.2000,5.0000,-0.0010,0.0010,0.0010,7.8000,");
    }

    #[test]
    fn test_create_in_names_file_by_role() {
        let dir = tempfile::tempdir().unwrap();
        let logger = CalibrationLogger::create_in(&dir.path().join("logs"), "network").unwrap();
        let name = logger.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("calibration_network_"));
        assert!(name.ends_with(".csv"));
        assert!(logger.path().exists());
    }
}
