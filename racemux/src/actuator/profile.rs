//! ESC and steering servo calibration profile.
//!
//! Physical values are what the PWM driver receives. The ESC does not idle at
//! zero: it has a neutral point and a forward gain, so
//!
//! ```text
//! throttle_physical = neutral + throttle_normalized × gain
//! steering_physical = steering_normalized × steering_gain + steering_offset
//! ```
//!
//! The arbiter's speed mapping works in physical units (that is where the
//! calibration anchors were measured) and uses [`EscProfile::normalize_throttle`]
//! to come back to normalized units.

/// Translation between normalized and physical actuator units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EscProfile {
    /// Physical throttle at which the ESC holds still.
    pub neutral: f32,

    /// Physical throttle change per unit of normalized throttle.
    pub gain: f32,

    /// Largest physical throttle above neutral the mapping may request.
    pub max_throttle: f32,

    /// Steering servo gain (negative inverts the servo).
    pub steering_gain: f32,

    /// Physical steering that drives straight.
    pub steering_offset: f32,

    /// Scale throttle by `reference_voltage / battery_voltage`.
    pub voltage_compensation: bool,

    /// Fully-charged pack voltage used as the compensation reference (V).
    pub reference_voltage: f32,
}

/// Pack voltages below this are treated as a sensor fault and not compensated.
const MIN_COMPENSATION_VOLTAGE: f32 = 1.0;

impl Default for EscProfile {
    fn default() -> Self {
        Self {
            neutral: 0.12,
            gain: 0.88,
            max_throttle: 0.36,
            steering_gain: -0.65,
            steering_offset: 0.0,
            voltage_compensation: false,
            reference_voltage: 8.4,
        }
    }
}

impl EscProfile {
    /// Physical throttle ceiling used by the speed mapping.
    pub fn max_physical_throttle(&self) -> f32 {
        self.neutral + self.max_throttle
    }

    /// Inverse of the neutral+gain formula.
    pub fn normalize_throttle(&self, physical: f32) -> f32 {
        if self.gain.abs() < f32::EPSILON {
            return 0.0;
        }
        (physical - self.neutral) / self.gain
    }

    /// Physical throttle for a normalized value, optionally compensated for
    /// battery sag, clamped to `[-1, 1]`.
    pub fn physical_throttle(&self, normalized: f32, battery_voltage: Option<f32>) -> f32 {
        let physical = self.neutral + normalized * self.gain * self.voltage_gain(battery_voltage);
        physical.clamp(-1.0, 1.0)
    }

    /// Physical steering for a normalized value, clamped to `[-1, 1]`.
    pub fn physical_steering(&self, normalized: f32) -> f32 {
        (normalized * self.steering_gain + self.steering_offset).clamp(-1.0, 1.0)
    }

    fn voltage_gain(&self, battery_voltage: Option<f32>) -> f32 {
        if !self.voltage_compensation {
            return 1.0;
        }
        match battery_voltage {
            Some(v) if v.is_finite() && v >= MIN_COMPENSATION_VOLTAGE => self.reference_voltage / v,
            _ => 1.0,
        }
    }
}
