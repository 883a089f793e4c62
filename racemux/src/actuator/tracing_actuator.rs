//! Dry-run actuator that reports physical outputs through `tracing`.

use super::{clamp_unit, Actuation, Actuator, EscProfile};
use crate::telemetry::{NoTelemetry, TelemetrySource};

/// Actuator that logs what it would write to the PWM driver.
///
/// Output is logged at `debug` when it changes and at `trace` otherwise, so a
/// 100 Hz arbiter does not flood the default log level.
pub struct TracingActuator {
    profile: EscProfile,
    telemetry: Box<dyn TelemetrySource>,
    current: Actuation,
    last_logged: Option<Actuation>,
}

impl std::fmt::Debug for TracingActuator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TracingActuator")
            .field("profile", &self.profile)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl TracingActuator {
    /// Create a dry-run actuator using `profile` for physical conversion.
    pub fn new(profile: EscProfile) -> Self {
        Self {
            profile,
            telemetry: Box::new(NoTelemetry),
            current: Actuation::NEUTRAL,
            last_logged: None,
        }
    }

    /// Read battery voltage from `telemetry` for ESC voltage compensation.
    pub fn with_telemetry(mut self, telemetry: Box<dyn TelemetrySource>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Last commanded output (normalized units).
    pub fn current(&self) -> Actuation {
        self.current
    }

    fn report(&mut self) {
        let voltage = if self.profile.voltage_compensation {
            self.telemetry.battery_voltage()
        } else {
            None
        };
        let steering_physical = self.profile.physical_steering(self.current.steering);
        let throttle_physical = self.profile.physical_throttle(self.current.throttle, voltage);

        if self.last_logged == Some(self.current) {
            tracing::trace!(
                steering = format!("{:+.3}", self.current.steering),
                throttle = format!("{:+.3}", self.current.throttle),
                "Actuator output unchanged"
            );
            return;
        }

        tracing::debug!(
            steering = format!("{:+.3}", self.current.steering),
            throttle = format!("{:+.3}", self.current.throttle),
            steering_physical = format!("{:+.3}", steering_physical),
            throttle_physical = format!("{:.3}", throttle_physical),
            battery_v = ?voltage,
            "Actuator output"
        );
        self.last_logged = Some(self.current);
    }
}

impl Actuator for TracingActuator {
    fn set_steering(&mut self, value: f32) {
        self.current.steering = clamp_unit(value);
    }

    fn set_throttle(&mut self, value: f32) {
        self.current.throttle = clamp_unit(value);
        self.report();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_actuator_tracks_current_output() {
        let mut actuator = TracingActuator::new(EscProfile::default());
        actuator.apply(Actuation::new(0.3, 0.2));
        assert_eq!(actuator.current(), Actuation::new(0.3, 0.2));
        actuator.neutral();
        assert!(actuator.current().is_neutral());
    }

    #[test]
    fn test_tracing_actuator_clamps_input() {
        let mut actuator = TracingActuator::new(EscProfile::default());
        actuator.set_steering(4.0);
        actuator.set_throttle(-9.0);
        assert_eq!(actuator.current(), Actuation::new(1.0, -1.0));
    }
}
