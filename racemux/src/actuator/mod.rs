//! Actuator collaborator contract.
//!
//! The arbiter talks to steering servo and ESC hardware only through the
//! [`Actuator`] trait: two fire-and-forget setters taking actuator-normalized
//! values in `[-1, 1]`, where `0.0` is neutral for both channels. Hardware
//! drivers live outside this crate; the crate ships a tracing actuator for dry
//! runs and a recording actuator for tests.
//!
//! # Module Structure
//!
//! - [`profile`] - `EscProfile`, the neutral+gain formula and its inverse
//! - [`guard`] - `NeutralGuard`, scoped release of the actuation resource
//! - [`tracing_actuator`] - `TracingActuator` for dry runs
//! - [`recording`] - `RecordingActuator` for tests and simulations

mod guard;
mod profile;
mod recording;
mod tracing_actuator;

pub use guard::NeutralGuard;
pub use profile::EscProfile;
pub use recording::RecordingActuator;
pub use tracing_actuator::TracingActuator;

/// One actuation step in actuator-normalized units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Actuation {
    /// Steering in `[-1, 1]`.
    pub steering: f32,
    /// Throttle in `[-1, 1]`; `0.0` is ESC neutral.
    pub throttle: f32,
}

impl Actuation {
    /// The fail-safe output: wheels centered, ESC at neutral.
    pub const NEUTRAL: Actuation = Actuation {
        steering: 0.0,
        throttle: 0.0,
    };

    /// Create an actuation, clamping both channels into `[-1, 1]`.
    pub fn new(steering: f32, throttle: f32) -> Self {
        Self {
            steering: clamp_unit(steering),
            throttle: clamp_unit(throttle),
        }
    }

    /// Whether this is the neutral output.
    pub fn is_neutral(&self) -> bool {
        *self == Self::NEUTRAL
    }
}

impl Default for Actuation {
    fn default() -> Self {
        Actuation::NEUTRAL
    }
}

/// Clamp into `[-1, 1]`, mapping NaN to `0.0`.
pub(crate) fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-1.0, 1.0)
    }
}

/// Steering servo + ESC.
///
/// Calls never fail from the caller's point of view; hardware-layer errors are
/// the implementation's business.
pub trait Actuator: Send {
    /// Set steering, `value ∈ [-1, 1]`.
    fn set_steering(&mut self, value: f32);

    /// Set throttle, `value ∈ [-1, 1]`.
    fn set_throttle(&mut self, value: f32);

    /// Apply both channels, steering first.
    fn apply(&mut self, actuation: Actuation) {
        self.set_steering(actuation.steering);
        self.set_throttle(actuation.throttle);
    }

    /// Drive both channels to neutral.
    fn neutral(&mut self) {
        self.apply(Actuation::NEUTRAL);
    }
}

impl<A: Actuator + ?Sized> Actuator for Box<A> {
    fn set_steering(&mut self, value: f32) {
        (**self).set_steering(value);
    }

    fn set_throttle(&mut self, value: f32) {
        (**self).set_throttle(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actuation_new_clamps() {
        let a = Actuation::new(2.0, -3.0);
        assert_eq!(a, Actuation::new(1.0, -1.0));
        assert_eq!(Actuation::new(f32::NAN, 0.5).steering, 0.0);
    }

    #[test]
    fn test_neutral_is_zero() {
        assert!(Actuation::NEUTRAL.is_neutral());
        assert!(!Actuation::new(0.0, 0.1).is_neutral());
    }

    #[test]
    fn test_boxed_actuator_forwards() {
        let recorder = RecordingActuator::new();
        let mut boxed: Box<dyn Actuator> = Box::new(recorder.clone());
        boxed.apply(Actuation::new(0.5, 0.25));
        assert_eq!(recorder.last(), Actuation::new(0.5, 0.25));
    }
}
