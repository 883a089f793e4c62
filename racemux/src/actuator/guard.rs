//! Scoped ownership of the actuator.

use std::ops::{Deref, DerefMut};

use super::Actuator;

/// Owns an actuator and drives it to neutral when dropped.
///
/// The arbiter loop holds its actuator through this guard, so every way out
/// of the loop (normal shutdown, an error returned with `?`, a panic
/// unwinding through the stack) leaves the vehicle at neutral.
#[derive(Debug)]
pub struct NeutralGuard<A: Actuator> {
    actuator: A,
}

impl<A: Actuator> NeutralGuard<A> {
    /// Take ownership of `actuator`, setting it to neutral immediately.
    pub fn new(mut actuator: A) -> Self {
        actuator.neutral();
        Self { actuator }
    }
}

impl<A: Actuator> Deref for NeutralGuard<A> {
    type Target = A;

    fn deref(&self) -> &A {
        &self.actuator
    }
}

impl<A: Actuator> DerefMut for NeutralGuard<A> {
    fn deref_mut(&mut self) -> &mut A {
        &mut self.actuator
    }
}

impl<A: Actuator> Drop for NeutralGuard<A> {
    fn drop(&mut self) {
        self.actuator.neutral();
        tracing::debug!("Actuator released at neutral");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::{Actuation, RecordingActuator};

    #[test]
    fn test_guard_neutralizes_on_create_and_drop() {
        let recorder = RecordingActuator::new();
        {
            let mut guard = NeutralGuard::new(recorder.clone());
            assert!(recorder.last().is_neutral());
            guard.apply(Actuation::new(0.4, 0.3));
            assert_eq!(recorder.last(), Actuation::new(0.4, 0.3));
        }
        assert!(recorder.last().is_neutral());
        assert_eq!(recorder.history().len(), 3);
    }

    #[test]
    fn test_guard_neutralizes_on_panic() {
        let recorder = RecordingActuator::new();
        let inner = recorder.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let mut guard = NeutralGuard::new(inner);
            guard.apply(Actuation::new(0.0, 0.8));
            panic!("tick failed");
        }));
        assert!(result.is_err());
        assert!(recorder.last().is_neutral());
    }
}
