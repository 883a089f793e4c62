//! In-memory actuator that remembers every output.

use std::sync::{Arc, Mutex, MutexGuard};

use super::{clamp_unit, Actuation, Actuator};

#[derive(Debug, Default)]
struct Recorded {
    current: Actuation,
    history: Vec<Actuation>,
}

/// Actuator that records outputs instead of driving hardware.
///
/// Clones share the same record, so a test can hand one clone to the arbiter
/// and inspect the outputs through another. A history entry is appended on
/// every `set_throttle`; since [`Actuator::apply`] sets steering first, each
/// `apply` yields exactly one entry.
#[derive(Debug, Clone, Default)]
pub struct RecordingActuator {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingActuator {
    /// Create an empty recorder at neutral.
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent output.
    pub fn last(&self) -> Actuation {
        self.lock().current
    }

    /// Every completed output, oldest first.
    pub fn history(&self) -> Vec<Actuation> {
        self.lock().history.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Actuator for RecordingActuator {
    fn set_steering(&mut self, value: f32) {
        self.lock().current.steering = clamp_unit(value);
    }

    fn set_throttle(&mut self, value: f32) {
        let mut recorded = self.lock();
        recorded.current.throttle = clamp_unit(value);
        let snapshot = recorded.current;
        recorded.history.push(snapshot);
    }
}
