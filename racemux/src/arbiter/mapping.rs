//! Speed-to-throttle mapping and the calibration state it reads.
//!
//! ```text
//!  physical
//!  throttle      ceiling (neutral + max_throttle) ─────────────
//!     │                                 ╱ high anchor (speed 5)
//!     │                               ╱
//!     │             low anchor  ●───╱   (extrapolated beyond)
//!     │                       ╱ (speed 1)
//!     │  neutral ───────────●────────────────────────────────
//!     └──────────────────────────────────────────────── speed
//! ```
//!
//! Calibration only ever moves the high anchor. The low anchor follows it at
//! a fixed distance so the slope, which was measured once on the vehicle,
//! is preserved.

use crate::actuator::EscProfile;

use super::config::MappingConfig;

/// Outcome of applying one calibration adjustment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorAdjustment {
    /// Requested signed change.
    pub delta: f32,
    /// High anchor before the adjustment.
    pub previous: f32,
    /// High anchor after the adjustment (and clamp).
    pub current: f32,
    /// Whether the bounds limited the change.
    pub clamped: bool,
}

/// Calibration anchors owned by the arbiter.
///
/// Mutated only by [`CalibrationState::adjust`], which the arbiter calls from
/// its single-threaded loop. Both anchors change together, so a reader never
/// observes one updated and the other not.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationState {
    high_anchor: f32,
    low_anchor: f32,
    anchor_spread: f32,
    min_high_anchor: f32,
    max_high_anchor: f32,
}

impl CalibrationState {
    /// Build the initial state from configuration.
    ///
    /// The configured high anchor is clamped into its bounds; the spread is
    /// taken from the configured anchors and never changes afterwards.
    pub fn new(config: &MappingConfig) -> Self {
        let min = config.min_high_anchor.min(config.max_high_anchor);
        let max = config.max_high_anchor.max(config.min_high_anchor);
        let spread = (config.high_anchor - config.low_anchor).max(0.0);
        let high = config.high_anchor.clamp(min, max);
        Self {
            high_anchor: high,
            low_anchor: high - spread,
            anchor_spread: spread,
            min_high_anchor: min,
            max_high_anchor: max,
        }
    }

    /// Physical throttle at the high speed anchor.
    pub fn high_anchor(&self) -> f32 {
        self.high_anchor
    }

    /// Physical throttle at the low speed anchor.
    pub fn low_anchor(&self) -> f32 {
        self.low_anchor
    }

    /// Apply a signed change to the high anchor.
    pub fn adjust(&mut self, delta: f32) -> AnchorAdjustment {
        let previous = self.high_anchor;
        let requested = previous + delta;
        let current = requested.clamp(self.min_high_anchor, self.max_high_anchor);

        self.high_anchor = current;
        self.low_anchor = current - self.anchor_spread;

        AnchorAdjustment {
            delta,
            previous,
            current,
            clamped: current != requested,
        }
    }
}

/// Piecewise-linear speed → normalized throttle mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrottleMap {
    low_speed: f32,
    high_speed: f32,
    esc: EscProfile,
}

impl ThrottleMap {
    /// Create a mapping from configuration.
    pub fn new(config: &MappingConfig) -> Self {
        Self {
            low_speed: config.low_speed,
            high_speed: config.high_speed,
            esc: config.esc,
        }
    }

    /// ESC profile used for normalization.
    pub fn esc(&self) -> &EscProfile {
        &self.esc
    }

    /// Map a speed intent to normalized throttle.
    ///
    /// Interpolates through the two anchors (extrapolating outside them),
    /// clamps the physical value to `[neutral, neutral + max_throttle]`, then
    /// inverts the ESC's neutral+gain formula. `speed <= 0` and non-finite
    /// speeds map to neutral.
    pub fn speed_to_throttle(&self, speed: f32, anchors: &CalibrationState) -> f32 {
        if !speed.is_finite() || speed <= 0.0 {
            return 0.0;
        }

        let span = self.high_speed - self.low_speed;
        let slope = if span.abs() < f32::EPSILON {
            0.0
        } else {
            (anchors.high_anchor - anchors.low_anchor) / span
        };
        let physical = anchors.low_anchor + slope * (speed - self.low_speed);
        let physical = physical.clamp(self.esc.neutral, self.esc.max_physical_throttle());

        self.esc.normalize_throttle(physical).clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    fn measured_config() -> MappingConfig {
        MappingConfig::default().with_anchors(0.33, 0.34)
    }

    #[test]
    fn test_anchors_hit_exactly() {
        let config = measured_config();
        let map = ThrottleMap::new(&config);
        let state = CalibrationState::new(&config);
        let esc = EscProfile::default();

        assert!(approx(map.speed_to_throttle(1.0, &state), esc.normalize_throttle(0.33)));
        assert!(approx(map.speed_to_throttle(5.0, &state), esc.normalize_throttle(0.34)));
        assert!(approx(map.speed_to_throttle(3.0, &state), esc.normalize_throttle(0.335)));
    }

    #[test]
    fn test_non_positive_speed_is_neutral() {
        let config = measured_config();
        let map = ThrottleMap::new(&config);
        let state = CalibrationState::new(&config);
        assert_eq!(map.speed_to_throttle(0.0, &state), 0.0);
        assert_eq!(map.speed_to_throttle(-2.0, &state), 0.0);
        assert_eq!(map.speed_to_throttle(f32::NAN, &state), 0.0);
    }

    #[test]
    fn test_extrapolation_is_capped_at_ceiling() {
        let config = measured_config();
        let map = ThrottleMap::new(&config);
        let state = CalibrationState::new(&config);
        let esc = EscProfile::default();

        let huge = map.speed_to_throttle(10_000.0, &state);
        assert!(approx(huge, esc.normalize_throttle(esc.max_physical_throttle())));
        assert!(map.speed_to_throttle(7.0, &state) > map.speed_to_throttle(5.0, &state));
    }

    #[test]
    fn test_adjust_moves_both_anchors() {
        let mut state = CalibrationState::new(&measured_config());
        let adj = state.adjust(-0.002);
        assert!(approx(adj.previous, 0.34));
        assert!(approx(adj.current, 0.338));
        assert!(!adj.clamped);
        assert!(approx(state.high_anchor(), 0.338));
        assert!(approx(state.low_anchor(), 0.328));
    }

    #[test]
    fn test_adjust_clamps_to_bounds() {
        let config = measured_config().with_anchor_bounds(0.335, 0.345);
        let mut state = CalibrationState::new(&config);

        let down = state.adjust(-1.0);
        assert!(down.clamped);
        assert!(approx(state.high_anchor(), 0.335));

        let up = state.adjust(1.0);
        assert!(up.clamped);
        assert!(approx(state.high_anchor(), 0.345));
        assert!(approx(state.low_anchor(), 0.335));
    }

    #[test]
    fn test_initial_anchor_outside_bounds_is_clamped() {
        let config = measured_config().with_anchor_bounds(0.2, 0.3);
        let state = CalibrationState::new(&config);
        assert!(approx(state.high_anchor(), 0.3));
        assert!(approx(state.low_anchor(), 0.29));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_mapping_is_non_decreasing(
                low in 0.12f32..0.45,
                spread in 0.0f32..0.05,
                a in 0.0f32..=5.0,
                b in 0.0f32..=5.0,
            ) {
                let config = MappingConfig::default()
                    .with_anchors(low, low + spread)
                    .with_anchor_bounds(0.0, 1.0);
                let map = ThrottleMap::new(&config);
                let state = CalibrationState::new(&config);

                let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
                prop_assert!(
                    map.speed_to_throttle(lo, &state) <= map.speed_to_throttle(hi, &state),
                    "mapping decreased between {} and {}", lo, hi
                );
            }

            #[test]
            fn test_mapping_stays_in_unit_range(speed in -10.0f32..100.0) {
                let config = MappingConfig::default();
                let map = ThrottleMap::new(&config);
                let state = CalibrationState::new(&config);
                let t = map.speed_to_throttle(speed, &state);
                prop_assert!((0.0..=1.0).contains(&t));
            }
        }
    }
}
