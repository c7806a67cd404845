//! Wheel state value type and optimisation

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;
use std::f64::consts::PI;
use util::maths::{normalise_angle, shortest_rotation_delta};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Rotations closer than this are treated as equal when choosing whether to reverse a wheel.
///
/// Units: radians
const OPTIMISE_TOLERANCE_RAD: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The state of a single wheel, either commanded or measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WheelState {
    /// Signed speed of the wheel along its rolling direction.
    ///
    /// Units: meters/second
    pub speed_ms: f64,

    /// Steer angle of the wheel, in [-pi, pi).
    ///
    /// Units: radians,
    /// Frame: Robot
    pub angle_rad: f64,

    /// Cumulative distance rolled by the wheel, only present on measured states.
    ///
    /// Units: meters
    pub distance_m: Option<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl WheelState {
    /// Create a new state, normalising the angle.
    pub fn new(speed_ms: f64, angle_rad: f64) -> Self {
        Self {
            speed_ms,
            angle_rad: normalise_angle(angle_rad),
            distance_m: None,
        }
    }

    /// Minimise the steer rotation needed to reach this state from `current_angle_rad`.
    ///
    /// If pointing the wheel the opposite way and driving it backwards needs less rotation than
    /// the direct solution the reversed state is returned. Rotations equal to within tolerance
    /// keep the direct solution. The returned flag is true when the state was reversed.
    pub fn optimise(&self, current_angle_rad: f64) -> (Self, bool) {
        let direct = shortest_rotation_delta(current_angle_rad, self.angle_rad);
        let reversed = shortest_rotation_delta(current_angle_rad, self.angle_rad + PI);

        if reversed.abs() < direct.abs() - OPTIMISE_TOLERANCE_RAD {
            (
                Self {
                    speed_ms: -self.speed_ms,
                    angle_rad: normalise_angle(self.angle_rad + PI),
                    distance_m: self.distance_m,
                },
                true,
            )
        }
        else {
            (*self, false)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_optimise_keeps_short_rotation() {
        let (s, rev) = WheelState::new(1.0, 0.3).optimise(0.0);
        assert!(!rev);
        assert_eq!(s.speed_ms, 1.0);
        assert_eq!(s.angle_rad, 0.3);
    }

    #[test]
    fn test_optimise_reverses() {
        // Target behind the wheel, reversing means no rotation at all
        let (s, rev) = WheelState::new(2.0, PI - 0.1).optimise(-0.1);
        assert!(rev);
        assert_eq!(s.speed_ms, -2.0);
        assert!((s.angle_rad + 0.1).abs() < EPS);
    }

    #[test]
    fn test_optimise_tie_prefers_direct() {
        let (s, rev) = WheelState::new(1.0, FRAC_PI_2).optimise(0.0);
        assert!(!rev);
        assert_eq!(s.speed_ms, 1.0);
        assert_eq!(s.angle_rad, FRAC_PI_2);
    }

    #[test]
    fn test_optimise_rotation_bounded() {
        // Sweep targets and current angles, the commanded rotation must never pass a quarter turn
        let mut current = -7.0;
        while current < 7.0 {
            let mut target = -7.0;
            while target < 7.0 {
                let (s, _) = WheelState::new(1.0, target).optimise(current);
                let delta = shortest_rotation_delta(current, s.angle_rad);
                assert!(
                    delta.abs() <= FRAC_PI_2 + EPS,
                    "current = {}, target = {}, delta = {}",
                    current,
                    target,
                    delta
                );
                assert!(s.angle_rad >= -PI && s.angle_rad < PI);
                target += 0.37;
            }
            current += 0.29;
        }
    }
}
