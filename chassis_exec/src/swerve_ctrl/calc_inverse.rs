//! Inverse kinematics calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;

use super::{ChassisSpeeds, ModuleGeometry, WheelState, NUM_MODULES};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Wheel speeds below this are treated as stationary, and the wheel keeps its steer angle.
///
/// Units: meters/second
pub(crate) const STATIONARY_SPEED_MS: f64 = 1e-6;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Calculate the wheel states which achieve the given robot frame chassis speeds.
///
/// The velocity of each wheel is the chassis velocity plus the rotational component at the wheel
/// position, `(vx - omega * y, vy + omega * x)`.
pub fn inverse_kinematics(
    speeds: &ChassisSpeeds,
    geometry: &[ModuleGeometry; NUM_MODULES],
) -> [WheelState; NUM_MODULES] {
    let mut states = [WheelState::default(); NUM_MODULES];

    for (state, geom) in states.iter_mut().zip(geometry.iter()) {
        let vx = speeds.vx_ms - speeds.omega_rads * geom.y_m;
        let vy = speeds.vy_ms + speeds.omega_rads * geom.x_m;

        *state = WheelState::new(vx.hypot(vy), vy.atan2(vx));
    }

    states
}

/// Scale all wheel speeds down so that none exceeds `max_speed_ms`.
///
/// Ratios between the wheel speeds are preserved, and the fastest wheel ends up exactly at the
/// limit. Returns true if any scaling was applied.
pub fn desaturate(states: &mut [WheelState; NUM_MODULES], max_speed_ms: f64) -> bool {
    let fastest = states
        .iter()
        .map(|s| s.speed_ms.abs())
        .fold(0f64, f64::max);

    if fastest <= max_speed_ms {
        return false;
    }

    let scale = max_speed_ms / fastest;
    debug!(
        "Wheel speed {:.3} m/s exceeds limit {:.3} m/s, scaling by {:.3}",
        fastest, max_speed_ms, scale
    );

    for s in states.iter_mut() {
        s.speed_ms *= scale;
    }

    true
}
