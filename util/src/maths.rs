//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Rotation2, Vector2};
use num_traits::{Float, FloatConst};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Linearly map a value from the source range into the target range.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float
{
    target_range.0
        + ((value - source_range.0)
        * (target_range.1 - target_range.0)
        / (source_range.1 - source_range.0))
}

/// Clamp a value between a minimum and a maximum.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Map an angle in radians into the canonical range [-pi, pi).
///
/// Angles already inside the range are returned untouched, which makes the
/// function exactly idempotent rather than idempotent to within rounding.
pub fn normalise_angle<T>(angle: T) -> T
where
    T: Float + FloatConst
{
    let pi_t = T::PI();
    let tau_t = T::PI() + T::PI();

    if angle >= -pi_t && angle < pi_t {
        return angle;
    }

    let mut wrapped = rem_euclid(angle + pi_t, tau_t) - pi_t;

    // rem_euclid can round up to exactly tau, see its notes
    if wrapped >= pi_t {
        wrapped = wrapped - tau_t;
    }

    wrapped
}

/// Get the signed rotation which moves `current` onto an angle equivalent to
/// `target` by the shortest path.
///
/// The result is in [-pi, pi), positive values are anticlockwise rotations.
pub fn shortest_rotation_delta<T>(current: T, target: T) -> T
where
    T: Float + FloatConst
{
    normalise_angle(target - current)
}

/// Rotate the vector `(x, y)` anticlockwise by `angle_rad`.
///
/// Used to move velocities between the robot and field frames: a robot frame
/// vector rotated by the robot heading is expressed in the field frame, and a
/// field frame vector rotated by minus the heading is expressed in the robot
/// frame.
pub fn rotate_vector(x: f64, y: f64, angle_rad: f64) -> (f64, f64) {
    let rotated = Rotation2::new(angle_rad) * Vector2::new(x, y);

    (rotated.x, rotated.y)
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
/// This result is not an element of the function's codomain, but it is the
/// closest floating point number in the real numbers and thus fulfills the
/// property `self == self.div_euclid(rhs) * rhs + self.rem_euclid(rhs)`
/// approximatively.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}
