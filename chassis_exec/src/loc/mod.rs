//! # Localisation module
//!
//! This module provides the pose of the chassis on the field. The pose itself is estimated by
//! odometry inside `swerve_ctrl`, this module only defines the type and how a displacement is
//! applied to it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use util::maths::{normalise_angle, rotate_vector};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Below this rotation the displacement is integrated as a straight line.
///
/// Units: radians
const STRAIGHT_LINE_LIMIT_RAD: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The current pose (position and heading in the field frame) of the chassis.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Units: meters,
    /// Frame: Field
    pub x_m: f64,

    /// Units: meters,
    /// Frame: Field
    pub y_m: f64,

    /// Angle from the field X+ axis to the robot X+ axis, in [-pi, pi).
    ///
    /// Units: radians
    pub heading_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {
    pub fn new(x_m: f64, y_m: f64, heading_rad: f64) -> Self {
        Self {
            x_m,
            y_m,
            heading_rad: normalise_angle(heading_rad),
        }
    }

    /// Get the unit vector pointing along the robot X+ axis, in the field frame.
    pub fn forward2(&self) -> Vector2<f64> {
        Vector2::new(self.heading_rad.cos(), self.heading_rad.sin())
    }

    /// Apply a displacement expressed in the robot frame at this pose.
    ///
    /// The chassis is assumed to follow a constant curvature arc over the displacement, so
    /// translating while rotating lands on the correct point rather than the chord's end. The
    /// heading of the returned pose is this pose's heading plus `dtheta_rad`.
    pub fn exp(&self, dx_m: f64, dy_m: f64, dtheta_rad: f64) -> Self {
        let (sin_term, cos_term) = if dtheta_rad.abs() < STRAIGHT_LINE_LIMIT_RAD {
            (1.0 - dtheta_rad * dtheta_rad / 6.0, dtheta_rad / 2.0)
        }
        else {
            (
                dtheta_rad.sin() / dtheta_rad,
                (1.0 - dtheta_rad.cos()) / dtheta_rad,
            )
        };

        let arc_x = sin_term * dx_m - cos_term * dy_m;
        let arc_y = cos_term * dx_m + sin_term * dy_m;

        let (field_dx, field_dy) = rotate_vector(arc_x, arc_y, self.heading_rad);

        Self::new(
            self.x_m + field_dx,
            self.y_m + field_dy,
            self.heading_rad + dtheta_rad,
        )
    }
}
