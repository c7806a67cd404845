//! Commands passed into SwerveCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use util::maths::rotate_vector;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Velocity of the chassis.
///
/// The frame the velocity is expressed in is not part of this struct, anything accepting a
/// `ChassisSpeeds` from outside the chassis takes a [`Frame`] alongside it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChassisSpeeds {
    /// Units: meters/second
    pub vx_ms: f64,

    /// Units: meters/second
    pub vy_ms: f64,

    /// Units: radians/second
    pub omega_rads: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The frame a chassis velocity is expressed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frame {
    /// Along the chassis's own forward/left axes
    Robot,

    /// Along the fixed field axes, independent of the chassis heading
    Field,
}

/// A command to the chassis.
///
/// A command stays active until it is replaced, and is re-executed every cycle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ChassisCmd {
    /// Drive at the given velocity.
    Speeds {
        speeds: ChassisSpeeds,
        frame: Frame,
    },

    /// Drive at fractions of the maximum speeds.
    ///
    /// `drive` and `strafe` are fractions of the maximum linear speed along X and Y, `rotate` is
    /// a fraction of the maximum angular speed. Each is clamped to [-1, 1].
    Percent {
        drive: f64,
        strafe: f64,
        rotate: f64,
        frame: Frame,
    },

    /// Translate at the given velocity while holding the chassis at a field heading.
    HoldHeading {
        /// Units: meters/second
        vx_ms: f64,
        /// Units: meters/second
        vy_ms: f64,
        /// Units: radians, field frame
        heading_rad: f64,
        frame: Frame,
    },

    /// Point every module straight ahead with zero drive speed.
    ZeroAlign,

    /// Stop all drive axes, keeping the current steer angles.
    Stop,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ChassisSpeeds {
    pub fn new(vx_ms: f64, vy_ms: f64, omega_rads: f64) -> Self {
        Self {
            vx_ms,
            vy_ms,
            omega_rads,
        }
    }

    /// True if every component is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.vx_ms == 0.0 && self.vy_ms == 0.0 && self.omega_rads == 0.0
    }

    /// True if every component is a finite number.
    pub fn is_finite(&self) -> bool {
        self.vx_ms.is_finite() && self.vy_ms.is_finite() && self.omega_rads.is_finite()
    }

    /// Express field frame speeds in the robot frame, given the chassis heading in the field.
    pub fn field_to_robot(&self, heading_rad: f64) -> Self {
        let (vx, vy) = rotate_vector(self.vx_ms, self.vy_ms, -heading_rad);

        Self::new(vx, vy, self.omega_rads)
    }

    /// Express robot frame speeds in the field frame, given the chassis heading in the field.
    pub fn robot_to_field(&self, heading_rad: f64) -> Self {
        let (vx, vy) = rotate_vector(self.vx_ms, self.vy_ms, heading_rad);

        Self::new(vx, vy, self.omega_rads)
    }

    /// Express speeds given in `frame` in the robot frame.
    pub fn to_robot(&self, frame: Frame, heading_rad: f64) -> Self {
        match frame {
            Frame::Robot => *self,
            Frame::Field => self.field_to_robot(heading_rad),
        }
    }
}

impl ChassisCmd {
    /// Build a velocity command.
    pub fn speeds(vx_ms: f64, vy_ms: f64, omega_rads: f64, frame: Frame) -> Self {
        ChassisCmd::Speeds {
            speeds: ChassisSpeeds::new(vx_ms, vy_ms, omega_rads),
            frame,
        }
    }

    /// Determine if the command is valid (i.e. contains only finite numbers).
    pub fn is_valid(&self) -> bool {
        match self {
            ChassisCmd::Speeds { speeds, .. } => speeds.is_finite(),
            ChassisCmd::Percent {
                drive,
                strafe,
                rotate,
                ..
            } => drive.is_finite() && strafe.is_finite() && rotate.is_finite(),
            ChassisCmd::HoldHeading {
                vx_ms,
                vy_ms,
                heading_rad,
                ..
            } => vx_ms.is_finite() && vy_ms.is_finite() && heading_rad.is_finite(),
            ChassisCmd::ZeroAlign | ChassisCmd::Stop => true,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_field_to_robot() {
        // Facing +Y on the field, driving along field +Y is driving forwards
        let robot = ChassisSpeeds::new(0.0, 1.0, 0.3).field_to_robot(FRAC_PI_2);
        assert!((robot.vx_ms - 1.0).abs() < EPS);
        assert!(robot.vy_ms.abs() < EPS);
        assert_eq!(robot.omega_rads, 0.3);

        // And back again
        let field = robot.robot_to_field(FRAC_PI_2);
        assert!(field.vx_ms.abs() < EPS);
        assert!((field.vy_ms - 1.0).abs() < EPS);
    }

    #[test]
    fn test_robot_frame_untouched() {
        let s = ChassisSpeeds::new(1.0, -2.0, 0.5);
        assert_eq!(s.to_robot(Frame::Robot, 1.234), s);
    }

    #[test]
    fn test_cmd_valid() {
        assert!(ChassisCmd::speeds(1.0, 0.0, 0.0, Frame::Robot).is_valid());
        assert!(!ChassisCmd::speeds(std::f64::NAN, 0.0, 0.0, Frame::Robot).is_valid());
        assert!(!ChassisCmd::HoldHeading {
            vx_ms: 0.0,
            vy_ms: 0.0,
            heading_rad: std::f64::INFINITY,
            frame: Frame::Field
        }
        .is_valid());
        assert!(ChassisCmd::Stop.is_valid());
    }
}
