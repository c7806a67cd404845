//! # IMU Equipment Interface

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Attitude reported by the IMU.
///
/// Yaw follows the right hand grip rule about the robot's Z+ (upwards) axis, so anticlockwise
/// rotation when viewed from above is positive.
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, PartialEq)]
pub struct ImuSens {
    /// Units: degrees
    pub yaw_deg: f64,

    /// Units: degrees
    pub pitch_deg: f64,

    /// Units: degrees
    pub roll_deg: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Demands which can be sent to the IMU.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub enum ImuDem {
    /// Overwrite the fused yaw so that it reads the given value (degrees) from now on
    SetYaw(f64),
}
