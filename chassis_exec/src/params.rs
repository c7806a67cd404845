//! # Chassis Executable Parameters
//!
//! This module provide parameters for the chassis executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use eqpt_if::eqpt::CanId;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ChassisExecParams {
    /// Number of cycles to run before stopping, or run forever if not set
    #[serde(default)]
    pub num_cycles: Option<u64>,

    /// Bus ID of the Pigeon IMU
    pub pigeon_can_id: CanId,

    /// Heading of the robot on the field at startup
    ///
    /// Units: degrees
    #[serde(default)]
    pub initial_yaw_deg: f64,

    /// Consecutive cycle overruns after which the chassis is made safe
    pub max_consec_cycle_overruns: u64,

    /// Parameter file for the chassis, relative to the params directory
    pub swerve_ctrl_params: String,
}
