//! Swerve chassis control module
//!
//! Converts chassis velocity commands into steer angle and drive speed demands for each of the
//! four swerve modules, and integrates module feedback into the chassis pose.
//!
//! # Frames
//!
//! The robot frame has X+ forwards, Y+ to the left and Z+ upwards. The field frame is fixed to the
//! field with the same handedness. All angles follow the right hand grip rule about Z+.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod calc_inverse;
mod calc_odometry;
mod cmd;
mod factory;
mod heading_ctrl;
mod params;
mod state;
mod swerve_module;
mod wheel_state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use calc_inverse::{desaturate, inverse_kinematics};
pub use calc_odometry::{forward_kinematics, ForwardKinematics};
pub use cmd::*;
pub use factory::*;
pub use heading_ctrl::PidController;
pub use params::*;
pub use state::*;
pub use swerve_module::*;
pub use wheel_state::*;

use eqpt_if::eqpt::{mot::ControlMode, CanId};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The number of swerve modules on the chassis.
pub const NUM_MODULES: usize = 4;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during SwerveCtrl construction or operation.
#[derive(Debug, thiserror::Error)]
pub enum SwerveCtrlError {
    #[error("Expected exactly 4 swerve modules in the configuration, found {0}")]
    WrongModuleCount(usize),

    #[error("The {0:?} module is configured more than once")]
    DuplicateModule(ModulePosition),

    #[error("CAN ID {0} is used by more than one motor")]
    DuplicateCanId(CanId),

    #[error("Parameter {0} has an invalid value ({1})")]
    InvalidParam(&'static str, f64),

    #[error("Control data \"{0}\" is invalid")]
    InvalidControlData(String),

    #[error("Control data \"{0}\" must use {1:?} mode")]
    WrongControlMode(String, ControlMode),

    #[error("The module positions do not allow the chassis motion to be recovered")]
    DegenerateGeometry,

    #[error("Recieved an invalid chassis command: {0:?}")]
    InvalidCmd(ChassisCmd),
}

// ---------------------------------------------------------------------------
// TEST SUPPORT
// ---------------------------------------------------------------------------

/// Parameters for a 0.6 x 0.5 m chassis with Falcon drives and Talon steers.
///
/// Drive motors use odd CAN IDs from 1, each steer motor the ID after its drive.
#[cfg(test)]
pub(crate) fn test_params() -> Params {
    use eqpt_if::eqpt::mot::{ControlData, MotorKind};

    let control = |mode, identifier: &str| ControlData {
        mode,
        identifier: String::from(identifier),
        p: 0.1,
        i: 0.0,
        d: 0.0,
        f: 0.05,
        izone: 0.0,
        max_acceleration: 0.0,
        cruise_velocity: 0.0,
        peak_output: 1.0,
        nominal_output: 0.0,
    };

    let modules = ModulePosition::ALL
        .iter()
        .enumerate()
        .map(|(i, p)| ModuleParams {
            position: *p,
            offset_m: None,
            drive_motor: MotorParams {
                kind: MotorKind::Falcon,
                can_id: CanId(2 * i as u8 + 1),
                inverted: false,
            },
            steer_motor: MotorParams {
                kind: MotorKind::Talon,
                can_id: CanId(2 * i as u8 + 2),
                inverted: false,
            },
            steer_offset_rad: 0.0,
        })
        .collect();

    Params {
        wheel_base_m: 0.6,
        track_m: 0.5,
        wheel_diameter_m: 0.1016,
        drive_gear_ratio: 6.75,
        steer_gear_ratio: 12.8,
        max_speed_ms: 4.0,
        max_angular_speed_rads: 10.0,
        max_accel_mss: None,
        max_angular_accel_radss: None,
        cycle_period_s: 0.02,
        head_k_p: 2.0,
        head_k_i: 0.0,
        head_k_d: 0.0,
        drive_control: control(ControlMode::Velocity, "drive"),
        steer_control: control(ControlMode::Position, "steer"),
        modules,
    }
}
