//! Parameters structure for SwerveCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use eqpt_if::eqpt::{
    mot::{ControlData, MotorKind},
    CanId,
};

use super::NUM_MODULES;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for swerve chassis control.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {

    // ---- GEOMETRY ----

    /// Distance between the front and back wheel contact points.
    ///
    /// Units: meters
    pub wheel_base_m: f64,

    /// Distance between the left and right wheel contact points.
    ///
    /// Units: meters
    pub track_m: f64,

    /// Units: meters
    pub wheel_diameter_m: f64,

    /// Motor revolutions per wheel revolution on the drive axis.
    pub drive_gear_ratio: f64,

    /// Motor revolutions per module revolution on the steer axis.
    pub steer_gear_ratio: f64,

    // ---- CAPABILITIES ----

    /// Maximum speed of any one wheel.
    ///
    /// Units: meters/second
    pub max_speed_ms: f64,

    /// Units: radians/second
    pub max_angular_speed_rads: f64,

    /// Maximum change in commanded linear speed, unlimited if not set.
    ///
    /// Units: meters/second^2
    #[serde(default)]
    pub max_accel_mss: Option<f64>,

    /// Maximum change in commanded angular speed, unlimited if not set.
    ///
    /// Units: radians/second^2
    #[serde(default)]
    pub max_angular_accel_radss: Option<f64>,

    // ---- CONTROL ----

    /// Period between calls to `proc`.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Heading hold proportional gain
    pub head_k_p: f64,

    /// Heading hold integral gain
    #[serde(default)]
    pub head_k_i: f64,

    /// Heading hold derivative gain
    #[serde(default)]
    pub head_k_d: f64,

    /// Closed-loop constants applied to every drive motor
    pub drive_control: ControlData,

    /// Closed-loop constants applied to every steer motor
    pub steer_control: ControlData,

    // ---- MODULES ----

    pub modules: Vec<ModuleParams>,
}

/// Parameters for a single swerve module.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleParams {
    pub position: ModulePosition,

    /// Position of the wheel contact point relative to the chassis centre. If not set the
    /// position is derived from the wheel base and track.
    ///
    /// Units: meters,
    /// Frame: Robot
    #[serde(default)]
    pub offset_m: Option<[f64; 2]>,

    pub drive_motor: MotorParams,

    pub steer_motor: MotorParams,

    /// Steer angle reported by the encoder when the wheel points along the robot X+ axis.
    ///
    /// Units: radians
    #[serde(default)]
    pub steer_offset_rad: f64,
}

/// Parameters for one motor controller.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MotorParams {
    pub kind: MotorKind,
    pub can_id: CanId,
    #[serde(default)]
    pub inverted: bool,
}

/// Position of a module's wheel contact point relative to the chassis centre.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleGeometry {
    /// Units: meters
    pub x_m: f64,
    /// Units: meters
    pub y_m: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Corner of the chassis a module is mounted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModulePosition {
    FrontLeft,
    FrontRight,
    BackLeft,
    BackRight,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ModulePosition {
    /// Every position, in index order.
    pub const ALL: [ModulePosition; NUM_MODULES] = [
        ModulePosition::FrontLeft,
        ModulePosition::FrontRight,
        ModulePosition::BackLeft,
        ModulePosition::BackRight,
    ];

    /// Index of this module in per-module arrays.
    pub fn index(&self) -> usize {
        match self {
            ModulePosition::FrontLeft => 0,
            ModulePosition::FrontRight => 1,
            ModulePosition::BackLeft => 2,
            ModulePosition::BackRight => 3,
        }
    }

    /// Nominal contact point of this corner for a rectangular chassis.
    pub fn default_geometry(&self, wheel_base_m: f64, track_m: f64) -> ModuleGeometry {
        let x = wheel_base_m / 2.0;
        let y = track_m / 2.0;

        match self {
            ModulePosition::FrontLeft => ModuleGeometry::new(x, y),
            ModulePosition::FrontRight => ModuleGeometry::new(x, -y),
            ModulePosition::BackLeft => ModuleGeometry::new(-x, y),
            ModulePosition::BackRight => ModuleGeometry::new(-x, -y),
        }
    }
}

impl ModuleGeometry {
    pub fn new(x_m: f64, y_m: f64) -> Self {
        Self { x_m, y_m }
    }
}

impl ModuleParams {
    /// Get the contact point of this module, falling back to the rectangular layout.
    pub fn geometry(&self, wheel_base_m: f64, track_m: f64) -> ModuleGeometry {
        match self.offset_m {
            Some([x, y]) => ModuleGeometry::new(x, y),
            None => self.position.default_geometry(wheel_base_m, track_m),
        }
    }
}

impl Params {
    /// Circumference of the drive wheels.
    ///
    /// Units: meters
    pub fn wheel_circumference_m(&self) -> f64 {
        std::f64::consts::PI * self.wheel_diameter_m
    }
}
