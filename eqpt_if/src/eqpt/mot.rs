//! # Motor Controller Equipment Interface

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Control constants applied to a motor controller when it is configured.
///
/// Gains are in the controller's native units, outputs are fractions of full output.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ControlData {
    /// The closed-loop mode these constants are tuned for
    pub mode: ControlMode,

    /// Human readable name of this gain set, used only in logs
    #[serde(default)]
    pub identifier: String,

    /// Proportional gain
    pub p: f64,

    /// Integral gain
    #[serde(default)]
    pub i: f64,

    /// Derivative gain
    #[serde(default)]
    pub d: f64,

    /// Feedforward gain
    #[serde(default)]
    pub f: f64,

    /// Error band outside of which the integral accumulator is cleared
    #[serde(default)]
    pub izone: f64,

    /// Acceleration limit for profiled position moves
    ///
    /// Units: counts/100ms/second
    #[serde(default)]
    pub max_acceleration: f64,

    /// Cruise velocity for profiled position moves
    ///
    /// Units: counts/100ms
    #[serde(default)]
    pub cruise_velocity: f64,

    /// Peak output in either direction, (0, 1]
    pub peak_output: f64,

    /// Minimum output in either direction when the loop is active, [0, peak_output]
    #[serde(default)]
    pub nominal_output: f64,
}

/// Sensor data returned by a motor controller, in the controller's native units.
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, PartialEq)]
pub struct MotorSens {
    /// Integrated sensor position.
    ///
    /// Units: counts
    pub pos_counts: f64,

    /// Integrated sensor velocity.
    ///
    /// Units: counts/100ms
    pub vel_counts_100ms: f64,

    /// Faults currently latched by the controller
    pub faults: MotorFaults,
}

/// Fault flags reported by a motor controller.
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct MotorFaults {
    pub under_voltage: bool,
    pub over_temperature: bool,
    pub hardware_failure: bool,
    pub sensor_out_of_phase: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Motor controller types which can be fitted to the robot.
///
/// The set is closed: each variant is selected by configuration and the differences between them
/// are captured by the methods on this enum.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MotorKind {
    /// TalonFX with the integrated Falcon 500 encoder
    Falcon,

    /// TalonSRX with a quadrature magnetic encoder
    Talon,
}

/// Closed-loop modes a motor controller can run.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ControlMode {
    /// Closed-loop velocity
    Velocity,

    /// Closed-loop position
    Position,
}

/// Demand sent to a motor controller, in the controller's native units.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub enum MotorDem {
    /// Disable the output
    Neutral,

    /// Fraction of full output, [-1, 1]
    PercentOutput(f64),

    /// Velocity setpoint in counts/100ms
    Velocity(f64),

    /// Position setpoint in counts
    Position(f64),
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl MotorKind {
    /// Number of encoder counts in one revolution of the motor shaft.
    pub fn counts_per_rev(&self) -> f64 {
        match self {
            MotorKind::Falcon => 2048.0,
            MotorKind::Talon => 4096.0,
        }
    }
}

impl ControlData {
    /// Determine if the control data describes a configuration the controllers will accept.
    pub fn is_valid(&self) -> bool {
        let gains = [
            self.p,
            self.i,
            self.d,
            self.f,
            self.izone,
            self.max_acceleration,
            self.cruise_velocity,
        ];

        gains.iter().all(|g| g.is_finite() && *g >= 0.0)
            && self.peak_output > 0.0
            && self.peak_output <= 1.0
            && self.nominal_output >= 0.0
            && self.nominal_output <= self.peak_output
    }
}

impl MotorFaults {
    /// True if any fault is latched
    pub fn any(&self) -> bool {
        self.under_voltage
            || self.over_temperature
            || self.hardware_failure
            || self.sensor_out_of_phase
    }
}
