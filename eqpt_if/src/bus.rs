//! # CAN bus abstraction
//!
//! All equipment is reached through a [`CanBus`]. The robot executable provides an implementation
//! for the real bus, the chassis library provides a simulated one.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::eqpt::{
    imu::{ImuDem, ImuSens},
    mot::{ControlData, MotorDem, MotorKind, MotorSens},
    CanId,
};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Trait to provide a unified API for accessing devices on a CAN bus.
///
/// Calls must not block for longer than a bus frame timeout, a missing response is reported as
/// [`BusError::Timeout`] and the caller decides how to degrade.
pub trait CanBus {
    /// Send the control constants to a motor controller.
    fn configure_motor(
        &mut self,
        id: CanId,
        kind: MotorKind,
        control: &ControlData,
    ) -> Result<(), BusError>;

    /// Send a demand to a motor controller.
    fn send_motor_dem(&mut self, id: CanId, dem: MotorDem) -> Result<(), BusError>;

    /// Get the latest sensor frame from a motor controller.
    fn recv_motor_sens(&mut self, id: CanId) -> Result<MotorSens, BusError>;

    /// Send a demand to the IMU.
    fn send_imu_dem(&mut self, id: CanId, dem: ImuDem) -> Result<(), BusError>;

    /// Get the latest attitude frame from the IMU.
    fn recv_imu_sens(&mut self, id: CanId) -> Result<ImuSens, BusError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur when talking to a device on the bus.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum BusError {
    #[error("No device with ID {0} is present on the bus")]
    NoDevice(CanId),

    #[error("Timed out waiting for a frame from {0}")]
    Timeout(CanId),

    #[error("Device {0} rejected the request: {1}")]
    Rejected(CanId, String),
}
