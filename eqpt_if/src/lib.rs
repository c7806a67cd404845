//! # Equipment interface crate.
//!
//! Provides the common interfaces between the chassis software and the equipment on the robot's
//! CAN bus: the demands that can be sent to motor controllers, the sensor data they report, and
//! the bus abstraction that carries both.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Demand and sensor data definitions for equipment (motor controllers and the IMU)
pub mod eqpt;

/// The CAN bus abstraction
pub mod bus;
