//! # Chassis library.
//!
//! This library allows other crates in the workspace, and the benchmarks, to access items defined
//! inside the chassis crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Data store - the executable's per-cycle data and safe mode handling
pub mod data_store;

/// Hardware adapters - motor controllers and the heading sensor on the CAN bus
pub mod hw;

/// Localisation module - the chassis pose on the field
pub mod loc;

/// Chassis executable parameters
pub mod params;

/// Simulated CAN bus - ideal actuators and IMU for running without hardware
pub mod sim_bus;

/// Swerve control module - converts chassis velocity commands into individual module commands
pub mod swerve_ctrl;
