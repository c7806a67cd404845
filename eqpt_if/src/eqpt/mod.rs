//! # Equipment Interface
//!
//! This module defines the interface structures which are exchanged with equipment on the bus.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod imu;
pub mod mot;

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

/// Identifier of a device on the CAN bus.
#[derive(
    serde::Serialize, serde::Deserialize, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone,
)]
pub struct CanId(pub u8);

impl std::fmt::Display for CanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "can{}", self.0)
    }
}
