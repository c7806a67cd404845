//! # Hardware adapters
//!
//! Wrappers around the equipment on the CAN bus which convert between the controllers' native
//! units and mechanism units, and which absorb transient bus failures. A failed read leaves the
//! last known value in place, a failed write is dropped. Either way the failure is recorded in the
//! device's [`FaultLog`] rather than returned to the control code.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod motor;
mod pigeon;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{error, info, warn};
use serde::Serialize;

use eqpt_if::{bus::BusError, eqpt::mot::MotorFaults, eqpt::CanId};

pub use motor::*;
pub use pigeon::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of consecutive failed bus transactions after which a device is considered persistently
/// faulted.
pub const PERSISTENT_FAULT_THRESHOLD: u32 = 25;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Record of the failures of one device.
#[derive(Debug, Clone, Serialize)]
pub struct FaultLog {
    id: CanId,

    /// Failed transactions since the last successful one
    consecutive_errors: u32,

    /// Failed transactions since construction
    total_errors: u64,

    #[serde(skip)]
    last_error: Option<BusError>,

    /// Faults reported by the device itself, latched until cleared
    latched: MotorFaults,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl FaultLog {
    pub fn new(id: CanId) -> Self {
        Self {
            id,
            consecutive_errors: 0,
            total_errors: 0,
            last_error: None,
            latched: MotorFaults::default(),
        }
    }

    /// Record a failed transaction.
    pub fn record_error(&mut self, err: BusError) {
        self.consecutive_errors = self.consecutive_errors.saturating_add(1);
        self.total_errors += 1;

        if self.consecutive_errors == 1 {
            warn!("{}: {}", self.id, err);
        }
        else if self.consecutive_errors == PERSISTENT_FAULT_THRESHOLD {
            error!(
                "{}: {} consecutive bus failures, device is persistently faulted ({})",
                self.id, self.consecutive_errors, err
            );
        }

        self.last_error = Some(err);
    }

    /// Record a successful transaction.
    pub fn record_ok(&mut self) {
        if self.consecutive_errors >= PERSISTENT_FAULT_THRESHOLD {
            info!("{}: communication restored", self.id);
        }
        self.consecutive_errors = 0;
    }

    /// Latch faults reported by the device.
    pub fn latch(&mut self, faults: MotorFaults) {
        let newly_latched = MotorFaults {
            under_voltage: faults.under_voltage && !self.latched.under_voltage,
            over_temperature: faults.over_temperature && !self.latched.over_temperature,
            hardware_failure: faults.hardware_failure && !self.latched.hardware_failure,
            sensor_out_of_phase: faults.sensor_out_of_phase && !self.latched.sensor_out_of_phase,
        };

        if newly_latched.any() {
            warn!("{}: device reported faults {:?}", self.id, newly_latched);
        }

        self.latched.under_voltage |= faults.under_voltage;
        self.latched.over_temperature |= faults.over_temperature;
        self.latched.hardware_failure |= faults.hardware_failure;
        self.latched.sensor_out_of_phase |= faults.sensor_out_of_phase;
    }

    /// Clear the latched device faults.
    pub fn clear_latched(&mut self) {
        self.latched = MotorFaults::default();
    }

    /// True if the device can no longer be relied on.
    pub fn is_persistent(&self) -> bool {
        self.consecutive_errors >= PERSISTENT_FAULT_THRESHOLD || self.latched.hardware_failure
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors
    }

    pub fn total_errors(&self) -> u64 {
        self.total_errors
    }

    pub fn last_error(&self) -> Option<&BusError> {
        self.last_error.as_ref()
    }

    pub fn latched(&self) -> MotorFaults {
        self.latched
    }
}
