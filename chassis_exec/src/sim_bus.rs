//! # Simulated CAN bus
//!
//! An in-process bus with ideal actuators and a settable IMU, used by the executable when no
//! hardware is attached and by the tests. Velocity demands are tracked exactly and position
//! demands are reached within one step.
//!
//! The bus is a cheap handle, every clone refers to the same set of devices so that each adapter
//! can own a handle while the caller keeps one to drive the simulation.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use std::{cell::RefCell, collections::HashMap, rc::Rc};

use eqpt_if::{
    bus::{BusError, CanBus},
    eqpt::{
        imu::{ImuDem, ImuSens},
        mot::{ControlData, MotorDem, MotorFaults, MotorKind, MotorSens},
        CanId,
    },
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Handle to a simulated bus.
#[derive(Debug, Clone, Default)]
pub struct SimBus {
    inner: Rc<RefCell<SimDevices>>,
}

#[derive(Debug, Default)]
struct SimDevices {
    motors: HashMap<CanId, SimMotor>,
    imus: HashMap<CanId, SimImu>,
}

#[derive(Debug, Default)]
struct SimMotor {
    kind: Option<MotorKind>,
    control: Option<ControlData>,
    dem: Option<MotorDem>,
    sens: MotorSens,
    offline: bool,
}

#[derive(Debug, Default)]
struct SimImu {
    sens: ImuSens,
    offline: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a motor controller to the bus.
    pub fn add_motor(&mut self, id: CanId) {
        self.inner.borrow_mut().motors.insert(id, SimMotor::default());
    }

    /// Attach an IMU to the bus.
    pub fn add_imu(&mut self, id: CanId) {
        self.inner.borrow_mut().imus.insert(id, SimImu::default());
    }

    /// Make a device stop responding, or bring it back.
    pub fn set_offline(&mut self, id: CanId, offline: bool) {
        let mut devices = self.inner.borrow_mut();

        if let Some(m) = devices.motors.get_mut(&id) {
            m.offline = offline;
        }
        if let Some(i) = devices.imus.get_mut(&id) {
            i.offline = offline;
        }
    }

    /// Make a motor controller report faults.
    pub fn latch_fault(&mut self, id: CanId, faults: MotorFaults) {
        if let Some(m) = self.inner.borrow_mut().motors.get_mut(&id) {
            m.sens.faults = faults;
        }
    }

    /// Move the simulated chassis to a new yaw.
    pub fn set_yaw_deg(&mut self, id: CanId, yaw_deg: f64) {
        if let Some(i) = self.inner.borrow_mut().imus.get_mut(&id) {
            i.sens.yaw_deg = yaw_deg;
        }
    }

    /// Get the true yaw of the simulated chassis.
    pub fn yaw_deg(&self, id: CanId) -> Option<f64> {
        self.inner.borrow().imus.get(&id).map(|i| i.sens.yaw_deg)
    }

    /// Get the last demand sent to a motor.
    pub fn motor_dem(&self, id: CanId) -> Option<MotorDem> {
        self.inner.borrow().motors.get(&id).and_then(|m| m.dem)
    }

    /// Get the true state of a motor.
    pub fn motor_sens(&self, id: CanId) -> Option<MotorSens> {
        self.inner.borrow().motors.get(&id).map(|m| m.sens)
    }

    /// Get the controller type a motor was configured as, if it has been configured.
    pub fn motor_kind(&self, id: CanId) -> Option<MotorKind> {
        self.inner.borrow().motors.get(&id).and_then(|m| m.kind)
    }

    /// Get the control constants a motor has accepted, if it has been configured.
    pub fn motor_control(&self, id: CanId) -> Option<ControlData> {
        self.inner.borrow().motors.get(&id).and_then(|m| m.control.clone())
    }

    /// Advance the simulation by `dt_s` seconds.
    pub fn step(&mut self, dt_s: f64) {
        for (id, m) in self.inner.borrow_mut().motors.iter_mut() {
            match m.dem {
                Some(MotorDem::Velocity(v)) => {
                    m.sens.vel_counts_100ms = v;
                    m.sens.pos_counts += v * 10.0 * dt_s;
                }
                Some(MotorDem::Position(p)) => {
                    m.sens.vel_counts_100ms = 0.0;
                    m.sens.pos_counts = p;
                }
                Some(MotorDem::PercentOutput(_)) | Some(MotorDem::Neutral) | None => {
                    m.sens.vel_counts_100ms = 0.0;
                }
            }

            trace!("sim {}: {:?}", id, m.sens);
        }
    }

    fn with_motor<T, F>(&self, id: CanId, f: F) -> Result<T, BusError>
    where
        F: FnOnce(&mut SimMotor) -> Result<T, BusError>,
    {
        let mut devices = self.inner.borrow_mut();
        let motor = devices.motors.get_mut(&id).ok_or(BusError::NoDevice(id))?;

        if motor.offline {
            return Err(BusError::Timeout(id));
        }

        f(motor)
    }

    fn with_imu<T, F>(&self, id: CanId, f: F) -> Result<T, BusError>
    where
        F: FnOnce(&mut SimImu) -> T,
    {
        let mut devices = self.inner.borrow_mut();
        let imu = devices.imus.get_mut(&id).ok_or(BusError::NoDevice(id))?;

        if imu.offline {
            return Err(BusError::Timeout(id));
        }

        Ok(f(imu))
    }
}

impl CanBus for SimBus {
    fn configure_motor(
        &mut self,
        id: CanId,
        kind: MotorKind,
        control: &ControlData,
    ) -> Result<(), BusError> {
        self.with_motor(id, |m| {
            if !control.is_valid() {
                return Err(BusError::Rejected(
                    id,
                    format!("invalid control data \"{}\"", control.identifier),
                ));
            }

            m.kind = Some(kind);
            m.control = Some(control.clone());
            Ok(())
        })
    }

    fn send_motor_dem(&mut self, id: CanId, dem: MotorDem) -> Result<(), BusError> {
        self.with_motor(id, |m| {
            m.dem = Some(dem);
            Ok(())
        })
    }

    fn recv_motor_sens(&mut self, id: CanId) -> Result<MotorSens, BusError> {
        self.with_motor(id, |m| Ok(m.sens))
    }

    fn send_imu_dem(&mut self, id: CanId, dem: ImuDem) -> Result<(), BusError> {
        self.with_imu(id, |i| match dem {
            ImuDem::SetYaw(yaw_deg) => i.sens.yaw_deg = yaw_deg,
        })
    }

    fn recv_imu_sens(&mut self, id: CanId) -> Result<ImuSens, BusError> {
        self.with_imu(id, |i| i.sens)
    }
}
