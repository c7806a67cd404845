//! Heading sensor adapter

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, info};

use eqpt_if::{
    bus::{BusError, CanBus},
    eqpt::{
        imu::{ImuDem, ImuSens},
        CanId,
    },
};

use super::FaultLog;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A source of the absolute chassis heading.
pub trait HeadingSensor {
    /// Read the current yaw, or `None` if the sensor could not be read this cycle.
    ///
    /// Units: radians
    fn get_yaw_rad(&mut self) -> Option<f64>;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A Pigeon IMU on the bus.
#[derive(Debug)]
pub struct DragonPigeon<B: CanBus> {
    id: CanId,
    bus: B,

    /// Last attitude successfully read
    sens: Option<ImuSens>,

    fault_log: FaultLog,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<B: CanBus> DragonPigeon<B> {
    /// Create the adapter, setting the sensor yaw to the robot's starting heading.
    pub fn new(bus: B, id: CanId, initial_yaw_deg: f64) -> Self {
        let mut pigeon = Self {
            id,
            bus,
            sens: None,
            fault_log: FaultLog::new(id),
        };

        // A failure is already in the fault log, the sensor just reads from its power-on zero
        if pigeon.rezero(initial_yaw_deg).is_ok() {
            info!("{}: pigeon yaw set to {} deg", id, initial_yaw_deg);
        }

        pigeon
    }

    /// Overwrite the sensor yaw so that it reads `yaw_deg` from now on.
    pub fn rezero(&mut self, yaw_deg: f64) -> Result<(), BusError> {
        match self.bus.send_imu_dem(self.id, ImuDem::SetYaw(yaw_deg)) {
            Ok(()) => {
                self.fault_log.record_ok();
                debug!("{}: rezeroed to {} deg", self.id, yaw_deg);
                Ok(())
            }
            Err(e) => {
                self.fault_log.record_error(e.clone());
                Err(e)
            }
        }
    }

    /// Read the latest attitude from the sensor.
    ///
    /// Returns `None` if the read failed, the last good reading is still available from
    /// [`DragonPigeon::last_sens`].
    pub fn refresh(&mut self) -> Option<ImuSens> {
        match self.bus.recv_imu_sens(self.id) {
            Ok(sens) => {
                self.fault_log.record_ok();
                self.sens = Some(sens);
                Some(sens)
            }
            Err(e) => {
                self.fault_log.record_error(e);
                None
            }
        }
    }

    pub fn last_sens(&self) -> Option<ImuSens> {
        self.sens
    }

    /// Units: degrees
    pub fn pitch_deg(&self) -> Option<f64> {
        self.sens.map(|s| s.pitch_deg)
    }

    /// Units: degrees
    pub fn roll_deg(&self) -> Option<f64> {
        self.sens.map(|s| s.roll_deg)
    }

    pub fn faults(&self) -> &FaultLog {
        &self.fault_log
    }
}

impl<B: CanBus> HeadingSensor for DragonPigeon<B> {
    fn get_yaw_rad(&mut self) -> Option<f64> {
        self.refresh().map(|s| s.yaw_deg.to_radians())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim_bus::SimBus;

    #[test]
    fn test_initial_yaw() {
        let mut bus = SimBus::new();
        bus.add_imu(CanId(20));

        let mut pigeon = DragonPigeon::new(bus.clone(), CanId(20), 90.0);
        let yaw = pigeon.get_yaw_rad().unwrap();

        assert!((yaw - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_rezero_and_dropout() {
        let mut bus = SimBus::new();
        bus.add_imu(CanId(20));

        let mut pigeon = DragonPigeon::new(bus.clone(), CanId(20), 0.0);
        bus.set_yaw_deg(CanId(20), 45.0);
        pigeon.rezero(-30.0).unwrap();
        assert!((pigeon.get_yaw_rad().unwrap() + 30f64.to_radians()).abs() < 1e-12);

        bus.set_offline(CanId(20), true);
        assert!(pigeon.get_yaw_rad().is_none());
        assert_eq!(pigeon.last_sens().map(|s| s.yaw_deg), Some(-30.0));
        assert_eq!(pigeon.faults().consecutive_errors(), 1);
    }

    #[test]
    fn test_missing_device() {
        let bus = SimBus::new();
        let mut pigeon = DragonPigeon::new(bus, CanId(20), 0.0);

        assert!(pigeon.get_yaw_rad().is_none());
        assert_eq!(pigeon.faults().last_error(), Some(&BusError::NoDevice(CanId(20))));
    }
}
