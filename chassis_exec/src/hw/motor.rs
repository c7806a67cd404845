//! Motor controller adapter

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;

use eqpt_if::{
    bus::CanBus,
    eqpt::{
        mot::{ControlData, MotorDem, MotorKind, MotorSens},
        CanId,
    },
};

use super::FaultLog;
use crate::swerve_ctrl::MotorParams;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A motor controller on the bus.
///
/// Positions and velocities are in revolutions of the driven mechanism, i.e. after the gearbox.
/// All the controller variants report in encoder counts and counts per 100 ms and only differ in
/// the encoder resolution, so a single adapter serves every [`MotorKind`].
#[derive(Debug)]
pub struct DragonMotor<B: CanBus> {
    id: CanId,
    kind: MotorKind,
    bus: B,

    /// If true positive mechanism motion is negative motor motion
    inverted: bool,

    /// Motor revolutions per mechanism revolution
    gear_ratio: f64,

    /// Last sensor frame successfully read
    sens: MotorSens,

    /// True if the last read failed and `sens` is out of date
    stale: bool,

    fault_log: FaultLog,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<B: CanBus> DragonMotor<B> {
    /// Create the adapter and send the control constants to the controller.
    ///
    /// A controller which doesn't accept its configuration is logged and kept, it may come up
    /// later.
    pub fn new(mut bus: B, params: &MotorParams, gear_ratio: f64, control: &ControlData) -> Self {
        let mut fault_log = FaultLog::new(params.can_id);

        match bus.configure_motor(params.can_id, params.kind, control) {
            Ok(()) => fault_log.record_ok(),
            Err(e) => fault_log.record_error(e),
        }

        Self {
            id: params.can_id,
            kind: params.kind,
            bus,
            inverted: params.inverted,
            gear_ratio,
            sens: MotorSens::default(),
            stale: true,
            fault_log,
        }
    }

    /// Read the latest sensor frame from the controller.
    ///
    /// Returns false if the read failed, in which case the previous frame is kept.
    pub fn refresh(&mut self) -> bool {
        match self.bus.recv_motor_sens(self.id) {
            Ok(sens) => {
                self.fault_log.record_ok();
                self.fault_log.latch(sens.faults);
                self.sens = sens;
                self.stale = false;
            }
            Err(e) => {
                self.fault_log.record_error(e);
                self.stale = true;
            }
        }

        !self.stale
    }

    /// Units: mechanism revolutions/second
    pub fn velocity_rps(&self) -> f64 {
        self.sign()
            * counts_100ms_to_rps(
                self.sens.vel_counts_100ms,
                self.gear_ratio,
                self.kind.counts_per_rev(),
            )
    }

    /// Units: mechanism revolutions
    pub fn position_rot(&self) -> f64 {
        self.sign() * counts_to_rot(self.sens.pos_counts, self.gear_ratio, self.kind.counts_per_rev())
    }

    /// Command a closed-loop velocity.
    pub fn set_velocity_rps(&mut self, velocity_rps: f64) {
        let counts = rps_to_counts_100ms(
            self.sign() * velocity_rps,
            self.gear_ratio,
            self.kind.counts_per_rev(),
        );

        self.send(MotorDem::Velocity(counts));
    }

    /// Command a closed-loop position.
    pub fn set_position_rot(&mut self, position_rot: f64) {
        let counts = rot_to_counts(
            self.sign() * position_rot,
            self.gear_ratio,
            self.kind.counts_per_rev(),
        );

        self.send(MotorDem::Position(counts));
    }

    pub fn id(&self) -> CanId {
        self.id
    }

    pub fn kind(&self) -> MotorKind {
        self.kind
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn faults(&self) -> &FaultLog {
        &self.fault_log
    }

    fn send(&mut self, dem: MotorDem) {
        trace!("{} <- {:?}", self.id, dem);

        match self.bus.send_motor_dem(self.id, dem) {
            Ok(()) => self.fault_log.record_ok(),
            Err(e) => self.fault_log.record_error(e),
        }
    }

    fn sign(&self) -> f64 {
        if self.inverted {
            -1.0
        }
        else {
            1.0
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a mechanism velocity into controller velocity units.
pub fn rps_to_counts_100ms(velocity_rps: f64, gear_ratio: f64, counts_per_rev: f64) -> f64 {
    velocity_rps * gear_ratio * counts_per_rev / 10.0
}

/// Convert a controller velocity into mechanism revolutions per second.
pub fn counts_100ms_to_rps(velocity_counts_100ms: f64, gear_ratio: f64, counts_per_rev: f64) -> f64 {
    velocity_counts_100ms * 10.0 / (gear_ratio * counts_per_rev)
}

/// Convert a mechanism position into controller position units.
pub fn rot_to_counts(position_rot: f64, gear_ratio: f64, counts_per_rev: f64) -> f64 {
    position_rot * gear_ratio * counts_per_rev
}

/// Convert a controller position into mechanism revolutions.
pub fn counts_to_rot(position_counts: f64, gear_ratio: f64, counts_per_rev: f64) -> f64 {
    position_counts / (gear_ratio * counts_per_rev)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim_bus::SimBus;
    use eqpt_if::eqpt::mot::ControlMode;

    fn control() -> ControlData {
        ControlData {
            mode: ControlMode::Velocity,
            identifier: String::from("test"),
            p: 0.1,
            i: 0.0,
            d: 0.0,
            f: 0.0,
            izone: 0.0,
            max_acceleration: 0.0,
            cruise_velocity: 0.0,
            peak_output: 1.0,
            nominal_output: 0.0,
        }
    }

    #[test]
    fn test_velocity_round_trip_within_resolution() {
        for kind in [MotorKind::Falcon, MotorKind::Talon].iter() {
            let cpr = kind.counts_per_rev();
            let gear = 6.75;

            // Controllers only accept whole counts per 100 ms
            let resolution_rps = counts_100ms_to_rps(1.0, gear, cpr);

            let mut rps = -20.0;
            while rps < 20.0 {
                let counts = rps_to_counts_100ms(rps, gear, cpr).round();
                let back = counts_100ms_to_rps(counts, gear, cpr);
                assert!((back - rps).abs() <= 0.5 * resolution_rps + 1e-12);

                // Without quantisation the conversion is exact to rounding error
                let exact = counts_100ms_to_rps(rps_to_counts_100ms(rps, gear, cpr), gear, cpr);
                assert!((exact - rps).abs() < 1e-9);

                rps += 0.731;
            }
        }
    }

    #[test]
    fn test_position_round_trip() {
        let cpr = MotorKind::Falcon.counts_per_rev();
        let counts = rot_to_counts(1.25, 12.8, cpr);
        assert_eq!(counts, 1.25 * 12.8 * 2048.0);
        assert!((counts_to_rot(counts, 12.8, cpr) - 1.25).abs() < 1e-12);
    }

    #[test]
    fn test_inverted_motor() {
        let mut bus = SimBus::new();
        let params = MotorParams {
            kind: MotorKind::Talon,
            can_id: CanId(7),
            inverted: true,
        };

        bus.add_motor(CanId(7));
        let mut mot = DragonMotor::new(bus.clone(), &params, 2.0, &control());

        mot.set_velocity_rps(1.5);
        assert_eq!(
            bus.motor_dem(CanId(7)),
            Some(MotorDem::Velocity(-1.5 * 2.0 * 4096.0 / 10.0))
        );

        bus.step(0.1);
        assert!(mot.refresh());
        assert!((mot.velocity_rps() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_failed_read_keeps_last_value() {
        let mut bus = SimBus::new();
        let params = MotorParams {
            kind: MotorKind::Falcon,
            can_id: CanId(1),
            inverted: false,
        };

        bus.add_motor(CanId(1));
        let mut mot = DragonMotor::new(bus.clone(), &params, 1.0, &control());
        mot.set_velocity_rps(2.0);
        bus.step(0.02);
        assert!(mot.refresh());
        let last = mot.velocity_rps();

        bus.set_offline(CanId(1), true);
        assert!(!mot.refresh());
        assert!(mot.is_stale());
        assert_eq!(mot.velocity_rps(), last);
        assert_eq!(mot.faults().consecutive_errors(), 1);
    }
}
