//! A single swerve module

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use std::f64::consts::TAU;

use eqpt_if::bus::CanBus;
use util::maths::{normalise_angle, shortest_rotation_delta};

use super::{ModuleGeometry, ModuleParams, ModulePosition, Params, WheelState};
use crate::hw::DragonMotor;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One corner of the chassis: a wheel with its own steer and drive motors.
#[derive(Debug)]
pub struct SwerveModule<B: CanBus> {
    position: ModulePosition,
    geometry: ModuleGeometry,

    drive: DragonMotor<B>,
    steer: DragonMotor<B>,

    /// Units: meters
    wheel_circumference_m: f64,

    /// Units: radians
    steer_offset_rad: f64,

    /// The last state passed to `set_state`
    commanded: WheelState,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<B: CanBus> SwerveModule<B> {
    /// Build the module from its motors.
    ///
    /// The parameters must already have been validated.
    pub fn new(
        params: &Params,
        module_params: &ModuleParams,
        drive: DragonMotor<B>,
        steer: DragonMotor<B>,
    ) -> Self {
        Self {
            position: module_params.position,
            geometry: module_params.geometry(params.wheel_base_m, params.track_m),
            drive,
            steer,
            wheel_circumference_m: params.wheel_circumference_m(),
            steer_offset_rad: module_params.steer_offset_rad,
            commanded: WheelState::default(),
        }
    }

    /// Read fresh feedback from both motors.
    ///
    /// Returns false if either read failed, the module then reports the last known values.
    pub fn refresh(&mut self) -> bool {
        let drive_ok = self.drive.refresh();
        let steer_ok = self.steer.refresh();

        drive_ok && steer_ok
    }

    /// Get the measured state of the wheel from the last refresh.
    pub fn get_state(&self) -> WheelState {
        WheelState {
            speed_ms: self.drive.velocity_rps() * self.wheel_circumference_m,
            angle_rad: self.measured_angle_rad(),
            distance_m: Some(self.drive.position_rot() * self.wheel_circumference_m),
        }
    }

    /// Command the wheel to the given state.
    ///
    /// The steer motor is sent the position which reaches the target angle with the least
    /// rotation from where it is now, so the module never unwinds through whole turns. Bus
    /// failures go to the motor fault logs.
    pub fn set_state(&mut self, target: WheelState) {
        let delta_rad = shortest_rotation_delta(self.measured_angle_rad(), target.angle_rad);
        let steer_rot = self.steer.position_rot() + delta_rad / TAU;

        let drive_rps = target.speed_ms / self.wheel_circumference_m;

        trace!(
            "{:?}: steer {:.4} rot ({:+.4} rad), drive {:.4} rps",
            self.position,
            steer_rot,
            delta_rad,
            drive_rps
        );

        self.steer.set_position_rot(steer_rot);
        self.drive.set_velocity_rps(drive_rps);

        self.commanded = WheelState {
            distance_m: None,
            ..target
        };
    }

    pub fn commanded_state(&self) -> WheelState {
        self.commanded
    }

    pub fn position(&self) -> ModulePosition {
        self.position
    }

    pub fn geometry(&self) -> ModuleGeometry {
        self.geometry
    }

    /// True if the last refresh of either motor failed.
    pub fn is_stale(&self) -> bool {
        self.drive.is_stale() || self.steer.is_stale()
    }

    /// True if either motor is persistently faulted.
    pub fn is_faulted(&self) -> bool {
        self.drive.faults().is_persistent() || self.steer.faults().is_persistent()
    }

    pub fn drive_motor(&self) -> &DragonMotor<B> {
        &self.drive
    }

    pub fn steer_motor(&self) -> &DragonMotor<B> {
        &self.steer
    }

    fn measured_angle_rad(&self) -> f64 {
        normalise_angle(self.steer.position_rot() * TAU - self.steer_offset_rad)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim_bus::SimBus;
    use crate::swerve_ctrl::test_params;
    use eqpt_if::eqpt::{mot::MotorDem, CanId};
    use std::f64::consts::{FRAC_PI_2, PI};

    fn build(steer_offset_rad: f64) -> (SimBus, SwerveModule<SimBus>, CanId, CanId) {
        let params = test_params();
        let mut mp = params.modules[0].clone();
        mp.steer_offset_rad = steer_offset_rad;

        let mut bus = SimBus::new();
        bus.add_motor(mp.drive_motor.can_id);
        bus.add_motor(mp.steer_motor.can_id);

        let drive = DragonMotor::new(
            bus.clone(), &mp.drive_motor, params.drive_gear_ratio, &params.drive_control
        );
        let steer = DragonMotor::new(
            bus.clone(), &mp.steer_motor, params.steer_gear_ratio, &params.steer_control
        );

        let module = SwerveModule::new(&params, &mp, drive, steer);

        (bus, module, mp.drive_motor.can_id, mp.steer_motor.can_id)
    }

    #[test]
    fn test_set_and_measure() {
        let (mut bus, mut module, _, _) = build(0.0);
        let params = test_params();

        module.refresh();
        module.set_state(WheelState::new(1.5, FRAC_PI_2));
        bus.step(0.02);
        module.refresh();

        let s = module.get_state();
        assert!((s.speed_ms - 1.5).abs() < 1e-9);
        assert!((s.angle_rad - FRAC_PI_2).abs() < 1e-9);

        // 1.5 m/s for 0.02 s
        let d = s.distance_m.unwrap();
        assert!((d - 0.03).abs() < 1e-9, "distance = {}", d);
        assert_eq!(module.commanded_state(), WheelState::new(1.5, FRAC_PI_2));
        assert_eq!(module.geometry(), ModulePosition::FrontLeft.default_geometry(
            params.wheel_base_m, params.track_m
        ));
    }

    #[test]
    fn test_steer_takes_short_way_across_wrap() {
        let (mut bus, mut module, _, steer_id) = build(0.0);
        let params = test_params();

        module.refresh();
        module.set_state(WheelState::new(0.0, PI - 0.1));
        bus.step(0.02);
        module.refresh();

        // Going to -pi + 0.1 from pi - 0.1 is +0.2 rad, not -6.08
        module.set_state(WheelState::new(0.0, -PI + 0.1));
        let expected_rot = (PI - 0.1 + 0.2) / TAU;
        match bus.motor_dem(steer_id) {
            Some(MotorDem::Position(p)) => {
                let rot = p / (params.steer_gear_ratio * 4096.0);
                assert!((rot - expected_rot).abs() < 1e-9, "rot = {}", rot);
            }
            d => panic!("Unexpected steer demand {:?}", d),
        }
    }

    #[test]
    fn test_steer_offset() {
        let offset = 0.4;
        let (mut bus, mut module, _, _) = build(offset);

        module.refresh();
        assert!((module.get_state().angle_rad + offset).abs() < 1e-9);

        module.set_state(WheelState::new(0.0, 0.0));
        bus.step(0.02);
        module.refresh();
        assert!(module.get_state().angle_rad.abs() < 1e-9);
    }

    #[test]
    fn test_stale_on_dropout() {
        let (mut bus, mut module, drive_id, _) = build(0.0);

        assert!(module.refresh());
        bus.set_offline(drive_id, true);
        assert!(!module.refresh());
        assert!(module.is_stale());
        assert!(!module.is_faulted());
    }
}
