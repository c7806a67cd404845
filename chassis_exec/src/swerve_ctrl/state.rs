//! Implementations for the SwerveChassis state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace, warn};
use serde::Serialize;
use std::mem::discriminant;

// Internal
use super::{
    calc_inverse::STATIONARY_SPEED_MS,
    calc_odometry::Odometry,
    desaturate, factory, forward_kinematics, inverse_kinematics,
    ChassisCmd, ChassisSpeeds, ForwardKinematics, Frame, ModuleGeometry, ModulePosition, Params,
    PidController, SwerveChassisFactory, SwerveCtrlError, SwerveModule, WheelState, NUM_MODULES,
};
use crate::loc::Pose;
use eqpt_if::bus::CanBus;
use util::{
    maths::{clamp, lin_map, shortest_rotation_delta},
    module::State,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Swerve chassis control state.
///
/// Owns the four modules and the pose. The current command is re-executed on every call to
/// `proc` until it is replaced.
#[derive(Debug)]
pub struct SwerveChassis<B: CanBus> {
    params: Params,

    modules: [SwerveModule<B>; NUM_MODULES],

    geometry: [ModuleGeometry; NUM_MODULES],

    odometry: Odometry,

    head_ctrl: PidController,

    current_cmd: Option<ChassisCmd>,

    /// Robot frame speeds commanded on the last cycle, after limiting
    commanded_speeds: ChassisSpeeds,

    /// Pose heading the last commanded speeds were calculated at
    commanded_heading_rad: f64,

    /// Robot frame speeds measured on the last cycle
    measured_speeds: ChassisSpeeds,

    report: StatusReport,
}

/// Data needed to build the chassis.
pub struct ChassisInitData<B: CanBus> {
    pub params: Params,
    pub bus: B,
}

/// Input data to the chassis.
#[derive(Debug, Default, Clone, Copy)]
pub struct InputData {
    /// A new command to execute, or `None` to keep executing the current one.
    pub cmd: Option<ChassisCmd>,

    /// Yaw read from the heading sensor this cycle, `None` if it could not be read.
    ///
    /// Units: radians
    pub yaw_rad: Option<f64>,
}

/// Output of one chassis cycle.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct OutputData {
    pub pose: Pose,

    /// Robot frame speeds from the module feedback
    pub measured_speeds: ChassisSpeeds,

    /// Robot frame speeds sent to the modules
    pub commanded_speeds: ChassisSpeeds,

    /// The state each module was commanded to, in module index order
    pub wheel_dems: [WheelState; NUM_MODULES],
}

/// Status report for chassis processing.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct StatusReport {
    /// The wheel speeds had to be scaled down to the maximum module speed
    pub speed_normalised: bool,

    /// The commanded chassis speeds were limited by the acceleration limits
    pub accel_limited: bool,

    /// The module was commanded to drive backwards to save steer rotation
    pub reversed: [bool; NUM_MODULES],

    /// The module's feedback could not be read this cycle and is out of date
    pub stale_modules: [bool; NUM_MODULES],

    /// The module has a persistently faulted motor
    pub faulted_modules: [bool; NUM_MODULES],

    /// No sensor yaw was available, the heading was integrated from the wheels
    pub heading_from_wheels: bool,

    /// The new command this cycle was invalid and was not executed
    pub cmd_rejected: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<B: CanBus + Clone> State for SwerveChassis<B> {
    type InitData = ChassisInitData<B>;
    type InitError = SwerveCtrlError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = SwerveCtrlError;

    /// Build the chassis, configuring every motor on the bus.
    fn init(init_data: Self::InitData) -> Result<Self, Self::InitError> {
        SwerveChassisFactory::new(&init_data.params)?.create_chassis(&init_data.bus)
    }

    /// Perform one control cycle.
    ///
    /// Reads the module feedback, updates the pose, then commands the modules from the current
    /// command. An invalid new command does not replace the current one and is flagged in the
    /// status report.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        // Clear the status report
        self.report = StatusReport::default();

        // An invalid command is dropped, the tick runs on with the current one
        if let Some(cmd) = input_data.cmd {
            if let Err(e) = self.command(cmd) {
                warn!("Chassis command rejected: {}", e);
                self.report.cmd_rejected = true;
            }
        }

        // Feedback
        let mut measured = [WheelState::default(); NUM_MODULES];
        for (i, module) in self.modules.iter_mut().enumerate() {
            module.refresh();
            self.report.stale_modules[i] = module.is_stale();
            self.report.faulted_modules[i] = module.is_faulted();
            measured[i] = module.get_state();
        }

        // Odometry
        let (pose, heading_from_wheels) = self.odometry.update(&measured, input_data.yaw_rad);
        self.report.heading_from_wheels = heading_from_wheels;
        self.measured_speeds = forward_kinematics(self.odometry.fk(), &measured);

        // Commands
        let wheel_dems = self.calc_wheel_dems(&measured, &pose);

        // Dispatch
        for (module, dem) in self.modules.iter_mut().zip(wheel_dems.iter()) {
            module.set_state(*dem);
        }

        let output = OutputData {
            pose,
            measured_speeds: self.measured_speeds,
            commanded_speeds: self.commanded_speeds,
            wheel_dems,
        };

        trace!(
            "SwerveChassis output:\n    pose: {:?}\n    cmd: {:?}\n    dems: {:?}",
            output.pose,
            output.commanded_speeds,
            output.wheel_dems
        );

        Ok((output, self.report))
    }
}

impl<B: CanBus> SwerveChassis<B> {
    /// Assemble the chassis from modules already in index order.
    pub(crate) fn from_modules(
        params: Params,
        modules: [SwerveModule<B>; NUM_MODULES],
        fk: ForwardKinematics,
    ) -> Self {
        let geometry = factory::geometry(&params);
        let head_ctrl = PidController::new(params.head_k_p, params.head_k_i, params.head_k_d);

        Self {
            params,
            modules,
            geometry,
            odometry: Odometry::new(fk),
            head_ctrl,
            current_cmd: None,
            commanded_speeds: ChassisSpeeds::default(),
            commanded_heading_rad: 0.0,
            measured_speeds: ChassisSpeeds::default(),
            report: StatusReport::default(),
        }
    }

    /// Drive at the given velocity, replacing the current command.
    pub fn set_chassis_speeds(
        &mut self,
        vx_ms: f64,
        vy_ms: f64,
        omega_rads: f64,
        frame: Frame,
    ) -> Result<(), SwerveCtrlError> {
        self.command(ChassisCmd::speeds(vx_ms, vy_ms, omega_rads, frame))
    }

    /// Replace the current command.
    pub fn command(&mut self, cmd: ChassisCmd) -> Result<(), SwerveCtrlError> {
        if !cmd.is_valid() {
            return Err(SwerveCtrlError::InvalidCmd(cmd));
        }

        let same_kind = self
            .current_cmd
            .map(|c| discriminant(&c) == discriminant(&cmd))
            .unwrap_or(false);

        if !same_kind {
            debug!("New chassis command: {:?}", cmd);
            self.head_ctrl.reset();
        }

        self.current_cmd = Some(cmd);

        Ok(())
    }

    /// Overwrite the pose estimate.
    pub fn reset_pose(&mut self, pose: Pose) {
        debug!("Pose reset to {:?}", pose);
        self.odometry.reset_pose(pose);
    }

    pub fn pose(&self) -> Pose {
        self.odometry.pose()
    }

    /// Measured robot frame chassis speeds.
    pub fn chassis_speeds(&self) -> ChassisSpeeds {
        self.measured_speeds
    }

    /// Robot frame chassis speeds last sent to the modules.
    pub fn commanded_speeds(&self) -> ChassisSpeeds {
        self.commanded_speeds
    }

    pub fn current_cmd(&self) -> Option<ChassisCmd> {
        self.current_cmd
    }

    pub fn module(&self, position: ModulePosition) -> &SwerveModule<B> {
        &self.modules[position.index()]
    }

    pub fn modules(&self) -> &[SwerveModule<B>; NUM_MODULES] {
        &self.modules
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Calculate the state for each module from the current command.
    fn calc_wheel_dems(
        &mut self,
        measured: &[WheelState; NUM_MODULES],
        pose: &Pose,
    ) -> [WheelState; NUM_MODULES] {
        let max_ms = self.params.max_speed_ms;
        let max_rads = self.params.max_angular_speed_rads;

        let (target, frame) = match self.current_cmd {
            None | Some(ChassisCmd::Stop) => {
                self.commanded_speeds = ChassisSpeeds::default();
                return self.hold_angles(measured);
            }
            Some(ChassisCmd::ZeroAlign) => {
                self.commanded_speeds = ChassisSpeeds::default();
                return [WheelState::new(0.0, 0.0); NUM_MODULES];
            }
            Some(ChassisCmd::Speeds { speeds, frame }) => (speeds, frame),
            Some(ChassisCmd::Percent { drive, strafe, rotate, frame }) => {
                let pct = |v: f64| clamp(&v, &-1.0, &1.0);
                let speeds = ChassisSpeeds::new(
                    lin_map((-1.0, 1.0), (-max_ms, max_ms), pct(drive)),
                    lin_map((-1.0, 1.0), (-max_ms, max_ms), pct(strafe)),
                    lin_map((-1.0, 1.0), (-max_rads, max_rads), pct(rotate)),
                );
                (speeds, frame)
            }
            Some(ChassisCmd::HoldHeading { vx_ms, vy_ms, heading_rad, frame }) => {
                let err = shortest_rotation_delta(pose.heading_rad, heading_rad);
                let omega = self.head_ctrl.get(err, self.params.cycle_period_s);
                trace!("Heading error {:.4} rad, omega {:.4} rad/s", err, omega);

                (ChassisSpeeds::new(vx_ms, vy_ms, omega), frame)
            }
        };

        let limited = self
            .limit_speeds(target, frame)
            .to_robot(frame, pose.heading_rad);

        let mut dems = inverse_kinematics(&limited, &self.geometry);
        self.report.speed_normalised = desaturate(&mut dems, max_ms);

        // The speeds actually achieved by the wheel states
        self.commanded_speeds = forward_kinematics(self.odometry.fk(), &dems);
        self.commanded_heading_rad = pose.heading_rad;

        self.finalise_dems(dems, measured)
    }

    /// Apply the angular speed and acceleration limits to speeds given in `frame`.
    ///
    /// The linear limit acts in the frame of the command, so a field relative translation held
    /// while spinning is not limited once it has been reached.
    fn limit_speeds(&mut self, target: ChassisSpeeds, frame: Frame) -> ChassisSpeeds {
        let max_rads = self.params.max_angular_speed_rads;
        let dt = self.params.cycle_period_s;
        let prev = match frame {
            Frame::Robot => self.commanded_speeds,
            Frame::Field => self.commanded_speeds.robot_to_field(self.commanded_heading_rad),
        };

        let mut limited = ChassisSpeeds {
            omega_rads: clamp(&target.omega_rads, &-max_rads, &max_rads),
            ..target
        };

        if let Some(max_accel) = self.params.max_accel_mss {
            let dvx = limited.vx_ms - prev.vx_ms;
            let dvy = limited.vy_ms - prev.vy_ms;
            let dv = dvx.hypot(dvy);
            let dv_max = max_accel * dt;

            if dv > dv_max {
                limited.vx_ms = prev.vx_ms + dvx * dv_max / dv;
                limited.vy_ms = prev.vy_ms + dvy * dv_max / dv;
                self.report.accel_limited = true;
            }
        }

        if let Some(max_ang_accel) = self.params.max_angular_accel_radss {
            let dw_max = max_ang_accel * dt;
            let dw = limited.omega_rads - prev.omega_rads;

            if dw.abs() > dw_max {
                limited.omega_rads = prev.omega_rads + dw.signum() * dw_max;
                self.report.accel_limited = true;
            }
        }

        limited
    }

    /// Zero every drive while keeping the steer angles.
    fn hold_angles(&mut self, measured: &[WheelState; NUM_MODULES]) -> [WheelState; NUM_MODULES] {
        self.finalise_dems([WheelState::default(); NUM_MODULES], measured)
    }

    /// Hold the last angle on stationary wheels and optimise the rest against the feedback.
    fn finalise_dems(
        &mut self,
        mut dems: [WheelState; NUM_MODULES],
        measured: &[WheelState; NUM_MODULES],
    ) -> [WheelState; NUM_MODULES] {
        for i in 0..NUM_MODULES {
            if dems[i].speed_ms.abs() < STATIONARY_SPEED_MS {
                dems[i] = WheelState {
                    speed_ms: 0.0,
                    ..self.modules[i].commanded_state()
                };
            }

            let (optimised, reversed) = dems[i].optimise(measured[i].angle_rad);
            dems[i] = optimised;
            self.report.reversed[i] = reversed;
        }

        dems
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim_bus::SimBus;
    use crate::swerve_ctrl::test_params;
    use eqpt_if::eqpt::mot::{MotorFaults, MotorKind};
    use std::f64::consts::{FRAC_PI_2, PI};

    const EPS: f64 = 1e-9;

    fn build(params: Params) -> (SimBus, SwerveChassis<SimBus>) {
        let mut bus = SimBus::new();
        for mp in params.modules.iter() {
            bus.add_motor(mp.drive_motor.can_id);
            bus.add_motor(mp.steer_motor.can_id);
        }

        let chassis = SwerveChassis::init(ChassisInitData {
            params,
            bus: bus.clone(),
        })
        .unwrap();

        (bus, chassis)
    }

    /// Run one cycle and let the simulated motors follow
    fn tick(
        bus: &mut SimBus,
        chassis: &mut SwerveChassis<SimBus>,
        cmd: Option<ChassisCmd>,
        yaw_rad: f64,
    ) -> (OutputData, StatusReport) {
        let out = chassis
            .proc(&InputData {
                cmd,
                yaw_rad: Some(yaw_rad),
            })
            .unwrap();
        bus.step(chassis.params().cycle_period_s);
        out
    }

    #[test]
    fn test_straight_ahead() {
        let mut params = test_params();
        params.max_speed_ms = 2.0;
        let (mut bus, mut chassis) = build(params);

        chassis.set_chassis_speeds(1.0, 0.0, 0.0, Frame::Robot).unwrap();
        let (out, report) = tick(&mut bus, &mut chassis, None, 0.0);

        assert!(!report.speed_normalised);
        for s in out.wheel_dems.iter() {
            assert!(s.angle_rad.abs() < EPS);
            assert!((s.speed_ms - 1.0).abs() < EPS);
        }
        assert!((out.commanded_speeds.vx_ms - 1.0).abs() < EPS);
    }

    #[test]
    fn test_rotation_normalised() {
        let mut params = test_params();
        params.max_speed_ms = 2.0;
        let h = 3.0 / 2f64.sqrt();
        for mp in params.modules.iter_mut() {
            let g = mp.position.default_geometry(2.0 * h, 2.0 * h);
            mp.offset_m = Some([g.x_m, g.y_m]);
        }
        let (mut bus, mut chassis) = build(params);

        let (out, report) = tick(
            &mut bus, &mut chassis, Some(ChassisCmd::speeds(0.0, 0.0, 1.0, Frame::Robot)), 0.0
        );

        assert!(report.speed_normalised);
        for s in out.wheel_dems.iter() {
            assert!((s.speed_ms.abs() - 2.0).abs() < EPS);
        }
        assert!((out.commanded_speeds.omega_rads - 2.0 / 3.0).abs() < EPS);
    }

    #[test]
    fn test_reset_pose_then_zero_velocity() {
        let (mut bus, mut chassis) = build(test_params());

        tick(&mut bus, &mut chassis, Some(ChassisCmd::Stop), 0.2);
        chassis.reset_pose(Pose::new(5.0, 3.0, FRAC_PI_2));
        chassis.set_chassis_speeds(0.0, 0.0, 0.0, Frame::Field).unwrap();
        let (out, _) = tick(&mut bus, &mut chassis, None, 0.2);

        assert!((out.pose.x_m - 5.0).abs() < EPS);
        assert!((out.pose.y_m - 3.0).abs() < EPS);
        assert!((out.pose.heading_rad - FRAC_PI_2).abs() < EPS);
        assert_eq!(chassis.pose(), out.pose);
    }

    #[test]
    fn test_field_relative() {
        let (mut bus, mut chassis) = build(test_params());

        // Facing field +Y, so field +Y is robot forwards
        let (out, _) = tick(
            &mut bus,
            &mut chassis,
            Some(ChassisCmd::speeds(0.0, 1.0, 0.0, Frame::Field)),
            FRAC_PI_2,
        );

        for s in out.wheel_dems.iter() {
            assert!(s.angle_rad.abs() < EPS);
            assert!((s.speed_ms - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn test_zero_command_holds_angles() {
        let (mut bus, mut chassis) = build(test_params());

        tick(&mut bus, &mut chassis, Some(ChassisCmd::speeds(0.0, 1.0, 0.0, Frame::Robot)), 0.0);
        let (out, _) = tick(
            &mut bus, &mut chassis, Some(ChassisCmd::speeds(0.0, 0.0, 0.0, Frame::Robot)), 0.0
        );

        for s in out.wheel_dems.iter() {
            assert!((s.angle_rad - FRAC_PI_2).abs() < EPS);
            assert_eq!(s.speed_ms, 0.0);
        }

        let (out, _) = tick(&mut bus, &mut chassis, Some(ChassisCmd::Stop), 0.0);
        for s in out.wheel_dems.iter() {
            assert!((s.angle_rad - FRAC_PI_2).abs() < EPS);
        }
    }

    #[test]
    fn test_reverse_instead_of_half_turn() {
        let (mut bus, mut chassis) = build(test_params());

        tick(&mut bus, &mut chassis, Some(ChassisCmd::speeds(1.0, 0.0, 0.0, Frame::Robot)), 0.0);
        let (out, report) = tick(
            &mut bus, &mut chassis, Some(ChassisCmd::speeds(-1.0, 0.0, 0.0, Frame::Robot)), 0.0
        );

        for i in 0..NUM_MODULES {
            assert!(report.reversed[i]);
            assert!(out.wheel_dems[i].angle_rad.abs() < EPS);
            assert!((out.wheel_dems[i].speed_ms + 1.0).abs() < EPS);
        }
    }

    #[test]
    fn test_steer_rotation_bounded() {
        let (mut bus, mut chassis) = build(test_params());

        // The simulated steer motors reach their demand within a cycle, so the angles measured at
        // the start of a cycle are the previous demands
        let mut prev = [WheelState::default(); NUM_MODULES];
        let mut theta: f64 = 0.0;
        for _ in 0..40 {
            let (out, _) = tick(
                &mut bus,
                &mut chassis,
                Some(ChassisCmd::speeds(theta.cos(), theta.sin(), 0.7, Frame::Robot)),
                0.0,
            );

            for (p, s) in prev.iter().zip(out.wheel_dems.iter()) {
                let delta = shortest_rotation_delta(p.angle_rad, s.angle_rad);
                assert!(delta.abs() <= FRAC_PI_2 + 1e-6, "delta = {}", delta);
            }

            prev = out.wheel_dems;
            theta += 1.3;
        }
    }

    #[test]
    fn test_zero_align() {
        let (mut bus, mut chassis) = build(test_params());

        tick(&mut bus, &mut chassis, Some(ChassisCmd::speeds(0.0, 1.0, 0.0, Frame::Robot)), 0.0);
        let (out, _) = tick(&mut bus, &mut chassis, Some(ChassisCmd::ZeroAlign), 0.0);

        for s in out.wheel_dems.iter() {
            assert_eq!(s.angle_rad, 0.0);
            assert_eq!(s.speed_ms, 0.0);
        }
        assert!(out.commanded_speeds.is_zero());
    }

    #[test]
    fn test_percent_clamped() {
        let (mut bus, mut chassis) = build(test_params());

        let (out, report) = tick(
            &mut bus,
            &mut chassis,
            Some(ChassisCmd::Percent {
                drive: 2.0,
                strafe: 0.0,
                rotate: 0.0,
                frame: Frame::Robot,
            }),
            0.0,
        );

        assert!(!report.speed_normalised);
        for s in out.wheel_dems.iter() {
            assert!((s.speed_ms - 4.0).abs() < EPS);
        }
    }

    #[test]
    fn test_hold_heading() {
        let (mut bus, mut chassis) = build(test_params());

        let (out, _) = tick(
            &mut bus,
            &mut chassis,
            Some(ChassisCmd::HoldHeading {
                vx_ms: 0.0,
                vy_ms: 0.0,
                heading_rad: FRAC_PI_2,
                frame: Frame::Field,
            }),
            0.0,
        );

        // k_p = 2, so a quarter turn of error asks for pi rad/s
        assert!((out.commanded_speeds.omega_rads - PI).abs() < 1e-6);

        // At the target there is nothing to correct
        let (out, _) = tick(&mut bus, &mut chassis, None, FRAC_PI_2);
        assert!(out.commanded_speeds.omega_rads.abs() < 1e-6);
    }

    #[test]
    fn test_accel_limited() {
        let mut params = test_params();
        params.max_accel_mss = Some(1.0);
        let (mut bus, mut chassis) = build(params);

        let (out, report) = tick(
            &mut bus, &mut chassis, Some(ChassisCmd::speeds(1.0, 0.0, 0.0, Frame::Robot)), 0.0
        );

        assert!(report.accel_limited);
        assert!((out.commanded_speeds.vx_ms - 0.02).abs() < EPS);

        let (out, _) = tick(&mut bus, &mut chassis, None, 0.0);
        assert!((out.commanded_speeds.vx_ms - 0.04).abs() < EPS);
    }

    #[test]
    fn test_field_accel_limit_while_spinning() {
        let mut params = test_params();
        params.max_accel_mss = Some(1.0);
        let dt = params.cycle_period_s;
        let (mut bus, mut chassis) = build(params);

        let mut yaw_rad = 0.0;
        let mut cmd = Some(ChassisCmd::speeds(0.5, 0.0, 4.0, Frame::Field));

        for i in 0..40 {
            let (out, report) = tick(&mut bus, &mut chassis, cmd.take(), yaw_rad);
            let field = out.commanded_speeds.robot_to_field(yaw_rad);

            // Ramps at 0.02 m/s per cycle to 0.5 m/s, then holds without further limiting
            if i < 24 {
                assert!(report.accel_limited, "cycle {}", i);
            }
            if i >= 30 {
                assert!(!report.accel_limited, "cycle {}", i);
                assert!((field.vx_ms - 0.5).abs() < 1e-6, "vx = {}", field.vx_ms);
                assert!(field.vy_ms.abs() < 1e-6, "vy = {}", field.vy_ms);
            }

            yaw_rad += out.commanded_speeds.omega_rads * dt;
        }
    }

    #[test]
    fn test_invalid_cmd_rejected() {
        let (mut bus, mut chassis) = build(test_params());
        let driving = ChassisCmd::speeds(1.0, 0.0, 0.0, Frame::Robot);

        let mut out = tick(&mut bus, &mut chassis, Some(driving), 0.0).0;
        for _ in 0..10 {
            out = tick(&mut bus, &mut chassis, None, 0.0).0;
        }
        let pose_before = out.pose;

        let (out, report) = tick(
            &mut bus,
            &mut chassis,
            Some(ChassisCmd::speeds(std::f64::NAN, 0.0, 0.0, Frame::Robot)),
            0.0,
        );

        // The tick still ran, on the previous command
        assert!(report.cmd_rejected);
        assert_eq!(chassis.current_cmd(), Some(driving));
        assert!(out.pose.x_m > pose_before.x_m + 0.01, "x = {}", out.pose.x_m);
        assert!((out.commanded_speeds.vx_ms - 1.0).abs() < EPS);

        let (_, report) = tick(&mut bus, &mut chassis, None, 0.0);
        assert!(!report.cmd_rejected);
    }

    #[test]
    fn test_invalid_first_cmd_leaves_chassis_idle() {
        let (_, mut chassis) = build(test_params());

        let (out, report) = chassis
            .proc(&InputData {
                cmd: Some(ChassisCmd::speeds(0.0, std::f64::INFINITY, 0.0, Frame::Robot)),
                yaw_rad: Some(0.0),
            })
            .unwrap();

        assert!(report.cmd_rejected);
        assert!(chassis.current_cmd().is_none());
        assert!(out.commanded_speeds.is_zero());
    }

    #[test]
    fn test_motors_configured_at_init() {
        let params = test_params();
        let (bus, _chassis) = build(params.clone());

        for mp in params.modules.iter() {
            let drive = mp.drive_motor.can_id;
            let steer = mp.steer_motor.can_id;

            assert_eq!(bus.motor_control(drive), Some(params.drive_control.clone()));
            assert_eq!(bus.motor_control(steer), Some(params.steer_control.clone()));
            assert_eq!(bus.motor_kind(drive), Some(MotorKind::Falcon));
            assert_eq!(bus.motor_kind(steer), Some(MotorKind::Talon));
        }
    }

    #[test]
    fn test_device_fault_marks_module() {
        let params = test_params();
        let steer_id = params.modules[1].steer_motor.can_id;
        let (mut bus, mut chassis) = build(params);

        let (_, report) = tick(&mut bus, &mut chassis, Some(ChassisCmd::Stop), 0.0);
        assert_eq!(report.faulted_modules, [false; NUM_MODULES]);

        // Under voltage alone is reported but does not fault the module
        bus.latch_fault(steer_id, MotorFaults { under_voltage: true, ..Default::default() });
        let (_, report) = tick(&mut bus, &mut chassis, None, 0.0);
        assert_eq!(report.faulted_modules, [false; NUM_MODULES]);

        bus.latch_fault(steer_id, MotorFaults { hardware_failure: true, ..Default::default() });
        let (_, report) = tick(&mut bus, &mut chassis, None, 0.0);
        assert_eq!(report.faulted_modules, [false, true, false, false]);
        assert!(!report.stale_modules[1]);

        // Stays faulted after the device stops reporting it
        bus.latch_fault(steer_id, MotorFaults::default());
        let (_, report) = tick(&mut bus, &mut chassis, None, 0.0);
        assert_eq!(report.faulted_modules, [false, true, false, false]);
        assert!(chassis.module(ModulePosition::FrontRight).is_faulted());
    }

    #[test]
    fn test_odometry_follows_wheels() {
        let (mut bus, mut chassis) = build(test_params());

        chassis.set_chassis_speeds(1.0, 0.0, 0.0, Frame::Robot).unwrap();
        let mut out = OutputData::default();
        for _ in 0..50 {
            out = tick(&mut bus, &mut chassis, None, 0.0).0;
        }

        // The first cycle only sets the baseline
        assert!((out.pose.x_m - 0.98).abs() < 1e-6, "x = {}", out.pose.x_m);
        assert!(out.pose.y_m.abs() < 1e-6);
        assert!((chassis.chassis_speeds().vx_ms - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_stale_and_faulted_modules() {
        let params = test_params();
        let drive_id = params.modules[2].drive_motor.can_id;
        let (mut bus, mut chassis) = build(params);

        bus.set_offline(drive_id, true);

        let (_, report) = tick(&mut bus, &mut chassis, Some(ChassisCmd::Stop), 0.0);
        assert_eq!(report.stale_modules, [false, false, true, false]);
        assert_eq!(report.faulted_modules, [false; NUM_MODULES]);

        let mut report = report;
        for _ in 0..crate::hw::PERSISTENT_FAULT_THRESHOLD {
            report = tick(&mut bus, &mut chassis, None, 0.0).1;
        }
        assert_eq!(report.faulted_modules, [false, false, true, false]);
    }

    #[test]
    fn test_heading_from_wheels_flag() {
        let (_, mut chassis) = build(test_params());

        let (_, report) = chassis
            .proc(&InputData { cmd: Some(ChassisCmd::Stop), yaw_rad: None })
            .unwrap();

        assert!(report.heading_from_wheels);
    }
}
