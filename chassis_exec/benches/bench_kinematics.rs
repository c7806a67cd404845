//! # Kinematics Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use chassis_lib::{
    sim_bus::SimBus,
    swerve_ctrl::{
        self, desaturate, forward_kinematics, inverse_kinematics, ChassisCmd, ChassisInitData,
        ChassisSpeeds, ForwardKinematics, Frame, InputData, ModuleGeometry, SwerveChassis,
    },
};
use util::module::State;

fn kinematics_benchmark(c: &mut Criterion) {
    let params: swerve_ctrl::Params =
        util::params::load_str(include_str!("../../params/swerve_ctrl.toml")).unwrap();

    let mut geometry = [ModuleGeometry::default(); 4];
    for mp in params.modules.iter() {
        geometry[mp.position.index()] = mp.geometry(params.wheel_base_m, params.track_m);
    }

    let fk = ForwardKinematics::new(&geometry).unwrap();
    let speeds = ChassisSpeeds::new(3.0, -1.5, 4.0);

    c.bench_function("inverse kinematics", |b| {
        b.iter(|| {
            let mut states = inverse_kinematics(black_box(&speeds), &geometry);
            desaturate(&mut states, params.max_speed_ms);
            states.iter().map(|s| s.optimise(1.0).0).collect::<Vec<_>>()
        })
    });

    let states = inverse_kinematics(&speeds, &geometry);

    c.bench_function("forward kinematics", |b| {
        b.iter(|| forward_kinematics(&fk, black_box(&states)))
    });

    // ---- Full chassis cycle on the simulated bus ----

    let mut bus = SimBus::new();
    for mp in params.modules.iter() {
        bus.add_motor(mp.drive_motor.can_id);
        bus.add_motor(mp.steer_motor.can_id);
    }

    let mut chassis = SwerveChassis::init(ChassisInitData {
        params: params.clone(),
        bus: bus.clone(),
    })
    .unwrap();

    chassis
        .command(ChassisCmd::speeds(2.0, 1.0, 1.5, Frame::Field))
        .unwrap();

    let mut yaw_rad = 0.0;

    c.bench_function("chassis cycle", |b| {
        b.iter(|| {
            yaw_rad += 0.03;
            let out = chassis.proc(&InputData {
                cmd: None,
                yaw_rad: Some(yaw_rad),
            });
            bus.step(params.cycle_period_s);
            out
        })
    });
}

criterion_group!(benches, kinematics_benchmark);
criterion_main!(benches);
