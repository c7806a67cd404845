//! Main chassis executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the bus, heading sensor and chassis
//!     - Main loop:
//!         - System input acquisition:
//!             - Heading sensing
//!             - Command from the command line, on the first cycle
//!         - Safe mode checks
//!         - Swerve control processing, which reads the module feedback, updates odometry and
//!           commands the modules
//!         - Simulation step
//!
//! # Modules
//!
//! All modules (e.g. `swerve_ctrl`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.
//!

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, info, warn};
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use chassis_lib::{
    data_store::{DataStore, SafeModeCause},
    hw::{DragonPigeon, HeadingSensor},
    params::ChassisExecParams,
    sim_bus::SimBus,
    swerve_ctrl::{self, ChassisCmd, ChassisInitData, Frame, SwerveChassis},
};
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Swerve chassis executable, runs the chassis control loop against the simulated bus.
#[derive(Debug, StructOpt)]
#[structopt(name = "chassis_exec")]
struct Opts {
    /// Executable parameter file, relative to the params directory
    #[structopt(long, default_value = "chassis_exec.toml")]
    params: String,

    /// Number of cycles to run, overrides the parameter file
    #[structopt(long)]
    cycles: Option<u64>,

    /// Command to execute from the first cycle
    #[structopt(subcommand)]
    cmd: Option<CliCmd>,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Chassis commands which can be given on the command line.
#[derive(Debug, StructOpt)]
enum CliCmd {
    /// Drive at a velocity.
    #[structopt(name = "speeds")]
    Speeds {
        /// Forwards speed in meters/second
        #[structopt(allow_hyphen_values = true)]
        vx_ms: f64,

        /// Leftwards speed in meters/second
        #[structopt(allow_hyphen_values = true)]
        vy_ms: f64,

        /// Anticlockwise turn rate in radians/second
        #[structopt(allow_hyphen_values = true)]
        omega_rads: f64,

        /// Interpret the speeds in the field frame rather than the robot frame
        #[structopt(long)]
        field: bool,
    },

    /// Drive at fractions of the maximum speeds.
    #[structopt(name = "pct")]
    Percent {
        #[structopt(allow_hyphen_values = true)]
        drive: f64,

        #[structopt(allow_hyphen_values = true)]
        strafe: f64,

        #[structopt(allow_hyphen_values = true)]
        rotate: f64,

        #[structopt(long)]
        field: bool,
    },

    /// Translate while turning to and holding a field heading.
    #[structopt(name = "hold")]
    HoldHeading {
        #[structopt(allow_hyphen_values = true)]
        vx_ms: f64,

        #[structopt(allow_hyphen_values = true)]
        vy_ms: f64,

        /// Heading to hold in degrees
        #[structopt(allow_hyphen_values = true)]
        heading_deg: f64,

        #[structopt(long)]
        field: bool,
    },

    /// Point every module straight ahead.
    #[structopt(name = "align")]
    ZeroAlign,

    /// Stop, keeping the steer angles.
    #[structopt(name = "stop")]
    Stop,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    // ---- EARLY INITIALISATION ----

    color_eyre::install()?;

    let opts = Opts::from_args();

    // Initialise session
    let session = Session::new(
        "chassis_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Swerve Chassis Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI options: {:?}", opts);

    // ---- LOAD PARAMETERS ----

    let exec_params: ChassisExecParams = util::params::load(&opts.params)
        .wrap_err("Could not load exec params")?;

    let swerve_params: swerve_ctrl::Params = util::params::load(&exec_params.swerve_ctrl_params)
        .wrap_err("Could not load SwerveCtrl params")?;

    info!("Exec parameters loaded");

    let cycle_period_s = swerve_params.cycle_period_s;
    let num_cycles = opts.cycles.or(exec_params.num_cycles);

    // ---- INITIALISE EQUIPMENT ----

    let mut bus = SimBus::new();
    for mp in swerve_params.modules.iter() {
        bus.add_motor(mp.drive_motor.can_id);
        bus.add_motor(mp.steer_motor.can_id);
    }
    bus.add_imu(exec_params.pigeon_can_id);
    info!("Simulated bus initialised");

    let mut pigeon = DragonPigeon::new(
        bus.clone(),
        exec_params.pigeon_can_id,
        exec_params.initial_yaw_deg
    );

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    let mut chassis = SwerveChassis::init(ChassisInitData {
        params: swerve_params,
        bus: bus.clone(),
    }).wrap_err("Failed to initialise SwerveCtrl")?;
    info!("SwerveCtrl init complete");

    info!("Module initialisation complete\n");

    let mut pending_cmd = opts.cmd.as_ref().map(CliCmd::to_chassis_cmd);

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {

        if let Some(n) = num_cycles {
            if ds.num_cycles >= n as u128 {
                info!("{} cycles complete, stopping", n);
                break;
            }
        }

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(1.0 / cycle_period_s);

        // ---- DATA INPUT ----

        ds.chassis_input.yaw_rad = pigeon.get_yaw_rad();
        ds.chassis_input.cmd = pending_cmd.take();

        // ---- SAFETY ----

        ds.check_modules();
        ds.apply_safe_mode(chassis.current_cmd());

        // ---- CONTROL ALGORITHM PROCESSING ----

        match chassis.proc(&ds.chassis_input) {
            Ok((o, r)) => {
                ds.chassis_output = o;
                ds.chassis_status_rpt = r;
            },
            Err(e) => {
                warn!("Error during SwerveCtrl processing: {}", e)
            }
        };

        if ds.is_1_hz_cycle {
            info!(
                "Pose: ({:.3}, {:.3}) m, {:.1} deg, speeds: {:?}",
                ds.chassis_output.pose.x_m,
                ds.chassis_output.pose.y_m,
                ds.chassis_output.pose.heading_rad.to_degrees(),
                ds.chassis_output.measured_speeds
            );

            if let (Some(pitch), Some(roll)) = (pigeon.pitch_deg(), pigeon.roll_deg()) {
                debug!("Chassis tilt: pitch {:.1} deg, roll {:.1} deg", pitch, roll);
            }
        }

        // ---- SIMULATION ----

        // Ideal actuators, so the chassis turns at exactly the commanded rate
        bus.step(cycle_period_s);
        if let Some(yaw_deg) = bus.yaw_deg(exec_params.pigeon_can_id) {
            let omega_rads = ds.chassis_output.commanded_speeds.omega_rads;
            bus.set_yaw_deg(
                exec_params.pigeon_can_id,
                yaw_deg + (omega_rads * cycle_period_s).to_degrees()
            );
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(cycle_period_s)
            .checked_sub(cycle_dur)
        {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            },
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - cycle_period_s
                );
                ds.num_consec_cycle_overruns += 1;

                if ds.num_consec_cycle_overruns > exec_params.max_consec_cycle_overruns {
                    ds.make_safe(SafeModeCause::CycleOverruns);
                }
            }
        }

        ds.cycle_end();
    }

    // ---- SHUTDOWN ----

    info!("Final pose: {:?}", chassis.pose());
    info!("End of execution");

    Ok(())
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CliCmd {
    fn to_chassis_cmd(&self) -> ChassisCmd {
        let frame = |field: bool| if field { Frame::Field } else { Frame::Robot };

        match *self {
            CliCmd::Speeds { vx_ms, vy_ms, omega_rads, field } =>
                ChassisCmd::speeds(vx_ms, vy_ms, omega_rads, frame(field)),
            CliCmd::Percent { drive, strafe, rotate, field } => ChassisCmd::Percent {
                drive,
                strafe,
                rotate,
                frame: frame(field),
            },
            CliCmd::HoldHeading { vx_ms, vy_ms, heading_deg, field } => ChassisCmd::HoldHeading {
                vx_ms,
                vy_ms,
                heading_rad: heading_deg.to_radians(),
                frame: frame(field),
            },
            CliCmd::ZeroAlign => ChassisCmd::ZeroAlign,
            CliCmd::Stop => ChassisCmd::Stop,
        }
    }
}
