//! Construction of the swerve chassis from its parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, info};
use std::collections::HashSet;
use std::convert::TryInto;

use eqpt_if::{bus::CanBus, eqpt::mot::ControlMode};

use super::{
    ForwardKinematics, ModuleGeometry, ModuleParams, ModulePosition, Params, SwerveChassis,
    SwerveCtrlError, SwerveModule, NUM_MODULES,
};
use crate::hw::DragonMotor;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Builds swerve modules and the chassis from a validated set of parameters.
pub struct SwerveChassisFactory<'p> {
    params: &'p Params,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<'p> SwerveChassisFactory<'p> {
    /// Validate the parameters and create the factory.
    pub fn new(params: &'p Params) -> Result<Self, SwerveCtrlError> {
        validate(params)?;

        Ok(Self { params })
    }

    /// Create one module, configuring its motors on the bus.
    pub fn create_module<B: CanBus + Clone>(
        &self,
        bus: &B,
        module_params: &ModuleParams,
    ) -> SwerveModule<B> {
        debug!(
            "Creating {:?} module (drive {}, steer {})",
            module_params.position, module_params.drive_motor.can_id, module_params.steer_motor.can_id
        );

        let drive = DragonMotor::new(
            bus.clone(),
            &module_params.drive_motor,
            self.params.drive_gear_ratio,
            &self.params.drive_control,
        );
        let steer = DragonMotor::new(
            bus.clone(),
            &module_params.steer_motor,
            self.params.steer_gear_ratio,
            &self.params.steer_control,
        );

        SwerveModule::new(self.params, module_params, drive, steer)
    }

    /// Create the chassis with all four modules.
    pub fn create_chassis<B: CanBus + Clone>(
        &self,
        bus: &B,
    ) -> Result<SwerveChassis<B>, SwerveCtrlError> {
        let mut modules: Vec<SwerveModule<B>> = self
            .params
            .modules
            .iter()
            .map(|mp| self.create_module(bus, mp))
            .collect();

        modules.sort_by_key(|m| m.position().index());

        let modules: [SwerveModule<B>; NUM_MODULES] = modules
            .try_into()
            .map_err(|v: Vec<SwerveModule<B>>| SwerveCtrlError::WrongModuleCount(v.len()))?;

        let fk = ForwardKinematics::new(&geometry(self.params))?;

        info!("Swerve chassis created");

        Ok(SwerveChassis::from_modules(self.params.clone(), modules, fk))
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the contact point of every module, in module index order.
///
/// The parameters must contain each position exactly once.
pub(crate) fn geometry(params: &Params) -> [ModuleGeometry; NUM_MODULES] {
    let mut geom = [ModuleGeometry::default(); NUM_MODULES];

    for mp in params.modules.iter() {
        geom[mp.position.index()] = mp.geometry(params.wheel_base_m, params.track_m);
    }

    geom
}

/// Check that the parameters describe a chassis which can be built.
fn validate(params: &Params) -> Result<(), SwerveCtrlError> {
    let positive = [
        ("wheel_base_m", params.wheel_base_m),
        ("track_m", params.track_m),
        ("wheel_diameter_m", params.wheel_diameter_m),
        ("drive_gear_ratio", params.drive_gear_ratio),
        ("steer_gear_ratio", params.steer_gear_ratio),
        ("max_speed_ms", params.max_speed_ms),
        ("max_angular_speed_rads", params.max_angular_speed_rads),
        ("cycle_period_s", params.cycle_period_s),
    ];

    for (name, value) in positive.iter() {
        if !(value.is_finite() && *value > 0.0) {
            return Err(SwerveCtrlError::InvalidParam(*name, *value));
        }
    }

    let optional = [
        ("max_accel_mss", params.max_accel_mss),
        ("max_angular_accel_radss", params.max_angular_accel_radss),
    ];

    for (name, value) in optional.iter() {
        if let Some(v) = value {
            if !(v.is_finite() && *v > 0.0) {
                return Err(SwerveCtrlError::InvalidParam(*name, *v));
            }
        }
    }

    let gains = [
        ("head_k_p", params.head_k_p),
        ("head_k_i", params.head_k_i),
        ("head_k_d", params.head_k_d),
    ];

    for (name, value) in gains.iter() {
        if !value.is_finite() {
            return Err(SwerveCtrlError::InvalidParam(*name, *value));
        }
    }

    let controls = [
        (&params.drive_control, ControlMode::Velocity),
        (&params.steer_control, ControlMode::Position),
    ];

    for (control, mode) in controls.iter() {
        if !control.is_valid() {
            return Err(SwerveCtrlError::InvalidControlData(control.identifier.clone()));
        }
        if control.mode != *mode {
            return Err(SwerveCtrlError::WrongControlMode(control.identifier.clone(), *mode));
        }
    }

    if params.modules.len() != NUM_MODULES {
        return Err(SwerveCtrlError::WrongModuleCount(params.modules.len()));
    }

    let mut positions: HashSet<ModulePosition> = HashSet::new();
    let mut ids = HashSet::new();

    for mp in params.modules.iter() {
        if !positions.insert(mp.position) {
            return Err(SwerveCtrlError::DuplicateModule(mp.position));
        }

        for id in [mp.drive_motor.can_id, mp.steer_motor.can_id].iter() {
            if !ids.insert(*id) {
                return Err(SwerveCtrlError::DuplicateCanId(*id));
            }
        }

        if let Some([x, y]) = mp.offset_m {
            if !x.is_finite() {
                return Err(SwerveCtrlError::InvalidParam("offset_m", x));
            }
            if !y.is_finite() {
                return Err(SwerveCtrlError::InvalidParam("offset_m", y));
            }
        }

        if !mp.steer_offset_rad.is_finite() {
            return Err(SwerveCtrlError::InvalidParam("steer_offset_rad", mp.steer_offset_rad));
        }
    }

    ForwardKinematics::new(&geometry(params))?;

    Ok(())
}
