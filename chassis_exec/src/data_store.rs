//! # Data Store

use log::{info, warn};

use crate::swerve_ctrl::{self, ChassisCmd, NUM_MODULES};

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Gives the reason the chassis has been put into safe mode
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum SafeModeCause {
    /// A swerve module has a motor which has stopped responding or reported a hardware failure
    ModuleFaulted,

    /// Too many consecutive cycles overran their period
    CycleOverruns,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Session elapsed time
    pub session_time_s: f64,

    // Safe mode variables
    /// Determines if the chassis is in safe mode.
    pub safe: bool,

    /// Gives the reason for the chassis being in safe mode.
    pub safe_cause: Option<SafeModeCause>,

    // SwerveCtrl
    pub chassis_input: swerve_ctrl::InputData,
    pub chassis_output: swerve_ctrl::OutputData,
    pub chassis_status_rpt: swerve_ctrl::StatusReport,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Puts the chassis into safe mode with the given cause.
    pub fn make_safe(&mut self, cause: SafeModeCause) {
        if !self.safe {
            warn!("Make safe requested, cause: {:?}", cause);
            self.safe = true;
            self.safe_cause = Some(cause);
        }
    }

    /// Attempts to disable the safe mode by clearing the given cause.
    ///
    /// Returns `Ok(())` if this cause was cleared and safe mode was disabled, or `Err(())`
    /// otherwise. To remove safe mode the provided cause must match the initial reason for safe
    /// mode being enabled.
    ///
    /// If safe mode was not enabled `Ok(())` is returned
    pub fn make_unsafe(&mut self, cause: SafeModeCause) -> Result<(), ()> {
        if !self.safe {
            return Ok(());
        }

        match self.safe_cause {
            Some(root_cause) => {
                if cause == root_cause {
                    self.safe = false;
                    self.safe_cause = None;
                    info!("Make unsafe requested, root cause match, safe mode disabled");
                    Ok(())
                } else {
                    Err(())
                }
            }
            None => Ok(()),
        }
    }

    /// Check the last chassis status report for faulted modules, entering or leaving safe mode.
    ///
    /// There is no reconfiguration around a faulted module, the chassis is stopped until every
    /// module is healthy again.
    pub fn check_modules(&mut self) {
        let faulted: Vec<usize> = (0..NUM_MODULES)
            .filter(|i| self.chassis_status_rpt.faulted_modules[*i])
            .collect();

        if faulted.is_empty() {
            self.make_unsafe(SafeModeCause::ModuleFaulted).ok();
        }
        else {
            if !self.safe {
                warn!("Modules {:?} are persistently faulted", faulted);
            }
            self.make_safe(SafeModeCause::ModuleFaulted);
        }
    }

    /// Restrict this cycle's chassis input to what is allowed in safe mode.
    ///
    /// In safe mode any new command other than stop is dropped, and the chassis is commanded to
    /// stop if `current_cmd` (the command it is executing) is anything else.
    pub fn apply_safe_mode(&mut self, current_cmd: Option<ChassisCmd>) {
        if !self.safe {
            return;
        }

        if let Some(cmd) = self.chassis_input.cmd {
            if cmd != ChassisCmd::Stop {
                warn!("Chassis command rejected in safe mode: {:?}", cmd);
            }
        }

        self.chassis_input.cmd = match current_cmd {
            Some(ChassisCmd::Stop) => None,
            _ => Some(ChassisCmd::Stop),
        };
    }

    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and sets the 1Hz cycle flag.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        let cycles_per_s = (cycle_frequency_hz.round() as u128).max(1);
        self.is_1_hz_cycle = self.num_cycles % cycles_per_s == 0;

        // The status report is kept, safe mode checks run on the previous cycle's report
        self.chassis_input = swerve_ctrl::InputData::default();

        self.session_time_s = util::session::get_elapsed_seconds();
    }

    /// Perform actions required at the end of a cycle.
    pub fn cycle_end(&mut self) {
        self.num_cycles += 1;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::swerve_ctrl::Frame;

    #[test]
    fn test_safe_mode_stops_chassis() {
        let mut ds = DataStore::default();
        let driving = Some(ChassisCmd::speeds(1.0, 0.0, 0.0, Frame::Robot));

        ds.chassis_status_rpt.faulted_modules[1] = true;
        ds.check_modules();
        assert!(ds.safe);
        assert_eq!(ds.safe_cause, Some(SafeModeCause::ModuleFaulted));

        // A new drive command is replaced by stop
        ds.chassis_input.cmd = driving;
        ds.apply_safe_mode(driving);
        assert_eq!(ds.chassis_input.cmd, Some(ChassisCmd::Stop));

        // Once stopped nothing more is sent
        ds.chassis_input.cmd = driving;
        ds.apply_safe_mode(Some(ChassisCmd::Stop));
        assert_eq!(ds.chassis_input.cmd, None);
    }

    #[test]
    fn test_not_safe_passes_commands() {
        let mut ds = DataStore::default();
        let driving = Some(ChassisCmd::speeds(1.0, 0.0, 0.0, Frame::Robot));

        ds.check_modules();
        ds.chassis_input.cmd = driving;
        ds.apply_safe_mode(None);
        assert_eq!(ds.chassis_input.cmd, driving);
    }

    #[test]
    fn test_make_unsafe_needs_root_cause() {
        let mut ds = DataStore::default();
        ds.make_safe(SafeModeCause::CycleOverruns);

        ds.chassis_status_rpt = swerve_ctrl::StatusReport::default();
        ds.check_modules();
        assert!(ds.safe);

        assert!(ds.make_unsafe(SafeModeCause::CycleOverruns).is_ok());
        assert!(!ds.safe);
    }

    #[test]
    fn test_1_hz_cycle() {
        let mut ds = DataStore::default();

        ds.cycle_start(50.0);
        assert!(ds.is_1_hz_cycle);

        ds.cycle_end();
        ds.cycle_start(50.0);
        assert!(!ds.is_1_hz_cycle);
    }
}
