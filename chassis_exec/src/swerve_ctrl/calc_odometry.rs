//! Forward kinematics and odometry

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, trace};
use nalgebra::{SMatrix, SVector};

use super::{ChassisSpeeds, ModuleGeometry, SwerveCtrlError, WheelState, NUM_MODULES};
use crate::loc::Pose;
use util::maths::normalise_angle;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of rows in the kinematic matrix, two per module.
const FK_ROWS: usize = 2 * NUM_MODULES;

/// Determinant of `A^T A` below which the module layout is considered degenerate.
const DEGENERATE_DET_LIMIT: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Least squares solution of the chassis motion from the motion of each wheel.
///
/// Each wheel contributes two rows `[1, 0, -y; 0, 1, x]` to the kinematic matrix `A`, the solver
/// holds the pseudo-inverse `(A^T A)^-1 A^T` so that solving is a single matrix product.
#[derive(Debug, Clone)]
pub struct ForwardKinematics {
    pinv: SMatrix<f64, 3, FK_ROWS>,
}

/// Integrates module feedback and the heading sensor into the chassis pose.
#[derive(Debug, Clone)]
pub(crate) struct Odometry {
    fk: ForwardKinematics,

    pose: Pose,

    /// Distance reported by each module on the previous cycle
    prev_distance_m: Option<[f64; NUM_MODULES]>,

    /// Sensor yaw on the previous cycle it was available
    prev_yaw_rad: Option<f64>,

    /// Added to the sensor yaw to give the field heading, `None` until a yaw reading arrives
    /// after a pose reset.
    heading_offset_rad: Option<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ForwardKinematics {
    /// Build the solver for the given module layout.
    ///
    /// Fails with `DegenerateGeometry` if the layout does not determine the chassis motion, for
    /// example when every wheel sits on the same point.
    pub fn new(geometry: &[ModuleGeometry; NUM_MODULES]) -> Result<Self, SwerveCtrlError> {
        let mut a = SMatrix::<f64, FK_ROWS, 3>::zeros();

        for (i, g) in geometry.iter().enumerate() {
            a[(2 * i, 0)] = 1.0;
            a[(2 * i, 2)] = -g.y_m;
            a[(2 * i + 1, 1)] = 1.0;
            a[(2 * i + 1, 2)] = g.x_m;
        }

        let at = a.transpose();
        let ata = at * a;
        if !(ata.determinant().abs() > DEGENERATE_DET_LIMIT) {
            return Err(SwerveCtrlError::DegenerateGeometry);
        }
        let ata_inv = ata
            .try_inverse()
            .ok_or(SwerveCtrlError::DegenerateGeometry)?;

        let pinv = ata_inv * at;
        if pinv.iter().any(|v| !v.is_finite()) {
            return Err(SwerveCtrlError::DegenerateGeometry);
        }

        Ok(Self { pinv })
    }

    /// Solve for the chassis motion `(x, y, theta)` given the motion vector of each wheel.
    pub fn solve(&self, wheel_vectors: &[(f64, f64); NUM_MODULES]) -> (f64, f64, f64) {
        let mut b = SVector::<f64, FK_ROWS>::zeros();

        for (i, (x, y)) in wheel_vectors.iter().enumerate() {
            b[2 * i] = *x;
            b[2 * i + 1] = *y;
        }

        let sol = self.pinv * b;

        (sol[0], sol[1], sol[2])
    }
}

/// Calculate the robot frame chassis speeds from the measured wheel states.
pub fn forward_kinematics(
    fk: &ForwardKinematics,
    states: &[WheelState; NUM_MODULES],
) -> ChassisSpeeds {
    let mut vectors = [(0f64, 0f64); NUM_MODULES];

    for (v, s) in vectors.iter_mut().zip(states.iter()) {
        *v = (s.speed_ms * s.angle_rad.cos(), s.speed_ms * s.angle_rad.sin());
    }

    let (vx, vy, omega) = fk.solve(&vectors);

    ChassisSpeeds::new(vx, vy, omega)
}

impl Odometry {
    pub fn new(fk: ForwardKinematics) -> Self {
        Self {
            fk,
            pose: Pose::default(),
            prev_distance_m: None,
            prev_yaw_rad: None,
            heading_offset_rad: Some(0.0),
        }
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn fk(&self) -> &ForwardKinematics {
        &self.fk
    }

    /// Overwrite the pose.
    ///
    /// The heading sensor is left untouched, instead the offset between the sensor yaw and the
    /// field heading is changed so that the pose keeps the given heading.
    pub fn reset_pose(&mut self, pose: Pose) {
        self.pose = Pose::new(pose.x_m, pose.y_m, pose.heading_rad);

        self.heading_offset_rad = self
            .prev_yaw_rad
            .map(|yaw| pose.heading_rad - yaw);
    }

    /// Integrate one cycle of feedback into the pose.
    ///
    /// Returns the new pose and true if the heading change had to be taken from the wheels
    /// because no sensor yaw was available.
    pub fn update(
        &mut self,
        measured: &[WheelState; NUM_MODULES],
        yaw_rad: Option<f64>,
    ) -> (Pose, bool) {
        let mut distance_m = [0f64; NUM_MODULES];
        for (d, s) in distance_m.iter_mut().zip(measured.iter()) {
            *d = s.distance_m.unwrap_or(0.0);
        }

        // Heading the sensor says the chassis has now
        let sensor_heading = match (yaw_rad, self.heading_offset_rad) {
            (Some(yaw), Some(offset)) => Some(normalise_angle(yaw + offset)),
            (Some(yaw), None) => {
                // First reading after a reset, keep the heading we were given
                self.heading_offset_rad = Some(self.pose.heading_rad - yaw);
                Some(self.pose.heading_rad)
            }
            (None, _) => None,
        };

        if yaw_rad.is_some() {
            self.prev_yaw_rad = yaw_rad;
        }

        let prev_distance_m = match self.prev_distance_m {
            Some(d) => d,
            None => {
                // Nothing to difference against, baseline only
                self.prev_distance_m = Some(distance_m);
                if let Some(h) = sensor_heading {
                    self.pose.heading_rad = h;
                }
                return (self.pose, sensor_heading.is_none());
            }
        };

        let mut deltas = [(0f64, 0f64); NUM_MODULES];
        for i in 0..NUM_MODULES {
            let delta = distance_m[i] - prev_distance_m[i];
            let angle = measured[i].angle_rad;
            deltas[i] = (delta * angle.cos(), delta * angle.sin());
        }
        self.prev_distance_m = Some(distance_m);

        let (dx_m, dy_m, wheel_dtheta_rad) = self.fk.solve(&deltas);

        let (dtheta_rad, heading_from_wheels) = match sensor_heading {
            Some(h) => (normalise_angle(h - self.pose.heading_rad), false),
            None => {
                debug!("No heading sensor reading, using wheel odometry for the heading");
                (wheel_dtheta_rad, true)
            }
        };

        let mut pose = self.pose.exp(dx_m, dy_m, dtheta_rad);

        // The sensor heading is authoritative, don't let rounding in the integration drift it
        if let Some(h) = sensor_heading {
            pose.heading_rad = h;
        }

        trace!(
            "Odometry delta: ({:.4}, {:.4}, {:.4}), pose: {:?}",
            dx_m,
            dy_m,
            dtheta_rad,
            pose
        );

        self.pose = pose;

        (self.pose, heading_from_wheels)
    }
}
