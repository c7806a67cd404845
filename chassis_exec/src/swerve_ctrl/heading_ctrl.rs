//! # Heading controller
//!
//! Provides the PID controller used to hold the chassis at a target heading.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PID controller
#[derive(Debug, Serialize, Clone)]
pub struct PidController {
    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Dervative gain
    k_d: f64,

    /// Previous error
    prev_error: Option<f64>,

    /// The integral accumulation
    integral: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidController {

    /// Create a new controller with the given gains.
    pub fn new(k_p: f64, k_i: f64, k_d: f64) -> Self {
        Self {
            k_p, k_i, k_d,
            integral: 0f64,
            prev_error: None
        }
    }

    /// Clear the integral and derivative history.
    pub fn reset(&mut self) {
        self.integral = 0f64;
        self.prev_error = None;
    }

    /// Get the value of the controller for the given error, `dt` seconds after the previous call.
    ///
    /// The chassis runs at a fixed cycle so `dt` is the cycle period rather than a measured time.
    pub fn get(&mut self, error: f64, dt: f64) -> f64 {
        // Only accumulate and differentiate with a usable time step, a zero step would spike
        // both terms.
        let valid_dt = dt.is_finite() && dt > 0.0;

        if valid_dt {
            self.integral += error * dt;
        }

        // No derivative on the first call after a reset, otherwise the whole error appears as a
        // step.
        let deriv = match (self.prev_error, valid_dt) {
            (Some(e), true) => (error - e) / dt,
            _ => 0f64,
        };

        // Calculate the output
        let out =
            self.k_p * error
            + self.k_i * self.integral
            + self.k_d * deriv;

        // Remember the previous error
        self.prev_error = Some(error);

        out
    }
}
