// src/failsafe.rs

//! # Connection-Loss Descent
//!
//! When the radio link is lost the aircraft should come down slowly instead
//! of dropping. [`DescentFailsafe`] starts from the last commanded throttle
//! and lowers it by one microsecond per control cycle while the vertical
//! acceleration shows the aircraft is not yet descending. Once throttle falls
//! below the cutoff the motors are stopped and stay stopped.
//!
//! The failsafe sits outside the output stage and drives it only through
//! [`MotorOutput::process_motors`] and [`MotorOutput::set_motors_low`].
//!
//! ## Usage
//!
//! ```
//! use quad_esc_scheduler::{DescentFailsafe, DescentStep, Handoff, MotorConfig, MotorOutput};
//!
//! let handoff = Handoff::new();
//! let mut output = MotorOutput::new(MotorConfig::new(), &handoff).unwrap();
//!
//! // Link lost while hovering at 1052 µs; 1.05 g marks a descent.
//! let mut failsafe = DescentFailsafe::new(1052, 1.05_f32);
//!
//! assert_eq!(DescentStep::Descending(1051), failsafe.drive(&mut output, 1.0, 0.0, 0.0, 0.0));
//! assert_eq!(DescentStep::Descending(1050), failsafe.drive(&mut output, 1.0, 0.0, 0.0, 0.0));
//! assert_eq!(DescentStep::Stopped, failsafe.drive(&mut output, 1.0, 0.0, 0.0, 0.0));
//! ```

use crate::{AxisCommand, MotorOutput, Number};

/// Throttle below which the descent stops the motors, in microseconds.
pub const DESCENT_CUTOFF_US: u16 = 1050;

/// Result of one failsafe cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DescentStep {
    /// Still descending with this throttle, in microseconds.
    Descending(u16),
    /// Motors stopped; latched until the failsafe is recreated.
    Stopped,
}

/// Gradual throttle reduction after connection loss.
#[derive(Debug, Clone, Copy)]
pub struct DescentFailsafe<T: Number> {
    throttle: u16,
    accel_threshold: T,
    cutoff: u16,
    stopped: bool,
}

impl<T: Number> DescentFailsafe<T> {
    /// Starts a descent from `start_throttle_us`.
    ///
    /// Throttle is lowered while the vertical acceleration is below
    /// `accel_threshold`, in the unit of the caller's IMU.
    pub fn new(start_throttle_us: u16, accel_threshold: T) -> Self {
        Self {
            throttle: start_throttle_us,
            accel_threshold,
            cutoff: DESCENT_CUTOFF_US,
            stopped: false,
        }
    }

    /// Replaces the default [`DESCENT_CUTOFF_US`].
    pub fn with_cutoff(mut self, cutoff_us: u16) -> Self {
        self.cutoff = cutoff_us;
        self
    }

    /// Advances one control cycle with the measured vertical acceleration.
    pub fn step(&mut self, z_accel: T) -> DescentStep {
        if self.stopped {
            return DescentStep::Stopped;
        }

        if z_accel < self.accel_threshold {
            self.throttle = self.throttle.saturating_sub(1);
        }

        if self.throttle < self.cutoff {
            warn!("descent cutoff reached at {} us", self.throttle);
            self.stopped = true;
            return DescentStep::Stopped;
        }

        DescentStep::Descending(self.throttle)
    }

    /// Runs [`step`](Self::step) and forwards the result to `output`, keeping
    /// the stabilizer's axis corrections while descending.
    pub fn drive(
        &mut self,
        output: &mut MotorOutput<'_>,
        z_accel: T,
        roll: T,
        pitch: T,
        yaw: T,
    ) -> DescentStep {
        match self.step(z_accel) {
            DescentStep::Descending(throttle) => match T::from_u16(throttle) {
                Some(throttle) => {
                    output.process_motors(AxisCommand::new(throttle, roll, pitch, yaw));
                    DescentStep::Descending(self.throttle)
                }
                None => {
                    self.stopped = true;
                    output.set_motors_low();
                    DescentStep::Stopped
                }
            },
            DescentStep::Stopped => {
                output.set_motors_low();
                DescentStep::Stopped
            }
        }
    }

    /// Current descent throttle, in microseconds.
    pub fn throttle(&self) -> u16 {
        self.throttle
    }

    /// Whether the motors have been stopped.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}
