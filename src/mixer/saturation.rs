// src/mixer/saturation.rs

//! # Saturation Guard
//!
//! Brings raw mixer outputs into the ESC range. Both passes shift all four
//! motors by the same amount instead of clamping them one by one, so the
//! differences between motors, and with them the commanded attitude
//! correction, survive saturation.

use super::{Motor, MOTOR_COUNT};
use crate::PulseLimits;

/// Saturated pulse widths in microseconds, indexed by [`Motor::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorPulses(pub [u16; MOTOR_COUNT]);

impl MotorPulses {
    /// The stopped pulse on every channel.
    pub const fn stopped(limits: &PulseLimits) -> Self {
        Self([limits.zero_throttle; MOTOR_COUNT])
    }

    /// Pulse width of one motor.
    pub fn get(&self, motor: Motor) -> u16 {
        self.0[motor.index()]
    }
}

/// Applies the ceiling pass and then the floor pass to raw mixer outputs.
///
/// - Ceiling: if the highest motor exceeds `throttle_limit`, all motors are
///   lowered by the excess.
/// - Floor: below `min_spin` commanded throttle every motor is stopped;
///   otherwise, if the lowest motor is under `min_spin`, all motors are raised
///   by the shortfall.
///
/// Corrections wider than the `min_spin..=throttle_limit` window cannot be
/// shifted into it; the motors the floor pass lifts above the ceiling are
/// then held at `throttle_limit`.
pub fn saturate(raw: [i32; MOTOR_COUNT], throttle: i32, limits: &PulseLimits) -> MotorPulses {
    let ceiling = i64::from(limits.throttle_limit);
    let floor = i64::from(limits.min_spin);

    if throttle < i32::from(limits.min_spin) {
        return MotorPulses::stopped(limits);
    }

    let mut pulses = raw.map(i64::from);

    let excess = max(&pulses) - ceiling;
    if excess > 0 {
        pulses.iter_mut().for_each(|pulse| *pulse -= excess);
    }

    let shortfall = floor - min(&pulses);
    if shortfall > 0 {
        pulses.iter_mut().for_each(|pulse| *pulse += shortfall);
    }

    // Every value now lies in `floor..=ceiling` except the wide-spread case
    // described above, which `min` folds back under the ceiling.
    MotorPulses(pulses.map(|pulse| pulse.min(ceiling) as u16))
}

fn max(values: &[i64; MOTOR_COUNT]) -> i64 {
    values.iter().copied().fold(i64::MIN, i64::max)
}

fn min(values: &[i64; MOTOR_COUNT]) -> i64 {
    values.iter().copied().fold(i64::MAX, i64::min)
}
