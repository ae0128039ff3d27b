// src/mixer.rs

//! # Motor Mixing Module
//!
//! This module combines a throttle command with roll, pitch and yaw
//! corrections into one raw pulse per motor of an X-configuration quadrotor,
//! and provides the saturation guard that brings those raw pulses into the
//! ESC's safe range.
//!
//! ```text
//!        front
//!   (1) CW   CCW (2)
//!        \   /
//!         \ /
//!         / \
//!        /   \
//!   (3) CCW  CW (4)
//!        back
//! ```

pub mod saturation;
pub use saturation::*;

use num_traits::{FromPrimitive, Num, ToPrimitive};

/// Number of motor channels driven by the output stage.
pub const MOTOR_COUNT: usize = 4;

/// Custom trait to encapsulate base number requirements of the mixer.
///
/// Implemented for every primitive numeric type, and for fixed-point types
/// that provide the `num-traits` conversions.
pub trait Number: Num + ToPrimitive + FromPrimitive + PartialOrd + Copy {}

impl<T: Num + ToPrimitive + FromPrimitive + PartialOrd + Copy> Number for T {}

/// Motor channels of the X frame, numbered as the ESC outputs are wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Motor {
    /// Front left, spinning clockwise.
    FrontLeft = 1,
    /// Front right, spinning counter-clockwise.
    FrontRight = 2,
    /// Back left, spinning counter-clockwise.
    BackLeft = 3,
    /// Back right, spinning clockwise.
    BackRight = 4,
}

impl Motor {
    /// All channels in channel-number order.
    pub const ALL: [Motor; MOTOR_COUNT] = [
        Motor::FrontLeft,
        Motor::FrontRight,
        Motor::BackLeft,
        Motor::BackRight,
    ];

    /// Channel number, `1..=4`.
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Zero-based index into per-motor arrays.
    pub const fn index(self) -> usize {
        self as usize - 1
    }
}

/// Per-cycle command produced by the external attitude/rate controllers.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisCommand<T> {
    /// Collective throttle, in pulse microseconds.
    pub throttle: T,
    /// Roll correction, in pulse microseconds.
    pub roll: T,
    /// Pitch correction, in pulse microseconds.
    pub pitch: T,
    /// Yaw correction, in pulse microseconds.
    pub yaw: T,
}

impl<T: Number> AxisCommand<T> {
    /// Creates a command from throttle and the three axis corrections.
    pub fn new(throttle: T, roll: T, pitch: T, yaw: T) -> Self {
        Self {
            throttle,
            roll,
            pitch,
            yaw,
        }
    }
}

/// Mixes throttle and axis corrections into one raw value per motor,
/// indexed by [`Motor::index`]. No clamping happens here.
///
/// Arithmetic is done in `T`, so integer and fixed-point commands follow
/// `T`'s overflow rules. [`mix_pulses`] widens first and never overflows.
pub fn mix<T: Number>(command: &AxisCommand<T>) -> [T; MOTOR_COUNT] {
    let AxisCommand {
        throttle,
        roll,
        pitch,
        yaw,
    } = *command;

    [
        throttle + roll - pitch + yaw, // front left, CW
        throttle - roll - pitch - yaw, // front right, CCW
        throttle + roll + pitch - yaw, // back left, CCW
        throttle - roll + pitch + yaw, // back right, CW
    ]
}

/// Truncates mixed values toward zero into integer microseconds.
///
/// Returns `None` when any value has no `i32` representation (NaN,
/// infinities, or out of range).
pub fn to_raw_pulses<T: Number>(mixed: [T; MOTOR_COUNT]) -> Option<[i32; MOTOR_COUNT]> {
    let mut raw = [0; MOTOR_COUNT];
    for (slot, value) in raw.iter_mut().zip(mixed) {
        *slot = value.to_i32()?;
    }
    Some(raw)
}

/// Mixes `command` in `f64` and truncates the result into integer
/// microseconds.
///
/// Every integer, float and fixed-point input is widened before the sum, so
/// no command overflows. Returns `None` under the same conditions as
/// [`to_raw_pulses`].
pub fn mix_pulses<T: Number>(command: &AxisCommand<T>) -> Option<[i32; MOTOR_COUNT]> {
    let wide = AxisCommand::new(
        command.throttle.to_f64()?,
        command.roll.to_f64()?,
        command.pitch.to_f64()?,
        command.yaw.to_f64()?,
    );
    to_raw_pulses(mix(&wide))
}
