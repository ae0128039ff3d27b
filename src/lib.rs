// src/lib.rs

//! # Quadcopter ESC Pulse Scheduler
//!
//! This crate provides a `no_std`, no-alloc output stage for X-configuration
//! quadrotors driving four ESCs with 1000–2000 µs PWM pulses. It turns the
//! throttle and axis corrections of a flight stabilizer into staggered pulse
//! schedules and generates them from a compare-match timer interrupt.
//!
//! The stage is split between two contexts that share only a [`Handoff`]:
//!
//! - the control loop owns a [`MotorOutput`], which mixes, saturates and
//!   schedules one command per cycle and publishes the result;
//! - the timer interrupt owns a [`PulseEngine`], which raises and lowers the
//!   four lines and switches to a newly published schedule only at a frame
//!   boundary.
//!
//! Logging goes through `defmt` when the `defmt` feature is enabled.

#![no_std]
#![deny(missing_docs)]

#[macro_use]
mod fmt;

pub mod config;
pub mod engine;
pub mod failsafe;
pub mod handoff;
pub mod mixer;
pub mod output;
pub mod schedule;

#[doc(inline)]
pub use config::*;
#[doc(inline)]
pub use engine::*;
#[doc(inline)]
pub use failsafe::*;
#[doc(inline)]
pub use handoff::*;
#[doc(inline)]
pub use mixer::*;
#[doc(inline)]
pub use output::*;
#[doc(inline)]
pub use schedule::*;

#[cfg(test)]
mod test_utils;
