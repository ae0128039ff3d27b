// src/schedule.rs

//! # Tick Schedule Builder
//!
//! Converts a saturated [`MotorPulses`] set into the tick schedule executed by
//! the [`PulseEngine`](crate::PulseEngine).
//!
//! Channels are ordered by ascending pulse length and started one stagger gap
//! apart, so the ESCs never draw their start current at the same instant:
//!
//! ```text
//! tick:  0   GAP  2GAP 3GAP 4GAP            end[0] end[1] end[2] end[3]
//! ch a:      |‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾|
//! ch b:           |‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾|
//! ch c:                |‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾|
//! ch d:                     |‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾|
//! ```
//!
//! Because the shortest pulse starts first, end ticks come out in the same
//! order as start ticks.

use crate::{Motor, MotorPulses, TimingConfig, MOTOR_COUNT};

/// One channel's pulse within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScheduleEntry {
    /// Channel this entry drives.
    pub motor: Motor,
    /// Tick at which the line goes high.
    pub start_tick: u16,
    /// Tick at which the line goes low.
    pub end_tick: u16,
}

impl ScheduleEntry {
    /// Commanded pulse length in ticks.
    pub fn duration_ticks(&self) -> u16 {
        self.end_tick - self.start_tick
    }
}

/// Four entries sorted by ascending pulse length.
///
/// Entry `i` starts at `(i + 1) * gap_ticks` and ends `duration` ticks later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Schedule {
    entries: [ScheduleEntry; MOTOR_COUNT],
}

impl Schedule {
    /// Placeholder content of a slot that has never been written.
    pub const EMPTY: Schedule = Schedule {
        entries: [
            ScheduleEntry {
                motor: Motor::FrontLeft,
                start_tick: 0,
                end_tick: 0,
            },
            ScheduleEntry {
                motor: Motor::FrontRight,
                start_tick: 0,
                end_tick: 0,
            },
            ScheduleEntry {
                motor: Motor::BackLeft,
                start_tick: 0,
                end_tick: 0,
            },
            ScheduleEntry {
                motor: Motor::BackRight,
                start_tick: 0,
                end_tick: 0,
            },
        ],
    };

    /// Builds the staggered schedule for one pulse set.
    ///
    /// The sort is a stable insertion sort: at four elements its worst case
    /// is short and fixed, and equal pulses keep channel-number order, so
    /// identical inputs always give identical schedules.
    ///
    /// The timing is expected to come from a validated
    /// [`MotorConfig`](crate::MotorConfig) and the pulses from
    /// [`saturate`](crate::saturate); out-of-range ticks saturate at
    /// `u16::MAX` instead of wrapping.
    pub fn build(pulses: &MotorPulses, timing: &TimingConfig) -> Self {
        let mut order = Motor::ALL;
        let mut ticks = Motor::ALL.map(|motor| timing.us_to_ticks(pulses.get(motor)));

        for i in 1..MOTOR_COUNT {
            let mut j = i;
            while j > 0 && ticks[j - 1] > ticks[j] {
                ticks.swap(j - 1, j);
                order.swap(j - 1, j);
                j -= 1;
            }
        }

        let mut entries = Self::EMPTY.entries;
        for (position, entry) in entries.iter_mut().enumerate() {
            let start = timing.start_tick(position);
            *entry = ScheduleEntry {
                motor: order[position],
                start_tick: to_tick(start),
                end_tick: to_tick(ticks[position] + start),
            };
        }

        Schedule { entries }
    }

    /// Entries in execution order.
    pub fn entries(&self) -> &[ScheduleEntry; MOTOR_COUNT] {
        &self.entries
    }

    /// Entry at sorted position `position`.
    ///
    /// # Panics
    /// If `position >= MOTOR_COUNT`.
    pub fn entry(&self, position: usize) -> &ScheduleEntry {
        &self.entries[position]
    }

    /// Entry driving `motor`.
    pub fn for_motor(&self, motor: Motor) -> &ScheduleEntry {
        // Every schedule holds each motor exactly once.
        self.entries
            .iter()
            .find(|entry| entry.motor == motor)
            .unwrap_or(&self.entries[motor.index()])
    }

    /// Pulse lengths in ticks, indexed by [`Motor::index`].
    pub fn durations_by_motor(&self) -> [u16; MOTOR_COUNT] {
        Motor::ALL.map(|motor| self.for_motor(motor).duration_ticks())
    }
}

fn to_tick(ticks: u32) -> u16 {
    u16::try_from(ticks).unwrap_or(u16::MAX)
}
