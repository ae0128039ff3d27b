// src/config.rs

//! # Output Stage Configuration
//!
//! Pulse limits and timer constants shared by the control-loop side
//! ([`MotorOutput`](crate::MotorOutput)) and the interrupt side
//! ([`PulseEngine`](crate::PulseEngine)). A configuration is validated once,
//! when either side is constructed; every per-cycle operation afterwards is
//! total.

use crate::MOTOR_COUNT;

/// Pulse width limits in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulseLimits {
    /// Ceiling no motor pulse may exceed.
    pub throttle_limit: u16,
    /// Lowest pulse at which the motors still spin reliably.
    pub min_spin: u16,
    /// Pulse sent to every motor when stopped or disarmed.
    pub zero_throttle: u16,
}

/// Hardware timer constants, in timer ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimingConfig {
    /// Timer ticks per microsecond, fixed by the timer clock prescaler.
    pub ticks_per_us: u16,
    /// Stagger interval between consecutive channel starts.
    pub gap_ticks: u16,
    /// Length of one full output frame.
    pub cycle_ticks: u16,
}

/// Complete configuration of the motor output stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorConfig {
    /// Pulse width limits.
    pub limits: PulseLimits,
    /// Timer constants.
    pub timing: TimingConfig,
}

/// Reasons a [`MotorConfig`] is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// The timer must advance at least one tick per microsecond.
    #[error("tick rate must be at least one tick per microsecond")]
    ZeroTickRate,
    /// Channels must be staggered by a non-zero gap.
    #[error("stagger gap must be non-zero")]
    ZeroGap,
    /// Limits must satisfy `zero_throttle <= min_spin <= throttle_limit`.
    #[error("pulse limits out of order: zero {zero_throttle}, min spin {min_spin}, limit {throttle_limit}")]
    LimitsOutOfOrder {
        /// Configured stopped pulse.
        zero_throttle: u16,
        /// Configured minimum spin pulse.
        min_spin: u16,
        /// Configured ceiling.
        throttle_limit: u16,
    },
    /// The longest pulse of the last staggered channel ends after the frame.
    #[error("last pulse ends at tick {last_end_tick}, frame is {cycle_ticks} ticks")]
    FrameOverrun {
        /// End tick of the longest possible last channel.
        last_end_tick: u32,
        /// Configured frame length.
        cycle_ticks: u16,
    },
    /// The shortest pulse would end before the last channel has started.
    #[error("shortest pulse of {shortest_pulse_ticks} ticks overlaps a stagger of {stagger_ticks} ticks")]
    StaggerOverlap {
        /// Tick length of the stopped pulse.
        shortest_pulse_ticks: u32,
        /// Ticks between the first and last channel start.
        stagger_ticks: u32,
    },
}

impl PulseLimits {
    /// ESC limits used by the reference airframe.
    pub const fn new() -> Self {
        Self {
            throttle_limit: 2000,
            min_spin: 1100,
            zero_throttle: 1000,
        }
    }
}

impl TimingConfig {
    /// 16 MHz timer clock with a /8 prescaler: 2 ticks per microsecond,
    /// a 50 µs stagger and a 5 ms (200 Hz) frame.
    pub const fn new() -> Self {
        Self {
            ticks_per_us: 2,
            gap_ticks: 100,
            cycle_ticks: 10_000,
        }
    }

    /// Converts a pulse width in microseconds into timer ticks.
    pub fn us_to_ticks(&self, us: u16) -> u32 {
        u32::from(us) * u32::from(self.ticks_per_us)
    }

    /// Start tick of the channel at sorted position `position`.
    pub fn start_tick(&self, position: usize) -> u32 {
        (position as u32 + 1) * u32::from(self.gap_ticks)
    }
}

impl MotorConfig {
    /// Creates a configuration with the reference airframe defaults.
    /// Fields are public and can be changed before the configuration is
    /// handed to the output stage.
    ///
    /// Example Usage
    /// ```
    /// use quad_esc_scheduler::MotorConfig;
    ///
    /// let mut config = MotorConfig::new();
    ///
    /// // ESCs calibrated for a 1050..1950 µs window.
    /// config.limits.zero_throttle = 1050;
    /// config.limits.min_spin = 1120;
    /// config.limits.throttle_limit = 1950;
    ///
    /// // 400 Hz frame on the same 2 ticks/µs timer.
    /// config.timing.cycle_ticks = 5_000;
    ///
    /// assert!(config.validate().is_ok());
    /// ```
    pub const fn new() -> Self {
        Self {
            limits: PulseLimits::new(),
            timing: TimingConfig::new(),
        }
    }

    /// Checks that every schedule built from this configuration fits inside
    /// one frame and that the 16-bit tick arithmetic cannot overflow.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let PulseLimits {
            throttle_limit,
            min_spin,
            zero_throttle,
        } = self.limits;
        let timing = &self.timing;

        if timing.ticks_per_us == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        if timing.gap_ticks == 0 {
            return Err(ConfigError::ZeroGap);
        }
        if !(zero_throttle <= min_spin && min_spin <= throttle_limit) {
            return Err(ConfigError::LimitsOutOfOrder {
                zero_throttle,
                min_spin,
                throttle_limit,
            });
        }

        let last_end_tick = timing.us_to_ticks(throttle_limit) + timing.start_tick(MOTOR_COUNT - 1);
        if last_end_tick >= u32::from(timing.cycle_ticks) {
            return Err(ConfigError::FrameOverrun {
                last_end_tick,
                cycle_ticks: timing.cycle_ticks,
            });
        }

        // The first channel ends at `ticks + gap`, the last one starts at
        // `MOTOR_COUNT * gap`.
        let shortest_pulse_ticks = timing.us_to_ticks(zero_throttle);
        let stagger_ticks = (MOTOR_COUNT as u32 - 1) * u32::from(timing.gap_ticks);
        if shortest_pulse_ticks <= stagger_ticks {
            return Err(ConfigError::StaggerOverlap {
                shortest_pulse_ticks,
                stagger_ticks,
            });
        }

        Ok(())
    }
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self::new()
    }
}
