// src/output.rs

//! # Motor Output
//!
//! Control-loop half of the output stage. Once per control cycle the
//! stabilizer hands its throttle and axis corrections to
//! [`MotorOutput::process_motors`], which runs the whole producer pipeline:
//!
//! ```text
//! AxisCommand -> mix_pulses -> saturate -> Schedule::build -> Handoff::publish
//! ```
//!
//! The resulting schedule is picked up by the [`PulseEngine`](crate::PulseEngine)
//! at its next frame boundary.

use crate::{
    mix_pulses, saturate, AxisCommand, ConfigError, Handoff, MotorConfig, MotorPulses, Number,
    Schedule,
};

/// Producer side of the output stage.
///
/// Owns the `main` schedule slot; the staging slot lives in the shared
/// [`Handoff`].
pub struct MotorOutput<'a> {
    config: MotorConfig,
    main: Schedule,
    handoff: &'a Handoff,
}

impl<'a> MotorOutput<'a> {
    /// Validates `config` and publishes the stopped schedule, so the first
    /// frame the interrupt side adopts is a safe one.
    pub fn new(config: MotorConfig, handoff: &'a Handoff) -> Result<Self, ConfigError> {
        if let Err(error) = config.validate() {
            warn!("motor configuration rejected: {}", error);
            return Err(error);
        }

        let mut output = MotorOutput {
            config,
            main: Schedule::EMPTY,
            handoff,
        };
        output.set_motors_low();
        Ok(output)
    }

    /// Mixes, saturates, schedules and publishes one control cycle.
    ///
    /// Returns the saturated pulse set that was published. A command whose
    /// mixed values have no `i32` representation (NaN or infinite
    /// corrections, sums beyond the `i32` range) publishes the stopped pulse
    /// set instead.
    pub fn process_motors<T: Number>(&mut self, command: AxisCommand<T>) -> MotorPulses {
        let limits = &self.config.limits;
        let raw = mix_pulses(&command);
        let throttle = command.throttle.to_i32();

        let pulses = match (raw, throttle) {
            (Some(raw), Some(throttle)) => saturate(raw, throttle, limits),
            _ => {
                warn!("mixer output not representable, stopping motors");
                MotorPulses::stopped(limits)
            }
        };

        self.publish(&pulses);
        pulses
    }

    /// Publishes the stopped pulse on every channel, bypassing the mixer.
    pub fn set_motors_low(&mut self) {
        debug!("motors low");
        self.publish(&MotorPulses::stopped(&self.config.limits));
    }

    fn publish(&mut self, pulses: &MotorPulses) {
        self.main = Schedule::build(pulses, &self.config.timing);
        self.handoff.publish(&self.main);
    }

    /// The most recently built schedule.
    pub fn schedule(&self) -> &Schedule {
        &self.main
    }

    /// Configuration this output was built with.
    pub fn config(&self) -> &MotorConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Motor, MOTOR_COUNT};

    fn adopted(handoff: &Handoff) -> Option<Schedule> {
        let mut active = Schedule::EMPTY;
        handoff.try_adopt(&mut active).then_some(active)
    }

    /// Test that construction publishes the stopped schedule.
    #[test]
    fn test_output_new_publishes_stopped() {
        let handoff = Handoff::new();
        let output = MotorOutput::new(MotorConfig::new(), &handoff).unwrap();

        let stopped = Schedule::build(
            &MotorPulses([1000; MOTOR_COUNT]),
            &MotorConfig::new().timing,
        );
        assert_eq!(&stopped, output.schedule());
        assert_eq!(Some(stopped), adopted(&handoff));
    }

    /// Test that an invalid configuration never reaches the mailbox.
    #[test]
    fn test_output_rejects_invalid_config() {
        let handoff = Handoff::new();
        let mut config = MotorConfig::new();
        config.timing.ticks_per_us = 0;

        assert!(matches!(
            MotorOutput::new(config, &handoff),
            Err(ConfigError::ZeroTickRate)
        ));
        assert!(!handoff.is_pending());
    }

    /// Test the roll-right scenario through the full producer pipeline.
    #[test]
    fn test_output_roll_scenario() {
        let handoff = Handoff::new();
        let mut output = MotorOutput::new(MotorConfig::new(), &handoff).unwrap();

        let pulses = output.process_motors(AxisCommand::new(1500, 50, 0, 0));
        assert_eq!(MotorPulses([1550, 1450, 1550, 1450]), pulses);

        let schedule = adopted(&handoff).unwrap();
        assert_eq!(output.schedule(), &schedule);
        assert_eq!(
            [
                Motor::FrontRight,
                Motor::BackRight,
                Motor::FrontLeft,
                Motor::BackLeft
            ],
            schedule.entries().map(|entry| entry.motor)
        );
    }

    /// Test that throttle below the minimum spin publishes the stopped set.
    #[test]
    fn test_output_low_throttle_stops() {
        let handoff = Handoff::new();
        let mut output = MotorOutput::new(MotorConfig::new(), &handoff).unwrap();

        let pulses = output.process_motors(AxisCommand::new(1000.0_f32, 40.0, -25.0, 10.0));
        assert_eq!(MotorPulses([1000; MOTOR_COUNT]), pulses);
    }

    /// Test that a NaN correction falls back to the stopped set.
    #[test]
    fn test_output_nan_stops() {
        let handoff = Handoff::new();
        let mut output = MotorOutput::new(MotorConfig::new(), &handoff).unwrap();
        output.process_motors(AxisCommand::new(1600.0_f32, 20.0, 0.0, 0.0));

        let pulses = output.process_motors(AxisCommand::new(1600.0_f32, f32::NAN, 0.0, 0.0));
        assert_eq!(MotorPulses::stopped(&output.config().limits), pulses);
        assert_eq!(
            [2000; MOTOR_COUNT],
            adopted(&handoff).unwrap().durations_by_motor()
        );
    }

    /// Test that commands at the edge of their numeric type neither overflow
    /// nor leave the pulse window.
    #[test]
    fn test_output_extreme_integer_commands() {
        let handoff = Handoff::new();
        let mut output = MotorOutput::new(MotorConfig::new(), &handoff).unwrap();

        let pulses = output.process_motors(AxisCommand::new(i32::MAX - 10, 50, 0, 0));
        assert_eq!(MotorPulses::stopped(&output.config().limits), pulses);

        let pulses = output.process_motors(AxisCommand::new(32_000_i16, 500, -500, 500));
        assert_eq!(MotorPulses([2000, 1100, 1100, 1100]), pulses);
        assert_eq!(
            [4000, 2200, 2200, 2200],
            adopted(&handoff).unwrap().durations_by_motor()
        );
    }

    /// Test that an emergency stop replaces a pending flight schedule.
    #[test]
    fn test_output_set_motors_low_overrides_pending() {
        let handoff = Handoff::new();
        let mut output = MotorOutput::new(MotorConfig::new(), &handoff).unwrap();

        output.process_motors(AxisCommand::new(1800, 30, 30, 30));
        output.set_motors_low();

        let schedule = adopted(&handoff).unwrap();
        assert_eq!([2000; MOTOR_COUNT], schedule.durations_by_motor());
        assert_eq!(Motor::ALL, schedule.entries().map(|entry| entry.motor));
    }
}
