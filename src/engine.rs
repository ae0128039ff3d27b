// src/engine.rs

//! # Pulse State Machine
//!
//! Interrupt-side half of the output stage. A [`PulseEngine`] is driven by a
//! free-running hardware timer with a compare-match interrupt: every call to
//! [`PulseEngine::on_compare`] toggles at most one output line and arms the
//! next compare value.
//!
//! One frame walks `Reset -> Starting (x4) -> Ending (x4) -> Reset`:
//!
//! - `Reset`: zero the counter and arm the first start one gap later.
//! - `Starting`: raise the next channel in schedule order.
//! - `Ending`: lower the next channel in schedule order; after the last one
//!   arm the frame period and adopt a pending schedule from the [`Handoff`].
//!
//! Adoption happens only on the `Ending -> Reset` edge, so every frame is
//! generated from a single schedule.
//!
//! ## Usage
//!
//! The engine owns the output lines and the timer and is meant to be stored
//! where the compare-match interrupt handler can reach it, for example in a
//! `critical_section::Mutex<RefCell<Option<PulseEngine<..>>>>` filled during
//! start-up:
//!
//! ```ignore
//! #[interrupt]
//! fn TIM1_CC() {
//!     critical_section::with(|cs| {
//!         if let Some(engine) = ENGINE.borrow_ref_mut(cs).as_mut() {
//!             engine.on_compare().ok();
//!         }
//!     });
//! }
//! ```

use embedded_hal::digital::OutputPin;

use crate::{ConfigError, Handoff, Motor, MotorConfig, MotorPulses, Schedule, MOTOR_COUNT};

/// Four ESC signal lines, addressed by motor.
pub trait OutputLines {
    /// Error reported by the underlying pins.
    type Error;

    /// Drives the line of `motor` high (pulse begin).
    fn set_high(&mut self, motor: Motor) -> Result<(), Self::Error>;

    /// Drives the line of `motor` low (pulse end).
    fn set_low(&mut self, motor: Motor) -> Result<(), Self::Error>;
}

impl<P: OutputPin> OutputLines for [P; MOTOR_COUNT] {
    type Error = P::Error;

    fn set_high(&mut self, motor: Motor) -> Result<(), Self::Error> {
        self[motor.index()].set_high()
    }

    fn set_low(&mut self, motor: Motor) -> Result<(), Self::Error> {
        self[motor.index()].set_low()
    }
}

/// Free-running timer with one compare-match channel.
pub trait CompareTimer {
    /// Sets the counter back to zero.
    fn reset_counter(&mut self);

    /// Arms the next compare-match interrupt at `tick`.
    fn set_compare(&mut self, tick: u16);
}

/// Phase of the frame currently being generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleState {
    /// Frame boundary: the counter is reset on the next interrupt.
    Reset,
    /// Raising lines in schedule order.
    Starting,
    /// Lowering lines in schedule order.
    Ending,
}

/// Compare-match driven pulse generator.
pub struct PulseEngine<'a, L, T> {
    handoff: &'a Handoff,
    active: Schedule,
    state: CycleState,
    cursor: usize,
    lines: L,
    timer: T,
    gap_ticks: u16,
    cycle_ticks: u16,
}

impl<'a, L: OutputLines, T: CompareTimer> PulseEngine<'a, L, T> {
    /// Creates an engine whose active schedule is the stopped pulse set.
    ///
    /// Nothing is written to the lines or the timer until [`start`](Self::start).
    pub fn new(
        config: &MotorConfig,
        handoff: &'a Handoff,
        lines: L,
        timer: T,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(PulseEngine {
            handoff,
            active: Schedule::build(&MotorPulses::stopped(&config.limits), &config.timing),
            state: CycleState::Reset,
            cursor: 0,
            lines,
            timer,
            gap_ticks: config.timing.gap_ticks,
            cycle_ticks: config.timing.cycle_ticks,
        })
    }

    /// Drives every line low, zeroes the counter and arms the first channel
    /// start one gap later.
    ///
    /// Timer and lines are armed even when a line reports an error; the first
    /// error is returned.
    pub fn start(&mut self) -> Result<(), L::Error> {
        let mut result = Ok(());
        for motor in Motor::ALL {
            let lowered = self.lines.set_low(motor);
            if result.is_ok() {
                result = lowered;
            }
        }

        self.cursor = 0;
        self.state = CycleState::Starting;
        self.timer.reset_counter();
        self.timer.set_compare(self.gap_ticks);
        result
    }

    /// Compare-match interrupt body.
    ///
    /// The state machine advances and re-arms the timer before a line error
    /// is reported, so a faulty line never stalls the frame.
    pub fn on_compare(&mut self) -> Result<(), L::Error> {
        match self.state {
            CycleState::Reset => {
                self.timer.reset_counter();
                self.timer.set_compare(self.gap_ticks);
                self.state = CycleState::Starting;
                Ok(())
            }
            CycleState::Starting => {
                let raised = self.lines.set_high(self.active.entry(self.cursor).motor);
                self.cursor += 1;
                if self.cursor < MOTOR_COUNT {
                    self.timer.set_compare(self.active.entry(self.cursor).start_tick);
                } else {
                    self.cursor = 0;
                    self.timer.set_compare(self.active.entry(0).end_tick);
                    self.state = CycleState::Ending;
                }
                raised
            }
            CycleState::Ending => {
                let lowered = self.lines.set_low(self.active.entry(self.cursor).motor);
                self.cursor += 1;
                if self.cursor < MOTOR_COUNT {
                    self.timer.set_compare(self.active.entry(self.cursor).end_tick);
                } else {
                    self.timer.set_compare(self.cycle_ticks);
                    self.cursor = 0;
                    if self.handoff.try_adopt(&mut self.active) {
                        trace!("adopted schedule {}", self.active);
                    }
                    self.state = CycleState::Reset;
                }
                lowered
            }
        }
    }

    /// Schedule the current frame is generated from.
    pub fn active(&self) -> &Schedule {
        &self.active
    }

    /// Current phase of the frame.
    pub fn state(&self) -> CycleState {
        self.state
    }

    /// Schedule position the next `Starting` or `Ending` step acts on.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Releases the lines and the timer.
    pub fn release(self) -> (L, T) {
        (self.lines, self.timer)
    }
}
