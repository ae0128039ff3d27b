// src/test_utils.rs

//! This module contains utilities for testing.

extern crate std;

use core::cell::RefCell;
use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};
use std::rc::Rc;
use std::vec::Vec;

use crate::{CompareTimer, CycleState, Motor, OutputLines, PulseEngine, MOTOR_COUNT};

/// A constant defining the tolerance within which floating-point values
/// are considered close enough to be equal.
pub const TEST_TOLERANCE: f32 = 1e-5;

/// Checks if two floating point numbers are close enough to be considered
/// equal.
pub fn value_close(target: f32, value: f32) -> bool {
    let difference = target - value;
    -TEST_TOLERANCE < difference && difference < TEST_TOLERANCE
}

/// Checks if each motor value is close enough to be considered equal.
pub fn array_close(target: [f32; MOTOR_COUNT], value: [f32; MOTOR_COUNT]) -> bool {
    target
        .iter()
        .zip(value.iter())
        .all(|(&target, &value)| value_close(target, value))
}

/// A line transition recorded by the simulated output pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// Counter value when the line changed.
    pub tick: u16,
    /// Line that changed.
    pub motor: Motor,
    /// New level.
    pub high: bool,
}

/// Shared state of the simulated timer and pins.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    /// Current counter value.
    pub now: u16,
    /// Armed compare value.
    pub compare: u16,
    /// Number of counter resets.
    pub resets: usize,
    /// Recorded line transitions.
    pub edges: Vec<Edge>,
}

/// Simulated output pin that records its transitions.
pub struct SimPin {
    motor: Motor,
    trace: Rc<RefCell<Trace>>,
    /// Makes every write fail.
    pub fail: bool,
}

impl SimPin {
    fn write(&mut self, high: bool) -> Result<(), ErrorKind> {
        if self.fail {
            return Err(ErrorKind::Other);
        }
        let mut trace = self.trace.borrow_mut();
        let tick = trace.now;
        trace.edges.push(Edge {
            tick,
            motor: self.motor,
            high,
        });
        Ok(())
    }
}

impl ErrorType for SimPin {
    type Error = ErrorKind;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true)
    }
}

/// Simulated compare-match timer.
pub struct SimTimer {
    trace: Rc<RefCell<Trace>>,
}

impl CompareTimer for SimTimer {
    fn reset_counter(&mut self) {
        let mut trace = self.trace.borrow_mut();
        trace.now = 0;
        trace.resets += 1;
    }

    fn set_compare(&mut self, tick: u16) {
        self.trace.borrow_mut().compare = tick;
    }
}

/// Test bench wiring simulated pins and timer to one trace.
pub struct Bench {
    trace: Rc<RefCell<Trace>>,
}

impl Bench {
    /// Creates a bench with an empty trace.
    pub fn new() -> Self {
        Self {
            trace: Rc::new(RefCell::new(Trace::default())),
        }
    }

    /// Four pins, one per motor.
    pub fn pins(&self) -> [SimPin; MOTOR_COUNT] {
        Motor::ALL.map(|motor| SimPin {
            motor,
            trace: Rc::clone(&self.trace),
            fail: false,
        })
    }

    /// A timer sharing this bench's trace.
    pub fn timer(&self) -> SimTimer {
        SimTimer {
            trace: Rc::clone(&self.trace),
        }
    }

    /// Snapshot of the trace.
    pub fn trace(&self) -> Trace {
        self.trace.borrow().clone()
    }

    /// Forgets recorded edges.
    pub fn clear_edges(&self) {
        self.trace.borrow_mut().edges.clear();
    }

    /// Returns and forgets recorded edges.
    pub fn take_edges(&self) -> Vec<Edge> {
        core::mem::take(&mut self.trace.borrow_mut().edges)
    }

    /// Advances the counter to the armed compare value and runs the interrupt.
    pub fn fire<L: OutputLines>(
        &self,
        engine: &mut PulseEngine<'_, L, SimTimer>,
    ) -> Result<(), L::Error> {
        let compare = self.trace.borrow().compare;
        self.trace.borrow_mut().now = compare;
        engine.on_compare()
    }

    /// Fires interrupts until the engine is back at a frame boundary.
    pub fn run_frame<L: OutputLines>(&self, engine: &mut PulseEngine<'_, L, SimTimer>) {
        let _ = self.fire(engine);
        while engine.state() != CycleState::Reset {
            let _ = self.fire(engine);
        }
    }
}
