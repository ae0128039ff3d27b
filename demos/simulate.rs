// demos/simulate.rs

use core::convert::Infallible;
use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, OutputPin};
use fixed::types::I16F16;
use quad_esc_scheduler::{
    AxisCommand, CompareTimer, CycleState, DescentFailsafe, DescentStep, Handoff, Motor,
    MotorConfig, MotorOutput, PulseEngine,
};

// Counter value shared by the simulated timer and pins.
type Clock = Rc<RefCell<u16>>;

struct Pin {
    motor: Motor,
    clock: Clock,
}

impl ErrorType for Pin {
    type Error = Infallible;
}

impl OutputPin for Pin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        println!("  {:>5}  M{} low", *self.clock.borrow(), self.motor.id());
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        println!("  {:>5}  M{} high", *self.clock.borrow(), self.motor.id());
        Ok(())
    }
}

struct Timer {
    clock: Clock,
    compare: Rc<RefCell<u16>>,
}

impl CompareTimer for Timer {
    fn reset_counter(&mut self) {
        *self.clock.borrow_mut() = 0;
    }

    fn set_compare(&mut self, tick: u16) {
        *self.compare.borrow_mut() = tick;
    }
}

static HANDOFF: Handoff = Handoff::new();

fn main() {
    let config = MotorConfig::new();
    let clock: Clock = Rc::new(RefCell::new(0));
    let compare = Rc::new(RefCell::new(0));

    let pins = Motor::ALL.map(|motor| Pin {
        motor,
        clock: Rc::clone(&clock),
    });
    let timer = Timer {
        clock: Rc::clone(&clock),
        compare: Rc::clone(&compare),
    };

    let mut output = MotorOutput::new(config, &HANDOFF).unwrap();
    let mut engine = PulseEngine::new(&config, &HANDOFF, pins, timer).unwrap();
    engine.start().unwrap();

    // Advance the counter to each compare value until the frame is done.
    let run_frame = |engine: &mut PulseEngine<'_, [Pin; 4], Timer>| loop {
        *clock.borrow_mut() = *compare.borrow();
        let ending = engine.state() == CycleState::Ending;
        engine.on_compare().unwrap();
        if ending && engine.state() == CycleState::Reset {
            break;
        }
    };

    let commands = [
        ("hover", (1500.0, 0.0, 0.0, 0.0)),
        ("roll right", (1500.0, 50.0, 0.0, 0.0)),
        ("pitch forward, yaw left", (1650.0, 0.0, 35.5, -20.25)),
        ("full throttle", (1980.0, 40.0, -40.0, 0.0)),
        ("idle", (1000.0, 20.0, 0.0, 0.0)),
    ];

    for (name, (throttle, roll, pitch, yaw)) in commands {
        let command = AxisCommand::new(
            I16F16::from_num(throttle),
            I16F16::from_num(roll),
            I16F16::from_num(pitch),
            I16F16::from_num(yaw),
        );
        let pulses = output.process_motors(command);
        println!("{name}: {:?}", pulses.0);

        // The first frame still runs the previous schedule.
        run_frame(&mut engine);
        println!("  --- adopted ---");
        run_frame(&mut engine);
    }

    println!("connection lost");
    let mut failsafe = DescentFailsafe::new(1104, I16F16::from_num(1.05));
    let z_accel = I16F16::from_num(0.98);
    let zero = I16F16::ZERO;
    while let DescentStep::Descending(throttle) =
        failsafe.drive(&mut output, z_accel, zero, zero, zero)
    {
        println!("descending at {throttle} us");
        run_frame(&mut engine);
    }
    println!("motors stopped");
    run_frame(&mut engine);
    run_frame(&mut engine);
}
