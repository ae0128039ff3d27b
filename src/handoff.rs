// src/handoff.rs

//! # Schedule Handoff
//!
//! The only state shared between the control loop and the compare-match
//! interrupt. The control loop owns the `main` schedule (inside
//! [`MotorOutput`](crate::MotorOutput)), the interrupt owns the `active`
//! schedule (inside [`PulseEngine`](crate::PulseEngine)), and this type holds
//! the `staging` slot between them together with the `locked` and
//! `pending_update` flags.
//!
//! It behaves as a single-producer, single-consumer mailbox with drop-on-
//! overwrite semantics: schedules published between two adoptions are
//! replaced by the newest one.
//!
//! ## Usage
//!
//! `Handoff::new` is a `const fn`, so the mailbox can live in a `static`
//! reachable from both the main loop and the interrupt handler:
//!
//! ```
//! use quad_esc_scheduler::{Handoff, MotorConfig, MotorOutput};
//!
//! static HANDOFF: Handoff = Handoff::new();
//!
//! let mut output = MotorOutput::new(MotorConfig::new(), &HANDOFF).unwrap();
//! assert!(HANDOFF.is_pending());
//!
//! output.set_motors_low();
//! assert!(HANDOFF.is_pending());
//! ```

use core::cell::RefCell;
use critical_section::Mutex;

use crate::Schedule;

struct Mailbox {
    staging: Schedule,
    locked: bool,
    pending_update: bool,
}

/// Staging slot and flags shared by producer and interrupt handler.
pub struct Handoff {
    mailbox: Mutex<RefCell<Mailbox>>,
}

impl Handoff {
    /// Creates an empty mailbox with no pending update.
    pub const fn new() -> Self {
        Self {
            mailbox: Mutex::new(RefCell::new(Mailbox {
                staging: Schedule::EMPTY,
                locked: false,
                pending_update: false,
            })),
        }
    }

    /// Copies `schedule` into the staging slot and marks it pending.
    ///
    /// Runs inside a critical section, so the interrupt handler never sees a
    /// partially written slot. The section covers a fixed-size copy only.
    pub fn publish(&self, schedule: &Schedule) {
        critical_section::with(|cs| {
            let mut mailbox = self.mailbox.borrow_ref_mut(cs);
            mailbox.locked = true;
            mailbox.staging = *schedule;
            mailbox.locked = false;
            mailbox.pending_update = true;
        });
    }

    /// Moves a pending schedule into `active`.
    ///
    /// Called by the interrupt handler at a full-cycle boundary only. Returns
    /// `true` when `active` was replaced; otherwise `active` is left as is and
    /// the previous frame repeats.
    pub fn try_adopt(&self, active: &mut Schedule) -> bool {
        critical_section::with(|cs| {
            let mut mailbox = self.mailbox.borrow_ref_mut(cs);
            if mailbox.locked || !mailbox.pending_update {
                return false;
            }
            *active = mailbox.staging;
            mailbox.pending_update = false;
            true
        })
    }

    /// Whether a published schedule is waiting to be adopted.
    pub fn is_pending(&self) -> bool {
        critical_section::with(|cs| self.mailbox.borrow_ref(cs).pending_update)
    }
}

impl Default for Handoff {
    fn default() -> Self {
        Self::new()
    }
}
