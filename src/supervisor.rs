// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Supervisory loop and the collaborator interfaces it drives.
//!
//! Once bring-up finishes, the only work left is two cooperative duties: advance the liveness
//! indicator, then poll the communication link for an activation request. Both calls return
//! immediately; the loop never waits and never yields.

/// Periodic time source brought up by the sequencer before the indicator.
pub trait TimerDriver {
    fn init(&mut self);
}

/// Liveness indicator (status LED).
pub trait Indicator {
    fn init(&mut self);

    /// Advance the liveness signal. Called once per loop iteration; the driver decides whether
    /// the output actually flips on this call.
    fn toggle(&mut self);
}

/// Communication link that can request a hand-over to the bootloader.
pub trait CommInterface {
    fn init(&mut self);

    /// Non-blocking poll. Returns `true` once a complete activation request has been received.
    fn check_activation(&mut self) -> bool;

    /// Leave the application for the bootloader. Does not return.
    fn activate(&mut self) -> !;
}

/// Post-bring-up control flow. Owns the indicator and communication drivers outright.
pub struct Supervisor<I, C> {
    indicator: I,
    comm: C,
}

impl<I: Indicator, C: CommInterface> Supervisor<I, C> {
    pub fn new(indicator: I, comm: C) -> Self {
        Self { indicator, comm }
    }

    /// One iteration: indicator first, then the activation poll.
    #[inline]
    pub fn step(&mut self) -> bool {
        self.indicator.toggle();
        self.comm.check_activation()
    }

    /// Iterate until an activation request arrives.
    pub fn service(&mut self) {
        while !self.step() {}
    }

    /// Consume the loop and hand control to the bootloader.
    pub fn activate(mut self) -> ! {
        self.comm.activate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::vec::Vec;

    #[derive(Debug, PartialEq)]
    enum Call {
        Toggle,
        Check,
    }

    struct Led(Rc<RefCell<Vec<Call>>>);
    struct Link {
        calls: Rc<RefCell<Vec<Call>>>,
        request_after: usize,
    }

    impl Indicator for Led {
        fn init(&mut self) {}
        fn toggle(&mut self) {
            self.0.borrow_mut().push(Call::Toggle);
        }
    }

    impl CommInterface for Link {
        fn init(&mut self) {}
        fn check_activation(&mut self) -> bool {
            let mut calls = self.calls.borrow_mut();
            calls.push(Call::Check);
            calls.iter().filter(|c| **c == Call::Check).count() >= self.request_after
        }
        fn activate(&mut self) -> ! {
            panic!("activation is not exercised here");
        }
    }

    fn supervisor(request_after: usize) -> (Supervisor<Led, Link>, Rc<RefCell<Vec<Call>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sup = Supervisor::new(
            Led(calls.clone()),
            Link {
                calls: calls.clone(),
                request_after,
            },
        );
        (sup, calls)
    }

    #[test]
    fn step_toggles_before_polling() {
        let (mut sup, calls) = supervisor(usize::MAX);
        for _ in 0..3 {
            assert!(!sup.step());
        }
        assert_eq!(
            *calls.borrow(),
            [
                Call::Toggle,
                Call::Check,
                Call::Toggle,
                Call::Check,
                Call::Toggle,
                Call::Check,
            ]
        );
    }

    #[test]
    fn service_returns_on_activation() {
        let (mut sup, calls) = supervisor(5);
        sup.service();
        let calls = calls.borrow();
        assert_eq!(calls.len(), 10);
        assert_eq!(calls.last(), Some(&Call::Check));
    }
}
