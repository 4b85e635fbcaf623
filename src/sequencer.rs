// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Bring-up Sequencer
//!
//! Runs the one-time bring-up in a fixed order:
//!
//! 1. core init (flash accelerator, tick at the reset frequency) and the MSP post-reset hook
//! 2. clock plan derivation and application, then the tick re-tuned to the new HCLK
//! 3. timer driver
//! 4. indicator driver
//! 5. communication driver
//!
//! A clock failure ends in [`SequencerState::ClockFailed`]; the caller receives a [`Halted`]
//! whose only action is [`Halted::halt`]. Success hands back a [`Running`] system that owns the
//! supervisory loop. The clock-control handle is dropped at the end of step 2 either way, so no
//! clock register stays writable after bring-up.

use fugit::KilohertzU32;
use log::{debug, error, info};

use crate::clock::{self, ClockControl, ClockError, ClockPlan, ClockRequest};
use crate::resources::{Msp, MspLayout, ResourceControl};
use crate::supervisor::{CommInterface, Indicator, Supervisor, TimerDriver};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SequencerState {
    NotStarted,
    ClockConfiguring,
    /// Terminal. Nothing leaves this state.
    ClockFailed,
    DriversInitializing,
    /// Terminal. The supervisory loop iterates inside this state.
    Running,
}

impl SequencerState {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(self, next: SequencerState) -> bool {
        use SequencerState::*;
        matches!(
            (self, next),
            (NotStarted, ClockConfiguring)
                | (ClockConfiguring, ClockFailed)
                | (ClockConfiguring, DriversInitializing)
                | (DriversInitializing, Running)
        )
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, SequencerState::ClockFailed | SequencerState::Running)
    }

    /// Panics on a transition the state machine does not allow.
    fn advance(&mut self, next: SequencerState) {
        assert!(self.can_advance_to(next), "{:?} -> {:?}", *self, next);
        debug!("{:?} -> {:?}", *self, next);
        *self = next;
    }
}

/// Cortex-M core services touched before the clock tree exists.
pub trait CoreControl {
    /// Flash prefetch/accelerator and any other core setup that precedes the tick.
    fn init(&mut self);

    /// (Re)program the 1 kHz tick for a core running at `hclk`.
    fn start_tick(&mut self, hclk: KilohertzU32);
}

/// Exclusively owned hardware handles, consumed by the sequencer.
pub struct Platform<CORE, CLK, RES> {
    pub core: CORE,
    pub clocks: CLK,
    pub resources: RES,
}

/// The external collaborators, brought up in field order.
pub struct Drivers<T, I, C> {
    pub timer: T,
    pub indicator: I,
    pub comm: C,
}

pub struct Sequencer<CORE, CLK, RES, T, I, C> {
    platform: Platform<CORE, CLK, RES>,
    drivers: Drivers<T, I, C>,
    request: ClockRequest,
    layout: &'static MspLayout,
    state: SequencerState,
}

impl<CORE, CLK, RES, T, I, C> Sequencer<CORE, CLK, RES, T, I, C>
where
    CORE: CoreControl,
    CLK: ClockControl,
    RES: ResourceControl,
    T: TimerDriver,
    I: Indicator,
    C: CommInterface,
{
    pub fn new(
        platform: Platform<CORE, CLK, RES>,
        drivers: Drivers<T, I, C>,
        request: ClockRequest,
        layout: &'static MspLayout,
    ) -> Self {
        Self {
            platform,
            drivers,
            request,
            layout,
            state: SequencerState::NotStarted,
        }
    }

    #[inline]
    pub fn state(&self) -> SequencerState {
        self.state
    }

    /// Execute the whole sequence. Consumes the sequencer: it runs exactly once.
    pub fn run(mut self) -> Result<Running<CORE, RES, T, I, C>, Halted<CORE, RES>> {
        let Platform {
            mut core,
            mut clocks,
            resources,
        } = self.platform;

        // 1. core + MSP
        core.init();
        core.start_tick(self.request.reference);
        let msp = Msp::init(resources, self.layout);
        info!("MSP: {} domains, {} pins", msp.bindings().len(), msp.pins().len());

        // 2. clock tree
        self.state.advance(SequencerState::ClockConfiguring);
        let plan = match apply_clock_plan(&mut clocks, &self.request) {
            Ok(plan) => plan,
            Err(err) => {
                self.state.advance(SequencerState::ClockFailed);
                error!("clock configuration rejected: {}", err);
                return Err(Halted {
                    state: self.state,
                    error: err,
                    _core: core,
                    _msp: msp,
                });
            }
        };
        drop(clocks);
        core.start_tick(plan.hclk());
        info!("clock tree at {} kHz", plan.sysclk().to_kHz());

        // 3.-5. drivers
        self.state.advance(SequencerState::DriversInitializing);
        let Drivers {
            mut timer,
            mut indicator,
            mut comm,
        } = self.drivers;
        timer.init();
        indicator.init();
        comm.init();

        self.state.advance(SequencerState::Running);
        info!("bring-up complete");

        Ok(Running {
            state: self.state,
            plan,
            _core: core,
            _timer: timer,
            msp,
            supervisor: Supervisor::new(indicator, comm),
        })
    }
}

fn apply_clock_plan<K: ClockControl>(
    clocks: &mut K,
    request: &ClockRequest,
) -> Result<ClockPlan, ClockError> {
    let plan = request.plan()?;
    clock::configure(clocks, &plan)?;
    Ok(plan)
}

/// Successful bring-up. Owns everything that must stay alive for the rest of the run.
pub struct Running<CORE, RES: ResourceControl, T, I, C> {
    state: SequencerState,
    plan: ClockPlan,
    _core: CORE,
    _timer: T,
    msp: Msp<RES>,
    supervisor: Supervisor<I, C>,
}

impl<CORE, RES, T, I, C> Running<CORE, RES, T, I, C>
where
    RES: ResourceControl,
    I: Indicator,
    C: CommInterface,
{
    #[inline]
    pub fn state(&self) -> SequencerState {
        self.state
    }

    #[inline]
    pub fn plan(&self) -> &ClockPlan {
        &self.plan
    }

    pub fn supervisor(&mut self) -> &mut Supervisor<I, C> {
        &mut self.supervisor
    }

    /// Enter the supervisory loop. Returns only by handing control to the bootloader, after the
    /// MSP resources have been released.
    pub fn run(self) -> ! {
        let Self {
            mut supervisor,
            mut msp,
            ..
        } = self;

        supervisor.service();
        msp.deinit();
        supervisor.activate()
    }
}

/// Failed bring-up. Keeps the hardware handles alive so nothing is released behind the halt.
pub struct Halted<CORE, RES: ResourceControl> {
    state: SequencerState,
    error: ClockError,
    _core: CORE,
    _msp: Msp<RES>,
}

impl<CORE, RES: ResourceControl> Halted<CORE, RES> {
    #[inline]
    pub fn state(&self) -> SequencerState {
        self.state
    }

    #[inline]
    pub fn error(&self) -> ClockError {
        self.error
    }

    /// Stop all forward progress. Interrupts stay as they are; the core just spins.
    pub fn halt(self) -> ! {
        loop {
            core::hint::spin_loop();
        }
    }
}
