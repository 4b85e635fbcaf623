// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Recording fakes for the hardware traits. Every call lands in one shared, ordered event list.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use bringup::clock::{
    AhbPrescaler, ApbPrescaler, ClockControl, PllConfig, SysclkSource, VoltageScale,
};
use bringup::resources::{
    Domain, Level, MspLayout, PinConfig, PinId, ResourceControl, SystemException,
};
use bringup::sequencer::{CoreControl, Drivers, Platform};
use bringup::supervisor::{CommInterface, Indicator, TimerDriver};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    // core
    CoreInit,
    Tick(u32),
    // clocks
    VoltageScale(VoltageScale),
    HsiOn,
    Pll(bool),
    PllWrite(PllConfig),
    WaitStates(u8),
    Ahb(AhbPrescaler),
    Apb(ApbPrescaler, ApbPrescaler),
    Sysclk(SysclkSource),
    // resources
    DomainClock(Domain, bool),
    ApplyPin(PinId),
    WritePin(PinId, Level),
    ResetPin(PinId),
    Priority(SystemException, u8),
    // drivers
    TimerInit,
    IndicatorInit,
    Toggle,
    CommInit,
    Check,
    Activate,
}

pub type Events = Rc<RefCell<Vec<Event>>>;

pub fn events() -> Events {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn position(events: &Events, event: &Event) -> usize {
    events
        .borrow()
        .iter()
        .position(|e| e == event)
        .unwrap_or_else(|| panic!("{event:?} never happened"))
}

pub fn count(events: &Events, pred: impl Fn(&Event) -> bool) -> usize {
    events.borrow().iter().filter(|e| pred(e)).count()
}

pub struct FakeCore(pub Events);

impl CoreControl for FakeCore {
    fn init(&mut self) {
        self.0.borrow_mut().push(Event::CoreInit);
    }

    fn start_tick(&mut self, hclk: fugit::KilohertzU32) {
        self.0.borrow_mut().push(Event::Tick(hclk.to_kHz()));
    }
}

/// RCC/FLASH model. Switches, locks and latency writes take effect immediately unless a fault
/// is configured.
pub struct FakeClocks {
    pub events: Events,
    pub hsi_starts: bool,
    pub pll_locks: bool,
    pub pll_stuck_on: bool,
    pub switch_acks: bool,
    /// Highest wait-state count the flash accepts; higher writes are ignored.
    pub max_wait_states: u8,
    pub hsi_on: bool,
    pub pll_on: bool,
    pub wait_states: u8,
    pub sysclk: SysclkSource,
}

impl FakeClocks {
    pub fn new(events: Events) -> Self {
        Self {
            events,
            hsi_starts: true,
            pll_locks: true,
            pll_stuck_on: false,
            switch_acks: true,
            max_wait_states: 9,
            hsi_on: true,
            pll_on: false,
            wait_states: 0,
            sysclk: SysclkSource::Hsi,
        }
    }

    fn record(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }
}

impl ClockControl for FakeClocks {
    fn set_voltage_scale(&mut self, scale: VoltageScale) {
        self.record(Event::VoltageScale(scale));
    }

    fn enable_hsi(&mut self) {
        self.record(Event::HsiOn);
        self.hsi_on = true;
    }

    fn hsi_ready(&self) -> bool {
        self.hsi_on && self.hsi_starts
    }

    fn set_pll_enabled(&mut self, enabled: bool) {
        self.record(Event::Pll(enabled));
        self.pll_on = enabled;
    }

    fn pll_ready(&self) -> bool {
        if self.pll_on {
            self.pll_locks
        } else {
            self.pll_stuck_on
        }
    }

    fn write_pll(&mut self, pll: &PllConfig) {
        self.record(Event::PllWrite(*pll));
    }

    fn flash_wait_states(&self) -> u8 {
        self.wait_states
    }

    fn set_flash_wait_states(&mut self, wait_states: u8) {
        self.record(Event::WaitStates(wait_states));
        if wait_states <= self.max_wait_states {
            self.wait_states = wait_states;
        }
    }

    fn set_ahb_prescaler(&mut self, ahb: AhbPrescaler) {
        self.record(Event::Ahb(ahb));
    }

    fn set_apb_prescalers(&mut self, apb1: ApbPrescaler, apb2: ApbPrescaler) {
        self.record(Event::Apb(apb1, apb2));
    }

    fn select_sysclk(&mut self, source: SysclkSource) {
        self.record(Event::Sysclk(source));
        if self.switch_acks {
            self.sysclk = source;
        }
    }

    fn sysclk_source(&self) -> SysclkSource {
        self.sysclk
    }
}

/// Clock gates and pins, with enough state to answer `domain_clock`.
pub struct FakeResources {
    pub events: Events,
    pub enabled: Vec<Domain>,
}

impl FakeResources {
    pub fn new(events: Events) -> Self {
        Self {
            events,
            enabled: Vec::new(),
        }
    }
}

impl ResourceControl for FakeResources {
    fn set_domain_clock(&mut self, domain: Domain, enabled: bool) {
        self.events
            .borrow_mut()
            .push(Event::DomainClock(domain, enabled));
        self.enabled.retain(|d| *d != domain);
        if enabled {
            self.enabled.push(domain);
        }
    }

    fn domain_clock(&self, domain: Domain) -> bool {
        self.enabled.contains(&domain)
    }

    fn apply_pin(&mut self, config: &PinConfig) {
        self.events.borrow_mut().push(Event::ApplyPin(config.pin));
    }

    fn write_pin(&mut self, pin: PinId, level: Level) {
        self.events.borrow_mut().push(Event::WritePin(pin, level));
    }

    fn reset_pin(&mut self, pin: PinId) {
        self.events.borrow_mut().push(Event::ResetPin(pin));
    }

    fn set_priority(&mut self, exception: SystemException, priority: u8) {
        self.events
            .borrow_mut()
            .push(Event::Priority(exception, priority));
    }
}

pub struct FakeTimer(pub Events);

impl TimerDriver for FakeTimer {
    fn init(&mut self) {
        self.0.borrow_mut().push(Event::TimerInit);
    }
}

pub struct FakeIndicator(pub Events);

impl Indicator for FakeIndicator {
    fn init(&mut self) {
        self.0.borrow_mut().push(Event::IndicatorInit);
    }

    fn toggle(&mut self) {
        self.0.borrow_mut().push(Event::Toggle);
    }
}

/// Reports an activation request on the `request_on`-th poll.
pub struct FakeComm {
    pub events: Events,
    pub request_on: usize,
    polls: usize,
}

impl FakeComm {
    pub fn new(events: Events, request_on: usize) -> Self {
        Self {
            events,
            request_on,
            polls: 0,
        }
    }
}

impl CommInterface for FakeComm {
    fn init(&mut self) {
        self.events.borrow_mut().push(Event::CommInit);
    }

    fn check_activation(&mut self) -> bool {
        self.events.borrow_mut().push(Event::Check);
        self.polls += 1;
        self.polls == self.request_on
    }

    fn activate(&mut self) -> ! {
        self.events.borrow_mut().push(Event::Activate);
        panic!("activate");
    }
}

pub type TestPlatform = Platform<FakeCore, FakeClocks, FakeResources>;
pub type TestDrivers = Drivers<FakeTimer, FakeIndicator, FakeComm>;

pub fn platform(events: &Events) -> TestPlatform {
    Platform {
        core: FakeCore(events.clone()),
        clocks: FakeClocks::new(events.clone()),
        resources: FakeResources::new(events.clone()),
    }
}

pub fn drivers(events: &Events) -> TestDrivers {
    Drivers {
        timer: FakeTimer(events.clone()),
        indicator: FakeIndicator(events.clone()),
        comm: FakeComm::new(events.clone(), usize::MAX),
    }
}

/// Leak a layout so it can stand in for a board `static`.
pub fn leak(layout: MspLayout) -> &'static MspLayout {
    Box::leak(Box::new(layout))
}
