// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

mod common;

use std::panic::{self, AssertUnwindSafe};

use bringup::clock::{ClockError, ClockRequest, STM32F76X};
use bringup::config;
use bringup::resources::Domain;
use bringup::sequencer::{Sequencer, SequencerState};
use common::{count, drivers, events, platform, position, Event, FakeComm};
use fugit::KilohertzU32;

#[test]
fn nucleo_bring_up_runs_in_order() {
    let log = events();
    let seq = Sequencer::new(
        platform(&log),
        drivers(&log),
        config::CLOCK_REQUEST,
        &config::MSP,
    );
    assert_eq!(seq.state(), SequencerState::NotStarted);

    let running = match seq.run() {
        Ok(running) => running,
        Err(halted) => panic!("bring-up halted: {}", halted.error()),
    };
    assert_eq!(running.state(), SequencerState::Running);
    assert_eq!(running.plan().sysclk(), KilohertzU32::MHz(64));
    assert!(running.plan().wait_states() >= 2);

    let order = [
        Event::CoreInit,
        Event::Tick(16_000),
        Event::DomainClock(Domain::Syscfg, true),
        Event::HsiOn,
        Event::Sysclk(bringup::clock::SysclkSource::Pll),
        Event::Tick(64_000),
        Event::TimerInit,
        Event::IndicatorInit,
        Event::CommInit,
    ];
    let positions: Vec<usize> = order.iter().map(|e| position(&log, e)).collect();
    assert!(
        positions.windows(2).all(|w| w[0] < w[1]),
        "out of order: {:?}",
        log.borrow()
    );

    // Nothing toggles or polls until the loop runs.
    assert_eq!(count(&log, |e| matches!(e, Event::Toggle | Event::Check)), 0);
}

#[test]
fn unreachable_target_halts_before_any_driver() {
    let log = events();
    let request = ClockRequest {
        reference: config::HSI,
        target: KilohertzU32::kHz(64_001),
        limits: STM32F76X,
    };
    let seq = Sequencer::new(platform(&log), drivers(&log), request, &config::MSP);

    let halted = match seq.run() {
        Ok(_) => panic!("64.001 MHz must not be accepted"),
        Err(halted) => halted,
    };
    assert_eq!(halted.state(), SequencerState::ClockFailed);
    assert_eq!(
        halted.error(),
        ClockError::Unreachable {
            reference_khz: 16_000,
            target_khz: 64_001
        }
    );

    // The plan is rejected before any clock register is written.
    assert_eq!(count(&log, |e| matches!(e, Event::VoltageScale(_) | Event::HsiOn)), 0);
    assert_eq!(
        count(&log, |e| matches!(
            e,
            Event::TimerInit | Event::IndicatorInit | Event::Toggle | Event::CommInit
        )),
        0
    );
    // The tick keeps its reset-frequency setting.
    assert_eq!(count(&log, |e| matches!(e, Event::Tick(_))), 1);
    // Resources stay acquired while halted.
    assert_eq!(count(&log, |e| matches!(e, Event::DomainClock(_, false))), 0);
}

#[test]
fn hardware_rejection_also_halts() {
    let log = events();
    let mut platform = platform(&log);
    platform.clocks.pll_locks = false;
    let seq = Sequencer::new(platform, drivers(&log), config::CLOCK_REQUEST, &config::MSP);

    let halted = match seq.run() {
        Ok(_) => panic!("a PLL that never locks must halt"),
        Err(halted) => halted,
    };
    assert_eq!(halted.state(), SequencerState::ClockFailed);
    assert_eq!(halted.error(), ClockError::PllLockTimeout);
    assert_eq!(count(&log, |e| matches!(e, Event::IndicatorInit)), 0);
}

#[test]
fn loop_toggles_then_checks() {
    let log = events();
    let seq = Sequencer::new(
        platform(&log),
        drivers(&log),
        config::CLOCK_REQUEST,
        &config::MSP,
    );
    let mut running = seq.run().ok().expect("bring-up succeeds");
    let start = log.borrow().len();

    for _ in 0..4 {
        assert!(!running.supervisor().step());
    }

    let tail: Vec<Event> = log.borrow()[start..].to_vec();
    assert_eq!(
        tail,
        [
            Event::Toggle,
            Event::Check,
            Event::Toggle,
            Event::Check,
            Event::Toggle,
            Event::Check,
            Event::Toggle,
            Event::Check,
        ]
    );
}

#[test]
fn activation_releases_resources_before_leaving() {
    let log = events();
    let mut drivers = drivers(&log);
    drivers.comm = FakeComm::new(log.clone(), 3);
    let seq = Sequencer::new(platform(&log), drivers, config::CLOCK_REQUEST, &config::MSP);
    let running = seq.run().ok().expect("bring-up succeeds");

    let outcome = panic::catch_unwind(AssertUnwindSafe(move || running.run()));
    assert!(outcome.is_err());

    assert_eq!(count(&log, |e| *e == Event::Check), 3);
    let last_check = log.borrow().iter().rposition(|e| *e == Event::Check).unwrap();
    let released = position(&log, &Event::DomainClock(Domain::Syscfg, false));
    let activate = position(&log, &Event::Activate);
    assert!(last_check < released);
    assert!(released < activate);
}
