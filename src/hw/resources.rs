// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! RCC clock gates, GPIO port registers and SCB priorities behind [`ResourceControl`].

use cortex_m::peripheral::scb::SystemHandler;
use stm32f7xx_hal::pac;

use crate::resources::{
    Domain, Level, OutputType, PinConfig, PinId, PinMode, Port, Pull, ResourceControl, Speed,
    SystemException,
};

/// Implemented priority bits on the Cortex-M7 NVIC/SCB.
const PRIORITY_BITS: u8 = 4;

// APB1ENR
const USART2EN: u32 = 1 << 17;
const USART3EN: u32 = 1 << 18;
const PWREN: u32 = 1 << 28;
// APB2ENR
const USART1EN: u32 = 1 << 4;
const SYSCFGEN: u32 = 1 << 14;

/// Run `$body` with `$regs` bound to the register block of `$port`.
///
/// The GPIO blocks have distinct PAC types but share one register layout.
macro_rules! with_port {
    ($port:expr, $regs:ident => $body:expr) => {
        match $port {
            Port::A => {
                let $regs = unsafe { &*pac::GPIOA::ptr() };
                $body
            }
            Port::B => {
                let $regs = unsafe { &*pac::GPIOB::ptr() };
                $body
            }
            Port::C => {
                let $regs = unsafe { &*pac::GPIOC::ptr() };
                $body
            }
            Port::D => {
                let $regs = unsafe { &*pac::GPIOD::ptr() };
                $body
            }
            Port::E => {
                let $regs = unsafe { &*pac::GPIOE::ptr() };
                $body
            }
            Port::F => {
                let $regs = unsafe { &*pac::GPIOF::ptr() };
                $body
            }
            Port::G => {
                let $regs = unsafe { &*pac::GPIOG::ptr() };
                $body
            }
            Port::H => {
                let $regs = unsafe { &*pac::GPIOH::ptr() };
                $body
            }
            Port::I => {
                let $regs = unsafe { &*pac::GPIOI::ptr() };
                $body
            }
            Port::J => {
                let $regs = unsafe { &*pac::GPIOJ::ptr() };
                $body
            }
            Port::K => {
                let $regs = unsafe { &*pac::GPIOK::ptr() };
                $body
            }
        }
    };
}
pub(crate) use with_port;

/// Replace the `width`-bit field of pin `index` in a packed register value.
#[inline]
fn field(reg: u32, index: u8, width: u32, value: u32) -> u32 {
    let shift = u32::from(index) * width;
    let mask = ((1 << width) - 1) << shift;
    (reg & !mask) | ((value << shift) & mask)
}

/// BSRR word that drives `pin` to `level`.
#[inline]
pub(crate) fn bsrr_word(pin: PinId, level: Level) -> u32 {
    match level {
        Level::High => 1 << pin.index,
        Level::Low => 1 << (pin.index + 16),
    }
}

/// RCC gate registers plus the SCB, which holds the system-exception priorities.
pub struct RccResources {
    scb: cortex_m::peripheral::SCB,
}

impl RccResources {
    pub fn new(scb: cortex_m::peripheral::SCB) -> Self {
        Self { scb }
    }
}

impl ResourceControl for RccResources {
    fn set_domain_clock(&mut self, domain: Domain, enabled: bool) {
        let rcc = unsafe { &*pac::RCC::ptr() };
        let update = |bits: u32, mask: u32| if enabled { bits | mask } else { bits & !mask };

        match domain {
            Domain::Gpio(port) => {
                let mask = 1 << port.index();
                rcc.ahb1enr
                    .modify(|r, w| unsafe { w.bits(update(r.bits(), mask)) });
                // Dummy read-back: the gate takes two AHB cycles to open.
                let _ = rcc.ahb1enr.read().bits();
            }
            Domain::Pwr | Domain::Usart2 | Domain::Usart3 => {
                let mask = apb1_mask(domain);
                rcc.apb1enr
                    .modify(|r, w| unsafe { w.bits(update(r.bits(), mask)) });
                let _ = rcc.apb1enr.read().bits();
            }
            Domain::Syscfg | Domain::Usart1 => {
                let mask = apb2_mask(domain);
                rcc.apb2enr
                    .modify(|r, w| unsafe { w.bits(update(r.bits(), mask)) });
                let _ = rcc.apb2enr.read().bits();
            }
        }
    }

    fn domain_clock(&self, domain: Domain) -> bool {
        let rcc = unsafe { &*pac::RCC::ptr() };
        match domain {
            Domain::Gpio(port) => rcc.ahb1enr.read().bits() & (1 << port.index()) != 0,
            Domain::Pwr | Domain::Usart2 | Domain::Usart3 => {
                rcc.apb1enr.read().bits() & apb1_mask(domain) != 0
            }
            Domain::Syscfg | Domain::Usart1 => rcc.apb2enr.read().bits() & apb2_mask(domain) != 0,
        }
    }

    fn apply_pin(&mut self, config: &PinConfig) {
        let index = config.pin.index;
        let (mode, otype, af) = match config.mode {
            PinMode::Input => (0b00, OutputType::PushPull, 0),
            PinMode::Output { kind, .. } => (0b01, kind, 0),
            PinMode::Alternate { af, kind } => (0b10, kind, u32::from(af)),
            PinMode::Analog => (0b11, OutputType::PushPull, 0),
        };
        let open_drain = u32::from(otype == OutputType::OpenDrain);
        let speed = match config.speed {
            Speed::Low => 0b00,
            Speed::Medium => 0b01,
            Speed::High => 0b10,
            Speed::VeryHigh => 0b11,
        };
        let pull = match config.pull {
            Pull::None => 0b00,
            Pull::Up => 0b01,
            Pull::Down => 0b10,
        };

        with_port!(config.pin.port, gpio => {
            gpio.otyper.modify(|r, w| unsafe { w.bits(field(r.bits(), index, 1, open_drain)) });
            gpio.ospeedr.modify(|r, w| unsafe { w.bits(field(r.bits(), index, 2, speed)) });
            gpio.pupdr.modify(|r, w| unsafe { w.bits(field(r.bits(), index, 2, pull)) });
            // Selector before mode, so the pin never briefly carries AF0.
            if index < 8 {
                gpio.afrl.modify(|r, w| unsafe { w.bits(field(r.bits(), index, 4, af)) });
            } else {
                gpio.afrh.modify(|r, w| unsafe { w.bits(field(r.bits(), index - 8, 4, af)) });
            }
            gpio.moder.modify(|r, w| unsafe { w.bits(field(r.bits(), index, 2, mode)) });
        });
    }

    fn write_pin(&mut self, pin: PinId, level: Level) {
        let word = bsrr_word(pin, level);
        with_port!(pin.port, gpio => gpio.bsrr.write(|w| unsafe { w.bits(word) }));
    }

    fn reset_pin(&mut self, pin: PinId) {
        let index = pin.index;
        with_port!(pin.port, gpio => {
            gpio.moder.modify(|r, w| unsafe { w.bits(field(r.bits(), index, 2, 0b00)) });
            gpio.otyper.modify(|r, w| unsafe { w.bits(field(r.bits(), index, 1, 0)) });
            gpio.ospeedr.modify(|r, w| unsafe { w.bits(field(r.bits(), index, 2, 0b00)) });
            gpio.pupdr.modify(|r, w| unsafe { w.bits(field(r.bits(), index, 2, 0b00)) });
            if index < 8 {
                gpio.afrl.modify(|r, w| unsafe { w.bits(field(r.bits(), index, 4, 0)) });
            } else {
                gpio.afrh.modify(|r, w| unsafe { w.bits(field(r.bits(), index - 8, 4, 0)) });
            }
        });
    }

    fn set_priority(&mut self, exception: SystemException, priority: u8) {
        let handler = match exception {
            SystemException::SvCall => SystemHandler::SVCall,
            SystemException::PendSv => SystemHandler::PendSV,
            SystemException::SysTick => SystemHandler::SysTick,
        };
        unsafe {
            self.scb
                .set_priority(handler, priority << (8 - PRIORITY_BITS));
        }
    }
}

fn apb1_mask(domain: Domain) -> u32 {
    match domain {
        Domain::Pwr => PWREN,
        Domain::Usart2 => USART2EN,
        Domain::Usart3 => USART3EN,
        _ => 0,
    }
}

fn apb2_mask(domain: Domain) -> u32 {
    match domain {
        Domain::Syscfg => SYSCFGEN,
        Domain::Usart1 => USART1EN,
        _ => 0,
    }
}
