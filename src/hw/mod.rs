// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # STM32F7 Register Backends
//!
//! Register-level implementations of the bring-up traits for the STM32F767ZI, built on the PAC
//! that `stm32f7xx-hal` re-exports. Only compiled for the bare-metal target.
//!
//! - [`clock`] – RCC/FLASH/PWR behind [`crate::clock::ClockControl`]
//! - [`resources`] – clock gates, GPIO and SCB priorities behind
//!   [`crate::resources::ResourceControl`]
//! - [`cpu`] – flash accelerator and SysTick behind [`crate::sequencer::CoreControl`]
//! - [`systick`] – millisecond counter
//! - [`usart`] – USART3 receiver
//! - [`pins`] – GPIO output handles

pub mod clock;
pub mod cpu;
pub mod pins;
pub mod resources;
pub mod systick;
pub mod usart;

pub use self::clock::RccClocks;
pub use self::cpu::Core;
pub use self::pins::PortPin;
pub use self::resources::RccResources;
pub use self::systick::SysTickTimer;
pub use self::usart::Usart3;

use cortex_m::peripheral::SCB;
use stm32f7xx_hal::pac;

use crate::config;
use crate::drivers::{BlinkingLed, BootloaderEntry, Led, SerialActivation};
use crate::sequencer::{Drivers, Platform};

/// Leaves the application through a system reset. The bootloader runs first after reset.
pub struct SystemReset;

impl BootloaderEntry for SystemReset {
    fn enter(&mut self) -> ! {
        SCB::sys_reset()
    }
}

pub type StatusLed = BlinkingLed<PortPin, SysTickTimer>;
pub type ActivationLink = SerialActivation<Usart3, SysTickTimer, SystemReset>;

/// Every handle the bring-up needs, split out of the device and core peripherals.
pub struct Board {
    pub platform: Platform<Core, RccClocks, RccResources>,
    pub drivers: Drivers<SysTickTimer, StatusLed, ActivationLink>,
}

impl Board {
    pub fn new(dp: pac::Peripherals, cp: cortex_m::Peripherals) -> Self {
        let timer = SysTickTimer;

        // LD1 is wired active-high.
        let led = Led::active_high(PortPin::new(config::LED));
        let indicator = BlinkingLed::new(led, timer, config::LED_PERIOD_MS);

        let usart = Usart3::new(dp.USART3, config::USART_BAUD);
        let comm = SerialActivation::new(usart, timer, SystemReset);

        Self {
            platform: Platform {
                core: Core::new(cp.SYST),
                clocks: RccClocks::new(dp.RCC, dp.FLASH, dp.PWR),
                resources: RccResources::new(cp.SCB),
            },
            drivers: Drivers {
                timer,
                indicator,
                comm,
            },
        }
    }
}
