// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Board configuration for the STM32F767ZI Nucleo-144.
//!
//! Everything here is fixed at compile time. Pin assignments follow the Nucleo wiring: LD1 (green)
//! on PB0, and USART3 on PD8/PD9, which the ST-LINK exposes as its virtual COM port.

use fugit::KilohertzU32;

use crate::clock::{ClockRequest, STM32F76X};
use crate::resources::{Domain, Level, MspLayout, PinConfig, PinId, Port, SystemException};

/// Internal RC oscillator, the reference after reset.
pub const HSI: KilohertzU32 = KilohertzU32::MHz(16);

/// Core clock the bring-up aims for.
pub const SYSTEM_SPEED: KilohertzU32 = KilohertzU32::MHz(64);

pub const CLOCK_REQUEST: ClockRequest = ClockRequest {
    reference: HSI,
    target: SYSTEM_SPEED,
    limits: STM32F76X,
};

pub const USART_BAUD: u32 = 115_200;

/// Time between two LED flips.
pub const LED_PERIOD_MS: u32 = 500;

/// Shared priority for SVCall, PendSV and SysTick (highest).
pub const SYSTEM_PRIORITY: u8 = 0;

pub const LED: PinId = PinId::new(Port::B, 0);
pub const USART3_TX: PinId = PinId::new(Port::D, 8);
pub const USART3_RX: PinId = PinId::new(Port::D, 9);
pub const USART3_AF: u8 = 7;

const LAYOUT: MspLayout = MspLayout {
    domains: &[
        Domain::Syscfg,
        Domain::Pwr,
        Domain::Gpio(Port::B),
        Domain::Gpio(Port::D),
        Domain::Usart3,
    ],
    priorities: &[
        (SystemException::SvCall, SYSTEM_PRIORITY),
        (SystemException::PendSv, SYSTEM_PRIORITY),
        (SystemException::SysTick, SYSTEM_PRIORITY),
    ],
    pins: &[
        PinConfig::output(LED, Level::Low),
        PinConfig::alternate(USART3_TX, USART3_AF),
        PinConfig::alternate(USART3_RX, USART3_AF),
    ],
};

const _: () = assert!(LAYOUT.fits());

/// Post-reset MSP resources, in acquisition order.
pub static MSP: MspLayout = LAYOUT;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ApbPrescaler, PllP, VoltageScale};

    #[test]
    fn board_request_plans_cleanly() {
        let plan = CLOCK_REQUEST.plan().expect("board clock request must be reachable");
        assert_eq!(plan.sysclk(), SYSTEM_SPEED);
        assert_eq!(plan.pll().m, 8);
        assert_eq!(plan.pll().n, 64);
        assert_eq!(plan.pll().p, PllP::Div2);
        assert_eq!(plan.wait_states(), 2);
        assert_eq!(plan.apb1(), ApbPrescaler::Div2);
        assert_eq!(plan.apb2(), ApbPrescaler::Div1);
        assert_eq!(plan.voltage_scale(), VoltageScale::Scale3);
    }

    #[test]
    fn gpio_ports_are_clocked_before_their_pins() {
        for config in MSP.pins {
            assert!(MSP.domains.contains(&Domain::Gpio(config.pin.port)));
        }
    }

    #[test]
    fn only_the_led_has_an_idle_level() {
        let idle: Vec<_> = MSP
            .pins
            .iter()
            .filter_map(|p| p.idle_level().map(|level| (p.pin, level)))
            .collect();
        assert_eq!(idle, [(LED, Level::Low)]);
    }
}
