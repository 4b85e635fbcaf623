// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Pin definitions for the STM32F767ZI Nucleo-144.
//!
//! Pin functions are owned by the MSP layout (`config::MSP`); this module only hands out
//! `embedded-hal` output handles for pins the layout has already configured.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};
use stm32f7xx_hal::pac;

use super::resources::{bsrr_word, with_port};
use crate::resources::{Level, PinId, Port};

/// Output driven through the port's atomic set/reset register.
pub struct PortPin {
    pin: PinId,
}

impl PortPin {
    pub const fn new(pin: PinId) -> Self {
        Self { pin }
    }

    fn drive(&mut self, level: Level) {
        let word = bsrr_word(self.pin, level);
        with_port!(self.pin.port, gpio => gpio.bsrr.write(|w| unsafe { w.bits(word) }));
    }
}

impl ErrorType for PortPin {
    type Error = Infallible;
}

impl OutputPin for PortPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.drive(Level::Low);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.drive(Level::High);
        Ok(())
    }
}
