// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Status LED.
//!
//! - [`Led`] remembers its wiring polarity and last commanded state.
//! - [`BlinkingLed`] turns it into the liveness [`Indicator`]: every call to `toggle` checks the
//!   monotonic clock and flips the LED once per period.

use embedded_hal::digital::OutputPin;

use super::Monotonic;
use crate::supervisor::Indicator;

/// Whether the LED is driven active-high or active-low on the board wiring.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ActiveLevel {
    High,
    Low,
}

/// LED abstraction that remembers its active level and last known state.
pub struct Led<PIN: OutputPin> {
    pin: PIN,
    active: ActiveLevel,
    is_on: bool,
}

impl<PIN: OutputPin> Led<PIN> {
    /// Create an LED wrapper, initializing it to OFF.
    pub fn new(mut pin: PIN, active: ActiveLevel) -> Self {
        match active {
            ActiveLevel::High => pin.set_low().ok(),
            ActiveLevel::Low => pin.set_high().ok(),
        };
        Self {
            pin,
            active,
            is_on: false,
        }
    }

    /// Drive the LED logically ON (true) or OFF (false).
    pub fn set(&mut self, on: bool) {
        match (self.active, on) {
            (ActiveLevel::High, true) => self.pin.set_high().ok(),
            (ActiveLevel::High, false) => self.pin.set_low().ok(),
            (ActiveLevel::Low, true) => self.pin.set_low().ok(),
            (ActiveLevel::Low, false) => self.pin.set_high().ok(),
        };
        self.is_on = on;
    }

    #[inline]
    pub fn off(&mut self) {
        self.set(false);
    }

    pub fn toggle(&mut self) {
        self.set(!self.is_on);
    }

    #[inline]
    pub fn is_on(&self) -> bool {
        self.is_on
    }

    pub fn free(self) -> PIN {
        self.pin
    }
}

impl<PIN: OutputPin> Led<PIN> {
    pub fn active_high(pin: PIN) -> Self {
        Self::new(pin, ActiveLevel::High)
    }
    pub fn active_low(pin: PIN) -> Self {
        Self::new(pin, ActiveLevel::Low)
    }
}

/// LED that blinks with a fixed half-period measured on a [`Monotonic`] clock.
pub struct BlinkingLed<PIN: OutputPin, CLK> {
    led: Led<PIN>,
    clock: CLK,
    period_ms: u32,
    last_flip: u32,
}

impl<PIN: OutputPin, CLK: Monotonic> BlinkingLed<PIN, CLK> {
    /// `period_ms` is the time between two flips, i.e. half the blink cycle.
    pub fn new(led: Led<PIN>, clock: CLK, period_ms: u32) -> Self {
        Self {
            led,
            clock,
            period_ms,
            last_flip: 0,
        }
    }

    #[inline]
    pub fn is_on(&self) -> bool {
        self.led.is_on()
    }
}

impl<PIN: OutputPin, CLK: Monotonic> Indicator for BlinkingLed<PIN, CLK> {
    fn init(&mut self) {
        self.led.off();
        self.last_flip = self.clock.millis();
    }

    fn toggle(&mut self) {
        let now = self.clock.millis();
        if now.wrapping_sub(self.last_flip) >= self.period_ms {
            self.led.toggle();
            self.last_flip = now;
        }
    }
}
