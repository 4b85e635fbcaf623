// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Cortex-M7 core services: flash accelerator and the 1 kHz SysTick.

use cortex_m::peripheral::{syst::SystClkSource, SYST};
use fugit::KilohertzU32;
use stm32f7xx_hal::pac;

use crate::sequencer::CoreControl;

// FLASH_ACR
const PRFTEN: u32 = 1 << 8;
const ARTEN: u32 = 1 << 9;

/// Largest value the 24-bit SysTick reload register holds.
const SYST_RELOAD_MAX: u32 = 0x00FF_FFFF;

pub struct Core {
    syst: SYST,
}

impl Core {
    pub fn new(syst: SYST) -> Self {
        Self { syst }
    }
}

impl CoreControl for Core {
    fn init(&mut self) {
        let flash = unsafe { &*pac::FLASH::ptr() };
        flash
            .acr
            .modify(|r, w| unsafe { w.bits(r.bits() | ARTEN | PRFTEN) });
    }

    fn start_tick(&mut self, hclk: KilohertzU32) {
        // One tick per millisecond: the reload is the core frequency in kHz, minus one.
        let reload = hclk.to_kHz().saturating_sub(1).min(SYST_RELOAD_MAX);

        self.syst.disable_counter();
        self.syst.set_clock_source(SystClkSource::Core);
        self.syst.set_reload(reload);
        self.syst.clear_current();
        self.syst.enable_interrupt();
        self.syst.enable_counter();
    }
}
