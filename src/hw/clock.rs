// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! RCC, FLASH and PWR register backend for the clock configurator.

use fugit::KilohertzU32;
use stm32f7xx_hal::pac;

use crate::clock::{AhbPrescaler, ApbPrescaler, ClockControl, PllConfig, PllP, SysclkSource, VoltageScale};
use crate::config::HSI;

// RCC_CR
const HSION: u32 = 1 << 0;
const HSIRDY: u32 = 1 << 1;
const HSITRIM_MASK: u32 = 0x1F << 3;
const HSITRIM_DEFAULT: u32 = 16 << 3;
const PLLON: u32 = 1 << 24;
const PLLRDY: u32 = 1 << 25;

// RCC_PLLCFGR
const PLLM_MASK: u32 = 0x3F;
const PLLN_SHIFT: u32 = 6;
const PLLN_MASK: u32 = 0x1FF << PLLN_SHIFT;
const PLLP_SHIFT: u32 = 16;
const PLLP_MASK: u32 = 0b11 << PLLP_SHIFT;
const PLLSRC_HSE: u32 = 1 << 22;
const PLLQ_SHIFT: u32 = 24;
const PLLQ_MASK: u32 = 0xF << PLLQ_SHIFT;

// RCC_CFGR
const SW_MASK: u32 = 0b11;
const SWS_SHIFT: u32 = 2;
const HPRE_SHIFT: u32 = 4;
const HPRE_MASK: u32 = 0xF << HPRE_SHIFT;
const PPRE1_SHIFT: u32 = 10;
const PPRE2_SHIFT: u32 = 13;
const PPRE_MASK: u32 = 0b111;

// FLASH_ACR
const LATENCY_MASK: u32 = 0xF;

// PWR_CR1
const VOS_SHIFT: u32 = 14;
const VOS_MASK: u32 = 0b11 << VOS_SHIFT;

/// Owns the clock-tree registers for the duration of bring-up.
pub struct RccClocks {
    rcc: pac::RCC,
    flash: pac::FLASH,
    pwr: pac::PWR,
}

impl RccClocks {
    pub fn new(rcc: pac::RCC, flash: pac::FLASH, pwr: pac::PWR) -> Self {
        Self { rcc, flash, pwr }
    }
}

impl ClockControl for RccClocks {
    fn set_voltage_scale(&mut self, scale: VoltageScale) {
        let vos = match scale {
            VoltageScale::Scale3 => 0b01,
            VoltageScale::Scale2 => 0b10,
            VoltageScale::Scale1 => 0b11,
        };
        self.pwr
            .cr1
            .modify(|r, w| unsafe { w.bits((r.bits() & !VOS_MASK) | (vos << VOS_SHIFT)) });
    }

    fn enable_hsi(&mut self) {
        self.rcc
            .cr
            .modify(|r, w| unsafe { w.bits((r.bits() & !HSITRIM_MASK) | HSITRIM_DEFAULT | HSION) });
    }

    fn hsi_ready(&self) -> bool {
        self.rcc.cr.read().bits() & HSIRDY != 0
    }

    fn set_pll_enabled(&mut self, enabled: bool) {
        self.rcc.cr.modify(|r, w| unsafe {
            if enabled {
                w.bits(r.bits() | PLLON)
            } else {
                w.bits(r.bits() & !PLLON)
            }
        });
    }

    fn pll_ready(&self) -> bool {
        self.rcc.cr.read().bits() & PLLRDY != 0
    }

    fn write_pll(&mut self, pll: &PllConfig) {
        let p = match pll.p {
            PllP::Div2 => 0b00,
            PllP::Div4 => 0b01,
            PllP::Div6 => 0b10,
            PllP::Div8 => 0b11,
        };
        // PLLR and the reserved bits keep their reset values; source is HSI.
        let mask = PLLM_MASK | PLLN_MASK | PLLP_MASK | PLLSRC_HSE | PLLQ_MASK;
        let value = u32::from(pll.m)
            | (u32::from(pll.n) << PLLN_SHIFT)
            | (p << PLLP_SHIFT)
            | (u32::from(pll.q) << PLLQ_SHIFT);
        self.rcc
            .pllcfgr
            .modify(|r, w| unsafe { w.bits((r.bits() & !mask) | value) });
    }

    fn flash_wait_states(&self) -> u8 {
        (self.flash.acr.read().bits() & LATENCY_MASK) as u8
    }

    fn set_flash_wait_states(&mut self, wait_states: u8) {
        self.flash.acr.modify(|r, w| unsafe {
            w.bits((r.bits() & !LATENCY_MASK) | (u32::from(wait_states) & LATENCY_MASK))
        });
    }

    fn set_ahb_prescaler(&mut self, ahb: AhbPrescaler) {
        let hpre = hpre_bits(ahb);
        self.rcc
            .cfgr
            .modify(|r, w| unsafe { w.bits((r.bits() & !HPRE_MASK) | (hpre << HPRE_SHIFT)) });
    }

    fn set_apb_prescalers(&mut self, apb1: ApbPrescaler, apb2: ApbPrescaler) {
        let mask = (PPRE_MASK << PPRE1_SHIFT) | (PPRE_MASK << PPRE2_SHIFT);
        let value = (ppre_bits(apb1) << PPRE1_SHIFT) | (ppre_bits(apb2) << PPRE2_SHIFT);
        self.rcc
            .cfgr
            .modify(|r, w| unsafe { w.bits((r.bits() & !mask) | value) });
    }

    fn select_sysclk(&mut self, source: SysclkSource) {
        let sw = sw_bits(source);
        self.rcc
            .cfgr
            .modify(|r, w| unsafe { w.bits((r.bits() & !SW_MASK) | sw) });
    }

    fn sysclk_source(&self) -> SysclkSource {
        match (self.rcc.cfgr.read().bits() >> SWS_SHIFT) & SW_MASK {
            0b01 => SysclkSource::Hse,
            0b10 => SysclkSource::Pll,
            _ => SysclkSource::Hsi,
        }
    }
}

fn sw_bits(source: SysclkSource) -> u32 {
    match source {
        SysclkSource::Hsi => 0b00,
        SysclkSource::Hse => 0b01,
        SysclkSource::Pll => 0b10,
    }
}

fn hpre_bits(ahb: AhbPrescaler) -> u32 {
    match ahb {
        AhbPrescaler::Div1 => 0b0000,
        AhbPrescaler::Div2 => 0b1000,
        AhbPrescaler::Div4 => 0b1001,
        AhbPrescaler::Div8 => 0b1010,
        AhbPrescaler::Div16 => 0b1011,
    }
}

fn ppre_bits(apb: ApbPrescaler) -> u32 {
    match apb {
        ApbPrescaler::Div1 => 0b000,
        ApbPrescaler::Div2 => 0b100,
        ApbPrescaler::Div4 => 0b101,
        ApbPrescaler::Div8 => 0b110,
        ApbPrescaler::Div16 => 0b111,
    }
}

/// APB1 clock as the registers currently program it.
///
/// Read-only; drivers opened after bring-up use it to derive their baud dividers. Only HSI and the
/// HSI-fed PLL are decoded, which is all this firmware ever selects.
pub fn current_pclk1() -> KilohertzU32 {
    let rcc = unsafe { &*pac::RCC::ptr() };
    let cfgr = rcc.cfgr.read().bits();

    let sysclk = if (cfgr >> SWS_SHIFT) & SW_MASK == 0b10 {
        let pllcfgr = rcc.pllcfgr.read().bits();
        let m = (pllcfgr & PLLM_MASK).max(1);
        let n = (pllcfgr & PLLN_MASK) >> PLLN_SHIFT;
        let p = 2 * (((pllcfgr & PLLP_MASK) >> PLLP_SHIFT) + 1);
        HSI.to_kHz() * n / (m * p)
    } else {
        HSI.to_kHz()
    };

    let hpre = (cfgr & HPRE_MASK) >> HPRE_SHIFT;
    let ahb_shift = if hpre & 0b1000 == 0 {
        0
    } else {
        // 0b1000.. -> /2, /4, /8, /16, then /64 .. /512 (the /32 step does not exist)
        let step = (hpre & 0b111) + 1;
        if step > 4 {
            step + 1
        } else {
            step
        }
    };

    let ppre1 = (cfgr >> PPRE1_SHIFT) & PPRE_MASK;
    let apb1_shift = if ppre1 & 0b100 == 0 { 0 } else { (ppre1 & 0b11) + 1 };

    KilohertzU32::kHz(sysclk >> ahb_shift >> apb1_shift)
}
