// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Clock Tree
//!
//! Bringing the core from the 16 MHz internal oscillator to its target frequency happens in two
//! phases:
//!
//! 1. [`ClockPlan::derive`] searches the PLL divider space for a setting that hits the target
//!    exactly while keeping every internal stage inside the family [`Limits`]. Nothing touches
//!    hardware here.
//! 2. [`configure`] applies the plan through a [`ClockControl`] backend: oscillator and PLL
//!    first, then bus dividers paired with the flash wait states.
//!
//! Either phase can fail with a [`ClockError`]. There is no fallback; the caller is expected to
//! halt.

pub mod apply;
pub mod plan;

pub use apply::{configure, configure_buses, configure_oscillators, ClockControl, READY_POLL_LIMIT};
pub use plan::{ClockPlan, ClockRequest, Limits, STM32F76X};

/// PLLP divider feeding the system clock.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PllP {
    Div2,
    Div4,
    Div6,
    Div8,
}

impl PllP {
    pub const ALL: [PllP; 4] = [PllP::Div2, PllP::Div4, PllP::Div6, PllP::Div8];

    #[inline]
    pub const fn divisor(self) -> u32 {
        match self {
            PllP::Div2 => 2,
            PllP::Div4 => 4,
            PllP::Div6 => 6,
            PllP::Div8 => 8,
        }
    }
}

/// Main PLL register-level parameters, sourced from HSI.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PllConfig {
    /// Pre-divider between the reference and the VCO input.
    pub m: u8,
    /// VCO multiplier.
    pub n: u16,
    /// System clock tap.
    pub p: PllP,
    /// Peripheral (48 MHz domain) tap.
    pub q: u8,
}

/// AHB prescaler (HCLK = SYSCLK / div).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AhbPrescaler {
    Div1,
    Div2,
    Div4,
    Div8,
    Div16,
}

/// APB prescaler (PCLKx = HCLK / div).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ApbPrescaler {
    Div1,
    Div2,
    Div4,
    Div8,
    Div16,
}

impl AhbPrescaler {
    pub const ALL: [AhbPrescaler; 5] = [
        AhbPrescaler::Div1,
        AhbPrescaler::Div2,
        AhbPrescaler::Div4,
        AhbPrescaler::Div8,
        AhbPrescaler::Div16,
    ];

    #[inline]
    pub const fn divisor(self) -> u32 {
        match self {
            AhbPrescaler::Div1 => 1,
            AhbPrescaler::Div2 => 2,
            AhbPrescaler::Div4 => 4,
            AhbPrescaler::Div8 => 8,
            AhbPrescaler::Div16 => 16,
        }
    }
}

impl ApbPrescaler {
    pub const ALL: [ApbPrescaler; 5] = [
        ApbPrescaler::Div1,
        ApbPrescaler::Div2,
        ApbPrescaler::Div4,
        ApbPrescaler::Div8,
        ApbPrescaler::Div16,
    ];

    #[inline]
    pub const fn divisor(self) -> u32 {
        match self {
            ApbPrescaler::Div1 => 1,
            ApbPrescaler::Div2 => 2,
            ApbPrescaler::Div4 => 4,
            ApbPrescaler::Div8 => 8,
            ApbPrescaler::Div16 => 16,
        }
    }
}

/// Main regulator output scale. Lower scales save power but cap the core frequency.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum VoltageScale {
    Scale3,
    Scale2,
    Scale1,
}

/// System clock multiplexer input.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SysclkSource {
    Hsi,
    Hse,
    Pll,
}

/// Clock configuration rejected, either while planning or by hardware feedback.
///
/// This is the only failure the bring-up sequence recognizes. All variants are fatal.
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ClockError {
    #[error("no PLL setting reaches {target_khz} kHz from {reference_khz} kHz")]
    Unreachable { reference_khz: u32, target_khz: u32 },
    #[error("HSI did not report ready")]
    OscillatorTimeout,
    #[error("PLL drives SYSCLK and cannot be reprogrammed")]
    PllInUse,
    #[error("PLL did not stop")]
    PllUnlockTimeout,
    #[error("PLL did not lock")]
    PllLockTimeout,
    #[error("flash reports {actual} wait states, expected {expected}")]
    FlashLatencyRejected { expected: u8, actual: u8 },
    #[error("SYSCLK switch to {0:?} not acknowledged")]
    SwitchTimeout(SysclkSource),
}
