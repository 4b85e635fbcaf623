// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! PLL parameter derivation.
//!
//! The main PLL produces `SYSCLK = reference × N ÷ (M × P)`. [`ClockPlan::derive`] walks the
//! pre-divider M upwards (highest VCO input first), then P over
//! {2, 4, 6, 8}, and takes the first combination where N comes out as an exact integer and both
//! the VCO input and output stay inside [`Limits`]. With the 16 MHz HSI this lands on a 2 MHz VCO
//! input, so N reduces to `target × P ÷ 2 MHz`.
//!
//! Targets that are not an exact integer multiple of the VCO input step are rejected rather than
//! rounded.

use fugit::KilohertzU32;

use super::{AhbPrescaler, ApbPrescaler, ClockError, PllConfig, PllP, VoltageScale};

/// Documented clock-tree ranges for one MCU family. All bounds are inclusive.
#[derive(Copy, Clone, Debug)]
pub struct Limits {
    pub pllm: (u8, u8),
    pub plln: (u16, u16),
    pub pllq: (u8, u8),
    pub vco_in: (KilohertzU32, KilohertzU32),
    pub vco_out: (KilohertzU32, KilohertzU32),
    pub sysclk_max: KilohertzU32,
    /// Upper bound of the PLLQ (48 MHz domain) tap.
    pub pll48_max: KilohertzU32,
    pub hclk_max: KilohertzU32,
    pub apb1_max: KilohertzU32,
    pub apb2_max: KilohertzU32,
    /// HCLK window covered by each flash wait state at the board supply voltage.
    pub khz_per_wait_state: u32,
    pub max_wait_states: u8,
    /// Highest SYSCLK each regulator scale supports, lowest-power scale first.
    pub voltage_scales: [(VoltageScale, KilohertzU32); 3],
}

/// STM32F76x/77x at 2.7–3.6 V with over-drive left off (RM0410 §5, DS11532 §6.3).
pub const STM32F76X: Limits = Limits {
    pllm: (2, 63),
    plln: (50, 432),
    pllq: (2, 15),
    vco_in: (KilohertzU32::kHz(950), KilohertzU32::kHz(2_100)),
    vco_out: (KilohertzU32::MHz(100), KilohertzU32::MHz(432)),
    sysclk_max: KilohertzU32::MHz(180),
    pll48_max: KilohertzU32::MHz(48),
    hclk_max: KilohertzU32::MHz(180),
    apb1_max: KilohertzU32::MHz(54),
    apb2_max: KilohertzU32::MHz(108),
    khz_per_wait_state: 30_000,
    max_wait_states: 9,
    voltage_scales: [
        (VoltageScale::Scale3, KilohertzU32::MHz(144)),
        (VoltageScale::Scale2, KilohertzU32::MHz(168)),
        (VoltageScale::Scale1, KilohertzU32::MHz(180)),
    ],
};

/// What the board asks of the clock tree, fixed at compile time.
#[derive(Copy, Clone, Debug)]
pub struct ClockRequest {
    pub reference: KilohertzU32,
    pub target: KilohertzU32,
    pub limits: Limits,
}

impl ClockRequest {
    pub fn plan(&self) -> Result<ClockPlan, ClockError> {
        ClockPlan::derive(self.reference, self.target, &self.limits)
    }
}

/// A validated clock tree. Only [`ClockPlan::derive`] can build one.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ClockPlan {
    reference: KilohertzU32,
    pll: PllConfig,
    vco: KilohertzU32,
    sysclk: KilohertzU32,
    pll48: KilohertzU32,
    ahb: AhbPrescaler,
    apb1: ApbPrescaler,
    apb2: ApbPrescaler,
    wait_states: u8,
    voltage_scale: VoltageScale,
}

impl ClockPlan {
    /// Derive PLL, bus dividers, flash wait states and regulator scale for `target`.
    pub fn derive(
        reference: KilohertzU32,
        target: KilohertzU32,
        limits: &Limits,
    ) -> Result<Self, ClockError> {
        let unreachable = ClockError::Unreachable {
            reference_khz: reference.to_kHz(),
            target_khz: target.to_kHz(),
        };

        let reference_khz = u64::from(reference.to_kHz());
        let target_khz = u64::from(target.to_kHz());
        if reference_khz == 0 || target_khz == 0 || target > limits.sysclk_max {
            return Err(unreachable);
        }

        let (pll, vco_khz) = search_pll(reference_khz, target_khz, limits).ok_or(unreachable)?;

        let sysclk = target.to_kHz();
        let ahb = AhbPrescaler::ALL
            .into_iter()
            .find(|d| sysclk / d.divisor() <= limits.hclk_max.to_kHz())
            .ok_or(unreachable)?;
        let hclk = sysclk / ahb.divisor();

        let apb1 = ApbPrescaler::ALL
            .into_iter()
            .find(|d| hclk / d.divisor() <= limits.apb1_max.to_kHz())
            .ok_or(unreachable)?;
        let apb2 = ApbPrescaler::ALL
            .into_iter()
            .find(|d| hclk / d.divisor() <= limits.apb2_max.to_kHz())
            .ok_or(unreachable)?;

        let wait_states = (hclk - 1) / limits.khz_per_wait_state;
        if wait_states > u32::from(limits.max_wait_states) {
            return Err(unreachable);
        }

        let voltage_scale = limits
            .voltage_scales
            .iter()
            .find(|(_, max)| target <= *max)
            .map(|(scale, _)| *scale)
            .ok_or(unreachable)?;

        Ok(Self {
            reference,
            pll,
            vco: KilohertzU32::from_raw(vco_khz as u32),
            sysclk: target,
            pll48: KilohertzU32::from_raw((vco_khz / u64::from(pll.q)) as u32),
            ahb,
            apb1,
            apb2,
            wait_states: wait_states as u8,
            voltage_scale,
        })
    }

    #[inline]
    pub fn reference(&self) -> KilohertzU32 {
        self.reference
    }

    #[inline]
    pub fn pll(&self) -> PllConfig {
        self.pll
    }

    #[inline]
    pub fn vco(&self) -> KilohertzU32 {
        self.vco
    }

    /// VCO input frequency (reference ÷ M).
    pub fn vco_input(&self) -> KilohertzU32 {
        KilohertzU32::from_raw(self.reference.to_kHz() / u32::from(self.pll.m))
    }

    #[inline]
    pub fn sysclk(&self) -> KilohertzU32 {
        self.sysclk
    }

    #[inline]
    pub fn pll48(&self) -> KilohertzU32 {
        self.pll48
    }

    #[inline]
    pub fn ahb(&self) -> AhbPrescaler {
        self.ahb
    }

    #[inline]
    pub fn apb1(&self) -> ApbPrescaler {
        self.apb1
    }

    #[inline]
    pub fn apb2(&self) -> ApbPrescaler {
        self.apb2
    }

    pub fn hclk(&self) -> KilohertzU32 {
        KilohertzU32::from_raw(self.sysclk.to_kHz() / self.ahb.divisor())
    }

    pub fn pclk1(&self) -> KilohertzU32 {
        KilohertzU32::from_raw(self.hclk().to_kHz() / self.apb1.divisor())
    }

    pub fn pclk2(&self) -> KilohertzU32 {
        KilohertzU32::from_raw(self.hclk().to_kHz() / self.apb2.divisor())
    }

    /// Flash latency class for HCLK.
    #[inline]
    pub fn wait_states(&self) -> u8 {
        self.wait_states
    }

    #[inline]
    pub fn voltage_scale(&self) -> VoltageScale {
        self.voltage_scale
    }
}

fn search_pll(reference: u64, target: u64, limits: &Limits) -> Option<(PllConfig, u64)> {
    let (vco_in_min, vco_in_max) = (
        u64::from(limits.vco_in.0.to_kHz()),
        u64::from(limits.vco_in.1.to_kHz()),
    );
    let (vco_min, vco_max) = (
        u64::from(limits.vco_out.0.to_kHz()),
        u64::from(limits.vco_out.1.to_kHz()),
    );

    for m in limits.pllm.0..=limits.pllm.1 {
        let m_wide = u64::from(m);

        // reference / m must land inside the VCO input window
        if reference < vco_in_min * m_wide || reference > vco_in_max * m_wide {
            continue;
        }

        for p in PllP::ALL {
            let vco = target * u64::from(p.divisor());
            if vco < vco_min || vco > vco_max {
                continue;
            }

            let scaled = vco * m_wide;
            if scaled % reference != 0 {
                continue;
            }
            let n = scaled / reference;
            if n < u64::from(limits.plln.0) || n > u64::from(limits.plln.1) {
                continue;
            }

            let Some(q) = pick_q(vco, limits) else {
                continue;
            };

            return Some((
                PllConfig {
                    m,
                    n: n as u16,
                    p,
                    q,
                },
                vco,
            ));
        }
    }

    None
}

/// Smallest Q that keeps the 48 MHz domain at or under its ceiling.
fn pick_q(vco: u64, limits: &Limits) -> Option<u8> {
    let ceiling = u64::from(limits.pll48_max.to_kHz());
    let q = vco.div_ceil(ceiling).max(u64::from(limits.pllq.0));
    (q <= u64::from(limits.pllq.1)).then_some(q as u8)
}
