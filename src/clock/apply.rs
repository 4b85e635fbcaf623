// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Applying a [`ClockPlan`] to hardware.
//!
//! [`ClockControl`] is the register seam: each method is a single RCC/FLASH/PWR access, and the
//! ordering rules live here rather than in the backend. Every wait on a hardware ready flag is
//! bounded by [`READY_POLL_LIMIT`] reads; running out counts as the hardware rejecting the setting.

use log::{debug, trace};

use super::{AhbPrescaler, ApbPrescaler, ClockError, ClockPlan, PllConfig, SysclkSource, VoltageScale};

/// Upper bound on status-flag reads before a wait is declared failed.
///
/// HSI start-up and PLL lock are specified in microseconds; at 16 MHz this is several
/// milliseconds of polling.
pub const READY_POLL_LIMIT: u32 = 50_000;

/// Register-level access to the clock-control block.
pub trait ClockControl {
    fn set_voltage_scale(&mut self, scale: VoltageScale);

    /// Turn the internal oscillator on with its factory trim.
    fn enable_hsi(&mut self);
    fn hsi_ready(&self) -> bool;

    fn set_pll_enabled(&mut self, enabled: bool);
    fn pll_ready(&self) -> bool;
    /// Program M/N/P/Q with HSI as the PLL source. Only valid while the PLL is off.
    fn write_pll(&mut self, pll: &PllConfig);

    fn flash_wait_states(&self) -> u8;
    fn set_flash_wait_states(&mut self, wait_states: u8);

    fn set_ahb_prescaler(&mut self, ahb: AhbPrescaler);
    fn set_apb_prescalers(&mut self, apb1: ApbPrescaler, apb2: ApbPrescaler);

    fn select_sysclk(&mut self, source: SysclkSource);
    /// Source the clock switch currently reports (SWS), which lags the selection.
    fn sysclk_source(&self) -> SysclkSource;
}

/// Apply both steps of `plan`, oscillator first.
pub fn configure<K: ClockControl>(clk: &mut K, plan: &ClockPlan) -> Result<(), ClockError> {
    configure_oscillators(clk, plan)?;
    configure_buses(clk, plan)
}

/// Step 1: refuse a live PLL, then regulator scale, HSI and the PLL.
pub fn configure_oscillators<K: ClockControl>(
    clk: &mut K,
    plan: &ClockPlan,
) -> Result<(), ClockError> {
    // The PLL cannot be reprogrammed underneath the core, nor its regulator scale changed.
    if clk.sysclk_source() == SysclkSource::Pll {
        return Err(ClockError::PllInUse);
    }

    clk.set_voltage_scale(plan.voltage_scale());

    clk.enable_hsi();
    if !wait_for(|| clk.hsi_ready()) {
        return Err(ClockError::OscillatorTimeout);
    }
    trace!("HSI ready");

    clk.set_pll_enabled(false);
    if !wait_for(|| !clk.pll_ready()) {
        return Err(ClockError::PllUnlockTimeout);
    }

    let pll = plan.pll();
    clk.write_pll(&pll);
    clk.set_pll_enabled(true);
    if !wait_for(|| clk.pll_ready()) {
        return Err(ClockError::PllLockTimeout);
    }

    debug!(
        "PLL locked: M={} N={} P={} Q={} VCO={} kHz",
        pll.m,
        pll.n,
        pll.p.divisor(),
        pll.q,
        plan.vco().to_kHz()
    );
    Ok(())
}

/// Step 2: switch SYSCLK to the PLL with the flash wait states paired to the new HCLK.
///
/// Wait states go up before the switch and come down only after it, so the flash is never
/// under-provisioned for whatever clock is running at that moment.
pub fn configure_buses<K: ClockControl>(clk: &mut K, plan: &ClockPlan) -> Result<(), ClockError> {
    let target = plan.wait_states();

    if target > clk.flash_wait_states() {
        program_wait_states(clk, target)?;
    }

    // Park both APB buses at the slowest setting while HCLK moves.
    clk.set_apb_prescalers(ApbPrescaler::Div16, ApbPrescaler::Div16);
    clk.set_ahb_prescaler(plan.ahb());

    clk.select_sysclk(SysclkSource::Pll);
    if !wait_for(|| clk.sysclk_source() == SysclkSource::Pll) {
        return Err(ClockError::SwitchTimeout(SysclkSource::Pll));
    }

    if target < clk.flash_wait_states() {
        program_wait_states(clk, target)?;
    }

    clk.set_apb_prescalers(plan.apb1(), plan.apb2());

    debug!(
        "SYSCLK={} kHz HCLK={} kHz PCLK1={} kHz PCLK2={} kHz, {} wait states",
        plan.sysclk().to_kHz(),
        plan.hclk().to_kHz(),
        plan.pclk1().to_kHz(),
        plan.pclk2().to_kHz(),
        target
    );
    Ok(())
}

fn program_wait_states<K: ClockControl>(clk: &mut K, expected: u8) -> Result<(), ClockError> {
    clk.set_flash_wait_states(expected);

    // FLASH_ACR ignores values it cannot honour; the read-back is the only feedback.
    let actual = clk.flash_wait_states();
    if actual != expected {
        return Err(ClockError::FlashLatencyRejected { expected, actual });
    }
    Ok(())
}

fn wait_for(mut ready: impl FnMut() -> bool) -> bool {
    (0..READY_POLL_LIMIT).any(|_| ready())
}
