// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Peripheral Resources
//!
//! Clock gates, pin functions and system-exception priorities, plus the [`Msp`] guard that
//! acquires them in layout order during bring-up and releases them in exactly the reverse order.
//!
//! Release order matters for pins: an output is first driven to its idle level and only then
//! returned to its reset function, so external circuitry never sees a glitch while the pin floats.

use heapless::Vec;
use log::{error, trace};

/// Most clock domains an [`MspLayout`] may list.
pub const MAX_DOMAINS: usize = 8;
/// Most pins an [`MspLayout`] may list.
pub const MAX_PINS: usize = 8;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Port {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
}

impl Port {
    /// Position of the port in the GPIO address map and in RCC_AHB1ENR.
    #[inline]
    pub const fn index(self) -> u8 {
        self as u8
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PinId {
    pub port: Port,
    pub index: u8,
}

impl PinId {
    pub const fn new(port: Port, index: u8) -> Self {
        Self { port, index }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Level {
    Low,
    High,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Pull {
    None,
    Up,
    Down,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Speed {
    Low,
    Medium,
    High,
    VeryHigh,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputType {
    PushPull,
    OpenDrain,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PinMode {
    Input,
    /// GPIO output; `idle` is driven before the pin is configured and again before release.
    Output { kind: OutputType, idle: Level },
    Alternate { af: u8, kind: OutputType },
    Analog,
}

/// Full description of one pin function.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PinConfig {
    pub pin: PinId,
    pub mode: PinMode,
    pub pull: Pull,
    pub speed: Speed,
}

impl PinConfig {
    /// Push-pull output, no pull, low speed.
    pub const fn output(pin: PinId, idle: Level) -> Self {
        Self {
            pin,
            mode: PinMode::Output {
                kind: OutputType::PushPull,
                idle,
            },
            pull: Pull::None,
            speed: Speed::Low,
        }
    }

    /// Push-pull alternate function, no pull, low speed.
    pub const fn alternate(pin: PinId, af: u8) -> Self {
        Self {
            pin,
            mode: PinMode::Alternate {
                af,
                kind: OutputType::PushPull,
            },
            pull: Pull::None,
            speed: Speed::Low,
        }
    }

    /// Level to drive before the pin is floated, if it is an output.
    #[inline]
    pub fn idle_level(&self) -> Option<Level> {
        match self.mode {
            PinMode::Output { idle, .. } => Some(idle),
            _ => None,
        }
    }
}

/// A peripheral clock domain gated in RCC.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Domain {
    Syscfg,
    Pwr,
    Gpio(Port),
    Usart1,
    Usart2,
    Usart3,
}

/// Cortex-M system exceptions whose priority the bring-up fixes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SystemException {
    SvCall,
    PendSv,
    SysTick,
}

/// Record of one enabled domain; `enabled` drops to false on release.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PeripheralBinding {
    pub domain: Domain,
    pub enabled: bool,
}

/// Register-level access to clock gates, GPIO and the SCB priority registers.
pub trait ResourceControl {
    fn set_domain_clock(&mut self, domain: Domain, enabled: bool);
    fn domain_clock(&self, domain: Domain) -> bool;

    /// Program mode, output type, speed, pull and alternate selector.
    fn apply_pin(&mut self, config: &PinConfig);
    fn write_pin(&mut self, pin: PinId, level: Level);
    /// Return the pin to its reset function (input, no pull, low speed, AF0).
    fn reset_pin(&mut self, pin: PinId);

    fn set_priority(&mut self, exception: SystemException, priority: u8);
}

/// Gate `domain` on. Safe to call for an already enabled domain.
pub fn enable_domain<R: ResourceControl>(ctrl: &mut R, domain: Domain) -> PeripheralBinding {
    if !ctrl.domain_clock(domain) {
        ctrl.set_domain_clock(domain, true);
    }
    PeripheralBinding {
        domain,
        enabled: true,
    }
}

/// Gate the bound domain off. Safe to call twice.
pub fn disable_domain<R: ResourceControl>(ctrl: &mut R, binding: &mut PeripheralBinding) {
    if ctrl.domain_clock(binding.domain) {
        ctrl.set_domain_clock(binding.domain, false);
    }
    binding.enabled = false;
}

/// Configure a pin. Outputs are preloaded with their idle level so they come up inactive.
pub fn configure_pin<R: ResourceControl>(ctrl: &mut R, config: &PinConfig) {
    if let Some(idle) = config.idle_level() {
        ctrl.write_pin(config.pin, idle);
    }
    ctrl.apply_pin(config);
}

/// Release a pin: drive outputs to their idle level first, then remove the function mapping.
pub fn release_pin<R: ResourceControl>(ctrl: &mut R, config: &PinConfig) {
    if let Some(idle) = config.idle_level() {
        ctrl.write_pin(config.pin, idle);
    }
    ctrl.reset_pin(config.pin);
}

/// Everything the post-reset hook acquires, in acquisition order.
#[derive(Copy, Clone, Debug)]
pub struct MspLayout {
    pub domains: &'static [Domain],
    pub priorities: &'static [(SystemException, u8)],
    pub pins: &'static [PinConfig],
}

impl MspLayout {
    /// Whether the layout fits the guard's fixed-capacity records.
    pub const fn fits(&self) -> bool {
        self.domains.len() <= MAX_DOMAINS && self.pins.len() <= MAX_PINS
    }
}

/// Scoped ownership of the MSP resources.
///
/// [`Msp::init`] is the post-reset-init hook; [`Msp::deinit`] (also run on drop) is its mirror.
pub struct Msp<R: ResourceControl> {
    ctrl: R,
    bindings: Vec<PeripheralBinding, MAX_DOMAINS>,
    pins: Vec<PinConfig, MAX_PINS>,
}

impl<R: ResourceControl> Msp<R> {
    /// Enable domains, fix priorities, then configure pins, each in layout order.
    ///
    /// A pin is configured only if its GPIO port is among the enabled domains.
    pub fn init(mut ctrl: R, layout: &MspLayout) -> Self {
        let mut bindings: Vec<PeripheralBinding, MAX_DOMAINS> = Vec::new();
        for &domain in layout.domains {
            if bindings.is_full() {
                // Unrecorded domains would never be released, so they are not enabled either.
                error!("MSP layout exceeds {} domains, skipping {:?}", MAX_DOMAINS, domain);
                continue;
            }
            let _ = bindings.push(enable_domain(&mut ctrl, domain));
            trace!("domain {:?} on", domain);
        }

        for &(exception, priority) in layout.priorities {
            ctrl.set_priority(exception, priority);
        }

        let mut pins: Vec<PinConfig, MAX_PINS> = Vec::new();
        for config in layout.pins {
            let port = Domain::Gpio(config.pin.port);
            if !bindings.iter().any(|b| b.domain == port) {
                // Port registers are dead until the port clock is on.
                error!("{:?} is not clocked, skipping {:?}", port, config.pin);
                continue;
            }
            if pins.is_full() {
                error!("MSP layout exceeds {} pins, skipping {:?}", MAX_PINS, config.pin);
                continue;
            }
            configure_pin(&mut ctrl, config);
            let _ = pins.push(*config);
        }

        Self {
            ctrl,
            bindings,
            pins,
        }
    }

    /// Release pins (newest first), then gate domains off (newest first). Idempotent.
    pub fn deinit(&mut self) {
        while let Some(config) = self.pins.pop() {
            release_pin(&mut self.ctrl, &config);
        }

        for binding in self.bindings.iter_mut().rev() {
            if binding.enabled {
                disable_domain(&mut self.ctrl, binding);
                trace!("domain {:?} off", binding.domain);
            }
        }
    }

    #[inline]
    pub fn bindings(&self) -> &[PeripheralBinding] {
        &self.bindings
    }

    /// Pins currently owned by the guard.
    #[inline]
    pub fn pins(&self) -> &[PinConfig] {
        &self.pins
    }

    pub fn is_released(&self) -> bool {
        self.pins.is_empty() && self.bindings.iter().all(|b| !b.enabled)
    }
}

impl<R: ResourceControl> Drop for Msp<R> {
    fn drop(&mut self) {
        self.deinit();
    }
}
