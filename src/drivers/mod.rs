// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Collaborator Drivers
//!
//! Drivers that sit above the raw `hw/` layer and plug into the [`crate::supervisor`] traits.
//! They are generic over `embedded-hal` pins and serial ports, so the same code runs on the board
//! and against fakes in tests.
//!
//! ## Existing drivers
//!
//! - [`led`] – status LED with a fixed blink period
//! - [`activation`] – serial activation-request detector

pub mod activation;
pub mod led;

pub use activation::{ActivationParser, BootloaderEntry, SerialActivation, SerialPort};
pub use led::{ActiveLevel, BlinkingLed, Led};

/// Free-running millisecond counter.
pub trait Monotonic {
    /// Milliseconds since the timer driver was initialized. Wraps after ~49 days.
    fn millis(&self) -> u32;
}
