// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Bring-up Firmware
//!
//! This crate takes an STM32F767ZI (Nucleo-144) from reset to a validated 64 MHz clock tree,
//! enables exactly the peripherals needed for the status LED and the USART3 activation link, and
//! then services both from a cooperative supervisory loop until reset or until an activation
//! request hands control to the bootloader.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`config`] | Compile-time clock targets, board pins and the MSP layout |
//! | [`clock`] | PLL plan derivation and two-step clock tree application |
//! | [`resources`] | Peripheral clock gates, pin functions, system priorities |
//! | [`sequencer`] | The ordered bring-up sequence and its fail-halt policy |
//! | [`supervisor`] | The post-bring-up loop and its collaborator traits |
//! | [`drivers`] | Hardware-independent collaborators (LED blinker, activation detector) |
//! | `hw` | STM32F7 register backends (target builds only) |
//! | `logging` | RTT sink for the `log` facade (target builds, `log-rtt` feature) |
//!
//! Everything outside `hw` is plain `no_std` logic behind traits, so it builds and tests on the
//! host:
//!
//! ```bash
//! cargo test
//! ```
//!
//! Flash the board:
//!
//! ```bash
//! cargo run --release --target thumbv7em-none-eabihf
//! ```
//!
//! Add `--features log-rtt` to stream bring-up logs over RTT.
//!
//! ## License
//!
//! Licensed under the **MIT License**.
//! See the `LICENSE` file in the repository root for full terms.
//!
//! © 2025–2026 Christopher Liu

#![cfg_attr(not(test), no_std)]

pub mod clock;
pub mod config;
pub mod drivers;
pub mod resources;
pub mod sequencer;
pub mod supervisor;

#[cfg(target_os = "none")]
pub mod hw;

#[cfg(all(target_os = "none", feature = "log-rtt"))]
pub mod logging;
