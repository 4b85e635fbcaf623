// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! RTT sink for the `log` facade.
//!
//! Records go to RTT up-channel 0 as `[LEVEL target] message`. Attach with any RTT viewer
//! (`probe-rs attach`, J-Link RTT Viewer).

use log::{LevelFilter, Log, Metadata, Record};
use rtt_target::{rprintln, rtt_init_print};

struct RttLogger;

static LOGGER: RttLogger = RttLogger;

impl Log for RttLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        rprintln!("[{} {}] {}", record.level(), record.target(), record.args());
    }

    fn flush(&self) {}
}

/// Set up the RTT channel and install the logger. Call once, before anything logs.
pub fn init(level: LevelFilter) {
    rtt_init_print!();
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
