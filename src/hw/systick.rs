// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Millisecond time base fed by the SysTick exception.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::drivers::Monotonic;
use crate::supervisor::TimerDriver;

static MILLIS: AtomicU32 = AtomicU32::new(0);

/// Advance the counter. Call from the `SysTick` exception handler only.
#[inline]
pub fn on_tick() {
    MILLIS.fetch_add(1, Ordering::Relaxed);
}

/// Handle on the shared counter. Zero-sized; copy it into every driver that needs time.
#[derive(Copy, Clone, Debug, Default)]
pub struct SysTickTimer;

impl TimerDriver for SysTickTimer {
    fn init(&mut self) {
        MILLIS.store(0, Ordering::Relaxed);
    }
}

impl Monotonic for SysTickTimer {
    #[inline]
    fn millis(&self) -> u32 {
        MILLIS.load(Ordering::Relaxed)
    }
}
