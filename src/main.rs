// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(target_os = "none")]
mod firmware {
    use cortex_m_rt::{entry, exception};
    use panic_halt as _;
    use stm32f7xx_hal::pac;

    use bringup::config;
    use bringup::hw::{self, Board};
    use bringup::sequencer::Sequencer;

    #[entry]
    fn main() -> ! {
        #[cfg(feature = "log-rtt")]
        bringup::logging::init(log::LevelFilter::Debug);

        // Peripherals
        let dp = pac::Peripherals::take().unwrap();
        let cp = cortex_m::Peripherals::take().unwrap();

        let Board { platform, drivers } = Board::new(dp, cp);
        let sequencer = Sequencer::new(platform, drivers, config::CLOCK_REQUEST, &config::MSP);

        match sequencer.run() {
            Ok(system) => system.run(),
            Err(halted) => halted.halt(),
        }
    }

    #[exception]
    fn SysTick() {
        hw::systick::on_tick();
    }
}

#[cfg(not(target_os = "none"))]
fn main() {}
