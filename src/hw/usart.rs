// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! USART3 receiver.
//!
//! On the Nucleo-144, USART3 (PD8/PD9) is routed to the ST-LINK virtual COM port, so the host
//! reaches it at
//! ```text
//! $ screen /dev/tty.usbmodem* 115200
//! ```
//!
//! Only reception is used: 8 data bits, no parity, 1 stop bit, 16x oversampling. Reads never
//! block; an empty receiver reports `WouldBlock`.

use embedded_hal_nb::serial::{self, ErrorKind, ErrorType, Read};
use stm32f7xx_hal::pac;

use super::clock::current_pclk1;
use crate::drivers::SerialPort;

// CR1
const UE: u32 = 1 << 0;
const RE: u32 = 1 << 2;
const TE: u32 = 1 << 3;

// ISR / ICR
const PE: u32 = 1 << 0;
const FE: u32 = 1 << 1;
const NE: u32 = 1 << 2;
const ORE: u32 = 1 << 3;
const RXNE: u32 = 1 << 5;

/// Receive-side line fault. The offending byte, if any, is discarded.
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum SerialError {
    #[error("receiver overrun")]
    Overrun,
    #[error("framing error")]
    Framing,
    #[error("noise detected")]
    Noise,
    #[error("parity error")]
    Parity,
}

impl serial::Error for SerialError {
    fn kind(&self) -> ErrorKind {
        match self {
            SerialError::Overrun => ErrorKind::Overrun,
            SerialError::Framing => ErrorKind::FrameFormat,
            SerialError::Noise => ErrorKind::Noise,
            SerialError::Parity => ErrorKind::Parity,
        }
    }
}

pub struct Usart3 {
    usart: pac::USART3,
    baud: u32,
}

impl Usart3 {
    /// Wrap the peripheral. Nothing is written until [`SerialPort::open`].
    pub fn new(usart: pac::USART3, baud: u32) -> Self {
        Self { usart, baud }
    }
}

impl SerialPort for Usart3 {
    fn open(&mut self) {
        let pclk1 = current_pclk1().to_Hz();
        let brr = (pclk1 + self.baud / 2) / self.baud;

        // Line settings only take while UE is clear.
        self.usart.cr1.write(|w| unsafe { w.bits(0) });
        self.usart.cr2.write(|w| unsafe { w.bits(0) });
        self.usart.cr3.write(|w| unsafe { w.bits(0) });
        self.usart.brr.write(|w| unsafe { w.bits(brr & 0xFFFF) });
        self.usart
            .icr
            .write(|w| unsafe { w.bits(PE | FE | NE | ORE) });
        self.usart.cr1.write(|w| unsafe { w.bits(UE | RE | TE) });
    }
}

impl ErrorType for Usart3 {
    type Error = SerialError;
}

impl Read<u8> for Usart3 {
    fn read(&mut self) -> nb::Result<u8, SerialError> {
        let isr = self.usart.isr.read().bits();

        let err = if isr & ORE != 0 {
            Some((ORE, SerialError::Overrun))
        } else if isr & FE != 0 {
            Some((FE, SerialError::Framing))
        } else if isr & NE != 0 {
            Some((NE, SerialError::Noise))
        } else if isr & PE != 0 {
            Some((PE, SerialError::Parity))
        } else {
            None
        };

        if let Some((flag, e)) = err {
            self.usart.icr.write(|w| unsafe { w.bits(flag) });
            // Drop the byte that came with the fault.
            let _ = self.usart.rdr.read().bits();
            return Err(nb::Error::Other(e));
        }

        if isr & RXNE != 0 {
            Ok((self.usart.rdr.read().bits() & 0xFF) as u8)
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}
