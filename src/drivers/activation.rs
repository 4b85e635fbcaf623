// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Serial activation-request detector.
//!
//! The host announces itself with a length-prefixed packet: one length byte followed by that many
//! payload bytes. A two-byte payload starting with [`CONNECT`] is an activation request; any other
//! well-formed packet is ignored. A partial packet is dropped if the line goes quiet for longer
//! than [`FRAME_TIMEOUT_MS`].

use embedded_hal_nb::serial::{Error as _, Read};
use log::{info, warn};

use super::Monotonic;
use crate::supervisor::CommInterface;

/// Command byte that opens a bootloader session.
pub const CONNECT: u8 = 0xFF;
/// Longest payload the detector buffers.
pub const MAX_PAYLOAD: usize = 64;
/// Inter-byte gap that abandons a partially received packet.
pub const FRAME_TIMEOUT_MS: u32 = 100;
/// Bytes consumed per poll, which bounds the time one `check_activation` call can take.
pub const MAX_BYTES_PER_POLL: usize = 16;

enum State {
    WaitLength,
    Payload { len: u8, received: u8 },
}

pub struct ActivationParser {
    state: State,
    payload: [u8; MAX_PAYLOAD],
    last_byte_ms: u32,
}

impl ActivationParser {
    pub const fn new() -> Self {
        Self {
            state: State::WaitLength,
            payload: [0; MAX_PAYLOAD],
            last_byte_ms: 0,
        }
    }

    pub fn reset(&mut self) {
        self.state = State::WaitLength;
    }

    /// Process a single incoming byte received at `now_ms`. Returns `true` when it completes an
    /// activation request.
    pub fn push(&mut self, byte: u8, now_ms: u32) -> bool {
        if matches!(self.state, State::Payload { .. })
            && now_ms.wrapping_sub(self.last_byte_ms) > FRAME_TIMEOUT_MS
        {
            self.state = State::WaitLength;
        }
        self.last_byte_ms = now_ms;

        match self.state {
            State::WaitLength => {
                if byte > 0 && usize::from(byte) <= MAX_PAYLOAD {
                    self.state = State::Payload {
                        len: byte,
                        received: 0,
                    };
                }
            }
            State::Payload { len, received } => {
                self.payload[usize::from(received)] = byte;
                let received = received + 1;

                if received < len {
                    self.state = State::Payload { len, received };
                } else {
                    self.state = State::WaitLength;
                    return len == 2 && self.payload[0] == CONNECT;
                }
            }
        }
        false
    }
}

impl Default for ActivationParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Serial receiver that is started only once the bus clocks are final.
pub trait SerialPort: Read<u8> {
    /// Program the line settings against the current bus clock and enable reception.
    fn open(&mut self);
}

/// How control leaves the application once activation is accepted.
pub trait BootloaderEntry {
    fn enter(&mut self) -> !;
}

/// [`CommInterface`] over a non-blocking serial receiver.
pub struct SerialActivation<RX, CLK, B> {
    rx: RX,
    clock: CLK,
    entry: B,
    parser: ActivationParser,
}

impl<RX, CLK, B> SerialActivation<RX, CLK, B>
where
    RX: SerialPort,
    CLK: Monotonic,
    B: BootloaderEntry,
{
    pub fn new(rx: RX, clock: CLK, entry: B) -> Self {
        Self {
            rx,
            clock,
            entry,
            parser: ActivationParser::new(),
        }
    }
}

impl<RX, CLK, B> CommInterface for SerialActivation<RX, CLK, B>
where
    RX: SerialPort,
    CLK: Monotonic,
    B: BootloaderEntry,
{
    fn init(&mut self) {
        self.rx.open();
        // Discard whatever arrived while the link was being brought up.
        for _ in 0..MAX_BYTES_PER_POLL {
            if let Err(nb::Error::WouldBlock) = self.rx.read() {
                break;
            }
        }
        self.parser.reset();
    }

    fn check_activation(&mut self) -> bool {
        for _ in 0..MAX_BYTES_PER_POLL {
            match self.rx.read() {
                Ok(byte) => {
                    if self.parser.push(byte, self.clock.millis()) {
                        info!("activation request received");
                        return true;
                    }
                }
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(e)) => {
                    warn!("serial rx error: {:?}", e.kind());
                    self.parser.reset();
                }
            }
        }
        false
    }

    fn activate(&mut self) -> ! {
        self.entry.enter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_nb::serial::{ErrorKind, ErrorType};
    use std::collections::VecDeque;

    #[derive(Debug)]
    struct LineError;

    impl embedded_hal_nb::serial::Error for LineError {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Overrun
        }
    }

    #[derive(Default)]
    struct FakeRx {
        queue: VecDeque<Result<u8, LineError>>,
        reads: usize,
        opened: bool,
    }

    impl FakeRx {
        fn feed(&mut self, bytes: &[u8]) {
            self.queue.extend(bytes.iter().map(|&b| Ok(b)));
        }
    }

    impl ErrorType for FakeRx {
        type Error = LineError;
    }

    impl Read<u8> for FakeRx {
        fn read(&mut self) -> nb::Result<u8, LineError> {
            self.reads += 1;
            match self.queue.pop_front() {
                Some(Ok(b)) => Ok(b),
                Some(Err(e)) => Err(nb::Error::Other(e)),
                None => Err(nb::Error::WouldBlock),
            }
        }
    }

    impl SerialPort for FakeRx {
        fn open(&mut self) {
            self.opened = true;
        }
    }

    struct Clock(u32);

    impl Monotonic for Clock {
        fn millis(&self) -> u32 {
            self.0
        }
    }

    struct NoEntry;

    impl BootloaderEntry for NoEntry {
        fn enter(&mut self) -> ! {
            panic!("bootloader entry is not exercised here");
        }
    }

    #[test]
    fn connect_frame_is_recognized() {
        let mut parser = ActivationParser::new();
        assert!(!parser.push(0x02, 0));
        assert!(!parser.push(CONNECT, 1));
        assert!(parser.push(0x00, 2));
    }

    #[test]
    fn other_frames_are_ignored() {
        let mut parser = ActivationParser::new();
        for (t, b) in [0x02, 0xFE, 0x00].into_iter().enumerate() {
            assert!(!parser.push(b, t as u32));
        }
        // Right command, wrong length.
        for (t, b) in [0x03, CONNECT, 0x00, 0x00].into_iter().enumerate() {
            assert!(!parser.push(b, t as u32));
        }
        // Zero and oversized lengths are skipped as noise.
        assert!(!parser.push(0x00, 10));
        assert!(!parser.push(0xF0, 11));
        assert!(!parser.push(0x02, 12));
        assert!(!parser.push(CONNECT, 13));
        assert!(parser.push(0x00, 14));
    }

    #[test]
    fn stale_partial_frame_is_dropped() {
        let mut parser = ActivationParser::new();
        assert!(!parser.push(0x02, 0));
        assert!(!parser.push(CONNECT, 10));
        // Too late: this byte starts a new frame instead of completing the old one.
        assert!(!parser.push(0x02, 10 + FRAME_TIMEOUT_MS + 1));
        assert!(!parser.push(CONNECT, 200));
        assert!(parser.push(0x00, 201));
    }

    #[test]
    fn poll_reads_without_blocking() {
        let mut link = SerialActivation::new(FakeRx::default(), Clock(0), NoEntry);
        link.init();
        assert!(link.rx.opened);
        assert!(!link.check_activation());

        link.rx.feed(&[0x02, CONNECT]);
        assert!(!link.check_activation());
        link.rx.feed(&[0x00]);
        assert!(link.check_activation());
    }

    #[test]
    fn poll_is_bounded() {
        let mut link = SerialActivation::new(FakeRx::default(), Clock(0), NoEntry);
        link.rx.feed(&[0x01; 100]);
        let before = link.rx.reads;
        assert!(!link.check_activation());
        assert_eq!(link.rx.reads - before, MAX_BYTES_PER_POLL);
    }

    #[test]
    fn init_discards_stale_bytes() {
        let mut link = SerialActivation::new(FakeRx::default(), Clock(0), NoEntry);
        link.rx.feed(&[0x02, CONNECT]);
        link.init();
        link.rx.feed(&[0x00]);
        assert!(!link.check_activation());
    }

    #[test]
    fn line_error_restarts_framing() {
        let mut link = SerialActivation::new(FakeRx::default(), Clock(0), NoEntry);
        link.rx.feed(&[0x02, CONNECT]);
        link.rx.queue.push_back(Err(LineError));
        link.rx.feed(&[0x00]);
        assert!(!link.check_activation());

        link.rx.feed(&[0x02, CONNECT, 0x00]);
        assert!(link.check_activation());
    }
}
