use log::trace;

use crate::constants::{DATA_REPORT_ID, HEAD, MEASUREMENT_FRAME_LEN, TAIL};
use crate::frame::MeasurementFrame;

/// Cursor, collecting flag and buffer of a frame in progress.
///
/// Always replaced as a whole so a half-reset state is never observable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserState {
    cursor: usize,
    collecting: bool,
    buffer: [u8; MEASUREMENT_FRAME_LEN],
}

impl ParserState {
    /// Index of the next byte to be stored.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether a data report header and command have been seen.
    pub fn is_collecting(&self) -> bool {
        self.collecting
    }

    fn push(&mut self, byte: u8) {
        self.buffer[self.cursor] = byte;
        self.cursor += 1;
    }
}

/// Byte-at-a-time state machine extracting data reports from the sensor stream.
///
/// State persists across calls, so frames split over several transport reads
/// are reassembled. Anything that is not a complete, checksum-valid
/// `AA C0 .. AB` frame is discarded without a signal.
#[derive(Debug, Default)]
pub struct ProtocolFramer {
    state: ParserState,
}

impl ProtocolFramer {
    /// Creates a framer waiting for a header byte.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current parser state.
    pub fn state(&self) -> &ParserState {
        &self.state
    }

    /// Drops any partial frame.
    pub fn reset(&mut self) {
        self.state = ParserState::default();
    }

    /// Feeds one byte and returns a frame when `byte` completes a valid one.
    pub fn parse(&mut self, byte: u8) -> Option<MeasurementFrame> {
        match self.state.cursor {
            0 => {
                if byte == HEAD {
                    self.state.push(byte);
                }
                None
            }
            1 => {
                if byte == DATA_REPORT_ID {
                    self.state.push(byte);
                    self.state.collecting = true;
                } else {
                    // Replies and unknown commands are not decoded here.
                    trace!("Dropping frame with command byte {:02X}", byte);
                    self.reset();
                    if byte == HEAD {
                        self.state.push(byte);
                    }
                }
                None
            }
            2..=8 if self.state.collecting => {
                self.state.push(byte);
                None
            }
            9 if self.state.collecting => self.complete(byte),
            _ => {
                self.reset();
                None
            }
        }
    }

    /// Feeds a slice, returning the frames completed along the way.
    pub fn parse_all(&mut self, bytes: &[u8]) -> Vec<MeasurementFrame> {
        bytes.iter().filter_map(|&b| self.parse(b)).collect()
    }

    fn complete(&mut self, tail: u8) -> Option<MeasurementFrame> {
        let mut buffer = self.state.buffer;
        buffer[9] = tail;
        self.reset();

        if tail != TAIL {
            trace!("Dropping frame with tail {:02X}: {:02X?}", tail, buffer);
            return None;
        }
        let frame = MeasurementFrame::from_bytes(buffer);
        if frame.is_none() {
            trace!("Dropping frame with bad checksum: {:02X?}", buffer);
        }
        frame
    }
}
