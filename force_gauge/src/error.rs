/*!
Error types for the force gauge components.

Two classes of failure exist. A [`FramingError`] describes one unexpected
byte on the wire; the decoder recovers from it by resynchronizing and it is
never surfaced to query callers. A [`GaugeError`] is fatal to the reader
task and is handed back to whoever owns it.
*/

use crate::decoder::DecoderState;
use std::fmt;
use thiserror::Error;

/// Common result type used throughout the force gauge library
pub type Result<T> = std::result::Result<T, GaugeError>;

/// What the decoder would have accepted at the position where a framing
/// violation occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    /// One exact byte (start marker, device id digit, end marker)
    Byte(u8),
    /// Any byte in the inclusive range (unit code, sign, exponent, digits)
    Range(u8, u8),
}

impl Expected {
    /// Check whether `byte` satisfies this expectation
    pub fn accepts(self, byte: u8) -> bool {
        match self {
            Expected::Byte(b) => byte == b,
            Expected::Range(lo, hi) => (lo..=hi).contains(&byte),
        }
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Byte(b) => write!(f, "{}", describe_byte(*b)),
            Expected::Range(lo, hi) => {
                write!(f, "byte in {}..={}", describe_byte(*lo), describe_byte(*hi))
            }
        }
    }
}

/// Render a wire byte for diagnostics: printable ASCII is quoted, control
/// bytes are shown in hex
pub fn describe_byte(byte: u8) -> String {
    if byte.is_ascii_graphic() || byte == b' ' {
        format!("'{}' (0x{:02X})", byte as char, byte)
    } else {
        format!("0x{:02X}", byte)
    }
}

/// A single unexpected byte in the frame stream.
///
/// The byte has already been consumed and the decoder is back in
/// [`DecoderState::WaitStart`] by the time this value is returned.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("framing violation in {state:?}: expected {expected} but received {actual:#04x}")]
pub struct FramingError {
    /// State the decoder was in when the byte arrived
    pub state: DecoderState,
    /// What that state would have accepted
    pub expected: Expected,
    /// The offending byte
    pub actual: u8,
}

/// Fatal errors surfaced to the owner of a reader task
#[derive(Error, Debug)]
pub enum GaugeError {
    /// The byte source failed (device unplugged, port closed, ...)
    #[error("I/O error on byte source: {0}")]
    Io(#[from] std::io::Error),

    /// The byte source reached end of stream
    #[error("Byte source closed")]
    SourceClosed,

    /// The reader thread panicked instead of returning
    #[error("Reader thread panicked")]
    ReaderPanicked,

    /// The serial port could not be opened
    #[cfg(feature = "serial")]
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GaugeError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framing_error_message_names_expected_and_actual() {
        let err = FramingError {
            state: DecoderState::ExpectId1,
            expected: Expected::Byte(b'4'),
            actual: 0x02,
        };
        let msg = err.to_string();
        assert!(msg.contains("ExpectId1"));
        assert!(msg.contains("'4' (0x34)"));
        assert!(msg.contains("0x02"));
    }

    #[test]
    fn test_expected_range_accepts() {
        let unit = Expected::Range(b'5', b'9');
        assert!(unit.accepts(b'5'));
        assert!(unit.accepts(b'9'));
        assert!(!unit.accepts(b'4'));
        assert!(!unit.accepts(0x0D));
    }
}
