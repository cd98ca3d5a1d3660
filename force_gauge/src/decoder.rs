/*!
Byte-at-a-time frame decoding state machine.

Every frame the gauge emits is 16 bytes:

```text
STX '4' '1' '5' <unit> <sign> <exponent> <8 digits, MSB first> CR
```

The decoder advances one state per accepted byte. A byte that does not fit
the current state is consumed, reported as a [`FramingError`] and the
decoder starts over in [`DecoderState::WaitStart`] with the next byte. There
is no backtracking: a rejected byte is never re-examined as a start marker.
*/

use crate::error::{Expected, FramingError};
use crate::protocol::{DEVICE_ID, DIGIT_COUNT, END_MARKER, FRAME_LEN, MAX_EXPONENT, START_MARKER};
use crate::reading::Reading;
use crate::unit::ForceUnit;
use tracing::{debug, warn};

/// Exact powers of ten for each decimal exponent the gauge can report
const DECIMAL_SCALE: [f64; MAX_EXPONENT as usize + 1] = [1.0, 10.0, 100.0, 1000.0];

/// Decoder position within the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// Hunting for the start marker
    WaitStart,
    ExpectId1,
    ExpectId2,
    ExpectId3,
    ExpectUnit,
    ExpectSign,
    ExpectExponent,
    /// Collecting magnitude digit `index` (0..8)
    AccumulateDigit { index: u8 },
    ExpectEnd,
}

impl DecoderState {
    /// Byte (or byte range) this state accepts
    pub fn expected(self) -> Expected {
        match self {
            Self::WaitStart => Expected::Byte(START_MARKER),
            Self::ExpectId1 => Expected::Byte(DEVICE_ID[0]),
            Self::ExpectId2 => Expected::Byte(DEVICE_ID[1]),
            Self::ExpectId3 => Expected::Byte(DEVICE_ID[2]),
            Self::ExpectUnit => Expected::Range(b'5', b'9'),
            Self::ExpectSign => Expected::Range(b'0', b'1'),
            Self::ExpectExponent => Expected::Range(b'0', b'0' + MAX_EXPONENT),
            Self::AccumulateDigit { .. } => Expected::Range(b'0', b'9'),
            Self::ExpectEnd => Expected::Byte(END_MARKER),
        }
    }

    /// Offset within the frame of the byte this state consumes
    pub fn offset(self) -> usize {
        match self {
            Self::WaitStart => 0,
            Self::ExpectId1 => 1,
            Self::ExpectId2 => 2,
            Self::ExpectId3 => 3,
            Self::ExpectUnit => 4,
            Self::ExpectSign => 5,
            Self::ExpectExponent => 6,
            Self::AccumulateDigit { index } => 7 + index as usize,
            Self::ExpectEnd => FRAME_LEN - 1,
        }
    }
}

/// Fields of the frame currently being decoded. Never leaves the decoder.
#[derive(Debug, Clone, Copy)]
struct Frame {
    unit: Option<ForceUnit>,
    sign: f64,
    exponent: u8,
    raw: u32,
}

impl Frame {
    const EMPTY: Frame = Frame {
        unit: None,
        sign: 1.0,
        exponent: 0,
        raw: 0,
    };

    /// `raw * 10^-exponent * sign`, divided by an exact power of ten so the
    /// result is the nearest double to the decimal the gauge displays
    fn value(&self) -> f64 {
        self.raw as f64 / DECIMAL_SCALE[self.exponent as usize] * self.sign
    }
}

/// Running decoder counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Bytes fed to the decoder
    pub bytes_consumed: u64,
    /// Frames that completed and produced a reading
    pub frames_completed: u64,
    /// Bytes rejected as framing violations
    pub framing_errors: u64,
}

/// Frame decoding state machine
pub struct FrameDecoder {
    state: DecoderState,
    frame: Frame,
    stats: DecoderStats,
}

impl FrameDecoder {
    /// Create a new decoder waiting for a start marker
    pub fn new() -> Self {
        Self {
            state: DecoderState::WaitStart,
            frame: Frame::EMPTY,
            stats: DecoderStats::default(),
        }
    }

    /// Get current state
    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Get statistics
    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Process one byte from the wire.
    ///
    /// Returns `Ok(Some(reading))` when this byte completed a frame,
    /// `Ok(None)` when it was accepted mid-frame, and `Err` when it was
    /// rejected. After an error the decoder is already back in
    /// [`DecoderState::WaitStart`].
    pub fn feed(&mut self, byte: u8) -> Result<Option<Reading>, FramingError> {
        self.stats.bytes_consumed += 1;

        let state = self.state;
        if !state.expected().accepts(byte) {
            return Err(self.resync(byte));
        }

        self.state = match state {
            DecoderState::WaitStart => DecoderState::ExpectId1,
            DecoderState::ExpectId1 => DecoderState::ExpectId2,
            DecoderState::ExpectId2 => DecoderState::ExpectId3,
            DecoderState::ExpectId3 => DecoderState::ExpectUnit,
            DecoderState::ExpectUnit => {
                let Some(unit) = ForceUnit::from_code(byte) else {
                    return Err(self.resync(byte));
                };
                self.frame.unit = Some(unit);
                DecoderState::ExpectSign
            }
            DecoderState::ExpectSign => {
                self.frame.sign = if byte == b'1' { -1.0 } else { 1.0 };
                DecoderState::ExpectExponent
            }
            DecoderState::ExpectExponent => {
                self.frame.exponent = byte - b'0';
                DecoderState::AccumulateDigit { index: 0 }
            }
            DecoderState::AccumulateDigit { index } => {
                self.frame.raw = self.frame.raw * 10 + u32::from(byte - b'0');
                if index + 1 >= DIGIT_COUNT {
                    DecoderState::ExpectEnd
                } else {
                    DecoderState::AccumulateDigit { index: index + 1 }
                }
            }
            DecoderState::ExpectEnd => {
                return Ok(self.complete());
            }
        };

        Ok(None)
    }

    /// Decode a buffer of captured bytes, returning every completed reading.
    ///
    /// Framing violations are logged and counted in [`Self::stats`].
    pub fn decode_bytes(&mut self, bytes: &[u8]) -> Vec<Reading> {
        bytes
            .iter()
            .filter_map(|&byte| self.feed(byte).ok().flatten())
            .collect()
    }

    /// Finish the current frame and reset the accumulators
    fn complete(&mut self) -> Option<Reading> {
        let frame = std::mem::replace(&mut self.frame, Frame::EMPTY);
        self.state = DecoderState::WaitStart;

        let unit = frame.unit?;
        let reading = Reading::new(frame.value(), unit);
        self.stats.frames_completed += 1;
        debug!("Frame complete: {} {}", reading.value, unit);
        Some(reading)
    }

    /// Drop the frame in progress after an unexpected byte
    fn resync(&mut self, byte: u8) -> FramingError {
        let error = FramingError {
            state: self.state,
            expected: self.state.expected(),
            actual: byte,
        };

        self.stats.framing_errors += 1;
        self.state = DecoderState::WaitStart;
        self.frame = Frame::EMPTY;

        // Line noise between frames is routine; mid-frame corruption is not
        if error.state == DecoderState::WaitStart {
            debug!("{}", error);
        } else {
            warn!("{} (frame offset {})", error, error.state.offset());
        }

        error
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the wire bytes of one frame
#[cfg(test)]
pub(crate) fn frame_bytes(unit: ForceUnit, negative: bool, exponent: u8, raw: u32) -> [u8; FRAME_LEN] {
    let mut frame = [0u8; FRAME_LEN];
    frame[0] = START_MARKER;
    frame[1..4].copy_from_slice(&DEVICE_ID);
    frame[4] = unit.code();
    frame[5] = if negative { b'1' } else { b'0' };
    frame[6] = b'0' + exponent;
    frame[7..15].copy_from_slice(format!("{:08}", raw).as_bytes());
    frame[FRAME_LEN - 1] = END_MARKER;
    frame
}
