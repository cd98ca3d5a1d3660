/*!
# Force Gauge Reader

Decodes the continuous serial stream of an RS-Pro 111-3689 class digital
force gauge into thread-safe force readings.

## Core Types

- [`FrameDecoder`] - byte-at-a-time frame state machine
- [`SharedReadingStore`] - lock-protected holder of the latest [`Reading`]
- [`ReaderTask`] - background loop driving the decoder from a [`ByteSource`]
- [`ForceGauge`] - query API (`read_gauge` / `read_force`)

## Modules

- [`decoder`] - frame decoding and resynchronization
- [`store`] - atomic publish / snapshot of readings
- [`reader`] - byte source abstraction and reader thread
- [`gauge`] - query API and lifecycle
- [`unit`] - force units and newton conversion
- [`error`] - error types
*/

pub mod decoder;
pub mod error;
pub mod gauge;
pub mod reader;
pub mod reading;
pub mod store;
pub mod unit;

#[cfg(feature = "serial")]
pub mod serial;

// Re-export commonly used types
pub use decoder::{DecoderState, DecoderStats, FrameDecoder};
pub use error::{Expected, FramingError, GaugeError, Result};
pub use gauge::ForceGauge;
pub use reader::{ByteSource, ReaderHandle, ReaderTask};
pub use reading::{ForceReading, Reading, Snapshot};
pub use store::SharedReadingStore;
pub use unit::ForceUnit;

/// Version information for the force gauge library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Protocol constants
pub mod protocol {
    /// Length of one frame in bytes
    pub const FRAME_LEN: usize = 16;

    /// Start of frame marker (STX)
    pub const START_MARKER: u8 = 0x02;

    /// End of frame marker (CR)
    pub const END_MARKER: u8 = 0x0D;

    /// Fixed device id digits following the start marker
    pub const DEVICE_ID: [u8; 3] = *b"415";

    /// Number of magnitude digits per frame
    pub const DIGIT_COUNT: u8 = 8;

    /// Largest decimal exponent the gauge reports
    pub const MAX_EXPONENT: u8 = 3;

    /// Standard gravity used for unit conversion, in m/s^2
    pub const STANDARD_GRAVITY: f64 = 9.810;

    /// Default serial device of the USB/RS-232 adapter
    pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";

    /// Default baud rate of the gauge
    pub const DEFAULT_BAUD_RATE: u32 = 9600;
}
