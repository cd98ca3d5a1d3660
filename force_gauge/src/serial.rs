/*!
Serial link to the gauge.

The gauge talks RS-232 through a 3.5 mm jack wired to DB9 and a USB
adapter: 8 data bits, no parity, 1 stop bit.
*/

use crate::error::{GaugeError, Result};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::time::Duration;
use tracing::debug;

/// Open `port` for reading gauge frames.
///
/// `read_timeout` bounds every byte read so a reader can notice a stop
/// request while the gauge is silent.
pub fn open(port: &str, baud_rate: u32, read_timeout: Duration) -> Result<Box<dyn SerialPort>> {
    if port.is_empty() {
        return Err(GaugeError::config("serial port path is empty"));
    }
    if baud_rate == 0 {
        return Err(GaugeError::config("baud rate must be non-zero"));
    }
    if read_timeout.is_zero() {
        return Err(GaugeError::config("read timeout must be non-zero"));
    }

    let serial = serialport::new(port, baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(read_timeout)
        .open()?;

    debug!("Opened {} at {} baud (timeout {:?})", port, baud_rate, read_timeout);
    Ok(serial)
}
