/*!
Query API over a running reader.

```no_run
use force_gauge::ForceGauge;
use std::io::Cursor;

let gauge = ForceGauge::start(Cursor::new(Vec::<u8>::new()))?;
let snapshot = gauge.read_gauge();
println!("{} {:?} ({:.1}s old)", snapshot.value, snapshot.unit, snapshot.age_secs());
let force = gauge.read_force();
println!("{:.3} N", force.newtons);
gauge.stop().ok();
# Ok::<(), force_gauge::GaugeError>(())
```
*/

use crate::decoder::DecoderStats;
use crate::error::Result;
use crate::reader::{ByteSource, ReaderHandle, ReaderTask};
use crate::reading::{ForceReading, Snapshot};
use crate::store::SharedReadingStore;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

/// A force gauge being read in the background
pub struct ForceGauge {
    store: Arc<SharedReadingStore>,
    reader: ReaderHandle,
}

impl ForceGauge {
    /// Start reading frames from `source` on a background thread
    pub fn start<S: ByteSource + Send + 'static>(source: S) -> Result<Self> {
        let store = Arc::new(SharedReadingStore::new());
        let reader = ReaderTask::new(source, Arc::clone(&store)).spawn()?;
        Ok(Self { store, reader })
    }

    /// Open the gauge's serial port and start reading it
    #[cfg(feature = "serial")]
    pub fn open_serial(port: &str, baud_rate: u32, read_timeout: std::time::Duration) -> Result<Self> {
        let source = crate::serial::open(port, baud_rate, read_timeout)?;
        info!("📡 Reading force gauge on {} at {} baud", port, baud_rate);
        Self::start(source)
    }

    /// Latest value, unit (as set on the gauge) and time since it was decoded.
    ///
    /// Never blocks on the reader. Before the first frame arrives this is
    /// [`Snapshot::ABSENT`].
    pub fn read_gauge(&self) -> Snapshot {
        self.store.snapshot()
    }

    /// Latest reading converted to newtons, with its age
    pub fn read_force(&self) -> ForceReading {
        self.read_gauge().to_force()
    }

    /// Number of frames decoded since the gauge was started
    pub fn frames_received(&self) -> u64 {
        self.store.published_count()
    }

    /// Whether the reader thread has exited; [`Self::stop`] reports why
    pub fn is_finished(&self) -> bool {
        self.reader.is_finished()
    }

    /// Get a reference to the running flag for external control
    pub fn get_running_flag(&self) -> Arc<AtomicBool> {
        self.reader.get_running_flag()
    }

    /// Stop the reader and wait for it to exit
    pub fn stop(self) -> Result<DecoderStats> {
        info!("Stopping force gauge reader");
        self.reader.stop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::frame_bytes;
    use crate::error::GaugeError;
    use crate::unit::ForceUnit;
    use std::io::Cursor;
    use std::thread;
    use std::time::Duration;

    fn wait_for_exit(gauge: &ForceGauge) {
        while !gauge.is_finished() {
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_read_gauge_before_first_frame() {
        let gauge = ForceGauge::start(Cursor::new(vec![0x02, b'4', b'1'])).unwrap();
        wait_for_exit(&gauge);

        let snapshot = gauge.read_gauge();
        assert_eq!(snapshot, Snapshot::ABSENT);
        let force = gauge.read_force();
        assert_eq!(force.newtons, 0.0);
        assert_eq!(force.age, Duration::MAX);
        assert!(matches!(gauge.stop(), Err(GaugeError::SourceClosed)));
    }

    #[test]
    fn test_read_gauge_and_force_grams() {
        let gauge = ForceGauge::start(Cursor::new(frame_bytes(ForceUnit::Gram, false, 2, 123).to_vec())).unwrap();
        wait_for_exit(&gauge);

        let snapshot = gauge.read_gauge();
        assert_eq!(snapshot.value, 1.23);
        assert_eq!(snapshot.unit, Some(ForceUnit::Gram));
        assert!(snapshot.age < Duration::from_secs(60));

        let force = gauge.read_force();
        assert!((force.newtons - 1.23 * 9.81e-3).abs() < 1e-12);
        assert_eq!(gauge.frames_received(), 1);
    }

    #[test]
    fn test_read_force_kilograms_uses_value_dependent_factor() {
        let gauge = ForceGauge::start(Cursor::new(frame_bytes(ForceUnit::Kilogram, false, 1, 30).to_vec())).unwrap();
        wait_for_exit(&gauge);

        let force = gauge.read_force();
        assert!((force.newtons - 3.0 * 3.0 * 9.81).abs() < 1e-9);
    }

    #[test]
    fn test_read_force_pounds_passes_through() {
        let gauge = ForceGauge::start(Cursor::new(frame_bytes(ForceUnit::Pound, true, 0, 12).to_vec())).unwrap();
        wait_for_exit(&gauge);

        assert_eq!(gauge.read_force().newtons, -12.0);
    }

    #[test]
    fn test_concurrent_callers() {
        let mut bytes = Vec::new();
        for raw in 0..200 {
            bytes.extend_from_slice(&frame_bytes(ForceUnit::Newton, false, 0, raw));
        }
        let gauge = Arc::new(ForceGauge::start(Cursor::new(bytes)).unwrap());

        let callers: Vec<_> = (0..4)
            .map(|_| {
                let gauge = Arc::clone(&gauge);
                thread::spawn(move || {
                    while !gauge.is_finished() {
                        let snapshot = gauge.read_gauge();
                        assert!(snapshot.value >= 0.0 && snapshot.value < 200.0);
                        let force = gauge.read_force();
                        assert!(force.newtons >= 0.0);
                    }
                })
            })
            .collect();

        for caller in callers {
            caller.join().unwrap();
        }
        assert_eq!(gauge.read_gauge().value, 199.0);
        assert_eq!(gauge.frames_received(), 200);
    }
}
