/*!
Background reader driving the frame decoder from a byte source.

The reader owns its byte source and decoder outright. It loops on
"read one byte, feed it, publish on completion" until its running flag is
cleared or the source fails. The loop never closes the source: a task run on
the calling thread hands it back through [`ReaderTask::into_source`], and a
spawned reader drops it (closing a serial port) when its thread exits. Clearing the flag cannot interrupt a read that
is already blocked, so sources should carry a read timeout: a timed-out
read counts as "no byte yet" and lets the loop notice the flag.
*/

use crate::decoder::{DecoderStats, FrameDecoder};
use crate::error::{GaugeError, Result};
use crate::store::SharedReadingStore;
use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{error, info};

/// Blocking source of wire bytes
pub trait ByteSource {
    /// Block until the next byte arrives.
    ///
    /// End of stream is reported as [`io::ErrorKind::UnexpectedEof`].
    fn read_next_byte(&mut self) -> io::Result<u8>;
}

impl<R: Read + ?Sized> ByteSource for R {
    fn read_next_byte(&mut self) -> io::Result<u8> {
        let mut byte = [0u8; 1];
        match self.read(&mut byte)? {
            0 => Err(io::Error::from(io::ErrorKind::UnexpectedEof)),
            _ => Ok(byte[0]),
        }
    }
}

/// Read outcomes that mean "nothing arrived yet" rather than failure
fn is_idle(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

/// Decoder loop bound to one byte source
pub struct ReaderTask<S> {
    source: S,
    decoder: FrameDecoder,
    store: Arc<SharedReadingStore>,
}

impl<S: ByteSource> ReaderTask<S> {
    /// Create a reader publishing into `store`
    pub fn new(source: S, store: Arc<SharedReadingStore>) -> Self {
        Self {
            source,
            decoder: FrameDecoder::new(),
            store,
        }
    }

    /// Run the read loop on the calling thread until `running` is cleared.
    ///
    /// Returns the decoder statistics on a clean stop. Any byte source
    /// failure ends the loop and is returned as is; it is never resynced.
    pub fn run(&mut self, running: &AtomicBool) -> Result<DecoderStats> {
        info!("Reader task started");

        while running.load(Ordering::SeqCst) {
            let byte = match self.source.read_next_byte() {
                Ok(byte) => byte,
                Err(e) if is_idle(&e) => continue,
                Err(e) => return Err(self.fail(e)),
            };

            // Framing violations are logged by the decoder, which has already resynced
            if let Ok(Some(reading)) = self.decoder.feed(byte) {
                self.store.publish(reading);
            }
        }

        let stats = self.decoder.stats();
        info!(
            "Reader task stopped: {} bytes, {} frames, {} framing errors",
            stats.bytes_consumed, stats.frames_completed, stats.framing_errors
        );
        Ok(stats)
    }

    /// Take the byte source back once the loop has returned
    pub fn into_source(self) -> S {
        self.source
    }

    fn fail(&self, err: io::Error) -> GaugeError {
        let stats = self.decoder.stats();
        let err = if err.kind() == io::ErrorKind::UnexpectedEof {
            GaugeError::SourceClosed
        } else {
            GaugeError::Io(err)
        };
        error!(
            "Reader task failed after {} frames ({} framing errors): {}",
            stats.frames_completed, stats.framing_errors, err
        );
        err
    }
}

impl<S: ByteSource + Send + 'static> ReaderTask<S> {
    /// Run the read loop on a dedicated thread.
    ///
    /// The thread owns the source and drops it after the loop returns.
    pub fn spawn(mut self) -> Result<ReaderHandle> {
        let running = Arc::new(AtomicBool::new(true));
        let running_reader = Arc::clone(&running);

        let join = thread::Builder::new()
            .name("force-gauge-reader".to_string())
            .spawn(move || self.run(&running_reader))?;

        Ok(ReaderHandle { running, join })
    }
}

/// Owner's handle on a spawned reader thread
pub struct ReaderHandle {
    running: Arc<AtomicBool>,
    join: JoinHandle<Result<DecoderStats>>,
}

impl ReaderHandle {
    /// Get a reference to the running flag for external control
    pub fn get_running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Ask the reader to stop after its current byte read returns
    pub fn request_stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Whether the reader thread has exited (stopped or failed)
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the reader thread and collect its outcome
    pub fn join(self) -> Result<DecoderStats> {
        self.join.join().map_err(|_| GaugeError::ReaderPanicked)?
    }

    /// Request a stop and wait for the reader thread
    pub fn stop(self) -> Result<DecoderStats> {
        self.request_stop();
        self.join()
    }
}
