/*!
Live monitor loop and offline replay of captured gauge output.
*/

use crate::config::{MonitorConfig, OutputFormat};
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use force_gauge::{DecoderStats, ForceGauge, FrameDecoder, Reading, Snapshot};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{info, warn};

/// Prints the latest gauge reading at a fixed interval until stopped
pub struct GaugeMonitor {
    config: MonitorConfig,
    running: Arc<AtomicBool>,
}

impl GaugeMonitor {
    /// Create a new monitor
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Get a reference to the running flag for external control
    pub fn get_running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Poll `gauge` until the running flag is cleared or the reader exits,
    /// then stop the reader and return its statistics
    pub fn run<W: Write>(&self, gauge: ForceGauge, out: &mut W) -> Result<DecoderStats> {
        let mut lines_printed = 0u64;

        while self.running.load(Ordering::SeqCst) {
            if gauge.is_finished() {
                warn!("Reader exited while monitoring");
                break;
            }

            let line = format_snapshot(&gauge.read_gauge(), Local::now(), &self.config);
            writeln!(out, "{}", line)?;
            out.flush()?;
            lines_printed += 1;

            thread::sleep(self.config.poll_interval());
        }

        let frames = gauge.frames_received();
        let stats = gauge.stop().context("Force gauge reader failed")?;

        info!("📊 Monitor final stats:");
        info!("   Lines printed: {}", lines_printed);
        info!("   Frames received: {}", frames);
        info!("   Bytes decoded: {}", stats.bytes_consumed);
        info!("   Framing errors: {}", stats.framing_errors);

        Ok(stats)
    }
}

/// Render one monitor line for `snapshot`
pub fn format_snapshot(snapshot: &Snapshot, now: DateTime<Local>, config: &MonitorConfig) -> String {
    let stale = snapshot.is_stale(config.stale_after());
    let time = now.format("%Y-%m-%d %H:%M:%S%.3f");

    match config.output {
        OutputFormat::Json => {
            let age = snapshot.has_data().then(|| snapshot.age_secs());
            let json = if config.newtons {
                serde_json::json!({
                    "time": now.to_rfc3339(),
                    "newtons": snapshot.to_force().newtons,
                    "age_seconds": age,
                    "stale": stale,
                })
            } else {
                serde_json::json!({
                    "time": now.to_rfc3339(),
                    "value": snapshot.value,
                    "unit": snapshot.unit,
                    "age_seconds": age,
                    "stale": stale,
                })
            };
            json.to_string()
        }
        OutputFormat::Text => {
            let Some(unit) = snapshot.unit else {
                return format!("{}  no reading yet", time);
            };
            let marker = if stale { "  [stale]" } else { "" };
            if config.newtons {
                format!(
                    "{}  {:>12.4} N  ({:.2}s){}",
                    time,
                    snapshot.to_force().newtons,
                    snapshot.age_secs(),
                    marker
                )
            } else {
                format!("{}  {:>12} {}  ({:.2}s){}", time, snapshot.value, unit, snapshot.age_secs(), marker)
            }
        }
    }
}

/// Render one decoded reading from a capture file
pub fn format_reading(index: usize, reading: &Reading, output: OutputFormat) -> String {
    match output {
        OutputFormat::Json => serde_json::json!({
            "frame": index,
            "value": reading.value,
            "unit": reading.unit,
        })
        .to_string(),
        OutputFormat::Text => format!("#{:<6} {:>12} {}", index, reading.value, reading.unit),
    }
}

/// Decode a raw byte capture of the gauge's serial output and print every
/// reading it contains
pub fn replay_file<W: Write>(path: &Path, output: OutputFormat, out: &mut W) -> Result<DecoderStats> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read capture file: {}", path.display()))?;
    info!("🔁 Replaying {} bytes from {}", bytes.len(), path.display());

    let mut decoder = FrameDecoder::new();
    for (index, reading) in decoder.decode_bytes(&bytes).iter().enumerate() {
        writeln!(out, "{}", format_reading(index, reading, output))?;
    }
    out.flush()?;

    let stats = decoder.stats();
    info!(
        "Replay complete: {} frames, {} framing errors",
        stats.frames_completed, stats.framing_errors
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use force_gauge::ForceUnit;
    use std::io::Cursor;
    use std::time::{Duration, Instant};

    const NEWTON_FRAME: &[u8; 16] = b"\x0241590200004567\r";

    fn config(output: OutputFormat) -> MonitorConfig {
        MonitorConfig {
            output,
            ..MonitorConfig::default()
        }
    }

    #[test]
    fn test_text_line_for_absent_reading() {
        let line = format_snapshot(&Snapshot::ABSENT, Local::now(), &config(OutputFormat::Text));
        assert!(line.ends_with("no reading yet"));
    }

    #[test]
    fn test_text_line_for_fresh_reading() {
        let t0 = Instant::now();
        let snapshot = Snapshot::of(&Reading::at(-1.23, ForceUnit::Gram, t0), t0 + Duration::from_millis(20));
        let line = format_snapshot(&snapshot, Local::now(), &config(OutputFormat::Text));

        assert!(line.contains("-1.23 g"));
        assert!(line.contains("(0.02s)"));
        assert!(!line.contains("[stale]"));
    }

    #[test]
    fn test_stale_reading_is_flagged() {
        let t0 = Instant::now();
        let snapshot = Snapshot::of(&Reading::at(2.0, ForceUnit::Newton, t0), t0 + Duration::from_secs(5));
        let line = format_snapshot(&snapshot, Local::now(), &config(OutputFormat::Text));
        assert!(line.ends_with("[stale]"));
    }

    #[test]
    fn test_json_line() {
        let t0 = Instant::now();
        let snapshot = Snapshot::of(&Reading::at(4.5, ForceUnit::Ounce, t0), t0);
        let line = format_snapshot(&snapshot, Local::now(), &config(OutputFormat::Json));

        let json: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(json["value"], 4.5);
        assert_eq!(json["unit"], "oz");
        assert_eq!(json["age_seconds"], 0.0);
        assert_eq!(json["stale"], false);
    }

    #[test]
    fn test_json_line_in_newtons() {
        let t0 = Instant::now();
        let snapshot = Snapshot::of(&Reading::at(1000.0, ForceUnit::Gram, t0), t0);
        let mut cfg = config(OutputFormat::Json);
        cfg.newtons = true;

        let json: serde_json::Value = serde_json::from_str(&format_snapshot(&snapshot, Local::now(), &cfg)).unwrap();
        let newtons = json["newtons"].as_f64().unwrap();
        assert!((newtons - 9.81).abs() < 1e-9);
    }

    #[test]
    fn test_json_line_without_data() {
        let line = format_snapshot(&Snapshot::ABSENT, Local::now(), &config(OutputFormat::Json));
        let json: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert!(json["unit"].is_null());
        assert!(json["age_seconds"].is_null());
        assert_eq!(json["stale"], true);
    }

    #[test]
    fn test_replay_file() {
        let mut capture = b"\x00\xFF".to_vec();
        capture.extend_from_slice(NEWTON_FRAME);
        // Truncated frame: a bad unit code aborts it
        capture.extend_from_slice(b"\x02415X");
        capture.extend_from_slice(NEWTON_FRAME);

        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), &capture).unwrap();

        let mut out = Vec::new();
        let stats = replay_file(file.path(), OutputFormat::Json, &mut out).unwrap();
        assert_eq!(stats.frames_completed, 2);
        assert_eq!(stats.framing_errors, 3);

        let lines: Vec<serde_json::Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["frame"], 1);
        assert_eq!(lines[1]["value"], 45.67);
        assert_eq!(lines[1]["unit"], "Newton");
    }

    #[test]
    fn test_monitor_stops_when_reader_exits() {
        let gauge = ForceGauge::start(Cursor::new(NEWTON_FRAME.to_vec())).unwrap();
        let mut cfg = config(OutputFormat::Text);
        cfg.poll_interval_ms = 1;

        let monitor = GaugeMonitor::new(cfg);
        let mut out = Vec::new();
        let result = monitor.run(gauge, &mut out);

        // A cursor runs dry, which the reader reports as a closed source
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Force gauge reader failed"));
    }

    #[test]
    fn test_monitor_honours_running_flag() {
        let gauge = ForceGauge::start(Cursor::new(NEWTON_FRAME.to_vec())).unwrap();
        let monitor = GaugeMonitor::new(config(OutputFormat::Text));
        monitor.get_running_flag().store(false, Ordering::SeqCst);

        let mut out = Vec::new();
        let _ = monitor.run(gauge, &mut out);
        assert!(out.is_empty());
    }
}
