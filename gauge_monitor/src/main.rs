/*!
# Gauge Monitor Application

Command-line companion for RS-Pro 111-3689 class force gauges connected
through an RS-232 to USB adapter.

## Features

- Live readings from the serial gauge at a configurable interval
- Text or JSON-lines output, in the gauge's own unit or in newtons
- Offline replay of raw serial captures
- TOML configuration file with command-line overrides

## Usage

### Live monitoring
```bash
gauge_monitor monitor --port /dev/ttyUSB0 --baud 9600
```

### JSON output in newtons
```bash
gauge_monitor monitor --json --newtons
```

### Replay a capture
```bash
gauge_monitor replay capture.bin
```
*/

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use force_gauge::ForceGauge;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use tracing::Level;

mod config;
mod monitor;

use config::{AppConfig, OutputFormat};
use monitor::GaugeMonitor;

#[derive(Parser)]
#[command(name = "gauge_monitor")]
#[command(about = "Live force gauge monitor and serial capture replay")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, default_value = "gauge_monitor.toml")]
    config: PathBuf,

    /// Enable debug logging (every decoded frame)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print live readings until Ctrl+C
    Monitor {
        /// Serial device (overrides config)
        #[arg(short, long)]
        port: Option<String>,

        /// Baud rate (overrides config)
        #[arg(short, long)]
        baud: Option<u32>,

        /// Interval between readings in milliseconds (overrides config)
        #[arg(short, long)]
        interval_ms: Option<u64>,

        /// Emit one JSON object per line
        #[arg(long)]
        json: bool,

        /// Print force converted to newtons
        #[arg(long)]
        newtons: bool,
    },

    /// Decode a raw capture of the gauge's serial output
    Replay {
        /// Capture file
        file: PathBuf,

        /// Emit one JSON object per line
        #[arg(long)]
        json: bool,
    },

    /// Generate configuration file
    Config {
        /// Output path for configuration file
        #[arg(short, long, default_value = "gauge_monitor.toml")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Log to stderr to keep stdout clean for readings
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    match cli.command {
        Some(Commands::Monitor { port, baud, interval_ms, json, newtons }) => {
            let mut config = AppConfig::load_or_default(&cli.config)?;
            if let Some(port) = port {
                config.serial.port = port;
            }
            if let Some(baud) = baud {
                config.serial.baud_rate = baud;
            }
            if let Some(interval_ms) = interval_ms {
                config.monitor.poll_interval_ms = interval_ms;
            }
            if json {
                config.monitor.output = OutputFormat::Json;
            }
            config.monitor.newtons |= newtons;

            run_monitor(config)
        }

        Some(Commands::Replay { file, json }) => {
            let output = if json { OutputFormat::Json } else { OutputFormat::Text };
            let stats = monitor::replay_file(&file, output, &mut std::io::stdout().lock())?;
            eprintln!(
                "✅ {} frames decoded, {} framing errors",
                stats.frames_completed, stats.framing_errors
            );
            Ok(())
        }

        Some(Commands::Config { output }) => generate_config_file(output),

        None => {
            let config = AppConfig::load_or_default(&cli.config)?;
            run_monitor(config)
        }
    }
}

/// Open the gauge and print readings until Ctrl+C
fn run_monitor(config: AppConfig) -> Result<()> {
    eprintln!("🚀 Starting force gauge monitor");
    eprintln!("🔌 Port: {} @ {} baud", config.serial.port, config.serial.baud_rate);

    let gauge = ForceGauge::open_serial(
        &config.serial.port,
        config.serial.baud_rate,
        config.serial.read_timeout(),
    )
    .with_context(|| format!("Failed to open force gauge on {}", config.serial.port))?;

    let monitor = GaugeMonitor::new(config.monitor);

    // Set up Ctrl+C handler
    let running = monitor.get_running_flag();
    ctrlc::set_handler(move || {
        eprintln!("\n🛑 Received Ctrl+C, shutting down gracefully...");
        running.store(false, Ordering::SeqCst);
    })?;

    let stats = monitor.run(gauge, &mut std::io::stdout().lock())?;

    eprintln!(
        "✅ Monitor stopped after {} frames ({} framing errors)",
        stats.frames_completed, stats.framing_errors
    );
    Ok(())
}

/// Generate a default configuration file
fn generate_config_file(output_path: PathBuf) -> Result<()> {
    let config = AppConfig::new();
    config.save_to_file(&output_path)?;

    println!("✅ Generated configuration file: {}", output_path.display());
    println!("📝 Edit the file to customize settings, then run:");
    println!("   gauge_monitor --config {}", output_path.display());

    Ok(())
}
