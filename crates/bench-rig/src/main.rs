//! Screen test bench: operator command line.
//!
//! Drives the bench peripherals by hand and inspects framebuffer dumps
//! without writing a test script.
//!
//! # Usage
//!
//! ```text
//! bench-rig [--config <FILE>] <COMMAND>
//!
//! Commands:
//!   home                         Run the gantry homing cycle
//!   move <X> <Y> [--feed <F>]    Move the stage to bench coordinates
//!   slot <NAME>                  Park the stage over a reader
//!   listen <NAME> [--seconds N]  Park over a reader and print what it reads
//!   relay set --reader R --key K Wire up one reader and one key
//!   relay reset                  Disconnect everything
//!   decode <RAW> <OUT>           Turn a raw framebuffer dump into an image
//!   recognize <RAW> [--text T]   List the templates found in a dump
//! ```
//!
//! # Configuration
//!
//! Port names, stage size, timeouts, reader places and recognition settings
//! come from a TOML file (`bench.toml` by default, or `BENCH_CONFIG`).  A
//! missing file means "all defaults".  `RUST_LOG` overrides the file's
//! `log_level`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use bench_core::{decode_frame, leading_match, Frame, Recognizer, Region};
use bench_core::recognition::synthesize_variants;
use bench_navigator::application::navigate::SnapshotStore;
use bench_navigator::infrastructure::diagnostics::BmpSnapshotStore;
use bench_navigator::infrastructure::templates::load_template_dir;
use bench_rig::application::gantry::GantryController;
use bench_rig::application::reader::ReaderSlot;
use bench_rig::application::relay::RelaySelector;
use bench_rig::infrastructure::serial::PortLine;
use bench_rig::infrastructure::storage::config::{load_config, BenchConfig, DEFAULT_CONFIG_FILE};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Screen test bench operator tool.
#[derive(Debug, Parser)]
#[command(
    name = "bench-rig",
    about = "Gantry, reader, relay and framebuffer tools for the screen test bench",
    version
)]
struct Cli {
    /// Bench configuration file.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE, env = "BENCH_CONFIG")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the gantry homing cycle.
    Home,

    /// Move the stage to bench coordinates and wait until it is idle.
    Move {
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
        /// Feed rate; defaults to the configured operator feed.
        #[arg(long)]
        feed: Option<u32>,
    },

    /// Park the stage over a reader slot.
    Slot { name: String },

    /// Park over a reader slot, then print every credential it reads.
    Listen {
        name: String,
        #[arg(long, default_value_t = 10)]
        seconds: u64,
    },

    /// Relay board control.
    Relay {
        #[command(subcommand)]
        action: RelayAction,
    },

    /// Decode a raw framebuffer dump and write it as an image.
    ///
    /// The output format follows the file extension (`.bmp` or `.png`).
    Decode {
        raw: PathBuf,
        out: PathBuf,
        /// Upscale factor; defaults to the configured preview scale.
        #[arg(long)]
        scale: Option<u32>,
    },

    /// List the templates recognised in a raw framebuffer dump.
    ///
    /// Without `--text` the configured template directory is searched.  With
    /// it, only text templates synthesised for that label are.
    Recognize {
        raw: PathBuf,
        #[arg(long)]
        text: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum RelayAction {
    /// Connect one reader and one key.
    Set {
        #[arg(long)]
        reader: u8,
        #[arg(long)]
        key: u8,
    },
    /// Disconnect every reader and key.
    Reset,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.bench.log_level)),
        )
        .init();

    info!(config = %cli.config.display(), "bench-rig starting");
    run(cli.command, &config).await
}

async fn run(command: Command, config: &BenchConfig) -> anyhow::Result<()> {
    match command {
        Command::Home => {
            let mut gantry = open_gantry(config)?;
            gantry
                .home(ms(config.gantry.home_timeout_ms))
                .await
                .context("homing failed")?;
            println!("homed");
        }
        Command::Move { x, y, feed } => {
            let mut gantry = open_gantry(config)?;
            let feed = feed.unwrap_or(config.gantry.feed);
            gantry
                .swim_to(x, y, feed, ms(config.gantry.move_timeout_ms))
                .await
                .with_context(|| format!("move to ({x}, {y}) failed"))?;
            println!("idle at ({x}, {y})");
        }
        Command::Slot { name } => {
            let slot = open_slot(config, &name)?;
            slot.go_to_place().await.context("move to slot failed")?;
            println!("parked over {name}");
        }
        Command::Listen { name, seconds } => listen(config, &name, seconds).await?,
        Command::Relay { action } => {
            let line = PortLine::open(&config.relay.port, config.relay.baud)?;
            let mut relay = RelaySelector::connect(Box::new(line)).await?;
            if let RelayAction::Set { reader, key } = action {
                relay.select(reader, key).await?;
            }
            println!("reader {} key {}", relay.get_reader(), relay.get_key());
        }
        Command::Decode { raw, out, scale } => {
            let frame = read_frame(&raw)?;
            let scale = scale.unwrap_or(config.navigator.scale).max(1);
            frame
                .upscaled(scale)
                .save(&out)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("{}", out.display());
        }
        Command::Recognize { raw, text } => recognize(config, &raw, text.as_deref())?,
    }
    Ok(())
}

// ── Commands ──────────────────────────────────────────────────────────────────

async fn listen(config: &BenchConfig, name: &str, seconds: u64) -> anyhow::Result<()> {
    let mut slot = open_slot(config, name)?;
    slot.go_to_place().await.context("move to slot failed")?;
    slot.clear().await?;

    let deadline = tokio::time::Instant::now() + Duration::from_secs(seconds);
    while tokio::time::Instant::now() < deadline {
        if slot.update().await? {
            if let Some(line) = slot.get() {
                println!("{line}");
            }
        }
    }
    Ok(())
}

fn recognize(config: &BenchConfig, raw: &Path, text: Option<&str>) -> anyhow::Result<()> {
    let frame = read_frame(raw)?;
    let library = match text {
        Some(label) => {
            let renderer = config
                .navigator
                .fonts
                .renderer()
                .context("failed to load fonts")?;
            synthesize_variants(&renderer, label)
        }
        None => load_template_dir(&config.navigator.template_dir)?,
    };
    if library.is_empty() {
        bail!("no templates to search for");
    }

    if config.navigator.debug {
        let store = BmpSnapshotStore::new(&config.navigator.snapshot_dir)
            .with_scale(config.navigator.scale);
        let path = store.save("recognize", &frame)?;
        info!(path = %path.display(), "preview written");
    }

    let matches = Recognizer::new(config.navigator.threshold).recognize(&library, &frame, Region::FULL);
    for m in &matches {
        println!(
            "{}\t({}, {})-({}, {})\t{:.4}",
            m.name, m.top_left.0, m.top_left.1, m.bottom_right.0, m.bottom_right.1, m.score
        );
    }
    match leading_match(&matches) {
        Some(m) => println!("leading: {}", m.name),
        None => println!("nothing recognised"),
    }
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

fn open_gantry(config: &BenchConfig) -> anyhow::Result<GantryController> {
    let section = &config.gantry;
    let line = PortLine::open(&section.port, section.baud)
        .with_context(|| format!("gantry port {}", section.port))?;
    Ok(GantryController::new(Box::new(line), section.size_x, section.size_y))
}

fn open_slot(config: &BenchConfig, name: &str) -> anyhow::Result<ReaderSlot> {
    let Some(place) = config.reader.slot(name) else {
        let known: Vec<&str> = config.reader.slots.iter().map(|s| s.name.as_str()).collect();
        bail!("unknown reader slot '{name}' (configured: {})", known.join(", "));
    };
    let gantry = open_gantry(config)?.into_handle();
    let line = PortLine::open(&config.reader.port, config.reader.baud)
        .with_context(|| format!("reader port {}", config.reader.port))?;
    Ok(ReaderSlot::new(&place.name, place.x, place.y, Box::new(line), gantry)
        .with_read_timeout(ms(config.reader.read_timeout_ms))
        .with_move_timeout(ms(config.gantry.move_timeout_ms)))
}

fn read_frame(path: &Path) -> anyhow::Result<Frame> {
    let data = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    decode_frame(&data).with_context(|| format!("{} is not a framebuffer dump", path.display()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_to_bench_toml() {
        let cli = Cli::parse_from(["bench-rig", "home"]);

        assert_eq!(cli.config, PathBuf::from("bench.toml"));
        assert!(matches!(cli.command, Command::Home));
    }

    #[test]
    fn test_move_accepts_negative_coordinates() {
        // Act
        let cli = Cli::parse_from(["bench-rig", "move", "-925", "-890.5", "--feed", "15000"]);

        // Assert
        match cli.command {
            Command::Move { x, y, feed } => {
                assert_eq!((x, y), (-925.0, -890.5));
                assert_eq!(feed, Some(15000));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_relay_set_parses_both_indices() {
        let cli = Cli::parse_from(["bench-rig", "relay", "set", "--reader", "3", "--key", "5"]);

        assert!(matches!(
            cli.command,
            Command::Relay {
                action: RelayAction::Set { reader: 3, key: 5 }
            }
        ));
    }

    #[test]
    fn test_listen_defaults_to_ten_seconds() {
        let cli = Cli::parse_from(["bench-rig", "--config", "rig.toml", "listen", "nfc"]);

        assert_eq!(cli.config, PathBuf::from("rig.toml"));
        match cli.command {
            Command::Listen { name, seconds } => assert_eq!((name.as_str(), seconds), ("nfc", 10)),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_recognize_text_is_optional() {
        let cli = Cli::parse_from(["bench-rig", "recognize", "dump.raw", "--text", "Settings"]);

        match cli.command {
            Command::Recognize { raw, text } => {
                assert_eq!(raw, PathBuf::from("dump.raw"));
                assert_eq!(text.as_deref(), Some("Settings"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_unknown_slot_is_rejected_before_opening_ports() {
        let config = BenchConfig::default();

        let err = open_slot(&config, "mifare").err().unwrap();

        assert!(err.to_string().contains("unknown reader slot 'mifare'"));
    }

    #[test]
    fn test_short_dump_is_rejected() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("bench-rig-short-{}.raw", std::process::id()));
        std::fs::write(&path, [0u8; 16]).unwrap();

        let result = read_frame(&path);
        let _ = std::fs::remove_file(&path);

        assert!(result.is_err());
    }
}
