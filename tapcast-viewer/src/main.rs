//! Tapcast viewer — entry point.
//!
//! ```text
//! tapcast                      Mirror with defaults
//! tapcast --config <path>      Use custom config TOML
//! tapcast --adb <path>         Explicit adb binary
//! tapcast --gen-config         Dump default config and exit
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tapcast_core::{AdbChannel, Device, ScreenGeometry, TapcastError};

use tapcast_viewer::config::ViewerConfig;
use tapcast_viewer::session::SessionController;
use tapcast_viewer::surface::MinifbSurface;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "tapcast", about = "Mirror a device screen into a desktop window")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "tapcast.toml")]
    config: PathBuf,

    /// Path to the adb binary (overrides config and PATH lookup).
    #[arg(long)]
    adb: Option<PathBuf>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        let text = toml::to_string_pretty(&ViewerConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let config = ViewerConfig::load(&cli.config);

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("tapcast v{}", env!("CARGO_PKG_VERSION"));

    // ── 1. Device link ──────────────────────────────────────────

    let adb = locate_adb(&cli, &config)?;
    info!("adb binary: {}", adb.display());

    let channel = Arc::new(AdbChannel::new(adb));
    let device = Device::new(
        channel,
        Duration::from_millis(config.device.command_timeout_ms),
    );
    device.ensure_attached().await?;

    let (device_w, device_h) = match device.resolution().await {
        Ok(size) => size,
        Err(err) => {
            warn!(error = %err, "could not query device resolution; using fallback");
            (config.device.fallback_width, config.device.fallback_height)
        }
    };
    info!(width = device_w, height = device_h, "device resolution");

    // ── 2. Window sized to the device aspect ────────────────────

    let window_h = config.display.window_height.max(1);
    let window_w = ((device_w as f64 * (window_h as f64 / device_h as f64)) as u32).max(1);

    let surface = MinifbSurface::create(
        &config.display.title,
        window_w,
        window_h,
        config.session.target_fps,
    )?;
    let geometry = ScreenGeometry::new(device_w, device_h, window_w, window_h)?;

    // ── 3. Run the session ──────────────────────────────────────

    let mut session = SessionController::new(surface, device, geometry, &config);
    session.run().await?;

    info!("shutting down");
    Ok(())
}

/// Resolve the adb binary: CLI flag, then config, then PATH.
fn locate_adb(cli: &Cli, config: &ViewerConfig) -> Result<PathBuf, TapcastError> {
    if let Some(path) = &cli.adb {
        return Ok(path.clone());
    }
    if !config.device.adb_path.is_empty() {
        return Ok(PathBuf::from(&config.device.adb_path));
    }
    which::which("adb").map_err(|_| TapcastError::BinaryNotFound("adb".into()))
}
