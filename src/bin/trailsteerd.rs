//! trailsteerd - trail-following steering daemon
//!
//! This daemon:
//! 1. Opens the configured camera (V4L2 device or synthetic stub)
//! 2. Runs the configured classifier backend over each frame
//! 3. Converts class probabilities into a smoothed unit-circle command
//! 4. Renders diagnostic output when a display is attached
//! 5. Shuts down cleanly on interrupt, between iterations

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use trailsteer::{
    classify, display, CameraConfig, CameraSource, DisplayMode, Pilot, PilotConfig,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the JSON configuration file.
    #[arg(long, env = "TRAILSTEER_CONFIG")]
    config: Option<PathBuf>,
    /// Camera device path or stub:// source (overrides config).
    #[arg(long)]
    camera: Option<String>,
    /// Classifier backend name (overrides config).
    #[arg(long)]
    backend: Option<String>,
    /// Display mode (auto|plain|none, overrides config).
    #[arg(long, value_name = "MODE")]
    display: Option<String>,
}

fn main() -> Result<()> {
    // Initialize logging (simple stderr)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("trailsteerd {} starting", env!("CARGO_PKG_VERSION"));

    let mut cfg = PilotConfig::load(args.config.as_deref())?;
    if let Some(device) = args.camera {
        cfg.camera.device = device;
    }
    if let Some(backend) = args.backend {
        cfg.classifier.backend = backend;
    }
    if let Some(mode) = args.display.as_deref() {
        cfg.display.mode = DisplayMode::parse(mode)?;
    }

    // Interrupts are honored at iteration boundaries only; the handler
    // just raises the flag.
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::SeqCst);
        })?;
    }

    let mut source = CameraSource::new(CameraConfig {
        device: cfg.camera.device.clone(),
        target_fps: cfg.camera.target_fps,
        width: cfg.camera.width,
        height: cfg.camera.height,
    })?;
    source.connect()?;
    log::info!(
        "camera open: {}x{}, {} bpp",
        source.width(),
        source.height(),
        source.pixel_depth_bits()
    );

    let mut classifier = classify::create_backend(&cfg.classifier)?;
    classifier.warm_up()?;
    log::info!("classifier backend: {}", classifier.name());

    let sink = display::create(cfg.display.mode, std::io::stderr().is_terminal());
    if sink.is_none() {
        log::info!("no display attached; rendering disabled");
    }

    let mut pilot = Pilot::new(
        source,
        classifier,
        sink,
        cfg.control,
        cfg.camera.capture_timeout(),
        cfg.camera.target_fps,
        shutdown,
    );
    pilot.run();

    log::info!("trailsteerd stopped");
    Ok(())
}
