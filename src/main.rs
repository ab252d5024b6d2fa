// src/main.rs

mod analysis;
mod config;
mod depth_gate;
mod detection;
mod frame_source;
mod pipeline;
mod types;

use anyhow::{Context, Result};
use frame_source::RecordedSession;
use pipeline::PipelineOrchestrator;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());

    // Validation failures abort here, before any device is opened
    let config = types::Config::load(&config_path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "hand_gesture_tracker={},ort=warn",
            config.logging.level
        ))
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("✋ Hand Gesture Tracker Starting");
    info!("✓ Configuration loaded from {}", config_path);
    info!(
        "Motion: window={}, threshold x={}px y={}px z={:.3}m | clip={:.2}m",
        config.motion.window_size,
        config.motion.threshold_x,
        config.motion.threshold_y,
        config.motion.threshold_z,
        config.depth_gate.clipping_distance
    );
    if config.selector.reject_beyond_clip {
        info!("Candidates beyond the clipping distance are ignored");
    }

    let detector =
        detection::build_detector(&config.detector).context("Hand detector unavailable")?;
    let sink = pipeline::build_sink(&config.transport);

    let mut orchestrator = PipelineOrchestrator::new(&config, detector, sink)?;
    let mut source = RecordedSession::open(&config.source)?;
    info!("✓ Pipeline ready");

    let summary = orchestrator.run(&mut source)?;

    info!("\n✓ Stream ended");
    info!("  Total frames: {}", summary.total_frames);
    info!(
        "  Frames with hand: {} ({:.1}%)",
        summary.frames_with_hand,
        100.0 * summary.frames_with_hand as f64 / summary.total_frames.max(1) as f64
    );
    info!("  Gestures: {}", summary.gestures.total());
    info!(
        "  Deliveries: {} ok, {} failed",
        summary.deliveries_ok, summary.delivery_failures
    );
    info!("  Average: {:.1} FPS", summary.fps);
    info!("{}", serde_json::to_string(&summary)?);

    Ok(())
}
