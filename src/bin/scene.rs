//! Scene Generator
//!
//! Writes a randomized ball layout as a scene description file, backing up
//! any previous one.
//!
//! Usage: `sweepbot-scene [scene.json]`

use std::path::PathBuf;
use anyhow::Context;
use tracing::info;

use sweepbot::config::load_or_default;
use sweepbot::interchange::scene::{SceneConfig, write_scene};

fn main() -> anyhow::Result<()> {
    sweepbot::init_tracing().context("failed to set tracing subscriber")?;

    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let config: SceneConfig = load_or_default(path.as_deref()).context("loading scene config")?;

    let summary = write_scene(&config)
        .with_context(|| format!("writing {}", config.output.display()))?;

    match &summary.backup {
        Some(backup) => info!("Backed up existing scene to: {}", backup.display()),
        None => info!("No existing scene to back up."),
    }
    info!("Wrote new scene to: {}", summary.output.display());
    info!("Ping balls: {}, Steel balls: {}", config.ping_count, config.steel_count);
    info!("Seed: {}", summary.report.seed);
    for object in summary.objects.iter().take(3) {
        info!("  x={:.3}, y={:.3}", object.position.x, object.position.y);
    }
    info!("Layout fingerprint: {}", hex::encode(summary.report.fingerprint()));

    Ok(())
}
