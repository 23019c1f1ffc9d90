//! Sweepbot Supervisor
//!
//! Runs the supervisor loop against the built-in kinematic host until the
//! configured duration elapses or Ctrl-C is pressed.
//!
//! Usage: `sweepbot-supervisor [config.json]` (or set `SWEEPBOT_CONFIG`).

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use anyhow::Context;
use tracing::{info, warn};

use sweepbot::{
    VERSION,
    config::SupervisorConfig,
    host::KinematicHost,
    supervisor::Supervisor,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    sweepbot::init_tracing().context("failed to set tracing subscriber")?;

    info!("Sweepbot Supervisor v{}", VERSION);

    let config = SupervisorConfig::from_arg_or_env(std::env::args_os().nth(1).map(PathBuf::from))
        .context("loading configuration")?;

    let host = KinematicHost::arena(
        config.host.clone(),
        &config.agent_name,
        config.agent_start(),
        &config.ball_prefix,
    );
    info!("Time step: {} ms", config.host.time_step_ms);
    if let Some(limit) = config.host.max_seconds {
        info!("Duration limit: {:.1} s", limit);
    }

    let stop = host.stop_handle();
    let mut supervisor = Supervisor::new(host, config).context("binding supervisor to host")?;

    // Ctrl-C only raises the flag; the host turns it into a shutdown at the next step
    let watcher = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received, stopping");
                stop.store(true, Ordering::SeqCst);
            }
            Err(e) => warn!(error = %e, "cannot listen for Ctrl-C"),
        }
    });

    let summary = tokio::task::spawn_blocking(move || {
        supervisor.initialize();
        supervisor.run()
    })
    .await
    .context("tick loop panicked")?;
    watcher.abort();

    info!("=== Run Summary ===");
    info!("Ticks: {} ({:.3} s simulated)", summary.ticks, summary.elapsed);
    info!("{}", summary.score);
    info!("Live balls: {}", summary.live_objects);
    info!("Final State Hash: {}", hex::encode(summary.final_hash));

    Ok(())
}
