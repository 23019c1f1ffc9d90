//! Waypoint Policy
//!
//! Reads the supervisor's telemetry and writes the next target into the
//! injection file. Meant to be run repeatedly; each run exits quickly.
//!
//! Usage: `sweepbot-waypoints [random|nearest]` (or set `MODE`).
//! `SWEEPBOT_POLICY_CONFIG` may name a JSON policy config.

use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error};

use sweepbot::DeterministicRng;
use sweepbot::config::load_or_default;
use sweepbot::interchange::policy::{self, PolicyConfig, PolicyOutcome, resolve_mode};

/// Environment variable naming the policy config file.
const POLICY_CONFIG_ENV: &str = "SWEEPBOT_POLICY_CONFIG";

fn main() -> ExitCode {
    if sweepbot::init_tracing().is_err() {
        return ExitCode::FAILURE;
    }

    let config_path = std::env::var_os(POLICY_CONFIG_ENV).map(PathBuf::from);
    let config: PolicyConfig = match load_or_default(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "cannot load policy config");
            return ExitCode::FAILURE;
        }
    };

    let cli = std::env::args().nth(1);
    let env = std::env::var("MODE").ok();
    let mode = match resolve_mode(cli.as_deref(), env.as_deref(), config.default_mode) {
        Ok(mode) => mode,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(2);
        }
    };

    let mut rng = DeterministicRng::from_entropy();
    match policy::run(mode, &config, &mut rng) {
        Ok(PolicyOutcome::Written(waypoint)) => {
            debug!(%mode, %waypoint, "target written");
            ExitCode::SUCCESS
        }
        Ok(PolicyOutcome::Skipped(reason)) => {
            debug!(%mode, reason, "nothing to do");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(%mode, error = %e, "write failed");
            ExitCode::FAILURE
        }
    }
}
