//! Next-waypoint Policy
//!
//! Short-lived policy runs that read telemetry and write one target into the
//! injection file:
//!
//! - `random`: once the agent reports `reached`, pick a uniform point;
//! - `nearest`: pick the live ball closest to the agent.
//!
//! Each run is idempotent and returns quickly; callers invoke it repeatedly.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::rng::DeterministicRng;
use crate::interchange::InterchangeError;
use crate::interchange::atomic::write_atomic;
use crate::interchange::injection::DYNAMIC_WAYPOINTS_FILE;
use crate::interchange::telemetry::{read_ball_positions, read_current_position, read_status};
use crate::sim::motion::MotionStatus;
use crate::sim::placement::Bounds;
use crate::sim::waypoint::Waypoint;

/// Policy selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyMode {
    /// Uniform target after each arrival
    Random,
    /// Closest live ball
    #[default]
    Nearest,
}

/// Mode name that matches no policy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mode: {0}")]
pub struct UnknownMode(pub String);

impl FromStr for PolicyMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "random" => Ok(PolicyMode::Random),
            "nearest" => Ok(PolicyMode::Nearest),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for PolicyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PolicyMode::Random => "random",
            PolicyMode::Nearest => "nearest",
        })
    }
}

/// Pick the mode: CLI argument, then environment, then the default.
///
/// Blank values count as absent.
pub fn resolve_mode(cli: Option<&str>, env: Option<&str>, default: PolicyMode) -> Result<PolicyMode, UnknownMode> {
    match cli.or(env).map(str::trim).filter(|s| !s.is_empty()) {
        Some(name) => name.parse(),
        None => Ok(default),
    }
}

/// Policy settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Directory holding telemetry and the injection file
    pub dir: PathBuf,
    /// Region random targets are drawn from
    pub bounds: Bounds,
    /// Mode when neither CLI nor environment names one
    pub default_mode: PolicyMode,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            bounds: Bounds::square(0.86),
            default_mode: PolicyMode::Nearest,
        }
    }
}

/// Result of one policy run.
#[derive(Clone, Debug, PartialEq)]
pub enum PolicyOutcome {
    /// A target was written
    Written(Waypoint),
    /// Nothing to do this time
    Skipped(&'static str),
}

/// Run `mode` once.
pub fn run(mode: PolicyMode, config: &PolicyConfig, rng: &mut DeterministicRng) -> Result<PolicyOutcome, InterchangeError> {
    match mode {
        PolicyMode::Random => run_random(config, rng),
        PolicyMode::Nearest => run_nearest(config),
    }
}

/// Write a uniform target once the agent has reached the previous one.
pub fn run_random(config: &PolicyConfig, rng: &mut DeterministicRng) -> Result<PolicyOutcome, InterchangeError> {
    if read_status(&config.dir) != MotionStatus::Reached.as_token() {
        return Ok(PolicyOutcome::Skipped("agent has not reached its target"));
    }
    let target = config.bounds.sample(rng);
    publish(config, Waypoint::new(target.x, target.y))
}

/// Write the live ball closest to the agent.
pub fn run_nearest(config: &PolicyConfig) -> Result<PolicyOutcome, InterchangeError> {
    let Some(agent) = read_current_position(&config.dir) else {
        return Ok(PolicyOutcome::Skipped("no agent position"));
    };
    let balls = read_ball_positions(&config.dir);

    let mut best: Option<(f64, Waypoint)> = None;
    for ball in &balls {
        let d2 = ball.position.distance_squared(agent);
        if best.map_or(true, |(best_d2, _)| d2 < best_d2) {
            best = Some((d2, Waypoint::new(ball.position.x, ball.position.y)));
        }
    }

    match best {
        Some((_, waypoint)) => publish(config, waypoint),
        None => Ok(PolicyOutcome::Skipped("no live balls")),
    }
}

fn publish(config: &PolicyConfig, waypoint: Waypoint) -> Result<PolicyOutcome, InterchangeError> {
    let path = config.dir.join(DYNAMIC_WAYPOINTS_FILE);
    write_atomic(&path, &format!("{}\n", waypoint))?;
    debug!(path = %path.display(), %waypoint, "target written");
    Ok(PolicyOutcome::Written(waypoint))
}

// =============================================================================
// TESTS
// =============================================================================
