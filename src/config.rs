//! Runtime Configuration
//!
//! JSON configuration for the binaries. Every field has a default, so an
//! empty object (or no file at all) reproduces the stock arena.

use std::fs;
use std::path::{Path, PathBuf};
use serde::de::DeserializeOwned;
use serde::{Serialize, Deserialize};
use tracing::info;

use crate::core::vec2::Vec2;
use crate::host::HostConfig;
use crate::interchange::{InjectionConfig, TelemetryConfig};
use crate::sim::capture::CaptureConfig;
use crate::sim::motion::MotionConfig;
use crate::sim::placement::{AGENT_START, PlacementConfig};
use crate::sim::waypoint::Waypoint;

/// Environment variable naming the supervisor config file.
pub const CONFIG_ENV: &str = "SWEEPBOT_CONFIG";

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// Config file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid JSON for this config.
    #[error("cannot parse {path}: {source}")]
    Parse {
        /// Config file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// Values are out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Supervisor settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Host entity name of the agent
    pub agent_name: String,
    /// Ball entity names are `<ball_prefix><index>`
    pub ball_prefix: String,
    /// Balls looked up on the host
    pub ball_count: u32,
    /// Randomize the layout before the first tick
    pub randomize_on_start: bool,
    /// Route to drive; `None` uses the default patrol
    pub waypoints: Option<Vec<Waypoint>>,
    /// Layout packer
    pub placement: PlacementConfig,
    /// Motion controller
    pub motion: MotionConfig,
    /// Capture windows
    pub capture: CaptureConfig,
    /// Telemetry files
    pub telemetry: TelemetryConfig,
    /// Injected waypoint file
    pub injection: InjectionConfig,
    /// Built-in kinematic host
    pub host: HostConfig,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            agent_name: "MY_ROBOT".to_string(),
            ball_prefix: "BALL_".to_string(),
            ball_count: 40,
            randomize_on_start: true,
            waypoints: None,
            placement: PlacementConfig::default(),
            motion: MotionConfig::default(),
            capture: CaptureConfig::default(),
            telemetry: TelemetryConfig::default(),
            injection: InjectionConfig::default(),
            host: HostConfig::default(),
        }
    }
}

impl SupervisorConfig {
    /// Load from a JSON file and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config: Self = load_json(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `arg` if given, else from `$SWEEPBOT_CONFIG`, else defaults.
    pub fn from_arg_or_env(arg: Option<PathBuf>) -> Result<Self, ConfigError> {
        match arg.or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from)) {
            Some(path) => {
                info!(path = %path.display(), "loading config");
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Where the agent starts in the kinematic host.
    pub fn agent_start(&self) -> [f64; 3] {
        let Vec2 { x, y } = AGENT_START;
        [x, y, 0.0]
    }

    /// Reject values the loop cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.agent_name.trim().is_empty() {
            return invalid("agent_name is empty");
        }
        if self.host.time_step_ms == 0 {
            return invalid("host.time_step_ms must be positive");
        }
        let b = &self.placement.bounds;
        if !positive(b.x_max - b.x_min) || !positive(b.y_max - b.y_min) {
            return invalid("placement.bounds is empty");
        }
        if !positive(self.placement.object_radius) {
            return invalid("placement.object_radius must be positive");
        }
        if !positive(self.capture.half_x) || !positive(self.capture.half_y) {
            return invalid("capture window must have positive size");
        }
        if !positive(self.motion.linear_speed) || !positive(self.motion.angular_speed) {
            return invalid("motion speeds must be positive");
        }
        Ok(())
    }
}

fn positive(value: f64) -> bool {
    value > 0.0
}

/// Deserialize a JSON file.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Deserialize `path` if given, else use the default.
pub fn load_or_default<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T, ConfigError> {
    match path {
        Some(path) => load_json(path),
        None => Ok(T::default()),
    }
}

// =============================================================================
// TESTS
// =============================================================================
