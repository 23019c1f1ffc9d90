//! Waypoint Injection
//!
//! An external policy process drops `(x, y, heading_or_none)` lines into
//! `dynamic_waypoints.txt`. The supervisor polls the file while the agent is
//! idle and feeds new content into the task queue. Content already consumed
//! is remembered and not enqueued again.

use std::collections::VecDeque;
use std::path::PathBuf;
use serde::{Serialize, Deserialize};
use tracing::{debug, info, warn};

use crate::interchange::InterchangeError;
use crate::interchange::atomic::read_trimmed;
use crate::sim::motion::MotionTask;
use crate::sim::waypoint::Waypoint;

/// Injected waypoint file.
pub const DYNAMIC_WAYPOINTS_FILE: &str = "dynamic_waypoints.txt";

/// How injected waypoints enter the queue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InjectionMode {
    /// Push behind whatever is queued
    #[default]
    Append,
    /// Drop the queue first
    Replace,
}

/// Injection settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectionConfig {
    /// Poll the file at all
    pub enabled: bool,
    /// File to poll
    pub path: PathBuf,
    /// Queue policy
    pub mode: InjectionMode,
}

impl Default for InjectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from(DYNAMIC_WAYPOINTS_FILE),
            mode: InjectionMode::Append,
        }
    }
}

/// Polls the injected file and remembers what it already consumed.
pub struct InjectionReader {
    config: InjectionConfig,
    last_consumed: Option<String>,
}

impl InjectionReader {
    /// Reader for `config`.
    pub fn new(config: InjectionConfig) -> Self {
        Self {
            config,
            last_consumed: None,
        }
    }

    /// Queue policy.
    pub fn mode(&self) -> InjectionMode {
        self.config.mode
    }

    /// Forget consumed content so the current file is picked up again.
    pub fn reset(&mut self) {
        self.last_consumed = None;
    }

    /// New waypoints, if the file changed since the last consumed content.
    ///
    /// A file that fails to parse is still marked consumed, so the same bad
    /// content is reported once.
    pub fn poll(&mut self) -> Result<Option<Vec<Waypoint>>, InterchangeError> {
        if !self.config.enabled {
            return Ok(None);
        }
        let Some(text) = read_trimmed(&self.config.path) else {
            return Ok(None);
        };
        if self.last_consumed.as_deref() == Some(text.as_str()) {
            return Ok(None);
        }

        let parsed = parse_numbered(&text);
        self.last_consumed = Some(text);
        parsed.map(Some)
    }

    /// Poll and push new waypoints into `queue`. Returns how many were added.
    ///
    /// Never fails: a bad file is logged and skipped.
    pub fn poll_into(&mut self, queue: &mut VecDeque<MotionTask>) -> usize {
        match self.poll() {
            Ok(Some(waypoints)) => apply(self.config.mode, queue, &waypoints),
            Ok(None) => 0,
            Err(e) => {
                warn!(path = %self.config.path.display(), error = %e, "ignoring injected waypoints");
                0
            }
        }
    }
}

fn parse_numbered(text: &str) -> Result<Vec<Waypoint>, InterchangeError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            line.parse::<Waypoint>()
                .map_err(|source| InterchangeError::Waypoint { line: index + 1, source })
        })
        .collect()
}

/// Push `waypoints` into `queue` under `mode`. Returns how many were added.
pub fn apply(mode: InjectionMode, queue: &mut VecDeque<MotionTask>, waypoints: &[Waypoint]) -> usize {
    if mode == InjectionMode::Replace && !queue.is_empty() {
        debug!(dropped = queue.len(), "replacing queued tasks");
        queue.clear();
    }
    queue.extend(waypoints.iter().map(|wp| wp.to_task()));
    if !waypoints.is_empty() {
        info!(count = waypoints.len(), ?mode, queued = queue.len(), "waypoints injected");
    }
    waypoints.len()
}

// =============================================================================
// TESTS
// =============================================================================
