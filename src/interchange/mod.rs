//! Plain-text Interchange
//!
//! Files shared with out-of-process tools: live telemetry written by the
//! supervisor, the injected waypoint file read back by it, and the scene
//! description produced by the layout generator.
//!
//! Writers replace files atomically (temp file, then rename). Readers are
//! soft: a missing or malformed file yields a default, never an error.

pub mod atomic;
pub mod telemetry;
pub mod injection;
pub mod scene;
pub mod policy;

use std::path::PathBuf;

pub use atomic::{write_atomic, read_soft};
pub use telemetry::{TelemetryConfig, TelemetryWriter, TelemetrySnapshot};
pub use injection::{InjectionConfig, InjectionMode, InjectionReader};
pub use scene::{SceneConfig, SceneObject, generate_scene};
pub use policy::{PolicyConfig, PolicyMode};

/// Interchange file errors.
#[derive(Debug, thiserror::Error)]
pub enum InterchangeError {
    /// Filesystem failure on a specific file.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// JSON encoding failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A line of a waypoint file did not parse.
    #[error("bad waypoint on line {line}: {source}")]
    Waypoint {
        /// 1-based line number
        line: usize,
        /// Parse failure
        #[source]
        source: crate::sim::waypoint::WaypointParseError,
    },
}

impl InterchangeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
