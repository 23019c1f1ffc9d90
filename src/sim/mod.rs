//! Simulation Module
//!
//! Everything that runs inside a tick, plus the one-off layout packer.
//! Nothing here touches a host or the filesystem.
//!
//! ## Module Structure
//!
//! - `state`: Objects, score counters, arena snapshot
//! - `motion`: Rate-limited pose controller
//! - `capture`: Agent-frame capture windows
//! - `placement`: Rejection-sampling layout generator
//! - `waypoint`: Waypoint text form and the default patrol route
//! - `tick`: One pure simulation step
//! - `events`: Events for logs and tests

pub mod state;
pub mod motion;
pub mod capture;
pub mod placement;
pub mod waypoint;
pub mod tick;
pub mod events;

// Re-export key types
pub use state::{ArenaState, MovableObject, ObjectClass, ObjectId, ScoreState};
pub use motion::{MotionConfig, MotionController, MotionPhase, MotionStatus, MotionTask};
pub use capture::{Capture, CaptureConfig};
pub use placement::{PlacementConfig, PlacementEngine, PlacementReport, PlacementTier};
pub use waypoint::{Waypoint, WaypointParseError, default_patrol_route};
pub use tick::{TickConfig, TickResult, tick};
pub use events::{SimEvent, SimEventData};
