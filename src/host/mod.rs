//! Host Boundary
//!
//! The simulator that owns physics and time. The supervisor only reaches it
//! through [`SimulationHost`]: one fixed step per tick, named entity lookups,
//! and a physics reset after teleporting an entity.

pub mod kinematic;

pub use kinematic::{HostConfig, KinematicHost};

/// What the host reports after a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Keep ticking
    Continue,
    /// The host is shutting down; stop the loop
    Shutdown,
}

/// Fixed-step simulator with named entities.
///
/// Lookups return `None` (setters return `false`) for unknown names so the
/// caller can skip missing entities without failing.
pub trait SimulationHost {
    /// Advance simulated time by one [`time_step`](Self::time_step).
    fn step(&mut self) -> StepOutcome;

    /// Fixed step length in seconds.
    fn time_step(&self) -> f64;

    /// Simulated seconds since start.
    fn elapsed(&self) -> f64;

    /// Whether an entity with this name exists.
    fn has_entity(&self, name: &str) -> bool {
        self.translation(name).is_some()
    }

    /// Entity translation `[x, y, z]`.
    fn translation(&self, name: &str) -> Option<[f64; 3]>;

    /// Teleport an entity.
    fn set_translation(&mut self, name: &str, translation: [f64; 3]) -> bool;

    /// Rotation about the vertical axis, radians.
    fn heading(&self, name: &str) -> Option<f64>;

    /// Set the rotation about the vertical axis.
    fn set_heading(&mut self, name: &str, heading: f64) -> bool;

    /// Free-form label (type or model name) of an entity.
    fn label(&self, name: &str) -> Option<String>;

    /// Drop any velocity the entity carries.
    fn reset_physics(&mut self, name: &str) -> bool;
}
