//! Simulation Events
//!
//! Events emitted by the tick and the supervisor, for logging and tests.

use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::sim::capture::Capture;
use crate::sim::motion::MotionPhase;
use crate::sim::state::{ObjectClass, ObjectId};

/// Event payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SimEventData {
    /// A queued task was armed
    TaskStarted {
        /// Target position
        target: Vec2,
        /// Requested final heading, if any
        heading: Option<f64>,
        /// Phase the controller entered
        phase: MotionPhase,
        /// Tasks still waiting behind this one
        queued: usize,
    },

    /// The armed task reached its target
    TaskCompleted {
        /// Position the agent snapped to
        target: Vec2,
        /// Tasks completed so far, this one included
        completed: u64,
    },

    /// An object entered the capture window
    ObjectCaptured {
        /// Captured object
        object_id: ObjectId,
        /// Host entity name
        name: String,
        /// Class it was counted as
        class: ObjectClass,
        /// Total score after this capture
        new_score: u32,
    },

    /// Placement fell back to a weaker constraint set
    PlacementDegraded {
        /// Index in the placement order
        index: usize,
        /// Position it was given
        position: Vec2,
        /// Exclusion zones were ignored too
        forced: bool,
    },
}

/// An event stamped with the tick it happened on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    /// Tick when the event occurred
    pub tick: u64,

    /// Event data
    pub data: SimEventData,
}

impl SimEvent {
    /// Create a new event.
    pub fn new(tick: u64, data: SimEventData) -> Self {
        Self { tick, data }
    }

    /// Create task started event.
    pub fn task_started(tick: u64, target: Vec2, heading: Option<f64>, phase: MotionPhase, queued: usize) -> Self {
        Self::new(tick, SimEventData::TaskStarted { target, heading, phase, queued })
    }

    /// Create task completed event.
    pub fn task_completed(tick: u64, target: Vec2, completed: u64) -> Self {
        Self::new(tick, SimEventData::TaskCompleted { target, completed })
    }

    /// Create object captured event.
    pub fn object_captured(tick: u64, capture: &Capture, new_score: u32) -> Self {
        Self::new(
            tick,
            SimEventData::ObjectCaptured {
                object_id: capture.id,
                name: capture.name.clone(),
                class: capture.class,
                new_score,
            },
        )
    }

    /// Create placement degraded event.
    pub fn placement_degraded(index: usize, position: Vec2, forced: bool) -> Self {
        Self::new(0, SimEventData::PlacementDegraded { index, position, forced })
    }

    /// Whether this is a capture.
    pub fn is_capture(&self) -> bool {
        matches!(self.data, SimEventData::ObjectCaptured { .. })
    }
}
