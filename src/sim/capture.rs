//! Capture Detection
//!
//! Per-tick proximity check between the agent and every live object. Each
//! object is moved into the agent's local frame (x forward, y left) and
//! tested against a box in front of the agent whose depth depends on the
//! object's class.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::geometry::{Pose, world_to_local};
use crate::core::vec2::Vec2;
use crate::sim::state::{MovableObject, ObjectClass, ObjectId, ScoreState};

/// Capture window geometry and where captured objects are parked.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Window depth in front of the agent (local x, m)
    pub half_x: f64,
    /// Window half-width either side of the agent axis (local y, m)
    pub half_y: f64,
    /// Steel window is this much shallower than the ping window (m)
    pub steel_offset: f64,
    /// Holding point captured objects are moved to, outside the arena
    pub holding_point: [f64; 3],
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            half_x: 0.12,
            half_y: 0.05,
            steel_offset: 0.01,
            holding_point: [-1.1, 0.0, 0.4],
        }
    }
}

impl CaptureConfig {
    /// Depth of the window for `class`.
    #[inline]
    pub fn depth(&self, class: ObjectClass) -> f64 {
        match class {
            ObjectClass::Ping => self.half_x,
            ObjectClass::Steel => self.half_x - self.steel_offset,
        }
    }

    /// Whether a point in agent-local coordinates lies in the window for `class`.
    ///
    /// Bounds are open: a point exactly on an edge is not captured.
    #[inline]
    pub fn contains(&self, class: ObjectClass, local: Vec2) -> bool {
        local.x > 0.0 && local.x < self.depth(class) && local.y.abs() < self.half_y
    }

    /// Holding point in the arena plane.
    pub fn holding_position(&self) -> Vec2 {
        Vec2::new(self.holding_point[0], self.holding_point[1])
    }
}

/// One object absorbed this tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Capture {
    /// Captured object
    pub id: ObjectId,
    /// Host entity name
    pub name: String,
    /// Class the window was chosen by
    pub class: ObjectClass,
    /// Where it sat in the agent frame when captured
    pub local: Vec2,
}

/// Result of one detector pass.
#[derive(Clone, Debug, Default)]
pub struct ScanResult {
    /// Objects captured on this pass, in id order
    pub captures: Vec<Capture>,
    /// Counters after this pass
    pub score: ScoreState,
    /// Distance from the agent to the closest live object before capture
    pub nearest_distance: Option<f64>,
}

/// Run one detector pass over `objects`.
///
/// Captured and absent objects are skipped. A newly captured object is moved to the
/// holding point, flagged, and counted once in the returned score.
pub fn scan<'a, I>(agent: &Pose, objects: I, score: ScoreState, config: &CaptureConfig) -> ScanResult
where
    I: IntoIterator<Item = &'a mut MovableObject>,
{
    let mut result = ScanResult {
        score,
        ..ScanResult::default()
    };

    for object in objects {
        if object.captured || !object.present {
            continue;
        }

        let distance = object.position.distance(agent.position);
        result.nearest_distance = Some(match result.nearest_distance {
            Some(best) => best.min(distance),
            None => distance,
        });

        let local = world_to_local(object.position, agent);
        let class = object.class();

        #[cfg(feature = "debug-tracing")]
        tracing::trace!(object = %object.name, %class, x = local.x, y = local.y, "capture test");

        if !config.contains(class, local) {
            continue;
        }

        object.position = config.holding_position();
        object.z = config.holding_point[2];
        object.captured = true;
        result.score.record_stored(class);

        debug!(object = %object.name, %class, x = local.x, y = local.y, "captured");

        result.captures.push(Capture {
            id: object.id,
            name: object.name.clone(),
            class,
            local,
        });
    }

    result
}

// =============================================================================
// TESTS
// =============================================================================
