//! Simulation State Definitions
//!
//! Movable objects, score counters and the arena snapshot the tick operates
//! on. Uses BTreeMap for deterministic iteration order.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::geometry::Pose;
use crate::core::hash::{StateHash, StateHasher};
use crate::core::vec2::Vec2;
use crate::sim::motion::{MotionConfig, MotionController, MotionTask};

// =============================================================================
// OBJECT ID
// =============================================================================

/// Index of a movable object in the host's `<prefix><index>` naming scheme.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

impl ObjectId {
    /// Host entity name for this object.
    pub fn entity_name(self, prefix: &str) -> String {
        format!("{}{}", prefix, self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// OBJECT CLASS
// =============================================================================

/// Object class, which selects the capture window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ObjectClass {
    /// Light ping-pong ball (class A)
    Ping = 0,
    /// Heavy steel ball (class B, narrower window)
    Steel = 1,
}

impl ObjectClass {
    /// Marker looked for in an object's label.
    pub const STEEL_MARKER: &'static str = "steel";

    /// Classify a label: anything containing "steel" (any case) is steel,
    /// everything else is ping.
    pub fn from_label(label: &str) -> Self {
        if label.to_lowercase().contains(Self::STEEL_MARKER) {
            ObjectClass::Steel
        } else {
            ObjectClass::Ping
        }
    }

    /// Lowercase name used in telemetry lines.
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectClass::Ping => "ping",
            ObjectClass::Steel => "steel",
        }
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// MOVABLE OBJECT
// =============================================================================

/// A capturable ball.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MovableObject {
    /// Stable identity
    pub id: ObjectId,
    /// Host entity name
    pub name: String,
    /// Free-form label the class is derived from
    pub label: String,
    /// Resolved class; `None` until the detector first looks at the object
    class: Option<ObjectClass>,
    /// Current position in the arena plane
    pub position: Vec2,
    /// Height above the floor
    pub z: f64,
    /// Captured objects are never tested again
    pub captured: bool,
    /// Seen on the host this tick; absent objects are left out of detection
    pub present: bool,
}

impl MovableObject {
    /// Create a live, unclassified object.
    pub fn new(id: ObjectId, name: impl Into<String>, label: impl Into<String>, position: Vec2, z: f64) -> Self {
        Self {
            id,
            name: name.into(),
            label: label.into(),
            class: None,
            position,
            z,
            captured: false,
            present: true,
        }
    }

    /// Class, resolving and caching it from the label on first call.
    pub fn class(&mut self) -> ObjectClass {
        *self.class.get_or_insert_with(|| ObjectClass::from_label(&self.label))
    }

    /// Class if it has already been resolved.
    pub fn cached_class(&self) -> Option<ObjectClass> {
        self.class
    }

    /// Class without caching (for readers holding a shared reference).
    pub fn peek_class(&self) -> ObjectClass {
        self.class.unwrap_or_else(|| ObjectClass::from_label(&self.label))
    }
}

// =============================================================================
// SCORE
// =============================================================================

/// Capture counters. Only ever increase within a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreState {
    /// Ping balls hit
    pub ping_hit: u32,
    /// Steel balls hit
    pub steel_hit: u32,
    /// Steel balls stored
    pub steel_stored: u32,
    /// Ping balls stored
    pub ping_stored: u32,
}

impl ScoreState {
    /// Weight of a ping hit.
    pub const PING_HIT_WEIGHT: u32 = 4;
    /// Weight of a steel hit.
    pub const STEEL_HIT_WEIGHT: u32 = 2;
    /// Weight of a stored steel ball.
    pub const STEEL_STORED_WEIGHT: u32 = 1;
    /// Stored ping balls do not score.
    pub const PING_STORED_WEIGHT: u32 = 0;

    /// Weighted total, recomputed from the counters.
    pub fn total(&self) -> u32 {
        self.ping_hit * Self::PING_HIT_WEIGHT
            + self.steel_hit * Self::STEEL_HIT_WEIGHT
            + self.steel_stored * Self::STEEL_STORED_WEIGHT
            + self.ping_stored * Self::PING_STORED_WEIGHT
    }

    /// Count one stored object of `class`.
    pub fn record_stored(&mut self, class: ObjectClass) {
        match class {
            ObjectClass::Ping => self.ping_stored += 1,
            ObjectClass::Steel => self.steel_stored += 1,
        }
    }

    /// Count one hit on an object of `class`.
    ///
    /// The detector never produces hits, so these counters stay at zero in a
    /// run; they are kept because the score formula and `score.json` carry them.
    pub fn record_hit(&mut self, class: ObjectClass) {
        match class {
            ObjectClass::Ping => self.ping_hit += 1,
            ObjectClass::Steel => self.steel_hit += 1,
        }
    }

    /// Total objects stored.
    pub fn stored(&self) -> u32 {
        self.ping_stored + self.steel_stored
    }
}

impl fmt::Display for ScoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Score: {} | Ping Hit: {} | Steel Hit: {} | Steel Stored: {} | Ping Stored: {}",
            self.total(),
            self.ping_hit,
            self.steel_hit,
            self.steel_stored,
            self.ping_stored,
        )
    }
}

// =============================================================================
// ARENA STATE
// =============================================================================

/// Everything one tick reads and writes, detached from the host.
#[derive(Clone, Debug)]
pub struct ArenaState {
    /// Ticks run so far
    pub tick: u64,
    /// Agent pose
    pub agent: Pose,
    /// Motion controller driving the agent
    pub motion: MotionController,
    /// Pending targets, FIFO
    pub queue: VecDeque<MotionTask>,
    /// Known objects
    pub objects: BTreeMap<ObjectId, MovableObject>,
}

impl ArenaState {
    /// Create a state with an idle controller and no objects.
    pub fn new(agent: Pose, motion: MotionConfig) -> Self {
        Self {
            tick: 0,
            agent,
            motion: MotionController::new(motion),
            queue: VecDeque::new(),
            objects: BTreeMap::new(),
        }
    }

    /// Register an object (replacing any previous record with the same id).
    pub fn insert_object(&mut self, object: MovableObject) {
        self.objects.insert(object.id, object);
    }

    /// Objects present and not captured yet.
    pub fn live_objects(&self) -> impl Iterator<Item = &MovableObject> {
        self.objects.values().filter(|o| o.present && !o.captured)
    }

    /// Number of live objects.
    pub fn live_count(&self) -> usize {
        self.live_objects().count()
    }

    /// Append a target to the queue.
    pub fn enqueue(&mut self, task: MotionTask) {
        self.queue.push_back(task);
    }

    /// Fingerprint of the agent pose and every object.
    pub fn compute_hash(&self) -> StateHash {
        let mut hasher = StateHasher::for_arena_state();
        hasher.update_u64(self.tick);
        hasher.update_vec2(self.agent.position);
        hasher.update_f64(self.agent.z);
        hasher.update_f64(self.agent.heading);
        for (id, object) in &self.objects {
            hasher.update_u32(id.0);
            hasher.update_vec2(object.position);
            hasher.update_bool(object.captured);
        }
        hasher.finalize()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_label() {
        assert_eq!(ObjectClass::from_label("SteelBall"), ObjectClass::Steel);
        assert_eq!(ObjectClass::from_label("heavy STEEL 3"), ObjectClass::Steel);
        assert_eq!(ObjectClass::from_label("PingBall"), ObjectClass::Ping);
        assert_eq!(ObjectClass::from_label(""), ObjectClass::Ping);
    }

    #[test]
    fn test_class_resolved_lazily_and_cached() {
        let mut ball = MovableObject::new(ObjectId(3), "BALL_3", "SteelBall", Vec2::ZERO, 0.02);
        assert_eq!(ball.cached_class(), None);

        assert_eq!(ball.class(), ObjectClass::Steel);
        assert_eq!(ball.cached_class(), Some(ObjectClass::Steel));

        // The cached value wins over later label edits
        ball.label = "PingBall".into();
        assert_eq!(ball.class(), ObjectClass::Steel);
    }

    #[test]
    fn test_score_formula() {
        let mut score = ScoreState::default();
        assert_eq!(score.total(), 0);

        score.record_stored(ObjectClass::Ping);
        score.record_stored(ObjectClass::Ping);
        // Stored ping balls carry no weight
        assert_eq!(score.total(), 0);

        score.record_stored(ObjectClass::Steel);
        assert_eq!(score.total(), 1);

        score.record_hit(ObjectClass::Ping);
        score.record_hit(ObjectClass::Steel);
        assert_eq!(score.total(), 1 + 4 + 2);
        assert_eq!(score.stored(), 3);
    }

    #[test]
    fn test_score_display() {
        let score = ScoreState { ping_hit: 0, steel_hit: 0, steel_stored: 2, ping_stored: 5 };
        assert_eq!(
            score.to_string(),
            "Score: 2 | Ping Hit: 0 | Steel Hit: 0 | Steel Stored: 2 | Ping Stored: 5"
        );
    }

    #[test]
    fn test_entity_name() {
        assert_eq!(ObjectId(12).entity_name("BALL_"), "BALL_12");
    }

    #[test]
    fn test_arena_hash_tracks_capture() {
        let mut state = ArenaState::new(Pose::default(), MotionConfig::default());
        state.insert_object(MovableObject::new(ObjectId(0), "BALL_0", "PingBall", Vec2::new(0.1, 0.1), 0.021));
        let before = state.compute_hash();

        if let Some(ball) = state.objects.get_mut(&ObjectId(0)) {
            ball.captured = true;
        }
        assert_ne!(before, state.compute_hash());
        assert_eq!(state.live_count(), 0);
    }

    #[test]
    fn test_absent_object_is_not_live() {
        let mut state = ArenaState::new(Pose::default(), MotionConfig::default());
        state.insert_object(MovableObject::new(ObjectId(0), "BALL_0", "PingBall", Vec2::new(0.1, 0.1), 0.021));
        state.insert_object(MovableObject::new(ObjectId(1), "BALL_1", "PingBall", Vec2::new(0.2, 0.1), 0.021));

        if let Some(ball) = state.objects.get_mut(&ObjectId(1)) {
            ball.present = false;
        }
        let live: Vec<ObjectId> = state.live_objects().map(|o| o.id).collect();
        assert_eq!(live, vec![ObjectId(0)]);
    }
}
