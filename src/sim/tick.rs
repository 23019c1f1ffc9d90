//! Simulation Tick
//!
//! One pure step of the agent loop: advance motion, run the capture scan,
//! then arm the next queued task if the controller went idle. No host, no
//! files, no clocks. The supervisor mirrors host state in and out around it.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::sim::capture::{self, Capture, CaptureConfig};
use crate::sim::events::SimEvent;
use crate::sim::motion::MotionPhase;
use crate::sim::state::{ArenaState, ScoreState};

/// Per-tick parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Fixed step length (s)
    pub dt: f64,
    /// Capture window geometry
    pub capture: CaptureConfig,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            dt: 0.032,
            capture: CaptureConfig::default(),
        }
    }
}

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Counters after this tick
    pub score: ScoreState,
    /// Events generated this tick, in order
    pub events: Vec<SimEvent>,
    /// Objects captured this tick
    pub captures: Vec<Capture>,
    /// The armed task finished this tick
    pub task_completed: bool,
    /// A queued task was armed this tick
    pub task_started: bool,
    /// Closest live object before capture, if any
    pub nearest_distance: Option<f64>,
}

/// Run one simulation tick.
///
/// Order within a tick:
/// 1. advance the motion controller by `config.dt`;
/// 2. scan every live object against the capture window at the new pose;
/// 3. if the controller is idle and the queue is not empty, arm the next task.
///
/// `score` goes in by value and the updated counters come back in the result.
pub fn tick(state: &mut ArenaState, score: ScoreState, config: &TickConfig) -> TickResult {
    let mut result = TickResult {
        score,
        ..TickResult::default()
    };

    state.tick += 1;

    // 1. Motion
    if state.motion.is_active() {
        let target = state.motion.target().position;
        if state.motion.update(&mut state.agent, config.dt) {
            result.task_completed = true;
            result.events.push(SimEvent::task_completed(
                state.tick,
                target,
                state.motion.completed_tasks(),
            ));
        }
    }

    // 2. Capture
    let scan = capture::scan(&state.agent, state.objects.values_mut(), score, &config.capture);
    let mut running = score;
    for captured in &scan.captures {
        running.record_stored(captured.class);
        result.events.push(SimEvent::object_captured(state.tick, captured, running.total()));
    }
    result.score = scan.score;
    result.captures = scan.captures;
    result.nearest_distance = scan.nearest_distance;

    // 3. Next task
    if !state.motion.is_active() {
        if let Some(event) = start_next_task(state) {
            result.task_started = true;
            result.events.push(event);
        }
    }

    result
}

/// Pop the next queued task and arm it.
///
/// A task that needs no motion leaves the controller idle; the one after it
/// is armed on the following tick.
pub fn start_next_task(state: &mut ArenaState) -> Option<SimEvent> {
    let task = state.queue.pop_front()?;
    let phase = state.motion.start(&state.agent, &task);
    debug!(
        tick = state.tick,
        x = task.target.x,
        y = task.target.y,
        ?phase,
        queued = state.queue.len(),
        "task started"
    );
    if phase == MotionPhase::Idle {
        debug!(tick = state.tick, "already at target");
    }
    Some(SimEvent::task_started(
        state.tick,
        task.target,
        task.heading,
        phase,
        state.queue.len(),
    ))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Pose;
    use crate::core::vec2::Vec2;
    use crate::sim::events::SimEventData;
    use crate::sim::motion::{MotionConfig, MotionTask};
    use crate::sim::state::{MovableObject, ObjectClass, ObjectId};

    fn arena() -> ArenaState {
        ArenaState::new(Pose::new(0.0, 0.0, 0.0, 0.0), MotionConfig::default())
    }

    fn run_until_idle(state: &mut ArenaState, config: &TickConfig, limit: usize) -> (ScoreState, Vec<SimEvent>) {
        let mut score = ScoreState::default();
        let mut events = Vec::new();
        for _ in 0..limit {
            let result = tick(state, score, config);
            score = result.score;
            events.extend(result.events);
            if !state.motion.is_active() && state.queue.is_empty() {
                break;
            }
        }
        (score, events)
    }

    #[test]
    fn test_idle_tick_does_nothing() {
        let mut state = arena();
        let result = tick(&mut state, ScoreState::default(), &TickConfig::default());
        assert_eq!(state.tick, 1);
        assert!(result.events.is_empty());
        assert!(!result.task_completed);
        assert!(!result.task_started);
        assert_eq!(state.agent.position, Vec2::ZERO);
    }

    #[test]
    fn test_drive_through_ball() {
        let config = TickConfig::default();
        let mut state = arena();
        state.insert_object(MovableObject::new(ObjectId(0), "BALL_0", "PingBall", Vec2::new(0.5, 0.0), 0.021));
        state.insert_object(MovableObject::new(ObjectId(1), "BALL_1", "SteelBall", Vec2::new(0.5, 0.3), 0.011));
        state.enqueue(MotionTask::to(1.0, 0.0));

        let (score, events) = run_until_idle(&mut state, &config, 200);

        assert_eq!(state.agent.position, Vec2::new(1.0, 0.0));
        assert_eq!(score.ping_stored, 1);
        assert_eq!(score.steel_stored, 0);
        assert_eq!(score.total(), 0);
        assert_eq!(state.live_count(), 1);

        let captures: Vec<&SimEvent> = events.iter().filter(|e| e.is_capture()).collect();
        assert_eq!(captures.len(), 1);
        match &captures[0].data {
            SimEventData::ObjectCaptured { object_id, class, .. } => {
                assert_eq!(*object_id, ObjectId(0));
                assert_eq!(*class, ObjectClass::Ping);
            }
            other => panic!("unexpected event {:?}", other),
        }

        // Started on the first tick, completed last
        assert!(matches!(events.first().map(|e| &e.data), Some(SimEventData::TaskStarted { .. })));
        assert!(matches!(events.last().map(|e| &e.data), Some(SimEventData::TaskCompleted { .. })));
    }

    #[test]
    fn test_queue_is_fifo() {
        let config = TickConfig::default();
        let mut state = arena();
        state.enqueue(MotionTask::to(0.1, 0.0));
        state.enqueue(MotionTask::to(0.1, 0.1));
        state.enqueue(MotionTask::to(0.0, 0.1));

        let (_, events) = run_until_idle(&mut state, &config, 500);

        let started: Vec<Vec2> = events
            .iter()
            .filter_map(|e| match e.data {
                SimEventData::TaskStarted { target, .. } => Some(target),
                _ => None,
            })
            .collect();
        assert_eq!(started, vec![Vec2::new(0.1, 0.0), Vec2::new(0.1, 0.1), Vec2::new(0.0, 0.1)]);
        assert_eq!(state.motion.completed_tasks(), 3);
        assert_eq!(state.agent.position, Vec2::new(0.0, 0.1));
    }

    #[test]
    fn test_completion_and_next_start_share_a_tick() {
        let config = TickConfig::default();
        let mut state = arena();
        state.enqueue(MotionTask::to(0.01, 0.0));
        state.enqueue(MotionTask::to(0.5, 0.0));

        // Tick 1 arms the first task
        let first = tick(&mut state, ScoreState::default(), &config);
        assert!(first.task_started);

        // Tick 2 finishes it and arms the next
        let second = tick(&mut state, first.score, &config);
        assert!(second.task_completed);
        assert!(second.task_started);
        assert_eq!(state.queue.len(), 0);
        assert!(state.motion.is_active());
    }

    #[test]
    fn test_noop_task_does_not_block_queue() {
        let config = TickConfig::default();
        let mut state = arena();
        state.enqueue(MotionTask::to(0.0, 0.0));
        state.enqueue(MotionTask::to(0.2, 0.0));

        let first = tick(&mut state, ScoreState::default(), &config);
        assert!(first.task_started);
        assert!(!state.motion.is_active());

        let second = tick(&mut state, first.score, &config);
        assert!(second.task_started);
        assert!(state.motion.is_active());
    }

    #[test]
    fn test_capture_event_carries_running_total() {
        let config = TickConfig::default();
        let mut state = arena();
        state.insert_object(MovableObject::new(ObjectId(0), "BALL_0", "SteelBall", Vec2::new(0.05, 0.0), 0.011));
        state.insert_object(MovableObject::new(ObjectId(1), "BALL_1", "SteelBall", Vec2::new(0.06, 0.01), 0.011));

        let result = tick(&mut state, ScoreState::default(), &config);
        let totals: Vec<u32> = result
            .events
            .iter()
            .filter_map(|e| match e.data {
                SimEventData::ObjectCaptured { new_score, .. } => Some(new_score),
                _ => None,
            })
            .collect();
        assert_eq!(totals, vec![1, 2]);
        assert_eq!(result.score.total(), 2);
    }
}
