//! Motion State Machine
//!
//! Non-blocking pose controller. A task is armed with [`MotionController::start`]
//! and advanced by exactly one tick per [`MotionController::update`] call, with
//! independent linear and angular rate limits.
//!
//! ## Phases
//!
//! - `RotateOnly`: target position already reached, turn to the requested heading.
//! - `RotateThenMove`: no heading requested; face the target, then drive straight.
//! - `MoveAndRotate`: drive straight while interpolating heading by progress.

use serde::{Serialize, Deserialize};

use crate::core::geometry::{Pose, bearing, lerp_angle, shortest_angular_delta};
use crate::core::vec2::{Vec2, ZERO_LENGTH_EPSILON};

/// Speeds and tolerances for the motion controller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Default translation speed (m/s)
    pub linear_speed: f64,
    /// Default turn rate (rad/s)
    pub angular_speed: f64,
    /// Heading error treated as converged (rad)
    pub heading_tolerance: f64,
    /// Target distance treated as "already there" (m)
    pub arrival_epsilon: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            linear_speed: 1.0,
            angular_speed: 3.0,
            heading_tolerance: 1e-3,
            arrival_epsilon: 1e-6,
        }
    }
}

/// One navigation goal.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MotionTask {
    /// Target position in the arena plane
    pub target: Vec2,
    /// Final heading; `None` means face the target, then drive
    pub heading: Option<f64>,
    /// Linear speed override (m/s)
    pub linear_speed: Option<f64>,
    /// Angular speed override (rad/s)
    pub angular_speed: Option<f64>,
}

impl MotionTask {
    /// Drive to `(x, y)` with default speeds, facing the target first.
    pub fn to(x: f64, y: f64) -> Self {
        Self {
            target: Vec2::new(x, y),
            heading: None,
            linear_speed: None,
            angular_speed: None,
        }
    }

    /// Require a final heading.
    pub fn with_heading(mut self, heading: f64) -> Self {
        self.heading = Some(heading);
        self
    }

    /// Override the linear speed.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.linear_speed = Some(speed);
        self
    }
}

/// Controller phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionPhase {
    /// No task armed
    Idle,
    /// Turn in place to the target heading
    RotateOnly,
    /// Turn to face the target, then translate without turning
    RotateThenMove {
        /// Heading has converged and translation is under way
        facing: bool,
    },
    /// Translate and turn concurrently
    MoveAndRotate,
}

/// Coarse controller status, as published to the status file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionStatus {
    /// Nothing has run yet
    Idle,
    /// A task is in progress
    Moving,
    /// The last task finished and nothing replaced it
    Reached,
}

impl MotionStatus {
    /// Token written to the status file.
    pub fn as_token(self) -> &'static str {
        match self {
            MotionStatus::Idle => "idle",
            MotionStatus::Moving => "moving",
            MotionStatus::Reached => "reached",
        }
    }
}

/// Incremental pose controller. One per agent, re-armed by every task.
#[derive(Clone, Debug)]
pub struct MotionController {
    config: MotionConfig,
    phase: MotionPhase,
    start: Pose,
    target: Pose,
    /// Unit direction fixed at `start`
    direction: Vec2,
    total_distance: f64,
    traveled: f64,
    linear_speed: f64,
    angular_speed: f64,
    completed_tasks: u64,
}

impl MotionController {
    /// Create an idle controller.
    pub fn new(config: MotionConfig) -> Self {
        let linear_speed = config.linear_speed;
        let angular_speed = config.angular_speed;
        Self {
            config,
            phase: MotionPhase::Idle,
            start: Pose::default(),
            target: Pose::default(),
            direction: Vec2::ZERO,
            total_distance: 0.0,
            traveled: 0.0,
            linear_speed,
            angular_speed,
            completed_tasks: 0,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> MotionPhase {
        self.phase
    }

    /// A task is armed.
    pub fn is_active(&self) -> bool {
        self.phase != MotionPhase::Idle
    }

    /// Target pose of the armed (or last) task.
    pub fn target(&self) -> &Pose {
        &self.target
    }

    /// Distance covered so far by the translation phase.
    pub fn traveled(&self) -> f64 {
        self.traveled
    }

    /// Straight-line distance planned at `start`.
    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    /// Number of tasks that ran to completion.
    pub fn completed_tasks(&self) -> u64 {
        self.completed_tasks
    }

    /// Status token for telemetry.
    pub fn status(&self) -> MotionStatus {
        if self.is_active() {
            MotionStatus::Moving
        } else if self.completed_tasks > 0 {
            MotionStatus::Reached
        } else {
            MotionStatus::Idle
        }
    }

    /// Arm a task from the current pose. Does not move the pose.
    ///
    /// Returns the phase entered; `Idle` when the agent already sits on the
    /// target and no heading was requested.
    pub fn start(&mut self, current: &Pose, task: &MotionTask) -> MotionPhase {
        let target_position = task.target;
        let delta = target_position - current.position;
        let distance = delta.length();

        self.start = *current;
        self.target = Pose {
            position: target_position,
            z: current.z,
            heading: current.heading,
        };
        self.linear_speed = positive_or(task.linear_speed, self.config.linear_speed);
        self.angular_speed = positive_or(task.angular_speed, self.config.angular_speed);
        self.total_distance = if distance.is_finite() { distance } else { 0.0 };
        self.traveled = 0.0;
        self.direction = if distance > ZERO_LENGTH_EPSILON {
            delta.scale(1.0 / distance)
        } else {
            Vec2::ZERO
        };

        let arrived = distance.is_nan() || distance <= self.config.arrival_epsilon;
        self.phase = if arrived {
            match task.heading {
                None => MotionPhase::Idle,
                Some(heading) => {
                    self.target.set_heading(heading);
                    MotionPhase::RotateOnly
                }
            }
        } else {
            match task.heading {
                None => {
                    self.target.set_heading(bearing(current.position, target_position));
                    MotionPhase::RotateThenMove { facing: false }
                }
                Some(heading) => {
                    self.target.set_heading(heading);
                    MotionPhase::MoveAndRotate
                }
            }
        };

        self.phase
    }

    /// Advance one tick of `dt` seconds, writing the new pose in place.
    ///
    /// Returns `true` when the task completed on this call or the controller
    /// was already idle.
    pub fn update(&mut self, pose: &mut Pose, dt: f64) -> bool {
        let step_distance = self.linear_speed * dt;

        match self.phase {
            MotionPhase::Idle => true,
            MotionPhase::RotateOnly => {
                if self.step_rotate(pose, dt) {
                    self.finish();
                    return true;
                }
                false
            }
            MotionPhase::RotateThenMove { facing } => {
                if !facing {
                    if !self.step_rotate(pose, dt) {
                        return false;
                    }
                    self.phase = MotionPhase::RotateThenMove { facing: true };
                }

                let remaining = pose.position.distance(self.target.position);
                if remaining <= step_distance {
                    pose.position = self.target.position;
                    self.traveled = self.total_distance;
                    self.finish();
                    return true;
                }
                pose.position = pose.position + self.direction.scale(step_distance);
                self.traveled += step_distance;
                false
            }
            MotionPhase::MoveAndRotate => {
                let remaining = pose.position.distance(self.target.position);
                if remaining <= step_distance {
                    pose.position = self.target.position;
                    pose.set_heading(self.target.heading);
                    self.traveled = self.total_distance;
                    self.finish();
                    return true;
                }
                pose.position = pose.position + self.direction.scale(step_distance);
                self.traveled += step_distance;
                let progress = if self.total_distance > ZERO_LENGTH_EPSILON {
                    (self.traveled / self.total_distance).clamp(0.0, 1.0)
                } else {
                    1.0
                };
                pose.set_heading(lerp_angle(self.start.heading, self.target.heading, progress));
                false
            }
        }
    }

    /// Drop the armed task. The pose stays wherever the last update left it.
    pub fn cancel(&mut self) {
        self.phase = MotionPhase::Idle;
    }

    /// Cancel and forget completed tasks, so `status()` reads `Idle` again.
    pub fn reset(&mut self) {
        self.cancel();
        self.completed_tasks = 0;
    }

    /// One rate-limited turn towards the target heading; `true` once converged.
    fn step_rotate(&self, pose: &mut Pose, dt: f64) -> bool {
        let remaining = shortest_angular_delta(self.target.heading, pose.heading);
        if remaining.abs() <= self.config.heading_tolerance {
            pose.set_heading(self.target.heading);
            return true;
        }
        let step = remaining.abs().min(self.angular_speed * dt);
        pose.set_heading(pose.heading + step.copysign(remaining));
        false
    }

    fn finish(&mut self) {
        self.phase = MotionPhase::Idle;
        self.completed_tasks += 1;
    }
}

fn positive_or(value: Option<f64>, fallback: f64) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => fallback,
    }
}

// =============================================================================
// TESTS
// =============================================================================
