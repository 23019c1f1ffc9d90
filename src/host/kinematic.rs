//! In-process kinematic host.
//!
//! Entities are plain poses in a map; a step only advances the clock. Used
//! by the supervisor binary for headless runs and by the tests.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::host::{SimulationHost, StepOutcome};

/// Host parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Fixed step length (ms)
    pub time_step_ms: u32,
    /// Sleep so simulated time tracks wall time
    pub realtime: bool,
    /// Shut down after this many simulated seconds
    pub max_seconds: Option<f64>,
    /// Balls labelled as ping before the rest are labelled steel
    pub ping_count: u32,
    /// Steel balls after the ping ones
    pub steel_count: u32,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            time_step_ms: 32,
            realtime: true,
            max_seconds: None,
            ping_count: 16,
            steel_count: 24,
        }
    }
}

impl HostConfig {
    /// Step length in seconds.
    pub fn time_step(&self) -> f64 {
        f64::from(self.time_step_ms) / 1000.0
    }
}

#[derive(Clone, Debug)]
struct Entity {
    translation: [f64; 3],
    heading: f64,
    label: String,
    physics_resets: u32,
}

/// Map-backed host with a fixed clock.
pub struct KinematicHost {
    config: HostConfig,
    entities: BTreeMap<String, Entity>,
    steps: u64,
    stop: Arc<AtomicBool>,
    last_step: Option<Instant>,
}

impl KinematicHost {
    /// Empty host.
    pub fn new(config: HostConfig) -> Self {
        Self {
            config,
            entities: BTreeMap::new(),
            steps: 0,
            stop: Arc::new(AtomicBool::new(false)),
            last_step: None,
        }
    }

    /// Host holding the agent at `agent_start` and `ping_count + steel_count`
    /// balls named `<prefix><index>`, all parked at the origin until placed.
    pub fn arena(config: HostConfig, agent: &str, agent_start: [f64; 3], ball_prefix: &str) -> Self {
        let ping = config.ping_count;
        let total = config.ping_count + config.steel_count;
        let mut host = Self::new(config);
        host.insert_entity(agent, "Agent", agent_start, 0.0);
        for index in 0..total {
            let label = if index < ping { "PingBall" } else { "SteelBall" };
            host.insert_entity(&format!("{}{}", ball_prefix, index), label, [0.0, 0.0, 0.0], 0.0);
        }
        info!(entities = host.entities.len(), "kinematic arena ready");
        host
    }

    /// Add or replace an entity.
    pub fn insert_entity(&mut self, name: &str, label: &str, translation: [f64; 3], heading: f64) {
        self.entities.insert(
            name.to_string(),
            Entity {
                translation,
                heading,
                label: label.to_string(),
                physics_resets: 0,
            },
        );
    }

    /// Remove an entity.
    pub fn remove_entity(&mut self, name: &str) -> bool {
        self.entities.remove(name).is_some()
    }

    /// Flag that turns the next step into [`StepOutcome::Shutdown`].
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Steps taken so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// How many times `name` had its physics reset.
    pub fn physics_resets(&self, name: &str) -> u32 {
        self.entities.get(name).map_or(0, |e| e.physics_resets)
    }

    fn pace(&mut self) {
        let step = Duration::from_millis(u64::from(self.config.time_step_ms));
        if let Some(last) = self.last_step {
            let spent = last.elapsed();
            if spent < step {
                std::thread::sleep(step - spent);
            }
        }
        self.last_step = Some(Instant::now());
    }
}

impl SimulationHost for KinematicHost {
    fn step(&mut self) -> StepOutcome {
        if self.stop.load(Ordering::SeqCst) {
            debug!(steps = self.steps, "stop flag raised");
            return StepOutcome::Shutdown;
        }
        if let Some(limit) = self.config.max_seconds {
            if self.elapsed() >= limit {
                debug!(steps = self.steps, limit, "duration limit reached");
                return StepOutcome::Shutdown;
            }
        }
        if self.config.realtime {
            self.pace();
        }
        self.steps += 1;
        StepOutcome::Continue
    }

    fn time_step(&self) -> f64 {
        self.config.time_step()
    }

    fn elapsed(&self) -> f64 {
        self.steps as f64 * self.config.time_step()
    }

    fn translation(&self, name: &str) -> Option<[f64; 3]> {
        self.entities.get(name).map(|e| e.translation)
    }

    fn set_translation(&mut self, name: &str, translation: [f64; 3]) -> bool {
        match self.entities.get_mut(name) {
            Some(entity) => {
                entity.translation = translation;
                true
            }
            None => false,
        }
    }

    fn heading(&self, name: &str) -> Option<f64> {
        self.entities.get(name).map(|e| e.heading)
    }

    fn set_heading(&mut self, name: &str, heading: f64) -> bool {
        match self.entities.get_mut(name) {
            Some(entity) => {
                entity.heading = heading;
                true
            }
            None => false,
        }
    }

    fn label(&self, name: &str) -> Option<String> {
        self.entities.get(name).map(|e| e.label.clone())
    }

    fn reset_physics(&mut self, name: &str) -> bool {
        match self.entities.get_mut(name) {
            Some(entity) => {
                entity.physics_resets += 1;
                true
            }
            None => false,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
