//! Supervisor Loop
//!
//! Owns a [`SimulationHost`] and drives the pure tick against it:
//!
//! ```text
//! host.step() ─► pull agent + live objects ─► poll injection (if idle)
//!      ▲                                            │
//!      │                                            ▼
//! telemetry ◄── push agent pose + captures ◄── sim::tick()
//! ```
//!
//! Exactly one host step per tick. The loop ends on the host's shutdown
//! sentinel; nothing else stops it once it is running.

use tracing::{debug, error, info, instrument, warn};

use crate::config::SupervisorConfig;
use crate::core::geometry::Pose;
use crate::core::hash::StateHash;
use crate::core::vec2::Vec2;
use crate::host::{SimulationHost, StepOutcome};
use crate::interchange::injection::InjectionReader;
use crate::interchange::telemetry::{TelemetrySnapshot, TelemetryWriter};
use crate::sim::events::{SimEvent, SimEventData};
use crate::sim::motion::MotionStatus;
use crate::sim::placement::{PlacementReport, PlacementTier, place_uniform};
use crate::sim::state::{ArenaState, MovableObject, ObjectId, ScoreState};
use crate::sim::tick::{TickConfig, TickResult, start_next_task, tick};
use crate::sim::waypoint::{Waypoint, default_patrol_route};

/// Supervisor errors.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    /// The configured agent entity does not exist on the host.
    #[error("agent entity `{0}` not found on host")]
    AgentMissing(String),
}

/// Totals after [`Supervisor::run`] returns.
#[derive(Clone, Debug)]
pub struct RunSummary {
    /// Ticks executed
    pub ticks: u64,
    /// Simulated seconds at shutdown
    pub elapsed: f64,
    /// Final counters
    pub score: ScoreState,
    /// Objects still live
    pub live_objects: usize,
    /// Arena fingerprint at shutdown
    pub final_hash: StateHash,
}

/// Host-synchronizing driver around [`tick`].
pub struct Supervisor<H: SimulationHost> {
    host: H,
    config: SupervisorConfig,
    tick_config: TickConfig,
    route: Vec<Waypoint>,
    state: ArenaState,
    score: ScoreState,
    telemetry: TelemetryWriter,
    injection: InjectionReader,
    layout: Option<PlacementReport>,
    last_status: MotionStatus,
}

impl<H: SimulationHost> Supervisor<H> {
    /// Bind to `host`. Fails only if the agent entity is missing.
    pub fn new(host: H, config: SupervisorConfig) -> Result<Self, SupervisorError> {
        let agent = read_pose(&host, &config.agent_name).ok_or_else(|| {
            error!(agent = %config.agent_name, "agent entity not found");
            SupervisorError::AgentMissing(config.agent_name.clone())
        })?;

        let tick_config = TickConfig {
            dt: host.time_step(),
            capture: config.capture.clone(),
        };
        let route = config.waypoints.clone().unwrap_or_else(default_patrol_route);
        let mut state = ArenaState::new(agent, config.motion.clone());
        state.queue.extend(route.iter().map(|wp| wp.to_task()));

        info!(
            agent = %config.agent_name,
            dt = tick_config.dt,
            waypoints = route.len(),
            balls = config.ball_count,
            "supervisor bound to host"
        );

        Ok(Self {
            telemetry: TelemetryWriter::new(config.telemetry.clone()),
            injection: InjectionReader::new(config.injection.clone()),
            host,
            tick_config,
            route,
            state,
            score: ScoreState::default(),
            layout: None,
            last_status: MotionStatus::Idle,
            config,
        })
    }

    /// Arena state.
    pub fn state(&self) -> &ArenaState {
        &self.state
    }

    /// Current counters.
    pub fn score(&self) -> ScoreState {
        self.score
    }

    /// The host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The host, mutably.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Last layout applied, if any.
    pub fn layout(&self) -> Option<&PlacementReport> {
        self.layout.as_ref()
    }

    /// Randomize the layout (if configured), register objects, arm the first
    /// task and publish initial telemetry.
    #[instrument(skip(self), fields(agent = %self.config.agent_name))]
    pub fn initialize(&mut self) -> Vec<SimEvent> {
        let randomize = self.config.randomize_on_start;
        self.setup(randomize)
    }

    fn setup(&mut self, randomize: bool) -> Vec<SimEvent> {
        let mut events = Vec::new();
        if randomize {
            events.extend(self.randomize_objects());
        }
        self.sync_objects();
        events.extend(start_next_task(&mut self.state));
        self.publish(true);
        info!(objects = self.state.objects.len(), queued = self.state.queue.len(), "initialized");
        events
    }

    /// Scatter every ball found on the host, then let physics settle.
    ///
    /// Missing balls are skipped. Returns one event per degraded placement.
    pub fn randomize_objects(&mut self) -> Vec<SimEvent> {
        let placement = &self.config.placement;
        let names: Vec<String> = (0..self.config.ball_count)
            .map(|i| ObjectId(i).entity_name(&self.config.ball_prefix))
            .filter(|name| {
                let found = self.host.has_entity(name);
                if !found {
                    warn!(entity = %name, "ball not found, skipping");
                }
                found
            })
            .collect();

        let report = place_uniform(names.len(), placement, placement.seed);
        let z = placement.rest_height(placement.object_radius);
        for (name, placed) in names.iter().zip(&report.placements) {
            self.host.set_translation(name, [placed.position.x, placed.position.y, z]);
            self.host.reset_physics(name);
        }

        let settle = placement.settle_steps(self.host.time_step());
        for _ in 0..settle {
            if self.host.step() == StepOutcome::Shutdown {
                break;
            }
        }

        info!(
            balls = report.placements.len(),
            seed = report.seed,
            no_overlap = placement.enforce_separation,
            fingerprint = %hex::encode(report.fingerprint()),
            settle_steps = settle,
            "randomized balls"
        );

        let events = report
            .degraded()
            .map(|p| SimEvent::placement_degraded(p.index, p.position, p.tier == PlacementTier::Forced))
            .collect();
        self.layout = Some(report);
        events
    }

    /// Put everything back: fresh layout, cleared captures and score, the
    /// configured route re-queued.
    ///
    /// Placement always runs with the configured seed, even when
    /// `randomize_on_start` is off.
    #[instrument(skip(self))]
    pub fn reset(&mut self) -> Vec<SimEvent> {
        self.state.motion.reset();
        self.state.queue.clear();
        self.state.queue.extend(self.route.iter().map(|wp| wp.to_task()));
        self.state.objects.clear();
        self.score = ScoreState::default();
        self.injection.reset();

        if let Some(agent) = read_pose(&self.host, &self.config.agent_name) {
            self.state.agent = agent;
        }
        let events = self.setup(true);
        info!("reset complete");
        events
    }

    /// One step of the loop. `None` once the host shuts down.
    pub fn run_tick(&mut self) -> Option<TickResult> {
        if self.host.step() == StepOutcome::Shutdown {
            return None;
        }

        self.pull();
        if !self.state.motion.is_active() {
            self.injection.poll_into(&mut self.state.queue);
        }

        let result = tick(&mut self.state, self.score, &self.tick_config);
        self.score = result.score;
        self.push(&result);
        self.log_events(&result);

        if let Some(distance) = result.nearest_distance {
            debug!(tick = self.state.tick, distance, "nearest live ball");
        }

        self.publish(false);
        Some(result)
    }

    /// Tick until the host shuts down.
    #[instrument(skip(self))]
    pub fn run(&mut self) -> RunSummary {
        let start_tick = self.state.tick;
        while self.run_tick().is_some() {}
        self.publish(true);

        let summary = RunSummary {
            ticks: self.state.tick - start_tick,
            elapsed: self.host.elapsed(),
            score: self.score,
            live_objects: self.state.live_count(),
            final_hash: self.state.compute_hash(),
        };
        info!(
            ticks = summary.ticks,
            elapsed = summary.elapsed,
            live = summary.live_objects,
            hash = %hex::encode(summary.final_hash),
            "host shut down; {}",
            summary.score
        );
        summary
    }

    /// Register balls seen for the first time and refresh live positions.
    /// Known balls the host no longer has are marked absent for this tick.
    fn sync_objects(&mut self) {
        for index in 0..self.config.ball_count {
            let id = ObjectId(index);
            let name = id.entity_name(&self.config.ball_prefix);
            let Some([x, y, z]) = self.host.translation(&name) else {
                if let Some(object) = self.state.objects.get_mut(&id) {
                    object.present = false;
                }
                continue;
            };

            match self.state.objects.get_mut(&id) {
                Some(object) if object.captured => {}
                Some(object) => {
                    object.position = Vec2::new(x, y);
                    object.z = z;
                    object.present = true;
                }
                None => {
                    let label = self.host.label(&name).unwrap_or_default();
                    self.state
                        .insert_object(MovableObject::new(id, name, label, Vec2::new(x, y), z));
                }
            }
        }
    }

    fn pull(&mut self) {
        if let Some(agent) = read_pose(&self.host, &self.config.agent_name) {
            self.state.agent = agent;
        }
        self.sync_objects();
    }

    fn push(&mut self, result: &TickResult) {
        let agent = self.state.agent;
        let name = &self.config.agent_name;
        self.host.set_translation(name, [agent.position.x, agent.position.y, agent.z]);
        self.host.set_heading(name, agent.heading);

        let holding = self.tick_config.capture.holding_point;
        for capture in &result.captures {
            self.host.set_translation(&capture.name, holding);
            self.host.reset_physics(&capture.name);
        }
    }

    fn log_events(&self, result: &TickResult) {
        for event in &result.events {
            match &event.data {
                SimEventData::ObjectCaptured { name, class, .. } => {
                    debug!(tick = event.tick, object = %name, %class, "absorbed");
                }
                SimEventData::TaskStarted { target, phase, queued, .. } => {
                    debug!(tick = event.tick, x = target.x, y = target.y, ?phase, queued, "next waypoint");
                }
                SimEventData::TaskCompleted { target, completed } => {
                    debug!(tick = event.tick, x = target.x, y = target.y, completed, "waypoint reached");
                }
                SimEventData::PlacementDegraded { .. } => {}
            }
        }
        if !result.captures.is_empty() {
            info!("{}", self.score);
        }
    }

    fn publish(&mut self, force: bool) {
        let status = self.state.motion.status();
        let snapshot = TelemetrySnapshot {
            time: self.host.elapsed(),
            agent: self.state.agent.position,
            status,
            objects: self
                .state
                .live_objects()
                .map(|o| (o.position, o.peek_class()))
                .collect(),
            score: self.score,
        };

        if force {
            self.telemetry.write_all(&snapshot);
        } else if !self.telemetry.on_tick(&snapshot) && status != self.last_status {
            self.telemetry.write_status(status);
        }
        self.last_status = status;
    }
}

fn read_pose<H: SimulationHost>(host: &H, name: &str) -> Option<Pose> {
    let [x, y, z] = host.translation(name)?;
    let heading = host.heading(name).unwrap_or(0.0);
    Some(Pose::new(x, y, z, heading))
}

// =============================================================================
// TESTS
// =============================================================================
