//! # Sweepbot
//!
//! Tick-driven arena supervisor: drives one agent through a queue of target
//! poses, absorbs balls that enter its capture window, and scatters the
//! balls in a collision-free initial layout.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         SWEEPBOT                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Primitives                                │
//! │  ├── vec2.rs     - 2D vector (f64)                           │
//! │  ├── geometry.rs - Poses, angle wrapping, frame transforms   │
//! │  ├── rng.rs      - Seeded Xorshift128+ PRNG                  │
//! │  └── hash.rs     - SHA-256 layout/state fingerprints         │
//! │                                                              │
//! │  sim/            - Pure simulation (no host, no files)       │
//! │  ├── motion.rs   - Rate-limited pose controller              │
//! │  ├── capture.rs  - Agent-frame capture windows               │
//! │  ├── placement.rs- Rejection-sampling layouts                │
//! │  ├── state.rs    - Objects, score, arena state               │
//! │  └── tick.rs     - One simulation step                       │
//! │                                                              │
//! │  host/           - Simulator boundary + kinematic host       │
//! │  interchange/    - Telemetry, injection, scene files         │
//! │  supervisor.rs   - Host-synchronizing tick loop              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! With an explicit seed, placement is reproducible bit for bit, and the
//! `sim/` tick is a pure function of its inputs. Objects live in a BTreeMap
//! so every pass visits them in id order.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod sim;
pub mod host;
pub mod interchange;
pub mod config;
pub mod supervisor;

// Re-export commonly used types
pub use core::vec2::Vec2;
pub use core::geometry::Pose;
pub use core::rng::DeterministicRng;
pub use sim::state::{ArenaState, ObjectClass, ScoreState};
pub use sim::motion::{MotionController, MotionTask};
pub use config::SupervisorConfig;
pub use supervisor::{Supervisor, SupervisorError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the global `tracing` subscriber used by the binaries.
///
/// Verbosity comes from `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
}
