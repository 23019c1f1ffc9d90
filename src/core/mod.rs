//! Core primitives.
//!
//! Geometry, vector math, seeded randomness and state fingerprints. Nothing
//! in here knows about hosts, files or the tick loop.

pub mod vec2;
pub mod geometry;
pub mod rng;
pub mod hash;

// Re-export core types
pub use vec2::Vec2;
pub use geometry::{Pose, normalize_angle, shortest_angular_delta, world_to_local, local_to_world};
pub use rng::DeterministicRng;
pub use hash::{StateHash, StateHasher, hash_positions};
