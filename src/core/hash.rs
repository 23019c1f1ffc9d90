//! Layout Fingerprints
//!
//! Deterministic SHA-256 hashing of positions and arena state, used to
//! compare two runs with the same seed without diffing coordinate lists.

use sha2::{Sha256, Digest};

use super::vec2::Vec2;

/// Hash output type (256 bits / 32 bytes)
pub type StateHash = [u8; 32];

/// Deterministic hasher for simulation state.
///
/// Wraps SHA-256 with helpers for the crate's value types.
/// Order of updates is significant.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for an object layout.
    pub fn for_layout() -> Self {
        Self::new(b"SWEEPBOT_LAYOUT_V1")
    }

    /// Create hasher for a full arena snapshot.
    pub fn for_arena_state() -> Self {
        Self::new(b"SWEEPBOT_ARENA_V1")
    }

    /// Update with raw bytes.
    #[inline]
    pub fn update_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with an f64 by its exact bit pattern.
    #[inline]
    pub fn update_f64(&mut self, value: f64) {
        self.update_u64(value.to_bits());
    }

    /// Update with a Vec2.
    #[inline]
    pub fn update_vec2(&mut self, value: Vec2) {
        self.update_f64(value.x);
        self.update_f64(value.y);
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// Fingerprint an ordered list of positions.
pub fn hash_positions<'a, I>(positions: I) -> StateHash
where
    I: IntoIterator<Item = &'a Vec2>,
{
    let mut hasher = StateHasher::for_layout();
    for position in positions {
        hasher.update_vec2(*position);
    }
    hasher.finalize()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_hasher_determinism() {
        let make_hash = || {
            let mut hasher = StateHasher::for_arena_state();
            hasher.update_u32(100);
            hasher.update_u64(12345);
            hasher.update_f64(5.5);
            hasher.update_vec2(Vec2::new(1.0, 2.0));
            hasher.update_bool(true);
            hasher.finalize()
        };

        assert_eq!(make_hash(), make_hash());
    }

    #[test]
    fn test_hash_order_matters() {
        let a = Vec2::new(0.1, 0.2);
        let b = Vec2::new(0.3, 0.4);
        assert_ne!(hash_positions(&[a, b]), hash_positions(&[b, a]));
    }

    #[test]
    fn test_domain_separation() {
        let mut layout = StateHasher::for_layout();
        let mut arena = StateHasher::for_arena_state();
        layout.update_u32(1);
        arena.update_u32(1);
        assert_ne!(layout.finalize(), arena.finalize());
    }

    #[test]
    fn test_hash_sees_tiny_differences() {
        let a = [Vec2::new(0.1, 0.2)];
        let b = [Vec2::new(0.1, 0.2 + f64::EPSILON)];
        assert_ne!(hash_positions(&a), hash_positions(&b));
    }
}
