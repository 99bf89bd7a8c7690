//! Seed resolution and per-node seed derivation.
//!
//! Every leaf draws from `derive(base, id)`, so two leaves built from the same
//! sampler still produce different streams while each stays a pure function of
//! `(node, base seed)`.

use crate::store::NodeId;
use rand::Rng;

/// Exclusive upper bound of admissible seeds (`2^32 - 1`).
pub const MAX_SEED: u64 = (1 << 32) - 1;

/// Node-local seed: `(base + id) mod (2^32 - 1)`.
#[inline]
pub fn derive(base: u32, node: NodeId) -> u32 {
    ((base as u64 + node.seed_key()) % MAX_SEED) as u32
}

/// Resolves the base seed for one top-level call.
///
/// A supplied seed is reduced into the admissible range; `None` draws a fresh
/// seed from the thread-local CSPRNG.
pub fn resolve(seed: Option<u32>) -> u32 {
    match seed {
        Some(s) => (s as u64 % MAX_SEED) as u32,
        None => fresh(),
    }
}

pub fn fresh() -> u32 {
    rand::rng().random_range(0..MAX_SEED as u32)
}
