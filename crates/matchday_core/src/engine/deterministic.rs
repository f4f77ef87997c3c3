//! Deterministic selection and the injectable match RNG.
//!
//! Two sources of variation exist in the engine and both replay exactly:
//!
//! 1. `MatchRng` - a seeded ChaCha8 stream for probability rolls that are
//!    consumed once in tick order (fouls, cards, shot accuracy).
//! 2. Hash-based choice keyed on (seed, tick, actor, subcase) for values
//!    that may be recomputed several times within a tick and must not
//!    drift between recomputations (stoppage jitter, formation gates).
//!
//! DefaultHasher is not stable across Rust versions, so the hash side uses
//! FxHasher.

use fxhash::FxHasher;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::hash::{Hash, Hasher};

/// Subcase constants, one per decision site so sites never collide.
pub mod subcase {
    /// Stoppage-time jitter for a half.
    pub const STOPPAGE_JITTER: u32 = 0x0100;
    /// Late-match formation-change probability gate.
    pub const FORMATION_GATE: u32 = 0x0200;
    /// Kick direction scatter when a pass has no target.
    pub const LOOSE_KICK_ANGLE: u32 = 0x0300;
}

/// Pick an index in `0..options_count` deterministically.
#[inline]
pub fn deterministic_choice(
    seed: u64,
    tick: u64,
    actor_idx: usize,
    subcase: u32,
    options_count: usize,
) -> usize {
    if options_count <= 1 {
        return 0;
    }
    let mut hasher = FxHasher::default();
    seed.hash(&mut hasher);
    tick.hash(&mut hasher);
    actor_idx.hash(&mut hasher);
    subcase.hash(&mut hasher);
    (hasher.finish() as usize) % options_count
}

/// Pick an f32 in `[min, max)` deterministically.
#[inline]
pub fn deterministic_f32(
    seed: u64,
    tick: u64,
    actor_idx: usize,
    subcase: u32,
    min: f32,
    max: f32,
) -> f32 {
    let mut hasher = FxHasher::default();
    seed.hash(&mut hasher);
    tick.hash(&mut hasher);
    actor_idx.hash(&mut hasher);
    subcase.hash(&mut hasher);
    let t = (hasher.finish() as f64) / (u64::MAX as f64);
    min + (max - min) * (t as f32)
}

/// Deterministic bool that is true with the given probability.
#[inline]
pub fn deterministic_bool(
    seed: u64,
    tick: u64,
    actor_idx: usize,
    subcase: u32,
    probability: f32,
) -> bool {
    deterministic_f32(seed, tick, actor_idx, subcase, 0.0, 1.0) < probability
}

/// Seeded RNG handed to every subsystem that rolls probabilities.
///
/// Production wiring seeds it from entropy; tests seed it with a constant
/// and replay fixed sequences.
#[derive(Debug, Clone)]
pub struct MatchRng {
    rng: ChaCha8Rng,
}

impl MatchRng {
    pub fn seeded(seed: u64) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(seed) }
    }

    pub fn from_entropy() -> Self {
        Self { rng: ChaCha8Rng::from_entropy() }
    }

    /// True with probability `p` (clamped to [0,1]).
    pub fn chance(&mut self, p: f32) -> bool {
        self.rng.gen::<f32>() < p.clamp(0.0, 1.0)
    }

    pub fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..max)
    }

    pub fn pick<'a, T>(&mut self, options: &'a [T]) -> Option<&'a T> {
        if options.is_empty() {
            return None;
        }
        let idx = self.rng.gen_range(0..options.len());
        Some(&options[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choice_is_stable() {
        let a = deterministic_choice(42, 100, 5, subcase::FORMATION_GATE, 10);
        let b = deterministic_choice(42, 100, 5, subcase::FORMATION_GATE, 10);
        assert_eq!(a, b);
    }

    #[test]
    fn choice_stays_in_range() {
        for options in 1..20 {
            let idx = deterministic_choice(42, 7, 3, subcase::STOPPAGE_JITTER, options);
            assert!(idx < options.max(1));
        }
    }

    #[test]
    fn f32_stays_in_range() {
        for tick in 0..200 {
            let v = deterministic_f32(9, tick, 1, subcase::STOPPAGE_JITTER, 0.0, 1.5);
            assert!((0.0..1.5).contains(&v));
        }
    }

    #[test]
    fn bool_extremes() {
        assert!(!deterministic_bool(1, 2, 3, subcase::FORMATION_GATE, 0.0));
        assert!(deterministic_bool(1, 2, 3, subcase::FORMATION_GATE, 1.0));
    }

    #[test]
    fn seeded_rng_replays() {
        let mut a = MatchRng::seeded(77);
        let mut b = MatchRng::seeded(77);
        for _ in 0..50 {
            assert_eq!(a.range_f32(0.0, 1.0), b.range_f32(0.0, 1.0));
        }
    }

    #[test]
    fn chance_extremes() {
        let mut rng = MatchRng::seeded(1);
        assert!(!rng.chance(0.0));
        assert!(rng.chance(1.0));
    }

    #[test]
    fn pick_empty_is_none() {
        let mut rng = MatchRng::seeded(1);
        let empty: [u8; 0] = [];
        assert!(rng.pick(&empty).is_none());
    }
}
