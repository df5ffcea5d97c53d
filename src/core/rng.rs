use bevy_ecs::prelude::*;

/// Seedable random source shared by the police and market systems.
///
/// All probability rolls go through this resource so encounter and deal
/// outcomes are reproducible under a fixed seed.
#[derive(Resource, Debug, Clone)]
pub struct RiskDice {
    state: u64,
}

impl RiskDice {
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed ^ 0x9E3779B97F4A7C15,
        }
    }

    /// Rebuild the stream from a previously captured raw state.
    pub fn from_state(state: u64) -> Self {
        Self { state }
    }

    /// Raw stream state, captured for save snapshots.
    pub fn state(&self) -> u64 {
        self.state
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1);
        self.state
    }

    /// Uniform draw in [0, 1).
    pub fn unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Single probability roll; p outside [0, 1] behaves as if clamped.
    pub fn chance(&mut self, p: f64) -> bool {
        self.unit() < p
    }

    /// Uniform draw in [lo, hi).
    pub fn range(&mut self, lo: f64, hi: f64) -> f64 {
        if hi <= lo {
            return lo;
        }
        lo + self.unit() * (hi - lo)
    }

    pub fn pick_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        (self.next_u64() % len as u64) as usize
    }

    /// Weighted choice over parallel weights; zero total falls back to a
    /// uniform pick.
    pub fn pick_weighted(&mut self, weights: &[u32]) -> usize {
        let total: u64 = weights.iter().map(|w| *w as u64).sum();
        if total == 0 {
            return self.pick_index(weights.len());
        }
        let mut roll = self.next_u64() % total;
        for (idx, weight) in weights.iter().enumerate() {
            let weight = *weight as u64;
            if roll < weight {
                return idx;
            }
            roll -= weight;
        }
        weights.len().saturating_sub(1)
    }
}
