//! Stochastic inputs and fragmentations for test variations
//!
//! Uses seeded RNG for reproducibility. Print seed on failure for replay.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seeded generator for reproducible stochastic tests
pub struct Gen {
    pub rng: StdRng,
    pub seed: u64,
}

impl Gen {
    /// Create with specific seed (for reproduction)
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed), seed }
    }

    /// Create from `LLFEED_TEST_SEED` or a random seed
    pub fn from_env_or_random() -> Self {
        let seed = std::env::var("LLFEED_TEST_SEED")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(rand::random);
        Self::new(seed)
    }

    /// Geometric distribution: count until rand > alpha
    pub fn geometric(&mut self, alpha: f64) -> usize {
        let mut n = 0;
        while self.rng.gen::<f64>() < alpha {
            n += 1;
        }
        n
    }

    /// Random boolean with probability p
    pub fn chance(&mut self, p: f64) -> bool {
        self.rng.gen::<f64>() < p
    }

    /// Plain text: letters, spaces and line terminators
    pub fn text(&mut self) -> Vec<u8> {
        let chars = b"abcdefghijklmnopqrstuvwxyz \r\n";
        let len = self.geometric(0.9);
        (0..len).map(|_| chars[self.rng.gen_range(0..chars.len())]).collect()
    }

    /// Text sprinkled with marks (`;`) and pauses (`!`), never an error
    pub fn input(&mut self) -> Vec<u8> {
        let mut out = self.text();
        for _ in 0..self.geometric(0.7) {
            out.push(if self.chance(0.5) { b';' } else { b'!' });
            out.extend(self.text());
        }
        out
    }

    /// Random chunk lengths covering exactly `len` bytes
    pub fn plan(&mut self, len: usize) -> Vec<usize> {
        let mut lengths = Vec::new();
        let mut left = len;
        while left > 0 {
            let n = (1 + self.geometric(0.6)).min(left);
            lengths.push(n);
            left -= n;
        }
        lengths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reproducibility() {
        let mut g1 = Gen::new(42);
        let mut g2 = Gen::new(42);

        for _ in 0..10 {
            assert_eq!(g1.input(), g2.input());
            assert_eq!(g1.plan(17), g2.plan(17));
        }
    }

    #[test]
    fn test_plan_covers_len() {
        let mut gen = Gen::new(7);
        for len in 0..50 {
            let plan = gen.plan(len);
            assert_eq!(plan.iter().sum::<usize>(), len);
            assert!(plan.iter().all(|&n| n > 0));
        }
    }
}
