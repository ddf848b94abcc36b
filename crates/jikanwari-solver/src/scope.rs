//! Search-level scope: clock, step counter and seeded randomness.

use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// State shared across one solver invocation.
///
/// The RNG is a ChaCha stream seeded exclusively from the caller's
/// `random_seed`: its output is stable across platforms and `rand`
/// releases, which is what makes solver runs reproducible.
pub struct SearchScope {
    start: Instant,
    rng: ChaCha8Rng,
    steps: u64,
}

impl SearchScope {
    pub fn new(seed: u64) -> Self {
        SearchScope {
            start: Instant::now(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            steps: 0,
        }
    }

    /// Replaces the RNG stream at a restart boundary.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn count_step(&mut self) {
        self.steps += 1;
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }
}
