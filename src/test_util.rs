use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic tiny RNG for repeatable tests
pub struct TestRng {
    rng: ChaCha8Rng,
}

impl TestRng {
    pub fn new() -> Self {
        Self::with_seed(0xdead_beef)
    }
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
    pub fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }
    pub fn gen_usize(&mut self, upper: usize) -> usize {
        (self.next_u32() as usize) % upper
    }
}

impl Default for TestRng {
    fn default() -> Self {
        Self::new()
    }
}
