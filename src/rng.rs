//! Seedable source of the random orders the attack probes in.

use core::ops::Range;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Produces block orders and bit orders for the driver and threshold search.
///
/// With a fixed seed every shuffle, and therefore every classification
/// outcome against a deterministic oracle, is reproducible.
pub struct PermutationSource {
    rng: ChaCha8Rng,
    seed: u64,
}

impl PermutationSource {
    /// Source seeded with `seed`.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Source seeded from the thread rng.
    pub fn from_entropy() -> Self {
        Self::from_seed(rand::rng().random())
    }

    /// The seed this source started from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// A uniformly shuffled copy of `range`.
    pub fn shuffled(&mut self, range: Range<usize>) -> Vec<usize> {
        let mut items: Vec<usize> = range.collect();
        self.shuffle(&mut items);
        items
    }

    /// Shuffle `items` in place.
    pub fn shuffle(&mut self, items: &mut [usize]) {
        items.shuffle(&mut self.rng);
    }
}
