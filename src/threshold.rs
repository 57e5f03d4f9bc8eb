//! Locating the decoding-failure boundary of one block.

use tracing::trace;

use crate::{
    error::Result,
    mutator::{CiphertextBuffer, FlipGuard},
    oracle::{DecapsulationOracle, Session, TimingClass},
};

/// Where the search stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Threshold {
    /// The class left the reference after the first `flips` positions of the order.
    Boundary {
        /// Number of positions flipped, including the one that crossed.
        flips: usize,
    },
    /// Every position was flipped without a confirmed class change.
    Exhausted,
}

/// Flip positions of a block one by one until decoding starts failing.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThresholdSearch {
    confirmations: u32,
}

impl ThresholdSearch {
    /// A search that re-queries `confirmations` times before accepting a class change.
    pub fn new(confirmations: u32) -> Self {
        Self { confirmations }
    }

    /// Flip `order` into `guard` one position at a time, querying after each.
    ///
    /// The flips stay applied when this returns; the caller's guard owns them.
    /// On [`Threshold::Boundary`] they are exactly `order[..flips]`.
    pub fn run<O: DecapsulationOracle>(
        &self,
        session: &mut Session<'_, O>,
        guard: &mut FlipGuard<'_>,
        order: &[usize],
        reference: TimingClass,
    ) -> Result<Threshold> {
        for (idx, &pos) in order.iter().enumerate() {
            guard.flip(pos);
            let class = session.timing_class(guard.ciphertext())?;
            if class != reference && self.confirm(session, guard.ciphertext(), reference)? {
                trace!(flips = idx + 1, "failure boundary");
                return Ok(Threshold::Boundary { flips: idx + 1 });
            }
        }
        Ok(Threshold::Exhausted)
    }

    /// A strict majority of the confirmation queries must also differ.
    fn confirm<O: DecapsulationOracle>(
        &self,
        session: &mut Session<'_, O>,
        ct: &CiphertextBuffer,
        reference: TimingClass,
    ) -> Result<bool> {
        if self.confirmations == 0 {
            return Ok(true);
        }
        let mut differ = 0;
        for _ in 0..self.confirmations {
            if session.timing_class(ct)? != reference {
                differ += 1;
            }
        }
        Ok(2 * differ > self.confirmations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SchemeParams;
    use crate::simulated::SimulatedOracle;

    const PARAMS: SchemeParams = SchemeParams {
        n: 1030,
        n1: 8,
        n2: 128,
        omega: 12,
        delta: 2,
    };

    #[test]
    fn boundary_matches_block_error_count() {
        let mut oracle = SimulatedOracle::builder(PARAMS)
            .radius(10)
            .seed(11)
            .build()
            .unwrap();
        let (pk, sk) = oracle.keypair();
        let y = oracle.reveal_secret(&sk);
        let m = oracle.random_message();
        let mut ct = oracle.probe_ciphertext(&pk, &m);
        let origin = oracle.codeword_region().start;
        let reference = oracle.message_timing(&pk, &m);
        let backup = ct.clone();

        let mut session = Session::new(&mut oracle, &sk);
        let mut guard = FlipGuard::new(&mut ct, origin);
        // corrupt delta blocks so the next failing block breaks decoding
        guard.flip_range(PARAMS.block(0));
        guard.flip_range(PARAMS.block(1));

        let block = PARAMS.block(5);
        let order: Vec<usize> = block.clone().collect();
        let mut probe = guard.nested();
        let outcome = ThresholdSearch::new(0)
            .run(&mut session, &mut probe, &order, reference)
            .unwrap();
        let Threshold::Boundary { flips } = outcome else {
            panic!("expected a boundary, got {outcome:?}");
        };

        // errors in the modified block exceed the radius exactly at the boundary
        let modified = |k: usize| {
            block
                .clone()
                .filter(|&i| y.get(i) != order[..k].contains(&i))
                .count()
        };
        assert_eq!(modified(flips), 11);
        assert!((1..flips).all(|k| modified(k) <= 10));
        drop(probe);
        drop(guard);
        assert_eq!(ct, backup);
    }

    #[test]
    fn class_change_persists_under_more_corruption() {
        let mut oracle = SimulatedOracle::builder(PARAMS)
            .radius(10)
            .seed(5)
            .build()
            .unwrap();
        let (pk, sk) = oracle.keypair();
        let y = oracle.reveal_secret(&sk);
        let m = oracle.random_message();
        let mut ct = oracle.probe_ciphertext(&pk, &m);
        let origin = oracle.codeword_region().start;
        let reference = oracle.message_timing(&pk, &m);

        let mut session = Session::new(&mut oracle, &sk);
        let mut guard = FlipGuard::new(&mut ct, origin);
        guard.flip_range(PARAMS.block(6));
        guard.flip_range(PARAMS.block(7));
        let order: Vec<usize> = PARAMS.block(2).collect();
        let outcome = ThresholdSearch::new(2)
            .run(&mut session, &mut guard, &order, reference)
            .unwrap();
        let Threshold::Boundary { flips } = outcome else {
            panic!("expected a boundary, got {outcome:?}");
        };

        // same corruption, same answer
        for _ in 0..5 {
            assert_ne!(session.timing_class(guard.ciphertext()).unwrap(), reference);
        }
        // further flips on clear positions keep decoding broken
        for &pos in order[flips..].iter().filter(|&&p| !y.get(p)).take(20) {
            guard.flip(pos);
            assert_ne!(session.timing_class(guard.ciphertext()).unwrap(), reference);
        }
    }

    #[test]
    fn uncorrupted_block_search_exhausts() {
        // without corrupted blocks one failing block stays within delta
        let mut oracle = SimulatedOracle::builder(PARAMS)
            .radius(10)
            .seed(3)
            .build()
            .unwrap();
        let (pk, sk) = oracle.keypair();
        let m = oracle.random_message();
        let mut ct = oracle.probe_ciphertext(&pk, &m);
        let origin = oracle.codeword_region().start;
        let reference = oracle.message_timing(&pk, &m);

        let mut session = Session::new(&mut oracle, &sk);
        let mut guard = FlipGuard::new(&mut ct, origin);
        let order: Vec<usize> = PARAMS.block(4).collect();
        let outcome = ThresholdSearch::default()
            .run(&mut session, &mut guard, &order, reference)
            .unwrap();
        assert_eq!(outcome, Threshold::Exhausted);
        assert_eq!(session.queries(), 128);
        assert_eq!(guard.flipped().len(), 128);
    }
}
