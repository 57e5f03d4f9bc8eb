//! Completing a coded-segment prediction with its tail bits.

use tracing::{debug, info, warn};

use crate::{
    error::Result,
    oracle::{DecapsulationOracle, Session},
    params::SchemeParams,
    patterns::{Pattern, PatternCatalog},
    vector::SecretVector,
};

/// Outcome of a resolver run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The first pattern whose completed vector decapsulates correctly.
    Found {
        /// The accepted tail hypothesis.
        pattern: Pattern,
        /// Its position in catalog order.
        index: usize,
    },
    /// No pattern within the weight budget or the test limit matched.
    Unresolved {
        /// Patterns checked against the oracle.
        tested: usize,
    },
}

/// Tests tail hypotheses against a known-error decapsulation.
pub struct TailResolver<'c> {
    params: SchemeParams,
    catalog: &'c PatternCatalog,
    limit: u64,
}

impl<'c> TailResolver<'c> {
    /// Resolver over `catalog` for vectors shaped by `params`.
    pub fn new(params: SchemeParams, catalog: &'c PatternCatalog) -> Self {
        Self {
            params,
            catalog,
            limit: u64::MAX,
        }
    }

    /// Give up after `limit` known-error decapsulations.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Try every pattern in catalog order on top of `baseline`.
    ///
    /// A fresh encapsulation provides the reference shared secret. Patterns
    /// heavier than the weight the baseline leaves free are never tried; since
    /// the catalog is sorted by weight the search stops at the first one.
    pub fn resolve<O: DecapsulationOracle>(
        &self,
        session: &mut Session<'_, O>,
        pk: &O::PublicKey,
        baseline: &SecretVector,
    ) -> Result<Resolution> {
        let (ct, expected) = session.oracle().encapsulate(pk);
        let budget = self.params.omega.saturating_sub(baseline.weight());
        let tail_start = self.params.n1n2();
        info!(
            baseline_weight = baseline.weight(),
            budget,
            catalog = self.catalog.len(),
            limit = self.limit,
            "resolving tail"
        );

        let mut tested = 0;
        for (index, pattern) in self.catalog.iter().enumerate() {
            if pattern.weight() > budget {
                break;
            }
            if tested as u64 >= self.limit {
                warn!(tested, "pattern test limit reached");
                break;
            }
            let candidate = pattern.apply(baseline, tail_start);
            tested += 1;
            if session.verify(&ct, pk, &candidate)? == expected {
                debug!(index, weight = pattern.weight(), "tail pattern accepted");
                return Ok(Resolution::Found { pattern, index });
            }
        }
        Ok(Resolution::Unresolved { tested })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::SimulatedOracle;

    const SMALL: SchemeParams = SchemeParams {
        n: 1030,
        n1: 8,
        n2: 128,
        omega: 12,
        delta: 2,
    };

    #[test]
    fn finds_forced_tail_in_exhaustive_catalog() {
        let mut oracle = SimulatedOracle::builder(SMALL)
            .tail_pattern(vec![1, 5])
            .seed(8)
            .build()
            .unwrap();
        let (pk, sk) = oracle.keypair();
        let y = oracle.reveal_secret(&sk);
        let baseline = y.resized(SMALL.n1n2()).resized(SMALL.n);
        let catalog = PatternCatalog::exhaustive(SMALL.tail_len(), SMALL.tail_len());

        let mut session = Session::new(&mut oracle, &sk);
        let outcome = TailResolver::new(SMALL, &catalog)
            .resolve(&mut session, &pk, &baseline)
            .unwrap();
        // empty, six singletons, five pairs from 0, then (1,2), (1,3), (1,4), (1,5)
        let Resolution::Found { pattern, index } = outcome else {
            panic!("tail not found: {outcome:?}");
        };
        assert_eq!(pattern.offsets(), &[1, 5]);
        assert_eq!(index, 1 + 6 + 5 + 3);
        assert_eq!(session.verifications(), index as u64 + 1);
        assert_eq!(pattern.apply(&baseline, SMALL.n1n2()), y);
    }

    #[test]
    fn weight_budget_prunes_the_search() {
        let mut oracle = SimulatedOracle::builder(SMALL)
            .tail_pattern(vec![0, 2])
            .seed(9)
            .build()
            .unwrap();
        let (pk, sk) = oracle.keypair();
        let mut baseline = oracle.reveal_secret(&sk).resized(SMALL.n1n2());
        // one extra wrong bit leaves room for a single tail bit only
        let spare = (0..SMALL.n1n2()).find(|&i| !baseline.get(i)).unwrap();
        baseline.set(spare, true);
        let baseline = baseline.resized(SMALL.n);

        let catalog = PatternCatalog::exhaustive(SMALL.tail_len(), SMALL.tail_len());
        let mut session = Session::new(&mut oracle, &sk);
        let outcome = TailResolver::new(SMALL, &catalog)
            .resolve(&mut session, &pk, &baseline)
            .unwrap();
        assert_eq!(outcome, Resolution::Unresolved { tested: 7 });
    }

    #[test]
    fn test_limit_bounds_a_huge_catalog() {
        let mut oracle = SimulatedOracle::builder(SchemeParams::HQC5)
            .tail_pattern(vec![4])
            .seed(10)
            .build()
            .unwrap();
        let (pk, sk) = oracle.keypair();
        // drop twenty coded errors so nothing in the catalog can match
        let coded = oracle.reveal_secret(&sk).resized(SchemeParams::HQC5.n1n2());
        let kept: Vec<usize> = coded.support().into_iter().skip(20).collect();
        let baseline = SecretVector::from_support(SchemeParams::HQC5.n, &kept);

        let tail = SchemeParams::HQC5.tail_len();
        let catalog = PatternCatalog::exhaustive(tail, tail);
        assert_eq!(catalog.len(), 1 << 37);
        let mut session = Session::new(&mut oracle, &sk);
        let outcome = TailResolver::new(SchemeParams::HQC5, &catalog)
            .with_limit(50)
            .resolve(&mut session, &pk, &baseline)
            .unwrap();
        assert_eq!(outcome, Resolution::Unresolved { tested: 50 });
        assert_eq!(session.verifications(), 50);
    }
}
