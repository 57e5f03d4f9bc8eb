//! Hypotheses for the error bits in the tail segment.

use serde::Serialize;

use crate::vector::SecretVector;

/// A set of tail-relative offsets hypothesised to be the tail's error bits.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Pattern {
    offsets: Vec<usize>,
}

impl Pattern {
    /// Pattern over `offsets`; order and duplicates in the input are irrelevant.
    pub fn new(mut offsets: Vec<usize>) -> Self {
        offsets.sort_unstable();
        offsets.dedup();
        Self { offsets }
    }

    /// Tail-relative offsets, ascending.
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Number of hypothesised error bits.
    pub fn weight(&self) -> usize {
        self.offsets.len()
    }

    /// `base` with the pattern XORed into the tail that starts at bit `tail_start`.
    pub fn apply(&self, base: &SecretVector, tail_start: usize) -> SecretVector {
        let mut v = base.clone();
        for &o in &self.offsets {
            v.flip(tail_start + o);
        }
        v
    }
}

/// Ordered, read-only collection of patterns, lightest first.
#[derive(Clone, Debug)]
pub enum PatternCatalog {
    /// Every subset of a `tail_len`-bit tail of weight at most `max_weight`,
    /// by weight and then lexicographically. Generated lazily.
    Exhaustive {
        /// Bits in the tail.
        tail_len: usize,
        /// Heaviest pattern produced.
        max_weight: usize,
    },
    /// An explicit list, stably sorted by weight.
    Listed(Vec<Pattern>),
}

impl PatternCatalog {
    /// All patterns of weight `0..=max_weight` over a tail of `tail_len` bits.
    pub fn exhaustive(tail_len: usize, max_weight: usize) -> Self {
        Self::Exhaustive {
            tail_len,
            max_weight: max_weight.min(tail_len),
        }
    }

    /// Catalog from explicit patterns. Equal weights keep their given order.
    pub fn from_patterns(mut patterns: Vec<Pattern>) -> Self {
        patterns.sort_by_key(Pattern::weight);
        Self::Listed(patterns)
    }

    /// Number of patterns, saturating at `u64::MAX`.
    pub fn len(&self) -> u64 {
        match self {
            Self::Exhaustive {
                tail_len,
                max_weight,
            } => (0..=*max_weight).fold(0u64, |acc, k| {
                acc.saturating_add(binomial(*tail_len as u64, k as u64))
            }),
            Self::Listed(list) => list.len() as u64,
        }
    }

    /// `true` when the catalog holds no pattern at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Patterns in catalog order.
    pub fn iter(&self) -> Patterns<'_> {
        let source = match self {
            Self::Exhaustive {
                tail_len,
                max_weight,
            } => Source::Exhaustive {
                tail_len: *tail_len,
                max_weight: *max_weight,
                next: Some(Vec::new()),
            },
            Self::Listed(list) => Source::Listed(list.iter()),
        };
        Patterns { source }
    }
}

/// Iterator over a [`PatternCatalog`].
pub struct Patterns<'a> {
    source: Source<'a>,
}

enum Source<'a> {
    Exhaustive {
        tail_len: usize,
        max_weight: usize,
        next: Option<Vec<usize>>,
    },
    Listed(core::slice::Iter<'a, Pattern>),
}

impl Iterator for Patterns<'_> {
    type Item = Pattern;

    fn next(&mut self) -> Option<Pattern> {
        match &mut self.source {
            Source::Listed(it) => it.next().cloned(),
            Source::Exhaustive {
                tail_len,
                max_weight,
                next,
            } => {
                let current = next.take()?;
                let mut succ = current.clone();
                if next_combination(&mut succ, *tail_len) {
                    *next = Some(succ);
                } else if current.len() < *max_weight {
                    *next = Some((0..current.len() + 1).collect());
                }
                Some(Pattern { offsets: current })
            }
        }
    }
}

/// Advance `comb` to the next ascending `k`-subset of `0..n` in lexicographic order.
fn next_combination(comb: &mut [usize], n: usize) -> bool {
    let k = comb.len();
    for i in (0..k).rev() {
        if comb[i] < n - (k - i) {
            comb[i] += 1;
            for j in i + 1..k {
                comb[j] = comb[j - 1] + 1;
            }
            return true;
        }
    }
    false
}

fn binomial(n: u64, k: u64) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut acc: u128 = 1;
    for i in 0..k {
        acc = acc * u128::from(n - i) / u128::from(i + 1);
        if acc > u128::from(u64::MAX) {
            return u64::MAX;
        }
    }
    acc as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhaustive_order_is_by_weight_then_lexicographic() {
        let catalog = PatternCatalog::exhaustive(4, 2);
        let all: Vec<Vec<usize>> = catalog.iter().map(|p| p.offsets().to_vec()).collect();
        assert_eq!(
            all,
            vec![
                vec![],
                vec![0],
                vec![1],
                vec![2],
                vec![3],
                vec![0, 1],
                vec![0, 2],
                vec![0, 3],
                vec![1, 2],
                vec![1, 3],
                vec![2, 3],
            ]
        );
        assert_eq!(catalog.len(), 11);
    }

    #[test]
    fn full_catalog_covers_every_subset() {
        let catalog = PatternCatalog::exhaustive(5, 9);
        let all: Vec<Pattern> = catalog.iter().collect();
        assert_eq!(all.len(), 32);
        assert_eq!(catalog.len(), 32);
        assert_eq!(all.last().map(Pattern::weight), Some(5));
        let mut unique = all.clone();
        unique.sort_by(|a, b| a.offsets().cmp(b.offsets()));
        unique.dedup();
        assert_eq!(unique.len(), 32);
    }

    #[test]
    fn listed_catalog_sorts_stably() {
        let catalog = PatternCatalog::from_patterns(vec![
            Pattern::new(vec![3, 1]),
            Pattern::new(vec![4]),
            Pattern::new(vec![0, 2]),
            Pattern::default(),
        ]);
        let all: Vec<Pattern> = catalog.iter().collect();
        assert_eq!(all[0], Pattern::default());
        assert_eq!(all[1].offsets(), &[4]);
        assert_eq!(all[2].offsets(), &[1, 3]);
        assert_eq!(all[3].offsets(), &[0, 2]);
    }

    #[test]
    fn apply_flips_tail_bits_only() {
        let base = SecretVector::from_support(20, &[2, 17]);
        let p = Pattern::new(vec![1, 3]);
        assert_eq!(p.apply(&base, 16).support(), vec![2, 19]);
        assert_eq!(p.weight(), 2);
    }

    #[test]
    fn huge_tails_saturate_the_count() {
        assert_eq!(binomial(37, 3), 7770);
        assert_eq!(PatternCatalog::exhaustive(4000, 40).len(), u64::MAX);
        assert_eq!(PatternCatalog::exhaustive(37, 37).iter().take(3).count(), 3);
    }
}
