//! Vector sampling and arithmetic in F2[X]/(X^n - 1).
//!
//! HQC 2025-08-22, §3.2 and §3.3. Fixed-weight vectors come from the
//! rejection sampler, which also reports how many times it refilled its
//! buffer from the XOF. That count is the decapsulation timing leak.

use super::xof::Xof;
use crate::vector::SecretVector;

/// Reduction of 24-bit samples modulo `n` with a precomputed Barrett multiplier.
#[derive(Clone, Copy, Debug)]
struct Reducer {
    n: u32,
    multiplier: u64,
    threshold: u32,
}

impl Reducer {
    fn new(n: usize) -> Self {
        let n = n as u32;
        Self {
            n,
            multiplier: (1u64 << 32) / u64::from(n),
            // largest multiple of n below 2^24; samples at or above it are rejected
            threshold: ((1u32 << 24) - 1) / n * n,
        }
    }

    #[inline]
    fn accepts(&self, x: u32) -> bool {
        x < self.threshold
    }

    /// `x mod n` for an accepted sample.
    #[inline]
    fn reduce(&self, x: u32) -> u32 {
        let q = ((u64::from(x) * self.multiplier) >> 32) as u32;
        let r = x - q * self.n;
        if r >= self.n { r - self.n } else { r }
    }
}

/// A fixed-weight vector and the XOF refills spent drawing it.
#[derive(Clone, Debug)]
pub(crate) struct Sampled {
    pub(crate) vector: SecretVector,
    pub(crate) refills: u64,
}

/// Uniform weight-`weight` vector of length `n` by rejection sampling.
///
/// Draws 24-bit big-endian samples from batches of `3 * weight` bytes,
/// rejects those past the largest multiple of `n` and skips duplicates.
pub(crate) fn sample_fixed_weight(xof: &mut Xof, n: usize, weight: usize) -> Sampled {
    let reducer = Reducer::new(n);
    let mut batch = vec![0u8; 3 * weight];
    let mut pos = batch.len();
    let mut refills = 0;
    let mut support: Vec<usize> = Vec::with_capacity(weight);

    while support.len() < weight {
        if pos + 3 > batch.len() {
            xof.squeeze_aligned(&mut batch);
            pos = 0;
            refills += 1;
        }
        let sample = u32::from_be_bytes([0, batch[pos], batch[pos + 1], batch[pos + 2]]);
        pos += 3;
        if !reducer.accepts(sample) {
            continue;
        }
        let index = reducer.reduce(sample) as usize;
        if !support.contains(&index) {
            support.push(index);
        }
    }
    Sampled {
        vector: SecretVector::from_support(n, &support),
        refills,
    }
}

/// Uniform vector of length `n`.
pub(crate) fn sample_dense(xof: &mut Xof, n: usize) -> SecretVector {
    let mut bytes = vec![0u8; n.div_ceil(8)];
    xof.squeeze(&mut bytes);
    SecretVector::from_le_bytes(n, &bytes)
}

/// `dense * sparse mod X^n - 1`, one shifted copy of `dense` per set bit of `sparse`.
pub(crate) fn mul_sparse(dense: &SecretVector, sparse: &SecretVector) -> SecretVector {
    let n = dense.len();
    let words = dense.as_words();
    let nw = words.len();
    let mut acc = vec![0u64; 2 * nw + 1];

    for shift in sparse.iter_ones() {
        let (q, r) = (shift / 64, shift % 64);
        for (i, &w) in words.iter().enumerate() {
            acc[i + q] ^= w << r;
            if r != 0 {
                acc[i + q + 1] ^= w >> (64 - r);
            }
        }
    }

    // fold the bits at n.. back onto 0..
    let folded = (0..nw)
        .map(|i| acc[i] ^ bits_at(&acc, n + 64 * i))
        .collect();
    SecretVector::from_words(n, folded)
}

/// The 64 bits of `words` starting at bit `start`; bits past the end read as zero.
fn bits_at(words: &[u64], start: usize) -> u64 {
    let (w, s) = (start / 64, start % 64);
    let lo = words.get(w).map_or(0, |&x| x >> s);
    if s == 0 {
        return lo;
    }
    lo | words.get(w + 1).map_or(0, |&x| x << (64 - s))
}

/// The first `len` bits of `v`.
#[inline]
pub(crate) fn truncate(v: &SecretVector, len: usize) -> SecretVector {
    v.resized(len)
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng, seq::index};
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::hqc::xof::XOF_DOMAIN;

    fn naive_mul(a: &SecretVector, b: &SecretVector) -> SecretVector {
        let n = a.len();
        let mut out = SecretVector::zeros(n);
        for i in a.iter_ones() {
            for j in b.iter_ones() {
                out.flip((i + j) % n);
            }
        }
        out
    }

    #[test]
    fn barrett_matches_remainder() {
        for n in [17669usize, 35851, 57637, 131] {
            let reducer = Reducer::new(n);
            let mut rng = ChaCha8Rng::seed_from_u64(n as u64);
            for _ in 0..2000 {
                let x = rng.random_range(0..reducer.threshold);
                assert_eq!(reducer.reduce(x) as usize, x as usize % n);
            }
            assert_eq!(reducer.reduce(reducer.threshold - 1) as usize, n - 1);
            assert!(!reducer.accepts(reducer.threshold));
        }
    }

    #[test]
    fn fixed_weight_vectors_have_exact_weight() {
        let mut xof = Xof::new(b"weights", XOF_DOMAIN);
        for (n, w) in [(17669, 66), (17669, 75), (57637, 149), (200, 150)] {
            let s = sample_fixed_weight(&mut xof, n, w);
            assert_eq!(s.vector.len(), n);
            assert_eq!(s.vector.weight(), w);
            assert!(s.refills >= 1);
        }
    }

    #[test]
    fn refills_grow_when_duplicates_are_likely() {
        // 150 distinct positions out of 200 cannot fit in one batch of 150 samples
        let mut xof = Xof::new(b"dense", XOF_DOMAIN);
        assert!(sample_fixed_weight(&mut xof, 200, 150).refills >= 2);

        let a = sample_fixed_weight(&mut Xof::new(b"same", XOF_DOMAIN), 17669, 75);
        let b = sample_fixed_weight(&mut Xof::new(b"same", XOF_DOMAIN), 17669, 75);
        assert_eq!(a.vector, b.vector);
        assert_eq!(a.refills, b.refills);
    }

    #[test]
    fn sparse_product_matches_schoolbook() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for n in [131usize, 64, 640, 1031] {
            let dense_support: Vec<usize> = index::sample(&mut rng, n, n / 3).into_vec();
            let sparse_support: Vec<usize> = index::sample(&mut rng, n, 9).into_vec();
            let dense = SecretVector::from_support(n, &dense_support);
            let sparse = SecretVector::from_support(n, &sparse_support);
            assert_eq!(mul_sparse(&dense, &sparse), naive_mul(&dense, &sparse), "n = {n}");
        }
    }

    #[test]
    fn unit_and_monomial_products() {
        let n = 17669;
        let mut xof = Xof::new(b"h", XOF_DOMAIN);
        let h = sample_dense(&mut xof, n);
        let one = SecretVector::from_support(n, &[0]);
        assert_eq!(mul_sparse(&h, &one), h);

        // multiplying by X rotates by one position
        let x = SecretVector::from_support(n, &[1]);
        let rotated = mul_sparse(&h, &x);
        for i in 0..n {
            assert_eq!(rotated.get((i + 1) % n), h.get(i));
        }
    }
}
