//! HQC-PKE: key generation, encryption and decryption.
//!
//! HQC 2025-08-22, §3.5, with one change: `r2`, `e` and `r1` are drawn
//! with the rejection sampler, so encryption time depends on the message.

use core::marker::PhantomData;

use super::{
    code,
    params::HqcParameterSet,
    vect::{Sampled, mul_sparse, sample_dense, sample_fixed_weight, truncate},
    xof::{Seed, XOF_DOMAIN, Xof, hash_i},
};
use crate::vector::SecretVector;

/// Encryption key `(seed_ek, s)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PkeEncryptionKey<P> {
    pub(crate) seed_ek: Seed,
    pub(crate) s: SecretVector,
    _params: PhantomData<P>,
}

impl<P: HqcParameterSet> PkeEncryptionKey<P> {
    /// `seed_ek || s`.
    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.seed_ek.to_vec();
        out.extend_from_slice(&self.s.to_le_bytes());
        out
    }

    /// The public vector `h`, re-expanded from `seed_ek`.
    pub(crate) fn h(&self) -> SecretVector {
        sample_dense(&mut Xof::new(&self.seed_ek, XOF_DOMAIN), P::N)
    }
}

/// `(u, v)`: `u` has `n` bits, `v` has `n1 * n2`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PkeCiphertext {
    pub(crate) u: SecretVector,
    pub(crate) v: SecretVector,
}

/// The three encryption vectors and the refills spent drawing them.
pub(crate) struct Randomness {
    r2: SecretVector,
    e: SecretVector,
    r1: SecretVector,
    pub(crate) refills: u64,
}

pub(crate) struct HqcPke;

impl HqcPke {
    /// Returns the encryption key and the secret `y`.
    pub(crate) fn keygen<P: HqcParameterSet>(
        seed_pke: &[u8],
    ) -> (PkeEncryptionKey<P>, SecretVector) {
        let (seed_dk, seed_ek) = hash_i(seed_pke);

        let mut dk_xof = Xof::new(&seed_dk, XOF_DOMAIN);
        let y = sample_fixed_weight(&mut dk_xof, P::N, P::OMEGA).vector;
        let x = sample_fixed_weight(&mut dk_xof, P::N, P::OMEGA).vector;

        let h = sample_dense(&mut Xof::new(&seed_ek, XOF_DOMAIN), P::N);
        let mut s = mul_sparse(&h, &y);
        s.xor_assign(&x);

        let ek = PkeEncryptionKey {
            seed_ek,
            s,
            _params: PhantomData,
        };
        (ek, y)
    }

    /// Draw `r2`, `e`, `r1` in that order from `theta`.
    pub(crate) fn randomness<P: HqcParameterSet>(theta: &[u8]) -> Randomness {
        let mut xof = Xof::new(theta, XOF_DOMAIN);
        let Sampled { vector: r2, refills: a } = sample_fixed_weight(&mut xof, P::N, P::OMEGA_R);
        let Sampled { vector: e, refills: b } = sample_fixed_weight(&mut xof, P::N, P::OMEGA_R);
        let Sampled { vector: r1, refills: c } = sample_fixed_weight(&mut xof, P::N, P::OMEGA_R);
        Randomness {
            r2,
            e,
            r1,
            refills: a + b + c,
        }
    }

    /// `u = h·r2 + r1`, `v = truncate(s·r2 + e) + Encode(m)`.
    pub(crate) fn encrypt<P: HqcParameterSet>(
        ek: &PkeEncryptionKey<P>,
        m: &[u8],
        theta: &[u8],
    ) -> (PkeCiphertext, u64) {
        let rand = Self::randomness::<P>(theta);

        let mut u = mul_sparse(&ek.h(), &rand.r2);
        u.xor_assign(&rand.r1);

        let mut sr2 = mul_sparse(&ek.s, &rand.r2);
        sr2.xor_assign(&rand.e);
        let mut v = truncate(&sr2, P::N1 * P::N2);
        v.xor_assign(&code::encode::<P>(m));

        (PkeCiphertext { u, v }, rand.refills)
    }

    /// `Decode(v - truncate(u·y))`.
    pub(crate) fn decrypt<P: HqcParameterSet>(y: &SecretVector, ct: &PkeCiphertext) -> Vec<u8> {
        let mut word = ct.v.clone();
        word.xor_assign(&truncate(&mul_sparse(&ct.u, y), P::N1 * P::N2));
        code::decode::<P>(&word)
    }
}
