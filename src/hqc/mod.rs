//! An instrumented HQC implementation serving as a real decapsulation oracle.
//!
//! Encryption draws `r2`, `e` and `r1` by rejection sampling, the way HQC
//! did before its samplers were made constant time, so the number of XOF
//! refills during the re-encryption step of decapsulation depends on the
//! decoded message. [`HqcOracle`] reports that count as the
//! [`TimingClass`].
//!
//! ```no_run
//! use hqcfail::hqc::Hqc1Oracle;
//! use hqcfail::oracle::DecapsulationOracle;
//!
//! let mut oracle = Hqc1Oracle::from_seed(7);
//! let (pk, sk) = oracle.keypair();
//! let (ct, k) = oracle.encapsulate(&pk);
//! assert_eq!(oracle.decapsulate(&ct, &sk).unwrap(), k);
//! ```

use core::marker::PhantomData;
use core::ops::Range;

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use crate::{
    error::{AttackError, Result},
    mutator::CiphertextBuffer,
    oracle::{DecapsulationOracle, TimingClass},
    params::SchemeParams,
    vector::SecretVector,
};

mod code;
mod gf256;
mod kem;
mod params;
mod pke;
mod rm;
mod rs;
mod vect;
mod xof;

pub use kem::{HqcPublicKey, HqcSecretKey, Message, SALT_BYTES, SharedSecret};
pub use params::{Hqc1, Hqc3, Hqc5, HqcParameterSet};
pub use xof::Seed;

use kem::{HqcKem, ciphertext_bytes};
use pke::PkeCiphertext;

/// HQC-1 oracle.
pub type Hqc1Oracle = HqcOracle<Hqc1>;
/// HQC-3 oracle.
pub type Hqc3Oracle = HqcOracle<Hqc3>;
/// HQC-5 oracle.
pub type Hqc5Oracle = HqcOracle<Hqc5>;

/// Decapsulation oracle over a leaking HQC implementation.
///
/// Key seeds, messages and salts come from an internal ChaCha rng, so a
/// fixed seed reproduces every key and ciphertext.
pub struct HqcOracle<P: HqcParameterSet> {
    rng: ChaCha8Rng,
    _params: PhantomData<P>,
}

impl<P: HqcParameterSet> HqcOracle<P> {
    /// Oracle whose randomness derives from `seed`.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            _params: PhantomData,
        }
    }

    /// Oracle seeded from the thread rng.
    pub fn from_entropy() -> Self {
        Self::from_seed(rand::rng().random())
    }

    /// Key pair expanded from an explicit 32-byte seed.
    pub fn keypair_from_seed(&self, seed: &Seed) -> (HqcPublicKey<P>, HqcSecretKey<P>) {
        HqcKem::keygen::<P>(seed)
    }

    fn bit_offset() -> usize {
        8 * P::u_bytes()
    }
}

impl<P: HqcParameterSet> DecapsulationOracle for HqcOracle<P> {
    type PublicKey = HqcPublicKey<P>;
    type SecretKey = HqcSecretKey<P>;
    type Message = Message<P>;
    type SharedSecret = SharedSecret;

    fn params(&self) -> SchemeParams {
        P::scheme()
    }

    fn ciphertext_len(&self) -> usize {
        P::u_bytes() + P::v_bytes() + SALT_BYTES
    }

    fn codeword_region(&self) -> Range<usize> {
        let start = Self::bit_offset();
        start..start + P::N1 * P::N2
    }

    fn keypair(&mut self) -> (Self::PublicKey, Self::SecretKey) {
        let mut seed = Seed::default();
        self.rng.fill_bytes(&mut seed);
        HqcKem::keygen::<P>(&seed)
    }

    fn encapsulate(&mut self, pk: &Self::PublicKey) -> (CiphertextBuffer, Self::SharedSecret) {
        let m = self.random_message();
        self.encapsulate_with_message(pk, &m)
    }

    fn encapsulate_with_message(
        &mut self,
        pk: &Self::PublicKey,
        message: &Self::Message,
    ) -> (CiphertextBuffer, Self::SharedSecret) {
        let mut salt = [0u8; SALT_BYTES];
        self.rng.fill_bytes(&mut salt);
        let (bytes, k) = HqcKem::encaps(pk, message, &salt);
        (CiphertextBuffer::new(bytes), k)
    }

    fn decapsulate(
        &mut self,
        ct: &CiphertextBuffer,
        sk: &Self::SecretKey,
    ) -> Result<Self::SharedSecret> {
        let out = HqcKem::decaps(&sk.pk, &sk.y, &sk.sigma, ct.as_bytes())?;
        Ok(out.shared)
    }

    fn decapsulate_instrumented(
        &mut self,
        ct: &CiphertextBuffer,
        sk: &Self::SecretKey,
    ) -> Result<(Self::Message, TimingClass)> {
        let out = HqcKem::decaps(&sk.pk, &sk.y, &sk.sigma, ct.as_bytes())?;
        trace!(refills = out.refills, "re-encryption sampling");
        Ok((out.message, TimingClass(out.refills)))
    }

    /// Decapsulation with `guess` standing in for `y`. The attacker has no
    /// `sigma`, so a rejected ciphertext yields the rejection key under an
    /// all-zero one.
    fn decapsulate_with_known_error(
        &mut self,
        ct: &CiphertextBuffer,
        pk: &Self::PublicKey,
        guess: &SecretVector,
    ) -> Result<Self::SharedSecret> {
        if guess.len() != P::N {
            return Err(AttackError::OraclePrecondition {
                expected: P::N,
                actual: guess.len(),
            });
        }
        let sigma = Message::<P>::default();
        let out = HqcKem::decaps(pk, guess, &sigma, ct.as_bytes())?;
        Ok(out.shared)
    }

    fn random_message(&mut self) -> Self::Message {
        let mut m = Message::<P>::default();
        self.rng.fill_bytes(&mut m);
        m
    }

    /// `u = 1`, `v = Encode(m)` and a zero salt, so decryption sees
    /// `Encode(m) + truncate(y)`.
    fn probe_ciphertext(
        &mut self,
        _pk: &Self::PublicKey,
        message: &Self::Message,
    ) -> CiphertextBuffer {
        let ct = PkeCiphertext {
            u: SecretVector::from_support(P::N, &[0]),
            v: code::encode::<P>(message),
        };
        CiphertextBuffer::new(ciphertext_bytes::<P>(&ct, &[0u8; SALT_BYTES]))
    }

    fn message_timing(&self, pk: &Self::PublicKey, message: &Self::Message) -> TimingClass {
        TimingClass(HqcKem::encryption_refills(pk, message, &[0u8; SALT_BYTES]))
    }

    fn reveal_secret(&self, sk: &Self::SecretKey) -> SecretVector {
        sk.y.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutator::FlipGuard;

    #[test]
    fn honest_traffic_round_trips() {
        let mut oracle = Hqc1Oracle::from_seed(1);
        let (pk, sk) = oracle.keypair();
        let (ct, k) = oracle.encapsulate(&pk);
        assert_eq!(ct.len(), oracle.ciphertext_len());
        assert_eq!(oracle.decapsulate(&ct, &sk).unwrap(), k);

        let y = oracle.reveal_secret(&sk);
        assert_eq!(y.weight(), Hqc1::OMEGA);
        assert_eq!(oracle.decapsulate_with_known_error(&ct, &pk, &y).unwrap(), k);

        // u is dense, so a single wrong position scrambles u·y
        let mut wrong = y.clone();
        wrong.flip(Hqc1::N - 1);
        assert_ne!(oracle.decapsulate_with_known_error(&ct, &pk, &wrong).unwrap(), k);
    }

    #[test]
    fn probe_class_is_predictable_offline() {
        let mut oracle = Hqc1Oracle::from_seed(2);
        let (pk, sk) = oracle.keypair();
        for _ in 0..4 {
            let m = oracle.random_message();
            let ct = oracle.probe_ciphertext(&pk, &m);
            let (decoded, class) = oracle.decapsulate_instrumented(&ct, &sk).unwrap();
            assert_eq!(decoded, m);
            assert_eq!(class, oracle.message_timing(&pk, &m));
            assert!(class.0 >= 3);
        }
    }

    #[test]
    fn region_covers_v() {
        let oracle = Hqc1Oracle::from_seed(3);
        let region = oracle.codeword_region();
        assert_eq!(region.start, 8 * 2209);
        assert_eq!(region.len(), 17664);
        assert!(region.end <= 8 * oracle.ciphertext_len());
    }

    #[test]
    fn corrupting_delta_blocks_keeps_the_message_and_one_more_loses_it() {
        let mut oracle = Hqc1Oracle::from_seed(4);
        let (pk, sk) = oracle.keypair();
        let m = oracle.random_message();
        let mut ct = oracle.probe_ciphertext(&pk, &m);
        let origin = oracle.codeword_region().start;
        let params = oracle.params();

        let mut guard = FlipGuard::new(&mut ct, origin);
        // message symbols are the last k blocks
        for b in params.n1 - params.delta..params.n1 {
            guard.flip_range(params.block(b));
        }
        let (decoded, _) = oracle
            .decapsulate_instrumented(guard.ciphertext(), &sk)
            .unwrap();
        assert_eq!(decoded, m);

        guard.flip_range(params.block(params.n1 - params.delta - 1));
        let (decoded, _) = oracle
            .decapsulate_instrumented(guard.ciphertext(), &sk)
            .unwrap();
        assert_ne!(decoded, m);
    }

    #[test]
    fn short_guess_is_rejected() {
        let mut oracle = Hqc1Oracle::from_seed(5);
        let (pk, _) = oracle.keypair();
        let (ct, _) = oracle.encapsulate(&pk);
        let err = oracle
            .decapsulate_with_known_error(&ct, &pk, &SecretVector::zeros(100))
            .unwrap_err();
        assert!(matches!(
            err,
            AttackError::OraclePrecondition {
                expected: 17669,
                actual: 100
            }
        ));
    }
}
