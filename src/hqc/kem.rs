//! HQC-KEM with implicit rejection.
//!
//! HQC 2025-08-22, §3.6. Decapsulation additionally reports the decoded
//! message and the sampler refills of its re-encryption.

use hybrid_array::Array;
use subtle::{ConditionallySelectable, ConstantTimeEq};

use super::{
    params::HqcParameterSet,
    pke::{HqcPke, PkeCiphertext, PkeEncryptionKey},
    xof::{Seed, XOF_DOMAIN, Xof, hash_g, hash_h, hash_j},
};
use crate::{
    error::{AttackError, Result},
    vector::SecretVector,
};

/// Salt carried at the end of every ciphertext.
pub const SALT_BYTES: usize = 16;

/// A `k`-byte HQC message.
pub type Message<P> = Array<u8, <P as HqcParameterSet>::K>;

/// 32-byte shared secret.
pub type SharedSecret = Seed;

/// HQC encapsulation key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HqcPublicKey<P: HqcParameterSet> {
    pub(crate) ek: PkeEncryptionKey<P>,
    pub(crate) hash_ek: Seed,
}

impl<P: HqcParameterSet> HqcPublicKey<P> {
    /// Serialized key, `seed_ek || s`.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.ek.to_bytes()
    }
}

/// HQC decapsulation key.
#[derive(Clone, Debug)]
pub struct HqcSecretKey<P: HqcParameterSet> {
    pub(crate) pk: HqcPublicKey<P>,
    pub(crate) y: SecretVector,
    pub(crate) sigma: Message<P>,
    pub(crate) seed_kem: Seed,
}

impl<P: HqcParameterSet> HqcSecretKey<P> {
    /// The matching encapsulation key.
    pub fn public_key(&self) -> &HqcPublicKey<P> {
        &self.pk
    }

    /// Seed the key pair was expanded from.
    pub fn seed(&self) -> &[u8] {
        &self.seed_kem
    }
}

/// Everything a decapsulation produced.
pub(crate) struct Decapsulation<P: HqcParameterSet> {
    pub(crate) shared: SharedSecret,
    pub(crate) message: Message<P>,
    pub(crate) refills: u64,
}

/// `u || v || salt`.
pub(crate) fn ciphertext_bytes<P: HqcParameterSet>(ct: &PkeCiphertext, salt: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(P::u_bytes() + P::v_bytes() + SALT_BYTES);
    out.extend_from_slice(&ct.u.to_le_bytes());
    out.extend_from_slice(&ct.v.to_le_bytes());
    out.extend_from_slice(salt);
    out
}

/// Split serialized bytes back into `(u, v)` and the salt.
pub(crate) fn parse_ciphertext<P: HqcParameterSet>(bytes: &[u8]) -> Result<(PkeCiphertext, &[u8])> {
    let (ub, vb) = (P::u_bytes(), P::v_bytes());
    let expected = ub + vb + SALT_BYTES;
    if bytes.len() != expected {
        return Err(AttackError::OraclePrecondition {
            expected,
            actual: bytes.len(),
        });
    }
    let ct = PkeCiphertext {
        u: SecretVector::from_le_bytes(P::N, &bytes[..ub]),
        v: SecretVector::from_le_bytes(P::N1 * P::N2, &bytes[ub..ub + vb]),
    };
    Ok((ct, &bytes[ub + vb..]))
}

pub(crate) struct HqcKem;

impl HqcKem {
    /// `(seed_pke, sigma) = XOF(seed_kem)`, then PKE key generation.
    pub(crate) fn keygen<P: HqcParameterSet>(
        seed_kem: &Seed,
    ) -> (HqcPublicKey<P>, HqcSecretKey<P>) {
        let mut xof = Xof::new(seed_kem, XOF_DOMAIN);
        let mut seed_pke = Seed::default();
        let mut sigma = Message::<P>::default();
        xof.squeeze(&mut seed_pke);
        xof.squeeze(&mut sigma);

        let (ek, y) = HqcPke::keygen::<P>(&seed_pke);
        let hash_ek = hash_h(&ek.to_bytes());
        let pk = HqcPublicKey { ek, hash_ek };
        let sk = HqcSecretKey {
            pk: pk.clone(),
            y,
            sigma,
            seed_kem: *seed_kem,
        };
        (pk, sk)
    }

    /// Deterministic encapsulation of `m` under `salt`; returns the serialized ciphertext.
    pub(crate) fn encaps<P: HqcParameterSet>(
        pk: &HqcPublicKey<P>,
        m: &Message<P>,
        salt: &[u8; SALT_BYTES],
    ) -> (Vec<u8>, SharedSecret) {
        let (k, theta) = hash_g(&pk.hash_ek, m, salt);
        let (ct, _) = HqcPke::encrypt(&pk.ek, m, &theta);
        (ciphertext_bytes::<P>(&ct, salt), k)
    }

    /// Decrypt with `y`, re-encrypt and compare; the rejection key uses `sigma`.
    pub(crate) fn decaps<P: HqcParameterSet>(
        pk: &HqcPublicKey<P>,
        y: &SecretVector,
        sigma: &[u8],
        bytes: &[u8],
    ) -> Result<Decapsulation<P>> {
        let (ct, salt) = parse_ciphertext::<P>(bytes)?;
        let mut message = Message::<P>::default();
        message.copy_from_slice(&HqcPke::decrypt::<P>(y, &ct));

        let (k_prime, theta) = hash_g(&pk.hash_ek, &message, salt);
        let (again, refills) = HqcPke::encrypt(&pk.ek, &message, &theta);
        let k_bar = hash_j(&pk.hash_ek, sigma, bytes);

        let valid = ciphertext_bytes::<P>(&again, salt).as_slice().ct_eq(bytes);
        let mut shared = SharedSecret::default();
        for (out, (reject, accept)) in shared.iter_mut().zip(k_bar.iter().zip(k_prime.iter())) {
            *out = u8::conditional_select(reject, accept, valid);
        }
        Ok(Decapsulation {
            shared,
            message,
            refills,
        })
    }

    /// Refills a re-encryption of `m` under `salt` spends, from public data only.
    pub(crate) fn encryption_refills<P: HqcParameterSet>(
        pk: &HqcPublicKey<P>,
        m: &Message<P>,
        salt: &[u8],
    ) -> u64 {
        let (_, theta) = hash_g(&pk.hash_ek, m, salt);
        HqcPke::randomness::<P>(&theta).refills
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hqc::params::{Hqc1, Hqc3};

    fn seed(byte: u8) -> Seed {
        Seed::from([byte; 32])
    }

    #[test]
    fn round_trip_hqc1() {
        let (pk, sk) = HqcKem::keygen::<Hqc1>(&seed(1));
        let m = Message::<Hqc1>::from([9u8; 16]);
        let (ct, k) = HqcKem::encaps(&pk, &m, &[2u8; SALT_BYTES]);
        assert_eq!(ct.len(), Hqc1::u_bytes() + Hqc1::v_bytes() + SALT_BYTES);

        let out = HqcKem::decaps(&pk, &sk.y, &sk.sigma, &ct).unwrap();
        assert_eq!(out.shared, k);
        assert_eq!(out.message, m);
        assert_eq!(out.refills, HqcKem::encryption_refills(&pk, &m, &[2u8; SALT_BYTES]));
    }

    #[test]
    fn tampering_triggers_implicit_rejection() {
        let (pk, sk) = HqcKem::keygen::<Hqc3>(&seed(3));
        let m = Message::<Hqc3>::from([4u8; 24]);
        let (mut ct, k) = HqcKem::encaps(&pk, &m, &[5u8; SALT_BYTES]);
        // one bit of v: the message still decodes but the re-encryption differs
        ct[Hqc3::u_bytes() + 3] ^= 0x10;

        let out = HqcKem::decaps(&pk, &sk.y, &sk.sigma, &ct).unwrap();
        assert_eq!(out.message, m);
        assert_ne!(out.shared, k);
        assert_eq!(out.shared, hash_j(&pk.hash_ek, &sk.sigma, &ct));
    }

    #[test]
    fn wrong_length_is_a_precondition_error() {
        let (pk, sk) = HqcKem::keygen::<Hqc1>(&seed(6));
        let err = HqcKem::decaps(&pk, &sk.y, &sk.sigma, &[0u8; 10]).err().unwrap();
        assert!(matches!(
            err,
            AttackError::OraclePrecondition { actual: 10, .. }
        ));
    }

    #[test]
    fn keygen_is_deterministic() {
        let (pk, sk) = HqcKem::keygen::<Hqc1>(&seed(7));
        let (pk2, sk2) = HqcKem::keygen::<Hqc1>(&seed(7));
        assert_eq!(pk, pk2);
        assert_eq!(sk.y, sk2.y);
        assert_eq!(sk.public_key(), &pk);
        assert_eq!(sk.seed(), &[7u8; 32]);
    }
}
