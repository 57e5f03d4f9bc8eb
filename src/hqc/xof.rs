//! SHAKE256 expansion and the domain-separated hashes G, H, I and J.
//!
//! HQC 2025-08-22, §3.1 and Table 1.

use hybrid_array::{Array, typenum::U32};
use sha3::digest::{Digest, ExtendableOutput, Update, XofReader};
use sha3::{Sha3_256, Sha3_512, Shake256, Shake256Reader};

pub(crate) const XOF_DOMAIN: u8 = 1;
const G_DOMAIN: u8 = 0;
const H_DOMAIN: u8 = 1;
const I_DOMAIN: u8 = 2;
const J_DOMAIN: u8 = 3;

/// 32-byte seed or hash output.
pub type Seed = Array<u8, U32>;

/// SHAKE256 stream over `seed || domain`.
pub(crate) struct Xof {
    reader: Shake256Reader,
}

impl Xof {
    pub(crate) fn new(seed: &[u8], domain: u8) -> Self {
        let mut shake = Shake256::default();
        Update::update(&mut shake, seed);
        Update::update(&mut shake, &[domain]);
        Self {
            reader: shake.finalize_xof(),
        }
    }

    pub(crate) fn squeeze(&mut self, out: &mut [u8]) {
        self.reader.read(out);
    }

    /// Squeeze in whole 8-byte units, dropping the unused end of the last one.
    ///
    /// Fixed-weight sampling reads this way; a plain squeeze of a length that
    /// is not a multiple of 8 leaves the stream at a different offset.
    pub(crate) fn squeeze_aligned(&mut self, out: &mut [u8]) {
        let whole = out.len() - out.len() % 8;
        self.reader.read(&mut out[..whole]);
        if whole < out.len() {
            let mut tail = [0u8; 8];
            self.reader.read(&mut tail);
            let rest = out.len() - whole;
            out[whole..].copy_from_slice(&tail[..rest]);
        }
    }
}

fn split_64(out: &[u8]) -> (Seed, Seed) {
    let mut a = Seed::default();
    let mut b = Seed::default();
    a.copy_from_slice(&out[..32]);
    b.copy_from_slice(&out[32..64]);
    (a, b)
}

/// G: `(K, theta)` from the key hash, the message and the salt.
pub(crate) fn hash_g(hash_ek: &[u8], m: &[u8], salt: &[u8]) -> (Seed, Seed) {
    let out = Sha3_512::new()
        .chain_update(hash_ek)
        .chain_update(m)
        .chain_update(salt)
        .chain_update([G_DOMAIN])
        .finalize();
    split_64(&out)
}

/// H: hash of a serialized encryption key.
pub(crate) fn hash_h(ek: &[u8]) -> Seed {
    let out = Sha3_256::new()
        .chain_update(ek)
        .chain_update([H_DOMAIN])
        .finalize();
    let mut h = Seed::default();
    h.copy_from_slice(&out);
    h
}

/// I: `(seed_dk, seed_ek)` from the PKE seed.
pub(crate) fn hash_i(seed: &[u8]) -> (Seed, Seed) {
    let out = Sha3_512::new()
        .chain_update(seed)
        .chain_update([I_DOMAIN])
        .finalize();
    split_64(&out)
}

/// J: implicit-rejection key.
pub(crate) fn hash_j(hash_ek: &[u8], sigma: &[u8], ct: &[u8]) -> Seed {
    let out = Sha3_256::new()
        .chain_update(hash_ek)
        .chain_update(sigma)
        .chain_update(ct)
        .chain_update([J_DOMAIN])
        .finalize();
    let mut k = Seed::default();
    k.copy_from_slice(&out);
    k
}
