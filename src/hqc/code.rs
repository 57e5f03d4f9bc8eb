//! The concatenated code: Reed-Solomon outside, duplicated RM(1,7) inside.

use super::{params::HqcParameterSet, rm, rs};
use crate::vector::SecretVector;

/// `n1 * n2`-bit codeword of a `k`-byte message.
pub(crate) fn encode<P: HqcParameterSet>(msg: &[u8]) -> SecretVector {
    let outer = rs::encode(msg, P::RS_POLY);
    let inner = rm::encode(&outer, P::MULTIPLICITY);
    SecretVector::from_le_bytes(P::N1 * P::N2, &inner)
}

/// Message decoded from a noisy `n1 * n2`-bit word.
pub(crate) fn decode<P: HqcParameterSet>(word: &SecretVector) -> Vec<u8> {
    let symbols = rm::decode(&word.to_le_bytes(), P::MULTIPLICITY);
    rs::decode(&symbols, P::DELTA)
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng, seq::index};
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::hqc::params::{Hqc1, Hqc3};

    #[test]
    fn survives_scattered_errors_and_whole_blocks() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let msg: Vec<u8> = (0..16).map(|_| rng.random()).collect();
        let mut word = encode::<Hqc1>(&msg);
        assert_eq!(word.len(), 17664);
        assert_eq!(decode::<Hqc1>(&word), msg);

        // 66 random bit errors, as a secret of weight omega would add
        for i in index::sample(&mut rng, word.len(), 66) {
            word.flip(i);
        }
        // and 15 fully complemented blocks
        for b in 0..15 {
            for i in Hqc1::scheme().block(3 * b % 46) {
                word.flip(i);
            }
        }
        assert_eq!(decode::<Hqc1>(&word), msg);
    }

    #[test]
    fn one_block_past_capacity_breaks_decoding() {
        let msg = vec![0x5au8; 24];
        let mut word = encode::<Hqc3>(&msg);
        // message symbols sit at the end of the outer codeword
        for b in Hqc3::N1 - Hqc3::DELTA - 1..Hqc3::N1 {
            for i in Hqc3::scheme().block(b) {
                word.flip(i);
            }
        }
        assert_ne!(decode::<Hqc3>(&word), msg);
    }
}
