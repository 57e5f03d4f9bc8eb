//! Duplicated RM(1,7) inner code.
//!
//! Each outer symbol becomes one 128-bit Reed-Muller codeword repeated
//! `multiplicity` times. HQC 2025-08-22, §3.4.3.

/// Bytes in one RM(1,7) codeword.
pub(crate) const RM_BYTES: usize = 16;

const RM_BITS: usize = 128;

#[inline]
fn bit_mask(x: u8) -> u32 {
    0u32.wrapping_sub(u32::from(x & 1))
}

/// The RM(1,7) codeword of `symbol`: bit `i` is `symbol[7] ^ <symbol[0..7], i>`.
fn encode_symbol(symbol: u8) -> [u8; RM_BYTES] {
    let mut word = bit_mask(symbol >> 7);
    word ^= bit_mask(symbol) & 0xaaaa_aaaa;
    word ^= bit_mask(symbol >> 1) & 0xcccc_cccc;
    word ^= bit_mask(symbol >> 2) & 0xf0f0_f0f0;
    word ^= bit_mask(symbol >> 3) & 0xff00_ff00;
    word ^= bit_mask(symbol >> 4) & 0xffff_0000;

    // bits 5 and 6 of the index select the 32-bit quarter
    let quarters = [
        word,
        word ^ bit_mask(symbol >> 5),
        word ^ bit_mask(symbol >> 6),
        word ^ bit_mask(symbol >> 5) ^ bit_mask(symbol >> 6),
    ];
    let mut out = [0u8; RM_BYTES];
    for (chunk, q) in out.chunks_exact_mut(4).zip(quarters) {
        chunk.copy_from_slice(&q.to_le_bytes());
    }
    out
}

/// Encode every symbol, `multiplicity` copies each, into one little-endian bit string.
pub(crate) fn encode(symbols: &[u8], multiplicity: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(symbols.len() * multiplicity * RM_BYTES);
    for &s in symbols {
        let codeword = encode_symbol(s);
        for _ in 0..multiplicity {
            out.extend_from_slice(&codeword);
        }
    }
    out
}

/// Maximum-likelihood decode of each `multiplicity * 16`-byte block.
pub(crate) fn decode(bits: &[u8], multiplicity: usize) -> Vec<u8> {
    bits.chunks_exact(multiplicity * RM_BYTES)
        .map(decode_block)
        .collect()
}

fn decode_block(block: &[u8]) -> u8 {
    // 0 counts +1 and 1 counts -1, summed over the copies
    let mut scores = [0i32; RM_BITS];
    for copy in block.chunks_exact(RM_BYTES) {
        for (i, score) in scores.iter_mut().enumerate() {
            let bit = (copy[i >> 3] >> (i & 7)) & 1;
            *score += 1 - 2 * i32::from(bit);
        }
    }
    hadamard(&mut scores);

    // strongest correlation; the first index wins a tie
    let mut best = 0;
    for i in 1..RM_BITS {
        if scores[i].abs() > scores[best].abs() {
            best = i;
        }
    }
    best as u8 | (u8::from(scores[best] < 0) << 7)
}

/// In-place fast Walsh-Hadamard transform.
fn hadamard(v: &mut [i32; RM_BITS]) {
    let mut half = 1;
    while half < RM_BITS {
        for start in (0..RM_BITS).step_by(2 * half) {
            for j in start..start + half {
                let (a, b) = (v[j], v[j + half]);
                v[j] = a + b;
                v[j + half] = a - b;
            }
        }
        half *= 2;
    }
}
