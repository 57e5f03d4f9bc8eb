//! Shortened Reed-Solomon outer code over GF(256).
//!
//! Codewords are `parity || message` with `2 * delta` parity symbols; the
//! generator has roots α, α^2, ..., α^(2 delta). HQC 2025-08-22, §3.4.2.

use super::gf256::{self, alpha_pow};

/// Systematic encoding of `msg` with the monic `generator` (lowest degree first).
pub(crate) fn encode(msg: &[u8], generator: &[u8]) -> Vec<u8> {
    let parity = generator.len() - 1;
    let k = msg.len();
    let mut codeword = vec![0u8; parity + k];

    // division by the generator in a shift register, highest degree first
    for i in 0..k {
        let gate = msg[k - 1 - i] ^ codeword[parity - 1];
        for j in (1..parity).rev() {
            codeword[j] = codeword[j - 1] ^ gf256::mul(gate, generator[j]);
        }
        codeword[0] = gf256::mul(gate, generator[0]);
    }
    codeword[parity..].copy_from_slice(msg);
    codeword
}

/// Correct up to `delta` symbol errors and return the message symbols.
///
/// Past the capacity the output is whatever the corrections produce; no
/// failure is signalled, as in HQC itself.
pub(crate) fn decode(received: &[u8], delta: usize) -> Vec<u8> {
    let parity = 2 * delta;
    let syndromes = syndromes(received, parity);
    if syndromes.iter().all(|&s| s == 0) {
        return received[parity..].to_vec();
    }

    let locator = berlekamp_massey(&syndromes);
    let evaluator = error_evaluator(&syndromes, &locator);
    let derivative: Vec<u8> = (0..parity)
        .map(|i| if i % 2 == 0 { locator[i + 1] } else { 0 })
        .collect();

    let mut corrected = received.to_vec();
    for (j, symbol) in corrected.iter_mut().enumerate() {
        let x_inv = alpha_pow(255 - j % 255);
        if eval(&locator, x_inv) == 0 {
            let magnitude = gf256::mul(
                eval(&evaluator, x_inv),
                gf256::inv(eval(&derivative, x_inv)),
            );
            *symbol ^= magnitude;
        }
    }
    corrected.split_off(parity)
}

/// `S_i = r(α^(i+1))` for `i < count`.
fn syndromes(received: &[u8], count: usize) -> Vec<u8> {
    (1..=count).map(|i| eval(received, alpha_pow(i))).collect()
}

/// Error-locator polynomial Λ, padded to `syndromes.len() + 1` coefficients.
fn berlekamp_massey(syndromes: &[u8]) -> Vec<u8> {
    let len = syndromes.len() + 1;
    let mut current = vec![0u8; len];
    let mut previous = vec![0u8; len];
    current[0] = 1;
    previous[0] = 1;
    let mut degree = 0;
    let mut shift = 1;
    let mut last_discrepancy = 1u8;

    for step in 0..syndromes.len() {
        let mut discrepancy = syndromes[step];
        for i in 1..=degree {
            discrepancy ^= gf256::mul(current[i], syndromes[step - i]);
        }
        if discrepancy == 0 {
            shift += 1;
            continue;
        }

        let scale = gf256::mul(discrepancy, gf256::inv(last_discrepancy));
        let saved = current.clone();
        for i in 0..len - shift {
            current[i + shift] ^= gf256::mul(scale, previous[i]);
        }
        if 2 * degree <= step {
            degree = step + 1 - degree;
            previous = saved;
            last_discrepancy = discrepancy;
            shift = 1;
        } else {
            shift += 1;
        }
    }
    current
}

/// Ω = S·Λ mod x^(2 delta).
fn error_evaluator(syndromes: &[u8], locator: &[u8]) -> Vec<u8> {
    let mut omega = vec![0u8; syndromes.len()];
    for (i, coeff) in omega.iter_mut().enumerate() {
        for j in 0..=i {
            *coeff ^= gf256::mul(syndromes[j], locator[i - j]);
        }
    }
    omega
}

/// Horner evaluation, coefficients lowest degree first.
fn eval(poly: &[u8], x: u8) -> u8 {
    poly.iter().rev().fold(0, |acc, &c| gf256::mul(acc, x) ^ c)
}
