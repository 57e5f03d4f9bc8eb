//! GF(2^8) arithmetic for the Reed-Solomon layer.
//!
//! Field polynomial x^8 + x^4 + x^3 + x^2 + 1 (0x11D), primitive element α = 2.
//! HQC 2025-08-22, §3.4.

use subtle::{ConditionallySelectable, ConstantTimeEq};

const FIELD_POLY: u16 = 0x11D;

/// `EXP[i] = α^i`, repeated past 255 so that the sum of two logs indexes directly.
pub(crate) const EXP: [u8; 512] = exp_table();

/// Discrete logarithm; `LOG[0]` is a placeholder and never meaningful.
pub(crate) const LOG: [u8; 256] = log_table();

const fn exp_table() -> [u8; 512] {
    let mut table = [0u8; 512];
    let mut x: u16 = 1;
    let mut i = 0;
    while i < 512 {
        table[i] = x as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= FIELD_POLY;
        }
        i += 1;
    }
    table
}

const fn log_table() -> [u8; 256] {
    let exp = exp_table();
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 255 {
        table[exp[i] as usize] = i as u8;
        i += 1;
    }
    table
}

/// Product in GF(256). The zero case is selected without branching.
#[inline]
#[must_use]
pub(crate) fn mul(a: u8, b: u8) -> u8 {
    let product = EXP[LOG[a as usize] as usize + LOG[b as usize] as usize];
    let either_zero = a.ct_eq(&0) | b.ct_eq(&0);
    u8::conditional_select(&product, &0, either_zero)
}

/// Multiplicative inverse; maps 0 to 0.
#[inline]
#[must_use]
pub(crate) fn inv(a: u8) -> u8 {
    let inverse = EXP[255 - LOG[a as usize] as usize];
    u8::conditional_select(&inverse, &0, a.ct_eq(&0))
}

/// α^e for any exponent.
#[inline]
#[must_use]
pub(crate) fn alpha_pow(e: usize) -> u8 {
    EXP[e % 255]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_consistent() {
        for a in 1..=255u8 {
            assert_eq!(EXP[LOG[a as usize] as usize], a);
        }
        for i in 0..257 {
            assert_eq!(EXP[i], EXP[i + 255]);
        }
        // α^8 reduces by the field polynomial
        assert_eq!(alpha_pow(8), 0x1D);
        assert_eq!(alpha_pow(255), 1);
    }

    #[test]
    fn field_laws() {
        for a in (0..=255u8).step_by(7) {
            for b in (0..=255u8).step_by(11) {
                assert_eq!(mul(a, b), mul(b, a));
                for c in (0..=255u8).step_by(29) {
                    assert_eq!(mul(a, b ^ c), mul(a, b) ^ mul(a, c));
                }
            }
        }
        assert_eq!(mul(0, 77), 0);
        assert_eq!(mul(3, 3), 5);
        assert_eq!(mul(16, 16), 29);
    }

    #[test]
    fn inverses() {
        assert_eq!(inv(0), 0);
        assert_eq!(inv(1), 1);
        assert_eq!(inv(2), 142);
        assert_eq!(inv(3), 244);
        for a in 1..=255u8 {
            assert_eq!(mul(a, inv(a)), 1, "a = {a}");
        }
    }
}
