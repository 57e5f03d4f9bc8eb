//! Shape of the secret vector as seen by the attack.

use core::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{AttackError, Result};

/// Parameters of the attacked scheme that the engine needs.
///
/// The secret vector has `n` bits. The first `n1 * n2` bits form the coded
/// segment (`n1` blocks of `n2` bits); the remaining bits form the tail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeParams {
    /// Total length of the secret vector.
    pub n: usize,
    /// Number of inner-code blocks (outer code length).
    pub n1: usize,
    /// Bits per inner-code block.
    pub n2: usize,
    /// Fixed Hamming weight of the secret vector.
    pub omega: usize,
    /// Outer decoding capacity: number of whole blocks flipped in a corrupt phase.
    pub delta: usize,
}

impl SchemeParams {
    /// HQC-1 (NIST level 1): the example parameters of the attack.
    pub const HQC1: Self = Self {
        n: 17669,
        n1: 46,
        n2: 384,
        omega: 66,
        delta: 15,
    };

    /// HQC-3 (NIST level 3)
    pub const HQC3: Self = Self {
        n: 35851,
        n1: 56,
        n2: 640,
        omega: 100,
        delta: 16,
    };

    /// HQC-5 (NIST level 5)
    pub const HQC5: Self = Self {
        n: 57637,
        n1: 90,
        n2: 640,
        omega: 131,
        delta: 29,
    };

    /// Length of the coded segment.
    #[inline]
    pub const fn n1n2(&self) -> usize {
        self.n1 * self.n2
    }

    /// Length of the tail segment.
    #[inline]
    pub const fn tail_len(&self) -> usize {
        self.n - self.n1n2()
    }

    /// Absolute bit range of block `b` inside the secret vector.
    #[inline]
    pub const fn block(&self, b: usize) -> Range<usize> {
        b * self.n2..(b + 1) * self.n2
    }

    /// Absolute bit range of the tail segment.
    #[inline]
    pub const fn tail(&self) -> Range<usize> {
        self.n1n2()..self.n
    }

    /// Check that the parameters describe a vector the driver can attack.
    pub fn validate(&self) -> Result<()> {
        if self.n1 == 0 || self.n2 == 0 {
            return Err(AttackError::InvalidParams(
                "n1 and n2 must be non-zero".into(),
            ));
        }
        if self.n1n2() > self.n {
            return Err(AttackError::InvalidParams(format!(
                "coded segment {} exceeds vector length {}",
                self.n1n2(),
                self.n
            )));
        }
        // Two disjoint corrupt ranges must fit: [0, delta) and [delta, 2 delta).
        if self.delta == 0 || 2 * self.delta > self.n1 {
            return Err(AttackError::InvalidParams(format!(
                "delta {} must satisfy 0 < 2*delta <= n1 = {}",
                self.delta, self.n1
            )));
        }
        if self.omega == 0 || self.omega > self.n {
            return Err(AttackError::InvalidParams(format!(
                "omega {} out of range for n = {}",
                self.omega, self.n
            )));
        }
        Ok(())
    }
}
