//! HQC parameter sets, Table 5 of HQC 2025-08-22.

use core::fmt::Debug;

use hybrid_array::{
    ArraySize,
    typenum::{U16, U24, U32},
};

use crate::params::SchemeParams;

/// Compile-time description of one HQC security level.
pub trait HqcParameterSet: Copy + Default + Debug + Send + Sync + 'static {
    /// Display name, e.g. `hqc-1`.
    const NAME: &'static str;
    /// Length of the ambient space.
    const N: usize;
    /// Reed-Solomon block length.
    const N1: usize;
    /// Duplicated Reed-Muller block length.
    const N2: usize;
    /// Weight of `x` and `y`.
    const OMEGA: usize;
    /// Weight of `r1`, `r2` and `e`.
    const OMEGA_R: usize;
    /// Reed-Solomon correction capacity.
    const DELTA: usize;
    /// Copies of each RM(1,7) codeword.
    const MULTIPLICITY: usize;
    /// Reed-Solomon generator, lowest degree first, `2 * DELTA + 1` coefficients.
    const RS_POLY: &'static [u8];

    /// Message length in bytes.
    type K: ArraySize;

    /// The shape the attack engine sees.
    fn scheme() -> SchemeParams {
        SchemeParams {
            n: Self::N,
            n1: Self::N1,
            n2: Self::N2,
            omega: Self::OMEGA,
            delta: Self::DELTA,
        }
    }

    /// Bytes of a serialized `u`.
    fn u_bytes() -> usize {
        Self::N.div_ceil(8)
    }

    /// Bytes of a serialized `v`.
    fn v_bytes() -> usize {
        (Self::N1 * Self::N2).div_ceil(8)
    }
}

/// HQC-1 (NIST level 1).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Hqc1;

/// HQC-3 (NIST level 3).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Hqc3;

/// HQC-5 (NIST level 5).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Hqc5;

impl HqcParameterSet for Hqc1 {
    const NAME: &'static str = "hqc-1";
    const N: usize = 17669;
    const N1: usize = 46;
    const N2: usize = 384;
    const OMEGA: usize = 66;
    const OMEGA_R: usize = 75;
    const DELTA: usize = 15;
    const MULTIPLICITY: usize = 3;
    const RS_POLY: &'static [u8] = &[
        89, 69, 153, 116, 176, 117, 111, 75, 73, 233, 242, 233, 65, 210, 21, 139, 103, 173, 67,
        118, 105, 210, 174, 110, 74, 69, 228, 82, 255, 181, 1,
    ];
    type K = U16;
}

impl HqcParameterSet for Hqc3 {
    const NAME: &'static str = "hqc-3";
    const N: usize = 35851;
    const N1: usize = 56;
    const N2: usize = 640;
    const OMEGA: usize = 100;
    const OMEGA_R: usize = 114;
    const DELTA: usize = 16;
    const MULTIPLICITY: usize = 5;
    const RS_POLY: &'static [u8] = &[
        45, 216, 239, 24, 253, 104, 27, 40, 107, 50, 163, 210, 227, 134, 224, 158, 119, 13, 158, 1,
        238, 164, 82, 43, 15, 232, 246, 142, 50, 189, 29, 232, 1,
    ];
    type K = U24;
}

impl HqcParameterSet for Hqc5 {
    const NAME: &'static str = "hqc-5";
    const N: usize = 57637;
    const N1: usize = 90;
    const N2: usize = 640;
    const OMEGA: usize = 131;
    const OMEGA_R: usize = 149;
    const DELTA: usize = 29;
    const MULTIPLICITY: usize = 5;
    const RS_POLY: &'static [u8] = &[
        49, 167, 49, 39, 200, 121, 124, 91, 240, 63, 148, 71, 150, 123, 87, 101, 32, 215, 159, 71,
        201, 115, 97, 210, 186, 183, 141, 217, 123, 12, 31, 243, 180, 219, 152, 239, 99, 141, 4,
        246, 191, 144, 8, 232, 47, 27, 141, 178, 130, 64, 124, 47, 39, 188, 216, 48, 199, 187, 1,
    ];
    type K = U32;
}
