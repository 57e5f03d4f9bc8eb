//! Packed bit vectors for secrets and their recovered copies.

use core::fmt;
use core::ops::Range;

/// A fixed-length binary vector packed into `u64` words.
///
/// Bit `i` lives in word `i / 64` at position `i % 64`, which matches the
/// little-endian byte layout HQC uses for its vectors.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SecretVector {
    len: usize,
    words: Vec<u64>,
}

impl SecretVector {
    /// All-zero vector of `len` bits.
    pub fn zeros(len: usize) -> Self {
        Self {
            len,
            words: vec![0; len.div_ceil(64)],
        }
    }

    /// Vector with exactly the listed positions set. Positions `>= len` are ignored.
    pub fn from_support(len: usize, support: &[usize]) -> Self {
        let mut v = Self::zeros(len);
        for &i in support.iter().filter(|&&i| i < len) {
            v.set(i, true);
        }
        v
    }

    /// Vector over packed words; missing words read as zero, excess bits are dropped.
    pub(crate) fn from_words(len: usize, mut words: Vec<u64>) -> Self {
        words.resize(len.div_ceil(64), 0);
        let mut v = Self { len, words };
        v.mask_tail();
        v
    }

    /// Parse `len` bits from little-endian bytes (bit `i` is bit `i % 8` of byte `i / 8`).
    /// Missing bytes read as zero; bits beyond `len` are dropped.
    pub fn from_le_bytes(len: usize, bytes: &[u8]) -> Self {
        let mut v = Self::zeros(len);
        for (w, chunk) in v.words.iter_mut().zip(bytes.chunks(8)) {
            let mut buf = [0u8; 8];
            buf[..chunk.len()].copy_from_slice(chunk);
            *w = u64::from_le_bytes(buf);
        }
        v.mask_tail();
        v
    }

    /// Little-endian byte encoding, `ceil(len / 8)` bytes.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut out: Vec<u8> = self.words.iter().flat_map(|w| w.to_le_bytes()).collect();
        out.truncate(self.len.div_ceil(8));
        out
    }

    /// Number of bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` for the zero-length vector.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Packed words; bits beyond `len` are always zero.
    #[inline]
    pub fn as_words(&self) -> &[u64] {
        &self.words
    }

    /// Bit `i`.
    #[inline]
    pub fn get(&self, i: usize) -> bool {
        debug_assert!(i < self.len);
        (self.words[i >> 6] >> (i & 63)) & 1 == 1
    }

    /// Set bit `i` to `bit`.
    #[inline]
    pub fn set(&mut self, i: usize, bit: bool) {
        debug_assert!(i < self.len);
        let mask = 1u64 << (i & 63);
        if bit {
            self.words[i >> 6] |= mask;
        } else {
            self.words[i >> 6] &= !mask;
        }
    }

    /// Toggle bit `i`.
    #[inline]
    pub fn flip(&mut self, i: usize) {
        debug_assert!(i < self.len);
        self.words[i >> 6] ^= 1u64 << (i & 63);
    }

    /// Hamming weight.
    pub fn weight(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Hamming weight restricted to `range`.
    pub fn weight_in(&self, range: Range<usize>) -> usize {
        let end = range.end.min(self.len);
        let mut start = range.start;
        let mut total = 0;
        while start < end {
            let word = start >> 6;
            let lo = start & 63;
            let hi = (end - (word << 6)).min(64);
            let mut w = self.words[word] >> lo;
            if hi - lo < 64 {
                w &= (1u64 << (hi - lo)) - 1;
            }
            total += w.count_ones() as usize;
            start = (word << 6) + hi;
        }
        total
    }

    /// Positions of the set bits, ascending.
    pub fn support(&self) -> Vec<usize> {
        self.iter_ones().collect()
    }

    /// Iterator over set positions, ascending.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(wi, &w)| {
            let mut rest = w;
            core::iter::from_fn(move || {
                if rest == 0 {
                    return None;
                }
                let bit = rest.trailing_zeros() as usize;
                rest &= rest - 1;
                Some(wi * 64 + bit)
            })
        })
    }

    /// Hamming distance to `other`. Vectors of different length compare over
    /// the shorter one and count the excess bits of the longer one.
    pub fn distance(&self, other: &Self) -> usize {
        let (short, long) = if self.words.len() <= other.words.len() {
            (self, other)
        } else {
            (other, self)
        };
        let common: usize = short
            .words
            .iter()
            .zip(&long.words)
            .map(|(a, b)| (a ^ b).count_ones() as usize)
            .sum();
        let excess: usize = long.words[short.words.len()..]
            .iter()
            .map(|w| w.count_ones() as usize)
            .sum();
        common + excess
    }

    /// XOR `other` into `self`. Bits of `other` past `self.len()` are ignored.
    pub fn xor_assign(&mut self, other: &Self) {
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a ^= b;
        }
        self.mask_tail();
    }

    /// Copy truncated or zero-extended to `len` bits.
    pub fn resized(&self, len: usize) -> Self {
        let mut v = Self::zeros(len);
        let common = v.words.len().min(self.words.len());
        v.words[..common].copy_from_slice(&self.words[..common]);
        v.mask_tail();
        v
    }

    fn mask_tail(&mut self) {
        let rem = self.len % 64;
        if rem != 0
            && let Some(last) = self.words.last_mut()
        {
            *last &= (1u64 << rem) - 1;
        }
    }
}

impl fmt::Debug for SecretVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretVector")
            .field("len", &self.len)
            .field("weight", &self.weight())
            .finish()
    }
}
