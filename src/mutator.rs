//! Bit-level mutation of serialized ciphertexts.
//!
//! [`flip_bit`] is the raw primitive: it toggles one bit and keeps no record.
//! Probing code never calls it directly on the probe ciphertext. It goes
//! through a [`FlipGuard`], which remembers every flip it applied and undoes
//! them when dropped, so the buffer is restored on every exit path of a
//! probing routine, including `?` propagation.

use core::fmt;
use core::ops::Range;

/// Opaque serialized ciphertext bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct CiphertextBuffer {
    bytes: Vec<u8>,
}

impl CiphertextBuffer {
    /// Wrap serialized bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Serialized bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// `true` when no bytes are present.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Toggle the bit at absolute offset `bit` (bit `bit % 8` of byte `bit / 8`).
    #[inline]
    pub fn flip_bit(&mut self, bit: usize) {
        flip_bit(&mut self.bytes, bit);
    }
}

impl From<Vec<u8>> for CiphertextBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl AsRef<[u8]> for CiphertextBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for CiphertextBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head = &self.bytes[..self.bytes.len().min(8)];
        write!(f, "CiphertextBuffer({} bytes, {}..)", self.len(), hex::encode(head))
    }
}

/// Toggle one bit of `buf`. Two calls with the same index cancel out.
#[inline]
pub fn flip_bit(buf: &mut [u8], bit: usize) {
    buf[bit >> 3] ^= 1 << (bit & 7);
}

/// Scoped set of flips over the codeword region of a ciphertext.
///
/// Positions are relative to `origin`, the absolute bit offset of the region,
/// so callers address bits by their coded-segment index. Every flip is
/// undone, in reverse order, when the guard is dropped.
pub struct FlipGuard<'a> {
    buffer: &'a mut CiphertextBuffer,
    origin: usize,
    flipped: Vec<usize>,
}

impl<'a> FlipGuard<'a> {
    /// Start an empty flip scope over `buffer`, with region offset `origin`.
    pub fn new(buffer: &'a mut CiphertextBuffer, origin: usize) -> Self {
        Self {
            buffer,
            origin,
            flipped: Vec::new(),
        }
    }

    /// Toggle region position `pos` and record it.
    #[inline]
    pub fn flip(&mut self, pos: usize) {
        self.buffer.flip_bit(self.origin + pos);
        self.flipped.push(pos);
    }

    /// Toggle every position in `range`.
    pub fn flip_range(&mut self, range: Range<usize>) {
        for pos in range {
            self.flip(pos);
        }
    }

    /// An inner scope over the same buffer. Its flips are undone when it is
    /// dropped, before this guard can be used again.
    pub fn nested(&mut self) -> FlipGuard<'_> {
        FlipGuard {
            buffer: &mut *self.buffer,
            origin: self.origin,
            flipped: Vec::new(),
        }
    }

    /// The ciphertext with all currently applied flips.
    #[inline]
    pub fn ciphertext(&self) -> &CiphertextBuffer {
        &*self.buffer
    }

    /// Positions flipped by this scope, in application order.
    #[inline]
    pub fn flipped(&self) -> &[usize] {
        &self.flipped
    }
}

impl Drop for FlipGuard<'_> {
    fn drop(&mut self) {
        for &pos in self.flipped.iter().rev() {
            flip_bit(&mut self.buffer.bytes, self.origin + pos);
        }
    }
}
