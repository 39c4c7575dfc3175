//! # Common Foundation Crate
//!
//! Shared block-size constants, fixed-width byte aliases, the record `Cursor`
//! and `ParseError` used across the AES-256-GCM vault workspace.

#![forbid(unsafe_code)]

use core::fmt;

// ─────────────────────────────────────────────────────────────────────────────
// Sizes and fixed-width values
// ─────────────────────────────────────────────────────────────────────────────

/// Cipher block size in bytes (128 bits).
pub const BLOCK_LEN: usize = 16;
/// AES-256 key size in bytes.
pub const KEY_LEN: usize = 32;
/// GCM nonce size in bytes (96 bits).
pub const NONCE_LEN: usize = 12;
/// Authentication tag size in bytes.
pub const TAG_LEN: usize = 16;

/// One 128-bit cipher / hash block.
pub type Block = [u8; BLOCK_LEN];
/// A 96-bit GCM nonce.
pub type Nonce = [u8; NONCE_LEN];
/// A 128-bit authentication tag.
pub type Tag = [u8; TAG_LEN];

/// XOR `src` into `dst` byte by byte. Slices must have equal length.
#[inline]
pub fn xor_in_place(dst: &mut [u8], src: &[u8]) {
    debug_assert_eq!(dst.len(), src.len());
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= *s;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ParseError
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur when decoding a stored record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Tried to read past the end of the buffer.
    #[error("unexpected end of input")]
    UnexpectedEof,
    /// A length is not acceptable in context.
    #[error("length out of range: {0}")]
    LengthOutOfRange(&'static str),
}

// ─────────────────────────────────────────────────────────────────────────────
// Cursor: byte buffer reader
// ─────────────────────────────────────────────────────────────────────────────

/// A zero-copy reader over a byte buffer.
pub struct Cursor<'a> {
    buf: &'a [u8],
    off: usize,
}

impl<'a> Cursor<'a> {
    /// Create a new cursor at offset 0.
    #[inline]
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, off: 0 }
    }

    /// Number of bytes remaining from the current position.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.off)
    }

    // ── internal ──

    #[inline]
    fn take(&mut self, n: usize) -> Result<&'a [u8], ParseError> {
        if n > self.remaining() {
            return Err(ParseError::UnexpectedEof);
        }
        let slice = &self.buf[self.off..self.off + n];
        self.off += n;
        Ok(slice)
    }

    // ── readers ──

    /// Read a fixed-size array.
    #[inline]
    pub fn array<const N: usize>(&mut self) -> Result<[u8; N], ParseError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Read everything up to the final `keep` bytes, leaving those unread.
    pub fn until_tail(&mut self, keep: usize) -> Result<&'a [u8], ParseError> {
        let n = self
            .remaining()
            .checked_sub(keep)
            .ok_or(ParseError::UnexpectedEof)?;
        self.take(n)
    }
}

impl fmt::Debug for Cursor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("off", &self.off)
            .field("len", &self.buf.len())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_reads_in_order() {
        let data = [1u8, 2, 3, 4, 5, 6, 7, 8, 0xaa, 0xbb];
        let mut c = Cursor::new(&data);
        assert_eq!(c.array::<2>().unwrap(), [1, 2]);
        assert_eq!(c.until_tail(2).unwrap(), &[3, 4, 5, 6, 7, 8]);
        assert_eq!(c.array::<2>().unwrap(), [0xaa, 0xbb]);
        assert_eq!(c.remaining(), 0);
    }

    #[test]
    fn cursor_eof() {
        let data = [1u8, 2, 3];
        let mut c = Cursor::new(&data);
        assert_eq!(c.array::<4>(), Err(ParseError::UnexpectedEof));
        // A failed read does not advance.
        assert_eq!(c.remaining(), 3);
        assert_eq!(c.array::<3>().unwrap(), [1, 2, 3]);
    }

    #[test]
    fn cursor_until_tail() {
        let data = [1u8, 2, 3, 4, 5];
        let mut c = Cursor::new(&data);
        assert_eq!(c.until_tail(2).unwrap(), &[1, 2, 3]);
        assert_eq!(c.remaining(), 2);
        assert_eq!(c.until_tail(3), Err(ParseError::UnexpectedEof));
    }

    #[test]
    fn xor_in_place_works() {
        let mut a = [0x0fu8, 0xf0, 0xff];
        xor_in_place(&mut a, &[0xff, 0xff, 0x0f]);
        assert_eq!(a, [0xf0, 0x0f, 0xf0]);
    }

    #[test]
    fn parse_error_display() {
        assert_eq!(ParseError::UnexpectedEof.to_string(), "unexpected end of input");
        assert_eq!(
            ParseError::LengthOutOfRange("record").to_string(),
            "length out of range: record"
        );
    }
}
