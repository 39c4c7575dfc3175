/// AES-256-GCM authenticated encryption per NIST SP 800-38D.
///
/// [`AesGcm`] holds the key schedule and the hash subkey H = AES_K(0^128) and
/// can be shared read-only by any number of concurrent operations. Each
/// [`GcmOperation`] owns the ephemeral state of one encryption or decryption:
///
/// ```text
/// begin ──► feed_aad* ──► feed_data* ──► finish (encrypt) / verify (decrypt)
/// ```
///
/// Counter blocks are `nonce ‖ ctr32` with J0 = `nonce ‖ 1`. Block index 0
/// (J0) masks the tag; data block `i` (1-based) uses `nonce ‖ (i + 1)`.
///
/// Inputs arrive in 16-byte chunks. Only the chunk flagged `is_last` may be
/// shorter; it is zero-padded for GHASH and its exact length enters the
/// length block.

use core::borrow::Borrow;
use core::fmt;

use common::{BLOCK_LEN, Block, KEY_LEN, NONCE_LEN, Nonce, Tag, xor_in_place};
use log::{trace, warn};
use zeroize::Zeroize;

use crate::aes::{RoundKeySchedule, encrypt_block};
use crate::constant_time;
use crate::ghash::Ghash;

/// The 32-bit counter leaves room for 2^32 − 2 data blocks after J0.
pub const MAX_DATA_BLOCKS: u64 = (1 << 32) - 2;

/// Below this many blocks the keystream is computed inline even with `parallel`.
#[cfg(feature = "parallel")]
const PARALLEL_MIN_BLOCKS: usize = 64;

// ─────────────────────────────────────────────────────────────────────────────
// Modes and errors
// ─────────────────────────────────────────────────────────────────────────────

/// Direction of an operation. The wire flag is 0 for encrypt, 1 for decrypt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Encrypt,
    Decrypt,
}

impl Mode {
    pub fn flag(self) -> u8 {
        match self {
            Mode::Encrypt => 0,
            Mode::Decrypt => 1,
        }
    }

    pub fn from_flag(flag: u8) -> Option<Self> {
        match flag {
            0 => Some(Mode::Encrypt),
            1 => Some(Mode::Decrypt),
            _ => None,
        }
    }
}

/// An operation method was called out of order or with a malformed chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UsageError {
    #[error("finished before any AAD or data was fed")]
    NothingFed,
    #[error("AAD fed after the AAD phase was closed")]
    AadClosed,
    #[error("AAD was started but never marked last")]
    AadNotFinished,
    #[error("data fed after the final data chunk")]
    DataFinished,
    #[error("data was started but never marked last")]
    DataNotFinished,
    #[error("non-final chunk of {len} bytes; only the last chunk may be partial")]
    PartialBlock { len: usize },
    #[error("chunk of {len} bytes is larger than one block")]
    OversizedBlock { len: usize },
    #[error("operation was not begun in {expected:?} mode")]
    WrongMode { expected: Mode },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GcmError {
    #[error("usage error: {0}")]
    Usage(#[from] UsageError),
    /// Data beyond [`MAX_DATA_BLOCKS`] or AAD beyond 2^64 bits.
    #[error("input exceeds the GCM length limit")]
    LengthOverflow,
    /// Only returned by the one-shot [`AesGcm::open`].
    #[error("authentication failed")]
    AuthenticationFailed,
}

/// Chunks must be one block, except the last which may be shorter.
fn check_chunk(len: usize, is_last: bool) -> Result<(), UsageError> {
    if len > BLOCK_LEN {
        Err(UsageError::OversizedBlock { len })
    } else if len < BLOCK_LEN && !is_last {
        Err(UsageError::PartialBlock { len })
    } else {
        Ok(())
    }
}

/// Counter block for `index`, counted from J0.
fn counter_block(nonce: &Nonce, index: u64) -> Block {
    debug_assert!(index <= MAX_DATA_BLOCKS);
    let mut block = [0u8; BLOCK_LEN];
    block[..NONCE_LEN].copy_from_slice(nonce);
    block[NONCE_LEN..].copy_from_slice(&((index + 1) as u32).to_be_bytes());
    block
}

// ─────────────────────────────────────────────────────────────────────────────
// Keyed context
// ─────────────────────────────────────────────────────────────────────────────

/// AES-256-GCM context. Pre-computes H = AES_K(0^128) for GHASH.
#[derive(Clone)]
pub struct AesGcm {
    schedule: RoundKeySchedule,
    h: Block,
}

impl AesGcm {
    pub fn new(key: &[u8; KEY_LEN]) -> Self {
        Self::from_schedule(RoundKeySchedule::new(key))
    }

    /// Wrap an already expanded key.
    pub fn from_schedule(schedule: RoundKeySchedule) -> Self {
        let h = encrypt_block(&schedule, &[0u8; BLOCK_LEN]);
        Self { schedule, h }
    }

    /// Start an operation that borrows this context.
    pub fn begin(&self, nonce: &Nonce, mode: Mode) -> GcmOperation<&AesGcm> {
        GcmOperation::with_cipher(self, nonce, mode)
    }

    /// Encrypt and authenticate. Returns `(ciphertext, tag)`.
    ///
    /// `nonce` MUST be unique per message under the same key.
    pub fn seal(
        &self,
        nonce: &Nonce,
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<(Vec<u8>, Tag), GcmError> {
        let mut op = self.begin(nonce, Mode::Encrypt);
        op.feed_aad_all(aad)?;
        let mut ciphertext = plaintext.to_vec();
        op.feed_data_all(&mut ciphertext)?;
        let tag = op.finish()?;
        Ok((ciphertext, tag))
    }

    /// Decrypt and verify. The plaintext is only released when the tag matches.
    pub fn open(
        &self,
        nonce: &Nonce,
        aad: &[u8],
        ciphertext: &[u8],
        tag: &Tag,
    ) -> Result<Vec<u8>, GcmError> {
        let (mut plaintext, auth_ok) = self.decrypt_unverified(nonce, aad, ciphertext, tag)?;
        if !auth_ok {
            plaintext.zeroize();
            return Err(GcmError::AuthenticationFailed);
        }
        Ok(plaintext)
    }

    /// Decrypt and return the recovered bytes together with the verdict.
    ///
    /// When the verdict is `false` the bytes are unauthenticated and must be
    /// discarded by the caller.
    pub fn decrypt_unverified(
        &self,
        nonce: &Nonce,
        aad: &[u8],
        ciphertext: &[u8],
        tag: &Tag,
    ) -> Result<(Vec<u8>, bool), GcmError> {
        let mut op = self.begin(nonce, Mode::Decrypt);
        op.feed_aad_all(aad)?;
        let mut plaintext = ciphertext.to_vec();
        op.feed_data_all(&mut plaintext)?;
        let auth_ok = op.verify(tag)?;
        Ok((plaintext, auth_ok))
    }

    fn xor_keystream(&self, nonce: &Nonce, index: u64, chunk: &mut [u8]) {
        let mut keystream = encrypt_block(&self.schedule, &counter_block(nonce, index));
        xor_in_place(chunk, &keystream[..chunk.len()]);
        keystream.zeroize();
    }

    /// XOR the CTR keystream for data blocks `first..` into `data`.
    fn apply_keystream(&self, nonce: &Nonce, first: u64, data: &mut [u8]) {
        #[cfg(feature = "parallel")]
        if data.len() >= PARALLEL_MIN_BLOCKS * BLOCK_LEN {
            use rayon::prelude::*;
            data.par_chunks_mut(BLOCK_LEN)
                .enumerate()
                .for_each(|(i, chunk)| self.xor_keystream(nonce, first + i as u64, chunk));
            return;
        }

        for (i, chunk) in data.chunks_mut(BLOCK_LEN).enumerate() {
            self.xor_keystream(nonce, first + i as u64, chunk);
        }
    }
}

impl Drop for AesGcm {
    fn drop(&mut self) {
        self.h.zeroize();
    }
}

impl fmt::Debug for AesGcm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AesGcm(..)")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Per-operation state machine
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Nothing fed yet.
    Start,
    /// AAD in progress.
    Aad,
    /// AAD marked last; no data yet.
    AadDone,
    /// Data in progress.
    Data,
    /// Data marked last.
    DataDone,
}

/// One in-flight authenticated encryption or decryption.
///
/// `C` is anything that yields an [`AesGcm`]: a borrow for operations sharing
/// one key schedule, an `Arc` across threads, or an owned context from
/// [`GcmOperation::begin`]. Dropping an unfinished operation clears its state.
pub struct GcmOperation<C: Borrow<AesGcm>> {
    cipher: C,
    mode: Mode,
    nonce: Nonce,
    tag_mask: Block,
    ghash: Ghash,
    phase: Phase,
    aad_bits: u64,
    data_bits: u64,
    blocks: u64,
}

impl GcmOperation<AesGcm> {
    /// Expand `key` and start an operation that owns its context.
    pub fn begin(key: &[u8; KEY_LEN], nonce: &Nonce, mode: Mode) -> Self {
        Self::with_cipher(AesGcm::new(key), nonce, mode)
    }
}

impl<C: Borrow<AesGcm>> GcmOperation<C> {
    pub fn with_cipher(cipher: C, nonce: &Nonce, mode: Mode) -> Self {
        let (ghash, tag_mask) = {
            let ctx: &AesGcm = cipher.borrow();
            trace!("gcm: begin {mode:?}, nonce {nonce:02x?}");
            (
                Ghash::new(&ctx.h),
                encrypt_block(&ctx.schedule, &counter_block(nonce, 0)),
            )
        };
        Self {
            cipher,
            mode,
            nonce: *nonce,
            tag_mask,
            ghash,
            phase: Phase::Start,
            aad_bits: 0,
            data_bits: 0,
            blocks: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn nonce(&self) -> &Nonce {
        &self.nonce
    }

    /// AAD absorbed so far, in bits.
    pub fn aad_bits(&self) -> u64 {
        self.aad_bits
    }

    /// Data processed so far, in bits.
    pub fn data_bits(&self) -> u64 {
        self.data_bits
    }

    // ── AAD ──

    /// Authenticate one AAD chunk.
    pub fn feed_aad(&mut self, chunk: &[u8], is_last: bool) -> Result<(), GcmError> {
        check_chunk(chunk.len(), is_last)?;
        self.enter_aad()?;
        self.absorb_aad(chunk)?;
        self.phase = if is_last { Phase::AadDone } else { Phase::Aad };
        Ok(())
    }

    /// Authenticate the remaining AAD in one call and close the AAD phase.
    pub fn feed_aad_all(&mut self, aad: &[u8]) -> Result<(), GcmError> {
        self.enter_aad()?;
        self.absorb_aad(aad)?;
        self.phase = Phase::AadDone;
        Ok(())
    }

    fn enter_aad(&self) -> Result<(), UsageError> {
        match self.phase {
            Phase::Start | Phase::Aad => Ok(()),
            Phase::AadDone | Phase::Data | Phase::DataDone => Err(UsageError::AadClosed),
        }
    }

    fn absorb_aad(&mut self, aad: &[u8]) -> Result<(), GcmError> {
        let bits = (aad.len() as u64)
            .checked_mul(8)
            .and_then(|bits| self.aad_bits.checked_add(bits))
            .ok_or(GcmError::LengthOverflow)?;
        self.ghash.update_padded(aad);
        self.aad_bits = bits;
        Ok(())
    }

    // ── data ──

    /// Encrypt or decrypt one chunk in place.
    ///
    /// GHASH always absorbs the ciphertext side of the chunk. Feeding data
    /// without any prior AAD closes an empty AAD phase.
    pub fn feed_data(&mut self, chunk: &mut [u8], is_last: bool) -> Result<(), GcmError> {
        check_chunk(chunk.len(), is_last)?;
        self.enter_data()?;
        self.process(chunk)?;
        if is_last {
            self.phase = Phase::DataDone;
        }
        Ok(())
    }

    /// Encrypt or decrypt the remaining data in one call and close the data phase.
    pub fn feed_data_all(&mut self, data: &mut [u8]) -> Result<(), GcmError> {
        self.enter_data()?;
        self.process(data)?;
        self.phase = Phase::DataDone;
        Ok(())
    }

    fn enter_data(&mut self) -> Result<(), UsageError> {
        match self.phase {
            Phase::Start | Phase::AadDone => {
                self.phase = Phase::Data;
                Ok(())
            }
            Phase::Data => Ok(()),
            Phase::Aad => Err(UsageError::AadNotFinished),
            Phase::DataDone => Err(UsageError::DataFinished),
        }
    }

    fn process(&mut self, data: &mut [u8]) -> Result<(), GcmError> {
        let count = data.len().div_ceil(BLOCK_LEN) as u64;
        if count > MAX_DATA_BLOCKS - self.blocks {
            return Err(GcmError::LengthOverflow);
        }
        let first = self.blocks + 1;
        let cipher: &AesGcm = self.cipher.borrow();

        match self.mode {
            Mode::Encrypt => {
                cipher.apply_keystream(&self.nonce, first, data);
                self.ghash.update_padded(data);
            }
            Mode::Decrypt => {
                self.ghash.update_padded(data);
                cipher.apply_keystream(&self.nonce, first, data);
            }
        }

        self.blocks += count;
        self.data_bits += data.len() as u64 * 8;
        Ok(())
    }

    // ── finalization ──

    /// Close an encryption and return its tag.
    pub fn finish(mut self) -> Result<Tag, GcmError> {
        self.expect_mode(Mode::Encrypt)?;
        Ok(self.compute_tag()?)
    }

    /// Close a decryption and compare against `expected` in constant time.
    ///
    /// A mismatch is a normal outcome and is reported as `Ok(false)`.
    pub fn verify(mut self, expected: &Tag) -> Result<bool, GcmError> {
        self.expect_mode(Mode::Decrypt)?;
        let mut tag = self.compute_tag()?;
        let auth_ok = constant_time::ct_eq(&tag, expected);
        tag.zeroize();
        if !auth_ok {
            warn!(
                "gcm: tag mismatch for nonce {:02x?} ({} AAD bits, {} data bits)",
                self.nonce, self.aad_bits, self.data_bits
            );
        }
        Ok(auth_ok)
    }

    fn expect_mode(&self, expected: Mode) -> Result<(), UsageError> {
        if self.mode == expected {
            Ok(())
        } else {
            Err(UsageError::WrongMode { expected })
        }
    }

    fn compute_tag(&mut self) -> Result<Tag, UsageError> {
        match self.phase {
            Phase::Start => return Err(UsageError::NothingFed),
            Phase::Aad => return Err(UsageError::AadNotFinished),
            Phase::Data => return Err(UsageError::DataNotFinished),
            Phase::AadDone | Phase::DataDone => {}
        }
        self.ghash.update_lengths(self.aad_bits, self.data_bits);
        let mut tag: Tag = self.ghash.finalize();
        xor_in_place(&mut tag, &self.tag_mask);
        trace!(
            "gcm: finished {:?} ({} AAD bits, {} data bits)",
            self.mode, self.aad_bits, self.data_bits
        );
        Ok(tag)
    }
}

impl<C: Borrow<AesGcm>> Drop for GcmOperation<C> {
    fn drop(&mut self) {
        self.tag_mask.zeroize();
    }
}
