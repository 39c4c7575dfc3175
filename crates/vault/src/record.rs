/// Stored record layout and the seal/open wrapper around AES-256-GCM.
///
/// Record format (what the storage layer receives and returns):
/// - 12 bytes nonce (`seed ‖ counter`, big-endian)
/// - ciphertext, same length as the plaintext
/// - 16 bytes authentication tag
///
/// The record carries no length field; its extent is known to the storage layer.

use std::io::{self, Write};

use common::{Cursor, KEY_LEN, NONCE_LEN, Nonce, ParseError, TAG_LEN, Tag};
use crypto::AesGcm;
use log::{debug, warn};

use crate::config::SealerConfig;
use crate::error::VaultError;
use crate::nonce::NonceSequence;

/// Bytes a record adds beyond its ciphertext.
pub const RECORD_OVERHEAD: usize = NONCE_LEN + TAG_LEN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedRecord {
    pub nonce: Nonce,
    pub ciphertext: Vec<u8>,
    pub tag: Tag,
}

impl SealedRecord {
    pub fn encoded_len(&self) -> usize {
        RECORD_OVERHEAD + self.ciphertext.len()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out.extend_from_slice(&self.tag);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ParseError> {
        if bytes.len() < RECORD_OVERHEAD {
            return Err(ParseError::LengthOutOfRange("record shorter than nonce and tag"));
        }
        let mut cursor = Cursor::new(bytes);
        let nonce = cursor.array::<NONCE_LEN>()?;
        let ciphertext = cursor.until_tail(TAG_LEN)?.to_vec();
        let tag = cursor.array::<TAG_LEN>()?;
        Ok(Self {
            nonce,
            ciphertext,
            tag,
        })
    }

    /// Write the encoded record to a stream.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.nonce)?;
        w.write_all(&self.ciphertext)?;
        w.write_all(&self.tag)?;
        w.flush()
    }
}

/// Encrypt `plaintext` under a fresh nonce from `nonces`.
pub fn encrypt_record(
    key: &[u8; KEY_LEN],
    nonces: &mut NonceSequence,
    aad: &[u8],
    plaintext: &[u8],
) -> Result<SealedRecord, VaultError> {
    seal_with(&AesGcm::new(key), nonces, aad, plaintext)
}

/// Decrypt and authenticate a record's parts.
pub fn decrypt_record(
    key: &[u8; KEY_LEN],
    nonce: &Nonce,
    aad: &[u8],
    ciphertext: &[u8],
    tag: &Tag,
) -> Result<Vec<u8>, VaultError> {
    open_with(&AesGcm::new(key), nonce, aad, ciphertext, tag)
}

fn seal_with(
    gcm: &AesGcm,
    nonces: &mut NonceSequence,
    aad: &[u8],
    plaintext: &[u8],
) -> Result<SealedRecord, VaultError> {
    let nonce = nonces.next_nonce()?;
    let (ciphertext, tag) = gcm.seal(&nonce, aad, plaintext)?;
    debug!(
        "vault: sealed {} bytes under nonce {:02x?} ({} AAD bytes)",
        plaintext.len(),
        nonce,
        aad.len()
    );
    Ok(SealedRecord {
        nonce,
        ciphertext,
        tag,
    })
}

fn open_with(
    gcm: &AesGcm,
    nonce: &Nonce,
    aad: &[u8],
    ciphertext: &[u8],
    tag: &Tag,
) -> Result<Vec<u8>, VaultError> {
    let plaintext = gcm.open(nonce, aad, ciphertext, tag).map_err(|e| {
        warn!("vault: rejected record with nonce {nonce:02x?}: {e}");
        VaultError::from(e)
    })?;
    debug!("vault: opened {} bytes under nonce {:02x?}", plaintext.len(), nonce);
    Ok(plaintext)
}

/// One key plus its nonce sequence, for sealing many records.
///
/// The key schedule and hash subkey are computed once at construction.
#[derive(Debug)]
pub struct RecordSealer {
    gcm: AesGcm,
    nonces: NonceSequence,
}

impl RecordSealer {
    pub fn new(key: &[u8; KEY_LEN], config: &SealerConfig) -> Self {
        Self::with_sequence(key, NonceSequence::from_config(config))
    }

    pub fn with_sequence(key: &[u8; KEY_LEN], nonces: NonceSequence) -> Self {
        Self {
            gcm: AesGcm::new(key),
            nonces,
        }
    }

    pub fn nonces(&self) -> &NonceSequence {
        &self.nonces
    }

    pub fn seal(&mut self, aad: &[u8], plaintext: &[u8]) -> Result<SealedRecord, VaultError> {
        seal_with(&self.gcm, &mut self.nonces, aad, plaintext)
    }

    pub fn open(&self, aad: &[u8], record: &SealedRecord) -> Result<Vec<u8>, VaultError> {
        open_with(&self.gcm, &record.nonce, aad, &record.ciphertext, &record.tag)
    }

    /// Parse an encoded record and open it.
    pub fn open_bytes(&self, aad: &[u8], bytes: &[u8]) -> Result<Vec<u8>, VaultError> {
        self.open(aad, &SealedRecord::from_bytes(bytes)?)
    }
}
