//! # gcm_vault
//!
//! AES-256-GCM authenticated encryption for stored sample records.
//!
//! - [`crypto`]: the cipher core (AES-256, GHASH and the streaming GCM
//!   orchestrator, see [`crypto::GcmOperation`]).
//! - [`vault`]: nonce sequences and the `nonce ‖ ciphertext ‖ tag` record
//!   format handed to storage.
//! - [`common`]: block sizes, aliases and the record parser's cursor.
//!
//! ```no_run
//! use gcm_vault::{RecordSealer, SealerConfig};
//!
//! let key = [0u8; 32];
//! let mut sealer = RecordSealer::new(&key, &SealerConfig::default());
//! let record = sealer.seal(b"session 7", b"samples").unwrap();
//! let stored = record.to_bytes();
//! assert_eq!(sealer.open_bytes(b"session 7", &stored).unwrap(), b"samples");
//! ```

pub use common;
pub use crypto;
pub use vault;

pub use common::{BLOCK_LEN, Block, KEY_LEN, NONCE_LEN, Nonce, TAG_LEN, Tag};
pub use crypto::{AesGcm, GcmError, GcmOperation, Mode, UsageError};
pub use vault::{
    NonceSequence, RECORD_OVERHEAD, RecordSealer, SealedRecord, SealerConfig, SeedSource,
    VaultError, decrypt_record, encrypt_record, next_nonce,
};

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Inputs covering empty, sub-block, aligned and unaligned lengths.
    fn cases() -> Vec<(Vec<u8>, Vec<u8>)> {
        let bytes = |n: usize, salt: u8| -> Vec<u8> {
            (0..n).map(|i| (i as u8).wrapping_mul(29).wrapping_add(salt)).collect()
        };
        vec![
            (vec![], vec![]),
            (vec![], bytes(1, 3)),
            (bytes(16, 5), vec![]),
            (bytes(20, 7), bytes(16, 11)),
            (bytes(3, 13), bytes(47, 17)),
            (bytes(64, 19), bytes(1000, 23)),
        ]
    }

    #[test]
    fn roundtrip() {
        init_logging();
        let gcm = AesGcm::new(&[0x0fu8; KEY_LEN]);
        for (i, (aad, pt)) in cases().into_iter().enumerate() {
            let nonce = [i as u8; NONCE_LEN];
            let (ct, tag) = gcm.seal(&nonce, &aad, &pt).unwrap();
            assert_eq!(ct.len(), pt.len());

            let (recovered, auth_ok) = gcm.decrypt_unverified(&nonce, &aad, &ct, &tag).unwrap();
            assert!(auth_ok);
            assert_eq!(recovered, pt);
        }
    }

    #[test]
    fn determinism() {
        let gcm = AesGcm::new(&[0x21u8; KEY_LEN]);
        let nonce = [0x34u8; NONCE_LEN];
        for (aad, pt) in cases() {
            assert_eq!(
                gcm.seal(&nonce, &aad, &pt).unwrap(),
                AesGcm::new(&[0x21u8; KEY_LEN]).seal(&nonce, &aad, &pt).unwrap()
            );
        }
    }

    #[test]
    fn single_bit_tamper_detection() {
        init_logging();
        let gcm = AesGcm::new(&[0x77u8; KEY_LEN]);
        let nonce = [0x01u8; NONCE_LEN];
        let aad = b"recording 12, channel 4".to_vec();
        let pt = b"thirty-three bytes of raw samples".to_vec();
        let (ct, tag) = gcm.seal(&nonce, &aad, &pt).unwrap();

        for bit in 0..ct.len() * 8 {
            let mut bad = ct.clone();
            bad[bit / 8] ^= 1 << (bit % 8);
            let (_, auth_ok) = gcm.decrypt_unverified(&nonce, &aad, &bad, &tag).unwrap();
            assert!(!auth_ok, "ciphertext bit {bit}");
        }
        for bit in 0..aad.len() * 8 {
            let mut bad = aad.clone();
            bad[bit / 8] ^= 1 << (bit % 8);
            assert_eq!(
                gcm.open(&nonce, &bad, &ct, &tag),
                Err(GcmError::AuthenticationFailed),
                "AAD bit {bit}"
            );
        }
        for bit in 0..TAG_LEN * 8 {
            let mut bad = tag;
            bad[bit / 8] ^= 1 << (bit % 8);
            assert_eq!(
                gcm.open(&nonce, &aad, &ct, &bad),
                Err(GcmError::AuthenticationFailed),
                "tag bit {bit}"
            );
        }
    }

    #[test]
    fn nonce_sensitivity() {
        let gcm = AesGcm::new(&[0x99u8; KEY_LEN]);
        let pt = [0u8; 48];
        let (ct_a, tag_a) = gcm.seal(&[0u8; NONCE_LEN], b"", &pt).unwrap();
        let (ct_b, tag_b) = gcm.seal(&next_nonce(0, &mut 0, true).unwrap(), b"", &pt).unwrap();
        assert_ne!(ct_a, ct_b);
        assert_ne!(tag_a, tag_b);
    }

    #[test]
    fn known_vector_empty_inputs() {
        let mut op = GcmOperation::begin(&[0u8; KEY_LEN], &[0u8; NONCE_LEN], Mode::Encrypt);
        op.feed_aad_all(&[]).unwrap();
        op.feed_data_all(&mut []).unwrap();
        assert_eq!(hex::encode(op.finish().unwrap()), "530f8afbc74536b9a963b4f1c4cb738b");
    }

    #[test]
    fn streaming_and_record_agree() {
        init_logging();
        let key = [0x5eu8; KEY_LEN];
        let mut nonces = NonceSequence::new(0xfeed, 41);
        let aad = [0xa0u8; 32];
        let pt: Vec<u8> = (0..80u8).collect();

        let record = encrypt_record(&key, &mut nonces, &aad, &pt).unwrap();
        let stored = record.to_bytes();
        assert_eq!(stored.len(), pt.len() + RECORD_OVERHEAD);

        // Decrypt the stored record block by block.
        let parsed = SealedRecord::from_bytes(&stored).unwrap();
        let mut op = GcmOperation::begin(&key, &parsed.nonce, Mode::Decrypt);
        op.feed_aad(&aad[..16], false).unwrap();
        op.feed_aad(&aad[16..], true).unwrap();
        let mut data = parsed.ciphertext.clone();
        let blocks = data.len() / BLOCK_LEN;
        for (i, chunk) in data.chunks_mut(BLOCK_LEN).enumerate() {
            op.feed_data(chunk, i + 1 == blocks).unwrap();
        }
        assert!(op.verify(&parsed.tag).unwrap());
        assert_eq!(data, pt);

        assert_eq!(
            decrypt_record(&key, &parsed.nonce, &aad, &parsed.ciphertext, &parsed.tag).unwrap(),
            pt
        );
    }

    #[test]
    fn sealer_with_default_config() {
        let mut sealer = RecordSealer::new(&[3u8; KEY_LEN], &SealerConfig::default());
        let stored = sealer.seal(b"session 7", b"samples").unwrap().to_bytes();
        assert_eq!(sealer.open_bytes(b"session 7", &stored).unwrap(), b"samples");
        assert!(matches!(
            sealer.open_bytes(b"session 8", &stored),
            Err(VaultError::Authentication)
        ));
    }
}
