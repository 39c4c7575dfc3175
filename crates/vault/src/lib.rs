//! Nonce bookkeeping and `nonce ‖ ciphertext ‖ tag` records on top of the
//! AES-256-GCM engine in `crypto`.
//!
//! The storage layer only ever sees [`SealedRecord`] bytes; keys and seeds
//! are supplied by the caller.

pub mod config;
pub mod error;
pub mod nonce;
pub mod record;

pub use config::{SealerConfig, SeedSource};
pub use error::VaultError;
pub use nonce::{NonceSequence, join_nonce, next_nonce, split_nonce};
pub use record::{RECORD_OVERHEAD, RecordSealer, SealedRecord, decrypt_record, encrypt_record};
