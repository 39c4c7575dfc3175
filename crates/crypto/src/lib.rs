/// AES-256-GCM authenticated encryption, built from scratch.
///
/// # Modules
///
/// - [`gf256`]: GF(2^8) arithmetic, S-boxes and the AES round transforms
/// - [`aes`]: AES-256 key schedule and block cipher (FIPS 197)
/// - [`ghash`]: GF(2^128) multiplication and the GHASH accumulator
/// - [`gcm`]: streaming GCM orchestrator and one-shot seal/open (NIST SP 800-38D)
/// - [`constant_time`]: constant-time tag comparison

pub mod gf256;
pub mod aes;
pub mod ghash;
pub mod gcm;
pub mod constant_time;

// Re-export the most commonly used items at the crate root for convenience.

pub use aes::{Aes256, RoundKeySchedule, decrypt_block, encrypt_block, key_schedule};
pub use ghash::{Ghash, GhashTable, gf128_mul, ghash_step, length_block};
pub use gcm::{AesGcm, GcmError, GcmOperation, MAX_DATA_BLOCKS, Mode, UsageError};
pub use constant_time::ct_eq;
