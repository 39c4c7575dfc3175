//! 96-bit nonces built as `seed (64 bits) ‖ counter (32 bits)`, big-endian.
//!
//! Uniqueness per key rests on the caller never reusing a (seed, counter)
//! pair; the counter here refuses to wrap rather than repeat a value.

use common::{NONCE_LEN, Nonce};
use log::warn;

use crate::config::SealerConfig;
use crate::error::VaultError;

/// Build `seed ‖ counter`, optionally advancing the stored counter first.
pub fn next_nonce(seed: u64, counter: &mut u32, increment: bool) -> Result<Nonce, VaultError> {
    if increment {
        *counter = counter.checked_add(1).ok_or_else(|| {
            warn!("vault: nonce counter exhausted for seed {seed:#018x}");
            VaultError::NonceExhausted { seed }
        })?;
    }
    Ok(join_nonce(seed, *counter))
}

pub fn join_nonce(seed: u64, counter: u32) -> Nonce {
    let mut nonce = [0u8; NONCE_LEN];
    nonce[..8].copy_from_slice(&seed.to_be_bytes());
    nonce[8..].copy_from_slice(&counter.to_be_bytes());
    nonce
}

/// Inverse of [`join_nonce`].
pub fn split_nonce(nonce: &Nonce) -> (u64, u32) {
    let mut seed = [0u8; 8];
    let mut counter = [0u8; 4];
    seed.copy_from_slice(&nonce[..8]);
    counter.copy_from_slice(&nonce[8..]);
    (u64::from_be_bytes(seed), u32::from_be_bytes(counter))
}

/// A monotonic nonce source for one key.
#[derive(Debug, Clone)]
pub struct NonceSequence {
    seed: u64,
    counter: u32,
    increment_before_use: bool,
    exhausted: bool,
}

impl NonceSequence {
    /// Advances the counter before each nonce, so the first one uses `counter + 1`.
    pub fn new(seed: u64, counter: u32) -> Self {
        Self {
            seed,
            counter,
            increment_before_use: true,
            exhausted: false,
        }
    }

    pub fn from_config(config: &SealerConfig) -> Self {
        Self {
            seed: config.seed.resolve(),
            counter: config.initial_counter,
            increment_before_use: config.increment_before_use,
            exhausted: false,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The counter value of the most recent (or, before use, the first) nonce.
    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn next_nonce(&mut self) -> Result<Nonce, VaultError> {
        if self.exhausted {
            return Err(VaultError::NonceExhausted { seed: self.seed });
        }
        if self.increment_before_use {
            return next_nonce(self.seed, &mut self.counter, true);
        }

        let nonce = next_nonce(self.seed, &mut self.counter, false)?;
        match self.counter.checked_add(1) {
            Some(next) => self.counter = next,
            None => self.exhausted = true,
        }
        Ok(nonce)
    }
}
