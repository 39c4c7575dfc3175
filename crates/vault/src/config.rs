//! Sealer configuration.

use std::time::{SystemTime, UNIX_EPOCH};

use log::warn;
use rand::RngCore;
use rand::rngs::OsRng;

/// Where the 64-bit nonce seed comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedSource {
    /// A caller-managed value, e.g. restored from storage.
    Fixed(u64),
    /// Seconds since the Unix epoch at construction time.
    UnixTime,
    /// 64 bits from the operating system RNG.
    Random,
}

impl SeedSource {
    pub fn resolve(self) -> u64 {
        match self {
            SeedSource::Fixed(seed) => seed,
            SeedSource::UnixTime => match SystemTime::now().duration_since(UNIX_EPOCH) {
                Ok(elapsed) => elapsed.as_secs(),
                Err(_) => {
                    warn!("vault: system clock is before the Unix epoch, seeding with 0");
                    0
                }
            },
            SeedSource::Random => OsRng.next_u64(),
        }
    }
}

/// Settings for a [`RecordSealer`](crate::RecordSealer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealerConfig {
    pub seed: SeedSource,
    pub initial_counter: u32,
    /// Advance the counter before building each nonce, so `initial_counter`
    /// itself is never used.
    pub increment_before_use: bool,
}

impl Default for SealerConfig {
    fn default() -> Self {
        Self {
            seed: SeedSource::Random,
            initial_counter: 0,
            increment_before_use: true,
        }
    }
}

impl SealerConfig {
    pub fn with_seed(mut self, seed: SeedSource) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_initial_counter(mut self, counter: u32) -> Self {
        self.initial_counter = counter;
        self
    }

    pub fn with_increment_before_use(mut self, increment: bool) -> Self {
        self.increment_before_use = increment;
        self
    }
}
