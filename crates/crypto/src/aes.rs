/// AES-256 block cipher per FIPS 197.
///
/// Key schedule expansion plus single-block encryption and decryption.
/// Used as the underlying primitive for AES-256-GCM.

use common::{Block, KEY_LEN};
use core::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::gf256::{
    RCON, State, add_round_key, inv_mix_columns, inv_shift_rows, inv_sub_bytes, mix_columns,
    rot_word, shift_rows, sub_bytes, sub_word,
};

/// Number of rounds for a 256-bit key.
pub const ROUNDS: usize = 14;

/// Words in the key (Nk).
const NK: usize = KEY_LEN / 4;

/// Total expanded words: 4 × (ROUNDS + 1) = 60.
const SCHEDULE_WORDS: usize = 4 * (ROUNDS + 1);

/// Expanded AES-256 round keys: 15 round keys of 4 words each.
///
/// Immutable once built and safe to share across threads; cleared on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct RoundKeySchedule {
    words: [u32; SCHEDULE_WORDS],
}

impl RoundKeySchedule {
    /// Expand a 256-bit key.
    pub fn new(key: &[u8; KEY_LEN]) -> Self {
        let mut w = [0u32; SCHEDULE_WORDS];

        for (i, chunk) in key.chunks_exact(4).enumerate() {
            w[i] = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }

        for i in NK..SCHEDULE_WORDS {
            let mut temp = w[i - 1];
            if i % NK == 0 {
                temp = sub_word(rot_word(temp)) ^ (u32::from(RCON[i / NK - 1]) << 24);
            } else if i % NK == 4 {
                temp = sub_word(temp);
            }
            w[i] = w[i - NK] ^ temp;
        }

        Self { words: w }
    }

    /// Round key `round` (0..=14) as 16 bytes, column-major like the state.
    pub fn round_key(&self, round: usize) -> [u8; 16] {
        let mut out = [0u8; 16];
        for (col, word) in self.words[4 * round..4 * round + 4].iter().enumerate() {
            out[4 * col..4 * col + 4].copy_from_slice(&word.to_be_bytes());
        }
        out
    }
}

impl fmt::Debug for RoundKeySchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RoundKeySchedule(..)")
    }
}

/// Expand `key` into its round-key schedule.
pub fn key_schedule(key: &[u8; KEY_LEN]) -> RoundKeySchedule {
    RoundKeySchedule::new(key)
}

/// Encrypt one block.
pub fn encrypt_block(sched: &RoundKeySchedule, block: &Block) -> Block {
    let mut state: State = *block;

    add_round_key(&mut state, &sched.round_key(0));

    // Rounds 1..13: SubBytes → ShiftRows → MixColumns → AddRoundKey
    for round in 1..ROUNDS {
        sub_bytes(&mut state);
        shift_rows(&mut state);
        mix_columns(&mut state);
        add_round_key(&mut state, &sched.round_key(round));
    }

    // Final round has no MixColumns
    sub_bytes(&mut state);
    shift_rows(&mut state);
    add_round_key(&mut state, &sched.round_key(ROUNDS));

    state
}

/// Decrypt one block.
pub fn decrypt_block(sched: &RoundKeySchedule, block: &Block) -> Block {
    let mut state: State = *block;

    add_round_key(&mut state, &sched.round_key(ROUNDS));

    for round in (1..ROUNDS).rev() {
        inv_shift_rows(&mut state);
        inv_sub_bytes(&mut state);
        add_round_key(&mut state, &sched.round_key(round));
        inv_mix_columns(&mut state);
    }

    inv_shift_rows(&mut state);
    inv_sub_bytes(&mut state);
    add_round_key(&mut state, &sched.round_key(0));

    state
}

/// A keyed AES-256 instance operating in place.
#[derive(Clone, Debug)]
pub struct Aes256 {
    schedule: RoundKeySchedule,
}

impl Aes256 {
    pub fn new(key: &[u8; KEY_LEN]) -> Self {
        Self {
            schedule: RoundKeySchedule::new(key),
        }
    }

    #[inline]
    pub fn schedule(&self) -> &RoundKeySchedule {
        &self.schedule
    }

    #[inline]
    pub fn encrypt_in_place(&self, block: &mut Block) {
        *block = encrypt_block(&self.schedule, block);
    }

    #[inline]
    pub fn decrypt_in_place(&self, block: &mut Block) {
        *block = decrypt_block(&self.schedule, block);
    }
}
