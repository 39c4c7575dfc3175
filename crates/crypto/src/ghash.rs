/// GHASH, the GF(2^128) polynomial hash used by GCM (NIST SP 800-38D §6.4).
///
/// Blocks are read as big-endian `u128`s in the GCM bit order: the most
/// significant bit is the coefficient of x^0. The field polynomial
/// x^128 + x^7 + x^2 + x + 1 appears in that order as `0xE1 << 120`.
///
/// [`gf128_mul`] is the bit-serial reference multiply and is branch-free.
/// [`GhashTable`] is the 4-bit windowed (Shoup) variant; it computes the same
/// products with table lookups indexed by operand nibbles, so it is faster but
/// not constant-time. [`Ghash`] uses the reference multiply unless the
/// `table-ghash` feature is enabled.

use common::{BLOCK_LEN, Block};
use zeroize::Zeroize;

/// Reduction constant R = 11100001 || 0^120.
const R: u128 = 0xe1 << 120;

/// Multiply by x: shift toward higher degree (right) and fold in R.
#[inline]
const fn mul_x(v: u128) -> u128 {
    (v >> 1) ^ (R & 0u128.wrapping_sub(v & 1))
}

/// Multiply two elements of GF(2^128).
///
/// Walks `x` from its most significant bit, XORing the running multiple of
/// `y` into the product for each set bit.
pub fn gf128_mul(x: u128, y: u128) -> u128 {
    let mut z = 0u128;
    let mut v = y;
    for i in (0..128).rev() {
        let bit = (x >> i) & 1;
        z ^= v & 0u128.wrapping_sub(bit);
        v = mul_x(v);
    }
    z
}

/// One GHASH step: `(acc ⊕ block) · H`.
pub fn ghash_step(acc: &Block, block: &Block, h: &Block) -> Block {
    let x = u128::from_be_bytes(*acc) ^ u128::from_be_bytes(*block);
    gf128_mul(x, u128::from_be_bytes(*h)).to_be_bytes()
}

/// The final GHASH input block: `len(A) ‖ len(C)`, both in bits, big-endian.
pub fn length_block(aad_bits: u64, data_bits: u64) -> Block {
    ((u128::from(aad_bits) << 64) | u128::from(data_bits)).to_be_bytes()
}

// ─────────────────────────────────────────────────────────────────────────────
// 4-bit table
// ─────────────────────────────────────────────────────────────────────────────

/// `REDUCE[n] = n · x^4` for the four low-order bits shifted out of a nibble step.
const REDUCE: [u128; 16] = reduce_table();

const fn reduce_table() -> [u128; 16] {
    let mut table = [0u128; 16];
    let mut n = 0;
    while n < 16 {
        let mut v = n as u128;
        let mut k = 0;
        while k < 4 {
            v = mul_x(v);
            k += 1;
        }
        table[n] = v;
        n += 1;
    }
    table
}

/// Precomputed multiples of H for every 4-bit polynomial.
///
/// Entry `n` holds `N(x) · H` where the nibble's high bit is the x^0
/// coefficient, so `table[8] = H` and `table[1] = H · x^3`.
#[derive(Clone, Zeroize)]
pub struct GhashTable {
    table: [u128; 16],
}

impl GhashTable {
    pub fn new(h: u128) -> Self {
        let mut table = [0u128; 16];
        table[8] = h;
        table[4] = mul_x(table[8]);
        table[2] = mul_x(table[4]);
        table[1] = mul_x(table[2]);
        for n in 1..16usize {
            if n.count_ones() > 1 {
                let low = n & n.wrapping_neg();
                table[n] = table[low] ^ table[n ^ low];
            }
        }
        Self { table }
    }

    /// `x · H`, Horner's rule over the 32 nibbles of `x`, highest degree first.
    pub fn mul(&self, x: u128) -> u128 {
        let mut z = 0u128;
        for k in 0..32 {
            let nibble = ((x >> (4 * k)) & 0xf) as usize;
            z = (z >> 4) ^ REDUCE[(z & 0xf) as usize] ^ self.table[nibble];
        }
        z
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Streaming accumulator
// ─────────────────────────────────────────────────────────────────────────────

/// GHASH accumulator Y keyed by the hash subkey H.
///
/// Performs no length tracking or ordering checks; callers feed AAD blocks,
/// then ciphertext blocks, then exactly one [`length_block`].
pub struct Ghash {
    h: u128,
    #[cfg(feature = "table-ghash")]
    table: GhashTable,
    acc: u128,
}

impl Ghash {
    pub fn new(h: &Block) -> Self {
        let h = u128::from_be_bytes(*h);
        Self {
            h,
            #[cfg(feature = "table-ghash")]
            table: GhashTable::new(h),
            acc: 0,
        }
    }

    #[cfg(not(feature = "table-ghash"))]
    #[inline]
    fn mul_h(&self, x: u128) -> u128 {
        gf128_mul(x, self.h)
    }

    #[cfg(feature = "table-ghash")]
    #[inline]
    fn mul_h(&self, x: u128) -> u128 {
        self.table.mul(x)
    }

    /// Absorb one full block.
    #[inline]
    pub fn update_block(&mut self, block: &Block) {
        self.acc = self.mul_h(self.acc ^ u128::from_be_bytes(*block));
    }

    /// Absorb `data`, zero-padding a trailing partial block.
    pub fn update_padded(&mut self, data: &[u8]) {
        for chunk in data.chunks(BLOCK_LEN) {
            let mut block = [0u8; BLOCK_LEN];
            block[..chunk.len()].copy_from_slice(chunk);
            self.update_block(&block);
        }
    }

    /// Absorb the closing length block.
    pub fn update_lengths(&mut self, aad_bits: u64, data_bits: u64) {
        self.update_block(&length_block(aad_bits, data_bits));
    }

    /// Current accumulator value.
    pub fn finalize(&self) -> Block {
        self.acc.to_be_bytes()
    }
}

impl Drop for Ghash {
    fn drop(&mut self) {
        self.h.zeroize();
        self.acc.zeroize();
        #[cfg(feature = "table-ghash")]
        self.table.zeroize();
    }
}
