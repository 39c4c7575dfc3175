//! GF(2^8) arithmetic and the byte-level AES round transforms.
//!
//! The state is a 4×4 byte matrix in column-major order: `state[4 * col + row]`.
//! Field multiplication reduces modulo x^8 + x^4 + x^3 + x + 1 (0x11B) and is
//! written without data-dependent branches.

/// Column-major AES state.
pub type State = [u8; 16];

/// Forward S-box (SubBytes).
pub const SBOX: [u8; 256] = [
    0x63, 0x7c, 0x77, 0x7b, 0xf2, 0x6b, 0x6f, 0xc5, 0x30, 0x01, 0x67, 0x2b, 0xfe, 0xd7, 0xab, 0x76,
    0xca, 0x82, 0xc9, 0x7d, 0xfa, 0x59, 0x47, 0xf0, 0xad, 0xd4, 0xa2, 0xaf, 0x9c, 0xa4, 0x72, 0xc0,
    0xb7, 0xfd, 0x93, 0x26, 0x36, 0x3f, 0xf7, 0xcc, 0x34, 0xa5, 0xe5, 0xf1, 0x71, 0xd8, 0x31, 0x15,
    0x04, 0xc7, 0x23, 0xc3, 0x18, 0x96, 0x05, 0x9a, 0x07, 0x12, 0x80, 0xe2, 0xeb, 0x27, 0xb2, 0x75,
    0x09, 0x83, 0x2c, 0x1a, 0x1b, 0x6e, 0x5a, 0xa0, 0x52, 0x3b, 0xd6, 0xb3, 0x29, 0xe3, 0x2f, 0x84,
    0x53, 0xd1, 0x00, 0xed, 0x20, 0xfc, 0xb1, 0x5b, 0x6a, 0xcb, 0xbe, 0x39, 0x4a, 0x4c, 0x58, 0xcf,
    0xd0, 0xef, 0xaa, 0xfb, 0x43, 0x4d, 0x33, 0x85, 0x45, 0xf9, 0x02, 0x7f, 0x50, 0x3c, 0x9f, 0xa8,
    0x51, 0xa3, 0x40, 0x8f, 0x92, 0x9d, 0x38, 0xf5, 0xbc, 0xb6, 0xda, 0x21, 0x10, 0xff, 0xf3, 0xd2,
    0xcd, 0x0c, 0x13, 0xec, 0x5f, 0x97, 0x44, 0x17, 0xc4, 0xa7, 0x7e, 0x3d, 0x64, 0x5d, 0x19, 0x73,
    0x60, 0x81, 0x4f, 0xdc, 0x22, 0x2a, 0x90, 0x88, 0x46, 0xee, 0xb8, 0x14, 0xde, 0x5e, 0x0b, 0xdb,
    0xe0, 0x32, 0x3a, 0x0a, 0x49, 0x06, 0x24, 0x5c, 0xc2, 0xd3, 0xac, 0x62, 0x91, 0x95, 0xe4, 0x79,
    0xe7, 0xc8, 0x37, 0x6d, 0x8d, 0xd5, 0x4e, 0xa9, 0x6c, 0x56, 0xf4, 0xea, 0x65, 0x7a, 0xae, 0x08,
    0xba, 0x78, 0x25, 0x2e, 0x1c, 0xa6, 0xb4, 0xc6, 0xe8, 0xdd, 0x74, 0x1f, 0x4b, 0xbd, 0x8b, 0x8a,
    0x70, 0x3e, 0xb5, 0x66, 0x48, 0x03, 0xf6, 0x0e, 0x61, 0x35, 0x57, 0xb9, 0x86, 0xc1, 0x1d, 0x9e,
    0xe1, 0xf8, 0x98, 0x11, 0x69, 0xd9, 0x8e, 0x94, 0x9b, 0x1e, 0x87, 0xe9, 0xce, 0x55, 0x28, 0xdf,
    0x8c, 0xa1, 0x89, 0x0d, 0xbf, 0xe6, 0x42, 0x68, 0x41, 0x99, 0x2d, 0x0f, 0xb0, 0x54, 0xbb, 0x16,
];

/// Inverse S-box (InvSubBytes).
pub const INV_SBOX: [u8; 256] = [
    0x52, 0x09, 0x6a, 0xd5, 0x30, 0x36, 0xa5, 0x38, 0xbf, 0x40, 0xa3, 0x9e, 0x81, 0xf3, 0xd7, 0xfb,
    0x7c, 0xe3, 0x39, 0x82, 0x9b, 0x2f, 0xff, 0x87, 0x34, 0x8e, 0x43, 0x44, 0xc4, 0xde, 0xe9, 0xcb,
    0x54, 0x7b, 0x94, 0x32, 0xa6, 0xc2, 0x23, 0x3d, 0xee, 0x4c, 0x95, 0x0b, 0x42, 0xfa, 0xc3, 0x4e,
    0x08, 0x2e, 0xa1, 0x66, 0x28, 0xd9, 0x24, 0xb2, 0x76, 0x5b, 0xa2, 0x49, 0x6d, 0x8b, 0xd1, 0x25,
    0x72, 0xf8, 0xf6, 0x64, 0x86, 0x68, 0x98, 0x16, 0xd4, 0xa4, 0x5c, 0xcc, 0x5d, 0x65, 0xb6, 0x92,
    0x6c, 0x70, 0x48, 0x50, 0xfd, 0xed, 0xb9, 0xda, 0x5e, 0x15, 0x46, 0x57, 0xa7, 0x8d, 0x9d, 0x84,
    0x90, 0xd8, 0xab, 0x00, 0x8c, 0xbc, 0xd3, 0x0a, 0xf7, 0xe4, 0x58, 0x05, 0xb8, 0xb3, 0x45, 0x06,
    0xd0, 0x2c, 0x1e, 0x8f, 0xca, 0x3f, 0x0f, 0x02, 0xc1, 0xaf, 0xbd, 0x03, 0x01, 0x13, 0x8a, 0x6b,
    0x3a, 0x91, 0x11, 0x41, 0x4f, 0x67, 0xdc, 0xea, 0x97, 0xf2, 0xcf, 0xce, 0xf0, 0xb4, 0xe6, 0x73,
    0x96, 0xac, 0x74, 0x22, 0xe7, 0xad, 0x35, 0x85, 0xe2, 0xf9, 0x37, 0xe8, 0x1c, 0x75, 0xdf, 0x6e,
    0x47, 0xf1, 0x1a, 0x71, 0x1d, 0x29, 0xc5, 0x89, 0x6f, 0xb7, 0x62, 0x0e, 0xaa, 0x18, 0xbe, 0x1b,
    0xfc, 0x56, 0x3e, 0x4b, 0xc6, 0xd2, 0x79, 0x20, 0x9a, 0xdb, 0xc0, 0xfe, 0x78, 0xcd, 0x5a, 0xf4,
    0x1f, 0xdd, 0xa8, 0x33, 0x88, 0x07, 0xc7, 0x31, 0xb1, 0x12, 0x10, 0x59, 0x27, 0x80, 0xec, 0x5f,
    0x60, 0x51, 0x7f, 0xa9, 0x19, 0xb5, 0x4a, 0x0d, 0x2d, 0xe5, 0x7a, 0x9f, 0x93, 0xc9, 0x9c, 0xef,
    0xa0, 0xe0, 0x3b, 0x4d, 0xae, 0x2a, 0xf5, 0xb0, 0xc8, 0xeb, 0xbb, 0x3c, 0x83, 0x53, 0x99, 0x61,
    0x17, 0x2b, 0x04, 0x7e, 0xba, 0x77, 0xd6, 0x26, 0xe1, 0x69, 0x14, 0x63, 0x55, 0x21, 0x0c, 0x7d,
];

/// Round constants: successive powers of x (0x02) in GF(2^8), starting at 0x01.
pub const RCON: [u8; 15] = rcon_table();

const fn rcon_table() -> [u8; 15] {
    let mut table = [0u8; 15];
    let mut r = 1u8;
    let mut i = 0;
    while i < table.len() {
        table[i] = r;
        r = xtime(r);
        i += 1;
    }
    table
}

/// Multiply by x ({02}), reducing with 0x1B when the top bit falls off.
#[inline]
pub const fn xtime(a: u8) -> u8 {
    (a << 1) ^ (0x1b & 0u8.wrapping_sub(a >> 7))
}

/// Multiply two elements of GF(2^8).
#[inline]
pub fn gmul(mut a: u8, mut b: u8) -> u8 {
    let mut p = 0u8;
    for _ in 0..8 {
        p ^= a & 0u8.wrapping_sub(b & 1);
        a = xtime(a);
        b >>= 1;
    }
    p
}

/// Apply the S-box to each byte of a big-endian word.
#[inline]
pub fn sub_word(w: u32) -> u32 {
    u32::from_be_bytes(w.to_be_bytes().map(|b| SBOX[b as usize]))
}

/// [a0, a1, a2, a3] -> [a1, a2, a3, a0].
#[inline]
pub fn rot_word(w: u32) -> u32 {
    w.rotate_left(8)
}

pub fn sub_bytes(state: &mut State) {
    for b in state.iter_mut() {
        *b = SBOX[*b as usize];
    }
}

pub fn inv_sub_bytes(state: &mut State) {
    for b in state.iter_mut() {
        *b = INV_SBOX[*b as usize];
    }
}

/// Row `r` rotates left by `r` columns.
pub fn shift_rows(state: &mut State) {
    let src = *state;
    for col in 0..4 {
        for row in 1..4 {
            state[4 * col + row] = src[4 * ((col + row) % 4) + row];
        }
    }
}

/// Row `r` rotates right by `r` columns.
pub fn inv_shift_rows(state: &mut State) {
    let src = *state;
    for col in 0..4 {
        for row in 1..4 {
            state[4 * ((col + row) % 4) + row] = src[4 * col + row];
        }
    }
}

/// Multiply every column by the circulant matrix with first row `coeffs`.
#[inline]
fn mix_with(state: &mut State, coeffs: [u8; 4]) {
    for column in state.chunks_exact_mut(4) {
        let s = [column[0], column[1], column[2], column[3]];
        for (row, out) in column.iter_mut().enumerate() {
            *out = (0..4).fold(0, |acc, k| acc ^ gmul(coeffs[(4 + k - row) % 4], s[k]));
        }
    }
}

/// MixColumns: {02, 03, 01, 01} and its rotations.
pub fn mix_columns(state: &mut State) {
    mix_with(state, [0x02, 0x03, 0x01, 0x01]);
}

/// InvMixColumns: {0E, 0B, 0D, 09} and its rotations.
pub fn inv_mix_columns(state: &mut State) {
    mix_with(state, [0x0e, 0x0b, 0x0d, 0x09]);
}

/// AddRoundKey.
#[inline]
pub fn add_round_key(state: &mut State, round_key: &[u8; 16]) {
    for (s, k) in state.iter_mut().zip(round_key) {
        *s ^= *k;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(hex_str: &str) -> State {
        hex::decode(hex_str).unwrap().try_into().unwrap()
    }

    #[test]
    fn test_xtime() {
        assert_eq!(xtime(0x57), 0xae);
        assert_eq!(xtime(0xae), 0x47);
        assert_eq!(xtime(0x47), 0x8e);
        assert_eq!(xtime(0x8e), 0x07);
    }

    #[test]
    fn test_gmul() {
        // {57} • {83} = {c1}, {57} • {13} = {fe}
        assert_eq!(gmul(0x57, 0x83), 0xc1);
        assert_eq!(gmul(0x57, 0x13), 0xfe);
        assert_eq!(gmul(0x00, 0xff), 0x00);
        assert_eq!(gmul(0x01, 0xab), 0xab);
    }

    #[test]
    fn test_rcon() {
        assert_eq!(
            RCON,
            [
                0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80, 0x1b, 0x36, 0x6c, 0xd8, 0xab,
                0x4d, 0x9a
            ]
        );
    }

    #[test]
    fn test_sbox_inverse() {
        for x in 0..=255u8 {
            assert_eq!(INV_SBOX[SBOX[x as usize] as usize], x);
        }
    }

    #[test]
    fn test_word_helpers() {
        assert_eq!(rot_word(0x09cf4f3c), 0xcf4f3c09);
        assert_eq!(sub_word(0xcf4f3c09), 0x8a84eb01);
    }

    // FIPS-197 Appendix B, round 1.
    #[test]
    fn test_round_one_transforms() {
        let mut s = state("193de3bea0f4e22b9ac68d2ae9f84808");
        sub_bytes(&mut s);
        assert_eq!(s, state("d42711aee0bf98f1b8b45de51e415230"));
        shift_rows(&mut s);
        assert_eq!(s, state("d4bf5d30e0b452aeb84111f11e2798e5"));
        mix_columns(&mut s);
        assert_eq!(s, state("046681e5e0cb199a48f8d37a2806264c"));
    }

    #[test]
    fn test_inverses() {
        let original = state("00112233445566778899aabbccddeeff");
        let mut s = original;
        shift_rows(&mut s);
        inv_shift_rows(&mut s);
        assert_eq!(s, original);
        mix_columns(&mut s);
        inv_mix_columns(&mut s);
        assert_eq!(s, original);
        sub_bytes(&mut s);
        inv_sub_bytes(&mut s);
        assert_eq!(s, original);
    }
}
