/// Constant-time comparison for authentication tags.
///
/// Avoids branching on secret data so a failed verification reveals only
/// pass/fail, never the position of the first differing byte.

use subtle::ConstantTimeEq;

/// Constant-time equality of two byte slices.
///
/// Returns `true` if and only if `a` and `b` have the same length and identical
/// contents. Lengths are public; contents are compared without early exit.
pub fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    bool::from(a.ct_eq(b))
}
