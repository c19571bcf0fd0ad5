//! Numeric utilities: safe and centralized integer conversions.
//!
//! Prefer fallible conversions when an out-of-range value should stop the
//! operation, and saturating ones when clamping is acceptable (metrics, logs).

#[inline]
#[must_use]
pub fn u64_to_usize(v: u64) -> Option<usize> {
    usize::try_from(v).ok()
}

#[inline]
#[must_use]
pub fn usize_to_u64(v: usize) -> u64 {
    u64::try_from(v).unwrap_or(u64::MAX)
}

#[inline]
#[must_use]
pub fn u128_to_u64_saturating(v: u128) -> u64 {
    u64::try_from(v).unwrap_or(u64::MAX)
}

/// Non-negative `i64` as `u64`; `None` for negative input.
#[inline]
#[must_use]
pub fn i64_to_u64(v: i64) -> Option<u64> {
    u64::try_from(v).ok()
}

/// `ceil(n / d)` for `d > 0`.
#[inline]
#[must_use]
pub fn div_ceil_u64(n: u64, d: u64) -> u64 {
    n.div_ceil(d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u64_to_usize_matches_std_try_from() {
        for &v in &[0u64, 1, 42, u64::from(u32::MAX), u64::from(u32::MAX) + 1] {
            assert_eq!(u64_to_usize(v), usize::try_from(v).ok());
        }
    }

    #[test]
    fn u128_to_u64_saturating_edges() {
        assert_eq!(u128_to_u64_saturating(0), 0);
        assert_eq!(u128_to_u64_saturating(u128::from(u64::MAX)), u64::MAX);
        assert_eq!(u128_to_u64_saturating(u128::from(u64::MAX) + 1), u64::MAX);
    }

    #[test]
    fn i64_to_u64_rejects_negatives() {
        assert_eq!(i64_to_u64(-5), None);
        assert_eq!(i64_to_u64(0), Some(0));
        assert_eq!(i64_to_u64(7), Some(7));
    }

    #[test]
    fn div_ceil_rounds_up() {
        assert_eq!(div_ceil_u64(0, 10), 0);
        assert_eq!(div_ceil_u64(25, 10), 3);
        assert_eq!(div_ceil_u64(30, 10), 3);
    }
}
