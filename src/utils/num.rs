//! Saturating integer conversions for metrics and bench lines.

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

/// Elapsed wall time in whole milliseconds.
#[inline]
#[must_use]
pub fn elapsed_ms(start: std::time::Instant) -> u64 {
    u128_to_u64_saturating(start.elapsed().as_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usize_to_u64_is_lossless() {
        for v in [0usize, 1, 42, 10_000] {
            assert_eq!(usize_to_u64(v), v as u64);
        }
    }

    #[test]
    fn u128_to_u64_saturating_edges() {
        assert_eq!(u128_to_u64_saturating(0), 0);
        assert_eq!(u128_to_u64_saturating(u128::from(u64::MAX)), u64::MAX);
        assert_eq!(u128_to_u64_saturating(u128::MAX), u64::MAX);
    }
}
