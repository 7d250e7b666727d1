//! Difficulty calculation for vanity patterns
//!
//! Every address position is modelled as uniform over the charset, so a
//! pattern of length `n` needs `charset^n` attempts on average. Real
//! addresses are base58 renderings of fixed-length byte strings and are not
//! quite uniform per character; the model is the working approximation.

use std::num::NonZeroU64;

use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};

use crate::matcher::charset_size;

/// Attempt rate assumed when the caller has not measured one
pub const DEFAULT_ATTEMPTS_PER_SECOND: NonZeroU64 = match NonZeroU64::new(10_000) {
    Some(rate) => rate,
    None => panic!("rate must be non-zero"),
};

/// Fraction bits carried past the difficulty's own width when scaling by ln 2
const LN2_EXTRA_BITS: usize = 64;

/// Headroom for the truncation error of the series terms
const LN2_GUARD_BITS: usize = 32;

/// Expected number of attempts for one match: `charset_size ^ len(pattern)`
pub fn difficulty(pattern: &str, case_sensitive: bool) -> BigUint {
    let base = BigUint::from(charset_size(case_sensitive));
    num_traits::pow(base, pattern.chars().count())
}

/// Attempts needed for a 50% cumulative chance: `ceil(ln 2 * difficulty)`.
///
/// ln 2 is taken to 64 bits more than the difficulty is wide, so the result
/// is exact unless `ln 2 * difficulty` lies within 2^-60 of an integer.
pub fn probability50(pattern: &str, case_sensitive: bool) -> BigUint {
    let difficulty = difficulty(pattern, case_sensitive);
    let bits = difficulty.bits() as usize + LN2_EXTRA_BITS;
    ceil_shr(difficulty * ln2_fixed(bits), bits)
}

/// floor(ln 2 * 2^bits), within one unit, from `ln 2 = sum 1 / (k * 2^k)`
fn ln2_fixed(bits: usize) -> BigUint {
    let precision = bits + LN2_GUARD_BITS;
    let one = BigUint::one() << precision;
    let mut sum = BigUint::zero();
    for k in 1..=precision {
        sum += (&one >> k) / BigUint::from(k);
    }
    sum >> LN2_GUARD_BITS
}

/// Seconds to work through `difficulty` attempts at the given rate, rounded up
pub fn estimate_time(
    pattern: &str,
    case_sensitive: bool,
    attempts_per_second: NonZeroU64,
) -> BigUint {
    let rate = BigUint::from(attempts_per_second.get());
    let difficulty = difficulty(pattern, case_sensitive);
    (difficulty + &rate - BigUint::one()) / rate
}

/// Lossy view of a difficulty; saturates to infinity past `f64::MAX`
pub fn difficulty_f64(difficulty: &BigUint) -> f64 {
    difficulty.to_f64().unwrap_or(f64::INFINITY)
}

fn ceil_shr(value: BigUint, bits: usize) -> BigUint {
    let mask = (BigUint::one() << bits) - BigUint::one();
    (value + mask) >> bits
}

/// Format difficulty as human-readable string
pub fn format_difficulty(difficulty: f64) -> String {
    if difficulty >= 1e18 {
        format!("{:.2e}", difficulty)
    } else if difficulty >= 1e15 {
        format!("{:.2}P", difficulty / 1e15)
    } else if difficulty >= 1e12 {
        format!("{:.2}T", difficulty / 1e12)
    } else if difficulty >= 1e9 {
        format!("{:.2}G", difficulty / 1e9)
    } else if difficulty >= 1e6 {
        format!("{:.2}M", difficulty / 1e6)
    } else if difficulty >= 1e3 {
        format!("{:.2}K", difficulty / 1e3)
    } else {
        format!("{:.0}", difficulty)
    }
}

/// Format duration in human-readable format
pub fn format_duration(seconds: f64) -> String {
    if seconds < 1.0 {
        format!("{:.0}ms", seconds * 1000.0)
    } else if seconds < 60.0 {
        format!("{:.1}s", seconds)
    } else if seconds < 3600.0 {
        format!("{:.1}m", seconds / 60.0)
    } else if seconds < 86400.0 {
        format!("{:.1}h", seconds / 3600.0)
    } else if seconds < 86400.0 * 365.0 {
        format!("{:.1}d", seconds / 86400.0)
    } else {
        format!("{:.1}y", seconds / (86400.0 * 365.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_calculation() {
        assert_eq!(difficulty("abc", false), BigUint::from(34u32.pow(3)));
        assert_eq!(difficulty("abc", true), BigUint::from(58u32.pow(3)));
        assert_eq!(difficulty("", true), BigUint::one());
    }

    #[test]
    fn test_case_insensitive_reduces_difficulty() {
        assert!(difficulty("Sol", false) < difficulty("Sol", true));
    }

    #[test]
    fn test_long_pattern_does_not_wrap() {
        // 58^20 is far past u64::MAX
        let d = difficulty("abcdefghijkmnopqrstu", true);
        assert!(d > BigUint::from(u64::MAX));
        assert_eq!(d, num_traits::pow(BigUint::from(58u32), 20));
    }

    #[test]
    fn test_probability50() {
        // ceil(0.6931 * 34) = 24, ceil(0.6931 * 58) = 41, ceil(0.6931 * 1156) = 802
        assert_eq!(probability50("a", false), BigUint::from(24u32));
        assert_eq!(probability50("a", true), BigUint::from(41u32));
        assert_eq!(probability50("ab", false), BigUint::from(802u32));
        assert_eq!(probability50("", false), BigUint::one());
    }

    #[test]
    fn test_probability50_exact_past_u64() {
        // ceil(ln 2 * 58^11), ceil(ln 2 * 58^12), ceil(ln 2 * 34^30)
        assert_eq!(
            probability50("abcdefghijk", true),
            "17319421840369816160".parse::<BigUint>().unwrap()
        );
        assert_eq!(
            probability50("abcdefghijkm", true),
            "1004526466741449337262".parse::<BigUint>().unwrap()
        );
        assert_eq!(
            probability50("abcdefghijkmnopqrstuvwxyz12345", false),
            "6098077961019996361983659618897589905098819410"
                .parse::<BigUint>()
                .unwrap()
        );
    }

    #[test]
    fn test_ln2_fixed() {
        // floor(ln 2 * 2^64)
        let ln2 = ln2_fixed(64);
        let expected = BigUint::from(0xB172_17F7_D1CF_79ABu64);
        assert!(ln2 <= expected && &expected - &ln2 <= BigUint::one());
    }

    #[test]
    fn test_estimate_time_rounds_up() {
        assert_eq!(
            estimate_time("ab", false, DEFAULT_ATTEMPTS_PER_SECOND),
            BigUint::one()
        );
        // 34^4 = 1_336_336
        assert_eq!(
            estimate_time("abcd", false, DEFAULT_ATTEMPTS_PER_SECOND),
            BigUint::from(134u32)
        );
        let rate = NonZeroU64::new(34).unwrap();
        assert_eq!(estimate_time("ab", false, rate), BigUint::from(34u32));
    }

    #[test]
    fn test_difficulty_f64_saturates() {
        let huge = num_traits::pow(BigUint::from(58u32), 400);
        assert_eq!(difficulty_f64(&huge), f64::INFINITY);
        assert_eq!(difficulty_f64(&BigUint::from(1156u32)), 1156.0);
    }

    #[test]
    fn test_format_difficulty() {
        assert_eq!(format_difficulty(34.0), "34");
        assert_eq!(format_difficulty(1156.0), "1.16K");
        assert_eq!(format_difficulty(1_336_336.0), "1.34M");
        assert_eq!(format_difficulty(1e12), "1.00T");
        assert_eq!(format_difficulty(2.5e20), "2.50e20");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.5), "500ms");
        assert_eq!(format_duration(30.0), "30.0s");
        assert_eq!(format_duration(120.0), "2.0m");
        assert_eq!(format_duration(7200.0), "2.0h");
    }
}
