//! Wall-clock timestamps with microsecond resolution
//!
//! Start stamps and cumulative times are persisted as `<secs>.<micros>` with the
//! microsecond part zero-padded to six digits. `TimeVal` keeps both fields as
//! separate integers so arithmetic never loses precision to floating point.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

const MICROS_PER_SEC: i64 = 1_000_000;

/// Seconds plus microseconds, normalized so that `0 <= micros < 1_000_000`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeVal {
    secs: i64,
    micros: i64,
}

impl TimeVal {
    pub const ZERO: TimeVal = TimeVal { secs: 0, micros: 0 };

    /// Build a value from raw fields, carrying any out-of-range microseconds
    pub fn new(secs: i64, micros: i64) -> Self {
        let mut tv = TimeVal { secs, micros };
        tv.normalize();
        tv
    }

    /// Current wall-clock time
    pub fn now() -> Self {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        TimeVal::new(
            i64::try_from(since_epoch.as_secs()).unwrap_or(i64::MAX),
            i64::from(since_epoch.subsec_micros()),
        )
    }

    pub fn secs(&self) -> i64 {
        self.secs
    }

    pub fn micros(&self) -> i64 {
        self.micros
    }

    /// Parse `<secs>.<micros>` as written by [`fmt::Display`]
    ///
    /// Leading whitespace is skipped and anything after the first token is
    /// ignored. Only the first six digits of the microsecond field are read, as a
    /// plain integer, so `"5.12"` means 5 s + 12 µs and `"1.1234567"` means
    /// 1 s + 123456 µs. Returns `None` when either field is missing or not numeric.
    pub fn parse(input: &str) -> Option<Self> {
        let token = input.split_whitespace().next()?;
        let (secs, micros) = token.split_once('.')?;
        if !is_digits(secs) || !is_digits(micros) {
            return None;
        }
        let micros = &micros[..micros.len().min(6)];
        Some(TimeVal::new(secs.parse().ok()?, micros.parse().ok()?))
    }

    /// Time from `earlier` to `self`, clamped to zero if the clock went backwards
    pub fn elapsed_since(&self, earlier: TimeVal) -> TimeVal {
        let diff = TimeVal::new(
            self.secs.saturating_sub(earlier.secs),
            self.micros - earlier.micros,
        );
        if diff.secs < 0 {
            TimeVal::ZERO
        } else {
            diff
        }
    }

    /// Sum of two values with the microsecond carry folded into seconds
    pub fn saturating_add(&self, other: TimeVal) -> TimeVal {
        TimeVal::new(
            self.secs.saturating_add(other.secs),
            self.micros + other.micros,
        )
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.secs as f64 + self.micros as f64 / MICROS_PER_SEC as f64
    }

    fn normalize(&mut self) {
        self.secs = self.secs.saturating_add(self.micros.div_euclid(MICROS_PER_SEC));
        self.micros = self.micros.rem_euclid(MICROS_PER_SEC);
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for TimeVal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.secs, self.micros)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_carries_overflowed_micros() {
        let tv = TimeVal::new(1, 2_500_000);
        assert_eq!(tv.secs(), 3);
        assert_eq!(tv.micros(), 500_000);
    }

    #[test]
    fn test_new_borrows_negative_micros() {
        let tv = TimeVal::new(5, -250_000);
        assert_eq!(tv.secs(), 4);
        assert_eq!(tv.micros(), 750_000);
    }

    #[test]
    fn test_display_zero_pads_micros() {
        assert_eq!(TimeVal::new(12, 42).to_string(), "12.000042");
        assert_eq!(TimeVal::ZERO.to_string(), "0.000000");
    }

    #[test]
    fn test_parse_written_format() {
        let tv = TimeVal::parse("1700000000.123456\n").unwrap();
        assert_eq!(tv, TimeVal::new(1_700_000_000, 123_456));
    }

    #[test]
    fn test_parse_short_micro_field_is_integer() {
        assert_eq!(TimeVal::parse("5.12"), Some(TimeVal::new(5, 12)));
    }

    #[test]
    fn test_parse_ignores_leading_whitespace_and_trailing_tokens() {
        assert_eq!(
            TimeVal::parse("  7.000001 junk"),
            Some(TimeVal::new(7, 1))
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(TimeVal::parse(""), None);
        assert_eq!(TimeVal::parse("\n"), None);
        assert_eq!(TimeVal::parse("17"), None);
        assert_eq!(TimeVal::parse("17."), None);
        assert_eq!(TimeVal::parse(".5"), None);
        assert_eq!(TimeVal::parse("a.b"), None);
        assert_eq!(TimeVal::parse("-1.000000"), None);
    }

    #[test]
    fn test_parse_reads_only_six_micro_digits() {
        assert_eq!(TimeVal::parse("1.1234567"), Some(TimeVal::new(1, 123_456)));
        assert_eq!(
            TimeVal::parse("2.000000999 junk"),
            Some(TimeVal::new(2, 0))
        );
    }

    #[test]
    fn test_elapsed_since_borrows_across_second() {
        let start = TimeVal::new(100, 900_000);
        let end = TimeVal::new(102, 100_000);
        assert_eq!(end.elapsed_since(start), TimeVal::new(1, 200_000));
    }

    #[test]
    fn test_elapsed_since_clamps_backwards_clock() {
        let start = TimeVal::new(100, 0);
        let end = TimeVal::new(99, 999_999);
        assert_eq!(end.elapsed_since(start), TimeVal::ZERO);
    }

    #[test]
    fn test_saturating_add_carries() {
        let a = TimeVal::new(1, 600_000);
        let b = TimeVal::new(2, 700_000);
        assert_eq!(a.saturating_add(b), TimeVal::new(4, 300_000));
    }

    #[test]
    fn test_as_secs_f64() {
        assert!((TimeVal::new(1, 500_000).as_secs_f64() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_now_is_after_epoch() {
        let now = TimeVal::now();
        assert!(now.secs() > 0);
        assert!((0..1_000_000).contains(&now.micros()));
    }
}
