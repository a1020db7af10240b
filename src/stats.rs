//! Aggregate call statistics stored in `.sta` records
//!
//! On-disk layout is a single line: `<count> <secs>.<micros> <average>`, where
//! the average is printed like C's `%f` (six decimals). Only the first two
//! fields are read back; the average is always recomputed.

use crate::timeval::TimeVal;
use std::fmt;

/// Call count and cumulative elapsed time for one function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallStats {
    pub count: u64,
    pub cumulative: TimeVal,
}

impl CallStats {
    /// Statistics after the very first completed call
    pub fn first(elapsed: TimeVal) -> Self {
        Self {
            count: 1,
            cumulative: elapsed,
        }
    }

    /// Fold one more completed call into existing statistics
    pub fn record(self, elapsed: TimeVal) -> Self {
        Self {
            count: self.count.saturating_add(1),
            cumulative: self.cumulative.saturating_add(elapsed),
        }
    }

    /// Merge a completed call into whatever was stored before
    ///
    /// Missing or malformed previous statistics start a fresh record.
    pub fn merge(previous: Option<CallStats>, elapsed: TimeVal) -> Self {
        match previous {
            Some(stats) => stats.record(elapsed),
            None => CallStats::first(elapsed),
        }
    }

    /// Average seconds per call
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.cumulative.as_secs_f64() / self.count as f64
    }

    /// Parse a `.sta` record, `None` if the count or cumulative field is unreadable
    pub fn parse(input: &str) -> Option<Self> {
        let mut fields = input.split_whitespace();
        let count = fields.next()?;
        if !count.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let count = count.parse().ok()?;
        let cumulative = TimeVal::parse(fields.next()?)?;
        Some(Self { count, cumulative })
    }
}

impl fmt::Display for CallStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {} {:.6}", self.count, self.cumulative, self.average())
    }
}
