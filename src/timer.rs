//! Recursion-aware enter/leave timer
//!
//! Each `ssp` invocation records exactly one event for one function. Depth is
//! tracked in the `.lvl` record so that only the outermost call of a recursive
//! chain is timed:
//!
//! ```text
//! Idle --enter--> Running(1)          writes .lvl and .str
//! Running(n) --enter--> Running(n+1)  writes .lvl
//! Running(n) --leave--> Running(n-1)  writes .lvl            (n > 1)
//! Running(1) --leave--> Idle          merges .sta, removes .str and .lvl
//! ```

use crate::error::Result;
use crate::lock::FunctionLock;
use crate::record::{self, StatePaths};
use crate::stats::CallStats;
use crate::timeval::TimeVal;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

/// What one timer invocation operates on
#[derive(Debug, Clone)]
pub struct TimerConfig {
    /// Directory holding the state records (must already exist)
    pub dir: PathBuf,
    /// Function name, used verbatim in record file names
    pub function: String,
    /// Hold the function's advisory lock for at most this long, `None` to skip locking
    pub lock_timeout: Option<Duration>,
}

impl TimerConfig {
    pub fn new(dir: impl Into<PathBuf>, function: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            function: function.into(),
            lock_timeout: None,
        }
    }

    /// Serialize updates through `<dir>/<function>.lck`
    pub fn with_lock(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }
}

/// Result of an enter event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnterOutcome {
    /// Depth went 0 -> 1 and the start stamp was written
    Outermost,
    /// Recursive entry, carries the new depth
    Nested(u32),
}

/// Result of a leave event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LeaveOutcome {
    /// No call was open for this function
    Unmatched,
    /// A recursive call returned, carries the remaining depth
    Nested(u32),
    /// The outermost call returned; statistics are `None` when no valid start
    /// stamp was found or the `.sta` record could not be updated
    Completed(Option<CallStats>),
}

/// Enter/leave state machine for one function in one directory
#[derive(Debug, Clone)]
pub struct CallTimer {
    config: TimerConfig,
    paths: StatePaths,
}

impl CallTimer {
    pub fn new(config: TimerConfig) -> Self {
        let paths = StatePaths::new(&config.dir, &config.function);
        Self { config, paths }
    }

    pub fn paths(&self) -> &StatePaths {
        &self.paths
    }

    pub fn enter(&self) -> Result<EnterOutcome> {
        self.enter_at(TimeVal::now())
    }

    pub fn leave(&self) -> Result<LeaveOutcome> {
        self.leave_at(TimeVal::now())
    }

    /// Record a call entry happening at `now`
    ///
    /// The start stamp is only written when the depth record was updated
    /// successfully and this is the outermost call.
    pub fn enter_at(&self, now: TimeVal) -> Result<EnterOutcome> {
        let _lock = self.lock()?;

        let depth = self.read_depth()?.unwrap_or(0).saturating_add(1);
        record::write_record(&self.paths.level, &format!("{depth}\n"))?;

        if depth > 1 {
            debug!(function = %self.config.function, depth, "nested enter");
            return Ok(EnterOutcome::Nested(depth));
        }

        record::write_record(&self.paths.start, &format!("{now}\n"))?;
        debug!(function = %self.config.function, start = %now, "outermost enter");
        Ok(EnterOutcome::Outermost)
    }

    /// Record a call return happening at `now`
    pub fn leave_at(&self, now: TimeVal) -> Result<LeaveOutcome> {
        let _lock = self.lock()?;

        let depth = match self.read_depth()? {
            Some(depth) if depth > 0 => depth - 1,
            Some(_) => {
                debug!(function = %self.config.function, "removing stale zero-depth record");
                record::remove_record(&self.paths.level)?;
                return Ok(LeaveOutcome::Unmatched);
            }
            None => {
                debug!(function = %self.config.function, "leave without matching enter");
                return Ok(LeaveOutcome::Unmatched);
            }
        };

        if depth > 0 {
            record::write_record(&self.paths.level, &format!("{depth}\n"))?;
            debug!(function = %self.config.function, depth, "nested leave");
            return Ok(LeaveOutcome::Nested(depth));
        }

        let stats = match self.close_out(now) {
            Ok(stats) => stats,
            Err(e) => {
                warn!(function = %self.config.function, "statistics not updated: {}", e);
                None
            }
        };

        if let Err(e) = record::remove_record(&self.paths.start) {
            warn!(function = %self.config.function, "{}", e);
        }
        record::remove_record(&self.paths.level)?;

        Ok(LeaveOutcome::Completed(stats))
    }

    /// Fold the elapsed time of the outermost call into the `.sta` record
    fn close_out(&self, now: TimeVal) -> Result<Option<CallStats>> {
        let start = record::read_record(&self.paths.start)?
            .as_deref()
            .and_then(TimeVal::parse);
        let Some(start) = start else {
            debug!(function = %self.config.function, "missing or malformed start stamp");
            return Ok(None);
        };

        let elapsed = now.elapsed_since(start);
        let previous = record::read_record(&self.paths.stats)?
            .as_deref()
            .and_then(CallStats::parse);
        if previous.is_none() {
            debug!(function = %self.config.function, "starting fresh statistics");
        }

        let stats = CallStats::merge(previous, elapsed);
        record::write_record(&self.paths.stats, &stats.to_string())?;
        debug!(
            function = %self.config.function,
            elapsed = %elapsed,
            count = stats.count,
            "recorded call"
        );
        Ok(Some(stats))
    }

    fn read_depth(&self) -> Result<Option<u32>> {
        Ok(record::read_record(&self.paths.level)?.map(|s| record::parse_depth(&s)))
    }

    fn lock(&self) -> Result<Option<FunctionLock>> {
        self.config
            .lock_timeout
            .map(|timeout| FunctionLock::acquire(&self.paths.lock, timeout))
            .transpose()
    }
}
