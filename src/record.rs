//! Per-function state records
//!
//! Every profiled function owns a handful of small text files inside the
//! state directory, all named `<dir>/<function><suffix>`:
//!
//! - `.lvl`: current recursion depth, present only while depth > 0
//! - `.str`: start stamp of the outermost call, present only while depth > 0
//! - `.sta`: aggregate statistics, never removed
//! - `.lck`: advisory lock file, only created when locking is enabled
//!
//! Records are always rewritten whole: the new content goes to a temporary file
//! in the same directory which is then renamed over the old record.

use crate::error::{Result, SspError};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const LEVEL_SUFFIX: &str = ".lvl";
pub const START_SUFFIX: &str = ".str";
pub const STATS_SUFFIX: &str = ".sta";
pub const LOCK_SUFFIX: &str = ".lck";

/// Paths of the records belonging to one function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePaths {
    pub dir: PathBuf,
    pub level: PathBuf,
    pub start: PathBuf,
    pub stats: PathBuf,
    pub lock: PathBuf,
}

impl StatePaths {
    /// Derive record paths by plain concatenation, without escaping `function`
    pub fn new(dir: impl AsRef<Path>, function: &str) -> Self {
        let dir = dir.as_ref();
        let record = |suffix: &str| dir.join(format!("{function}{suffix}"));
        Self {
            dir: dir.to_path_buf(),
            level: record(LEVEL_SUFFIX),
            start: record(START_SUFFIX),
            stats: record(STATS_SUFFIX),
            lock: record(LOCK_SUFFIX),
        }
    }
}

/// Parse a recursion depth with `atoi` semantics
///
/// Only the first line matters. Leading whitespace and an optional sign are
/// accepted, parsing stops at the first non-digit, and anything unreadable
/// counts as 0. Negative depths are clamped to 0.
pub fn parse_depth(input: &str) -> u32 {
    let line = input.lines().next().unwrap_or("").trim_start();
    let (negative, digits) = match line.as_bytes().first() {
        Some(b'-') => (true, &line[1..]),
        Some(b'+') => (false, &line[1..]),
        _ => (false, line),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if negative || end == 0 {
        return 0;
    }
    digits[..end].parse().unwrap_or(u32::MAX)
}

/// Read a whole record, `Ok(None)` if it does not exist
pub fn read_record(path: &Path) -> Result<Option<String>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SspError::io(path, e)),
    }
}

/// Replace a record's content atomically
///
/// The temporary file is created with mode 0600, so a freshly created record
/// is readable and writable by its owner only.
pub fn write_record(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".ssp")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| SspError::io(dir, e))?;
    tmp.write_all(contents.as_bytes())
        .map_err(|e| SspError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| SspError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    debug!(path = %path.display(), contents = contents.trim_end(), "wrote record");
    Ok(())
}

/// Delete a record; a record that is already gone is not an error
pub fn remove_record(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed record");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(SspError::io(path, e)),
    }
}
