//! Optional per-function advisory lock
//!
//! Shell call/return order already serializes events for one function within a
//! single execution trace. Backgrounded jobs break that assumption, so callers
//! can ask for the read-modify-write of a function's records to run while
//! holding an exclusive lock on `<dir>/<function>.lck`.

use crate::error::{Result, SspError};
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default time to wait for a contended lock
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(2);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Exclusive lock on a function's `.lck` file, released on drop
#[derive(Debug)]
pub struct FunctionLock {
    file: File,
    path: PathBuf,
}

impl FunctionLock {
    /// Poll for the lock until `timeout` elapses
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self> {
        let file = open_lock_file(path).map_err(|e| SspError::io(path, e))?;
        let start = Instant::now();
        loop {
            if matches!(FileExt::try_lock_exclusive(&file), Ok(true)) {
                debug!(path = %path.display(), "acquired lock");
                return Ok(Self {
                    file,
                    path: path.to_path_buf(),
                });
            }

            let waited = start.elapsed();
            if waited >= timeout {
                return Err(SspError::LockTimeout {
                    path: path.to_path_buf(),
                    waited,
                });
            }

            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Drop for FunctionLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(path = %self.path.display(), "failed to release lock: {}", e);
        }
    }
}

fn open_lock_file(path: &Path) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true).write(true).create(true).truncate(false);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}
