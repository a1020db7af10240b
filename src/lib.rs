//! ssp - Shell script profiler
//!
//! Times shell function calls from the outside: an instrumented function runs
//! `ssp enter <name> <dir>` on entry and `ssp leave <name> <dir> $?` on return.
//! Each invocation is a separate short-lived process, so all state lives in a
//! few small per-function records inside `<dir>`. Recursive calls are tracked
//! by depth and only the outermost call is timed.

pub mod cli;
pub mod error;
pub mod lock;
pub mod record;
pub mod report;
pub mod stats;
pub mod timer;
pub mod timeval;

pub use error::{Result, SspError};
pub use stats::CallStats;
pub use timer::{CallTimer, EnterOutcome, LeaveOutcome, TimerConfig};
pub use timeval::TimeVal;
