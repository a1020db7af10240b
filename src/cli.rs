//! CLI argument parsing for `ssp` and `ssp-report`

use crate::lock::DEFAULT_LOCK_TIMEOUT;
use clap::{CommandFactory, Parser, ValueEnum};
use std::ffi::OsString;
use std::path::PathBuf;

/// Printed to stdout when `ssp` is invoked without its required arguments
pub const USAGE: &str = "Usage: ssp {e(nter) | l(eave)} <funcname> <dir> [$?]";

/// Which event an `ssp` invocation records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Enter,
    Leave,
}

impl Mode {
    /// Anything starting with `e` is an enter, everything else a leave
    pub fn from_arg(arg: &str) -> Self {
        if arg.starts_with('e') {
            Mode::Enter
        } else {
            Mode::Leave
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "ssp")]
#[command(version)]
#[command(about = "Shell script profiler: times outermost function calls across invocations", long_about = None)]
#[command(override_usage = "ssp {e(nter) | l(eave)} <funcname> <dir> [$?]")]
pub struct Cli {
    /// `enter` or `leave` (only the first letter `e` is significant)
    #[arg(value_name = "MODE")]
    pub mode: String,

    /// Function name, used verbatim in state file names
    #[arg(value_name = "FUNCNAME")]
    pub function: String,

    /// Existing directory holding the state files
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Exit status to pass through, typically `$?` of the profiled function
    #[arg(value_name = "EXIT_CODE")]
    pub exit_code: Option<String>,

    /// Ignored trailing arguments
    #[arg(hide = true)]
    pub rest: Vec<String>,

    /// Serialize updates of this function's records through an advisory lock
    #[arg(long = "lock")]
    pub lock: bool,

    /// Give up waiting for the lock after this many milliseconds
    #[arg(
        long = "lock-timeout-ms",
        value_name = "MS",
        default_value_t = DEFAULT_LOCK_TIMEOUT.as_millis() as u64
    )]
    pub lock_timeout_ms: u64,

    /// Emit debug logs to stderr (filter refinable with RUST_LOG)
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// Parse an `ssp` command line
    ///
    /// Options are only recognized before the mode argument. From the mode on
    /// every argument is positional, so function names, directories and exit
    /// codes may start with `-`.
    pub fn try_parse_invocation<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(separate_positionals(args))
    }

    pub fn mode(&self) -> Mode {
        Mode::from_arg(&self.mode)
    }

    /// Exit status requested by the caller, 0 when none was given
    pub fn exit_code(&self) -> i32 {
        self.exit_code.as_deref().map(parse_exit_code).unwrap_or(0)
    }
}

/// Insert `--` in front of the first argument that is not a known option
fn separate_positionals<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut cmd = Cli::command();
    cmd.build();

    let mut args = args.into_iter().map(Into::into);
    let mut out: Vec<OsString> = args.next().into_iter().collect();
    while let Some(arg) = args.next() {
        let option = match arg.to_str() {
            Some("--") => {
                out.push(arg);
                break;
            }
            Some(text) => option_takes_value(&cmd, text),
            None => None,
        };
        match option {
            Some(takes_value) => {
                let inline = arg.to_str().is_some_and(|text| text.contains('='));
                out.push(arg);
                if takes_value && !inline {
                    out.extend(args.next());
                }
            }
            None => {
                out.push("--".into());
                out.push(arg);
                break;
            }
        }
    }
    out.extend(args);
    out
}

/// `Some(takes_value)` when `text` names one of the command's options
fn option_takes_value(cmd: &clap::Command, text: &str) -> Option<bool> {
    let name = text.split_once('=').map_or(text, |(name, _)| name);
    let is_named = |arg: &&clap::Arg| match name.strip_prefix("--") {
        Some(long) => arg.get_long() == Some(long),
        None => {
            let mut chars = name.strip_prefix('-').unwrap_or("").chars();
            matches!((chars.next(), chars.next()), (Some(c), None) if arg.get_short() == Some(c))
        }
    };
    cmd.get_arguments()
        .find(is_named)
        .map(|arg| arg.get_action().takes_values())
}

/// Parse an exit status the way C's `atoi` does
///
/// Leading whitespace and a sign are accepted, parsing stops at the first
/// non-digit, and unreadable input yields 0.
pub fn parse_exit_code(arg: &str) -> i32 {
    let s = arg.trim_start();
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'-') => (-1i64, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let value = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, b| {
            (acc * 10 + i64::from(b - b'0')).min(i64::from(u32::MAX))
        });
    (sign * value) as i32
}

/// Output format for statistics reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

/// Column used to order report rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortKey {
    /// Number of completed outermost calls
    Calls,
    /// Cumulative elapsed time
    Total,
    /// Average time per call
    Average,
    /// Function name
    Name,
}

#[derive(Parser, Debug)]
#[command(name = "ssp-report")]
#[command(version)]
#[command(about = "Summarize statistics collected by ssp", long_about = None)]
pub struct ReportCli {
    /// Directory holding the `.sta` records
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Sort rows by this column (ascending)
    #[arg(short = 's', long = "sort", value_enum, default_value = "total")]
    pub sort: SortKey,

    /// Reverse the sort order
    #[arg(short = 'r', long = "reverse")]
    pub reverse: bool,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Also list functions whose outermost call is still open
    #[arg(long = "running")]
    pub running: bool,

    /// Emit debug logs to stderr (filter refinable with RUST_LOG)
    #[arg(long = "debug")]
    pub debug: bool,
}
