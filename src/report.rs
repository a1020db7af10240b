//! Statistics reports over a profiling directory
//!
//! Collects every `.sta` record in a directory and renders them sorted by call
//! count, total time, or time per call, as a text table, JSON, or CSV.
//! Optionally lists functions whose outermost call is still open (`.lvl`
//! records).

use crate::cli::{OutputFormat, SortKey};
use crate::error::{Result, SspError};
use crate::record::{self, LEVEL_SUFFIX, START_SUFFIX, STATS_SUFFIX};
use crate::stats::CallStats;
use crate::timeval::TimeVal;
use serde::Serialize;
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// How a report is collected and rendered
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub dir: PathBuf,
    pub sort: SortKey,
    pub reverse: bool,
    pub format: OutputFormat,
    pub running: bool,
}

impl ReportConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            sort: SortKey::Total,
            reverse: false,
            format: OutputFormat::Text,
            running: false,
        }
    }
}

/// Statistics of one function
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionEntry {
    pub function: String,
    pub stats: CallStats,
}

/// A function with an open outermost call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunningEntry {
    pub function: String,
    pub depth: u32,
    pub since: Option<TimeVal>,
}

/// Collected report data, already sorted
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub functions: Vec<FunctionEntry>,
    pub running: Option<Vec<RunningEntry>>,
}

#[derive(Serialize)]
struct JsonFunction<'a> {
    function: &'a str,
    calls: u64,
    total_secs: f64,
    average_secs: f64,
}

#[derive(Serialize)]
struct JsonRunning<'a> {
    function: &'a str,
    depth: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    since: Option<String>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    functions: Vec<JsonFunction<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    running: Option<Vec<JsonRunning<'a>>>,
}

impl Report {
    /// Scan `config.dir` and sort the collected records
    pub fn collect(config: &ReportConfig) -> Result<Self> {
        if !config.dir.is_dir() {
            return Err(SspError::NotADirectory(config.dir.clone()));
        }

        let mut functions = Vec::new();
        for (function, path) in records_with_suffix(&config.dir, STATS_SUFFIX)? {
            let stats = record::read_record(&path)?
                .as_deref()
                .and_then(CallStats::parse);
            match stats {
                Some(stats) => functions.push(FunctionEntry { function, stats }),
                None => debug!(path = %path.display(), "skipping malformed statistics"),
            }
        }
        sort_entries(&mut functions, config.sort, config.reverse);

        let running = if config.running {
            let mut running = Vec::new();
            for (function, path) in records_with_suffix(&config.dir, LEVEL_SUFFIX)? {
                let depth = record::read_record(&path)?
                    .map(|s| record::parse_depth(&s))
                    .unwrap_or(0);
                if depth == 0 {
                    continue;
                }
                let start = config.dir.join(format!("{function}{START_SUFFIX}"));
                let since = record::read_record(&start)?
                    .as_deref()
                    .and_then(TimeVal::parse);
                running.push(RunningEntry {
                    function,
                    depth,
                    since,
                });
            }
            running.sort_by(|a, b| a.function.cmp(&b.function));
            Some(running)
        } else {
            None
        };

        Ok(Self { functions, running })
    }

    pub fn render(&self, format: OutputFormat) -> Result<String> {
        Ok(match format {
            OutputFormat::Text => self.to_text(),
            OutputFormat::Json => self.to_json()?,
            OutputFormat::Csv => self.to_csv(),
        })
    }

    /// Sum of all functions' statistics
    pub fn totals(&self) -> CallStats {
        self.functions.iter().fold(
            CallStats {
                count: 0,
                cumulative: TimeVal::ZERO,
            },
            |acc, entry| CallStats {
                count: acc.count.saturating_add(entry.stats.count),
                cumulative: acc.cumulative.saturating_add(entry.stats.cumulative),
            },
        )
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        if self.functions.is_empty() {
            out.push_str("No function statistics collected.\n");
        } else {
            out.push_str(&format!(
                "{:<40} {:>10} {:>16} {:>12}\n",
                "Function", "Calls", "Total Time", "Avg Time"
            ));
            out.push_str(&"─".repeat(81));
            out.push('\n');
            for entry in &self.functions {
                out.push_str(&format!(
                    "{:<40} {:>10} {:>15}s {:>11.6}s\n",
                    entry.function,
                    entry.stats.count,
                    entry.stats.cumulative.to_string(),
                    entry.stats.average()
                ));
            }
            out.push_str(&"─".repeat(81));
            out.push('\n');
            let totals = self.totals();
            out.push_str(&format!(
                "{:<40} {:>10} {:>15}s\n",
                "total",
                totals.count,
                totals.cumulative.to_string()
            ));
        }

        if let Some(running) = &self.running {
            out.push('\n');
            if running.is_empty() {
                out.push_str("No calls in progress.\n");
            } else {
                out.push_str(&format!("{:<40} {:>10} {:>18}\n", "In progress", "Depth", "Since"));
                for entry in running {
                    let since = entry.since.map(|t| t.to_string()).unwrap_or_else(|| "-".into());
                    out.push_str(&format!(
                        "{:<40} {:>10} {:>18}\n",
                        entry.function, entry.depth, since
                    ));
                }
            }
        }
        out
    }

    pub fn to_json(&self) -> Result<String> {
        let doc = JsonReport {
            functions: self
                .functions
                .iter()
                .map(|e| JsonFunction {
                    function: &e.function,
                    calls: e.stats.count,
                    total_secs: e.stats.cumulative.as_secs_f64(),
                    average_secs: e.stats.average(),
                })
                .collect(),
            running: self.running.as_ref().map(|running| {
                running
                    .iter()
                    .map(|e| JsonRunning {
                        function: &e.function,
                        depth: e.depth,
                        since: e.since.map(|t| t.to_string()),
                    })
                    .collect()
            }),
        };
        Ok(serde_json::to_string_pretty(&doc)?)
    }

    /// CSV rows of the function statistics; open calls are not included
    pub fn to_csv(&self) -> String {
        let mut out = String::from("function,calls,total,average\n");
        for entry in &self.functions {
            out.push_str(&format!(
                "{},{},{},{:.6}\n",
                escape_field(&entry.function),
                entry.stats.count,
                entry.stats.cumulative,
                entry.stats.average()
            ));
        }
        out
    }
}

/// Escape CSV field (handle commas, quotes, newlines)
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn sort_entries(entries: &mut [FunctionEntry], key: SortKey, reverse: bool) {
    entries.sort_by(|a, b| {
        let primary = match key {
            SortKey::Calls => a.stats.count.cmp(&b.stats.count),
            SortKey::Total => a.stats.cumulative.cmp(&b.stats.cumulative),
            SortKey::Average => a.stats.average().total_cmp(&b.stats.average()),
            SortKey::Name => Ordering::Equal,
        };
        let ordering = primary.then_with(|| a.function.cmp(&b.function));
        if reverse {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

/// `(function, path)` for every regular file in `dir` named `<function><suffix>`
fn records_with_suffix(dir: &Path, suffix: &str) -> Result<Vec<(String, PathBuf)>> {
    let entries = fs::read_dir(dir).map_err(|e| SspError::io(dir, e))?;
    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SspError::io(dir, e))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let Some(function) = name.strip_suffix(suffix) else {
            continue;
        };
        if function.is_empty() || !entry.path().is_file() {
            continue;
        }
        found.push((function.to_string(), entry.path()));
    }
    Ok(found)
}
