//! Execution ledger
//!
//! One append-only text log per job. Each cycle appends exactly one line:
//!
//! ```text
//! [<ISO8601 timestamp>] <STATUS>: <job_name> - <unit_count>件処理 <message>
//! ```
//!
//! Status queries recompute summaries by re-scanning the log rather than
//! maintaining a separate index. A PARTIAL record counts toward the
//! success tally (at least one unit succeeded) and never toward the error
//! tally; `last_run` only advances on lines that actually processed work.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use junkai_core::domain::record::{ExecutionRecord, LedgerSummary, RunStatus};
use std::io::Write;
use std::path::PathBuf;

/// Durable record of completed cycles
pub trait ExecutionLedger: Send + Sync {
    /// Appends one cycle's record. Records are never mutated after write.
    fn append(&self, record: &ExecutionRecord) -> Result<()>;

    /// Recomputes the job's history summary by scanning its log.
    fn summarize(&self, job_name: &str) -> Result<LedgerSummary>;
}

/// File-backed ledger, one log stream per job name
pub struct FileLedger {
    dir: PathBuf,
}

impl FileLedger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn log_path(&self, job_name: &str) -> PathBuf {
        self.dir.join(format!("dispatch-{}.log", job_name))
    }
}

impl ExecutionLedger for FileLedger {
    fn append(&self, record: &ExecutionRecord) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create ledger directory {}", self.dir.display()))?;

        let path = self.log_path(&record.job_name);
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open ledger {}", path.display()))?;

        writeln!(file, "{}", format_line(record))
            .with_context(|| format!("failed to append to ledger {}", path.display()))
    }

    fn summarize(&self, job_name: &str) -> Result<LedgerSummary> {
        let path = self.log_path(job_name);
        if !path.exists() {
            return Ok(LedgerSummary::default());
        }

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read ledger {}", path.display()))?;

        Ok(summarize_lines(&raw))
    }
}

fn format_line(record: &ExecutionRecord) -> String {
    format!(
        "[{}] {}: {} - {}件処理 {}",
        record.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        record.status.as_str(),
        record.job_name,
        record.total_units,
        record.message
    )
}

struct ParsedLine {
    timestamp: DateTime<Utc>,
    status: RunStatus,
    units: usize,
}

/// Parses one ledger line; unparseable lines are skipped by the scan.
fn parse_line(line: &str) -> Option<ParsedLine> {
    let rest = line.strip_prefix('[')?;
    let (raw_ts, rest) = rest.split_once("] ")?;
    let timestamp = DateTime::parse_from_rfc3339(raw_ts).ok()?.with_timezone(&Utc);

    let (raw_status, rest) = rest.split_once(": ")?;
    let status = match raw_status {
        "SUCCESS" => RunStatus::Success,
        "PARTIAL" => RunStatus::Partial,
        "ERROR" => RunStatus::Error,
        _ => return None,
    };

    let (_job, rest) = rest.split_once(" - ")?;
    let raw_units = rest.split("件処理").next()?;
    let units = raw_units.trim().parse().ok()?;

    Some(ParsedLine {
        timestamp,
        status,
        units,
    })
}

fn summarize_lines(raw: &str) -> LedgerSummary {
    let mut summary = LedgerSummary::default();

    for line in raw.lines() {
        let Some(entry) = parse_line(line) else {
            continue;
        };

        match entry.status {
            RunStatus::Success | RunStatus::Partial => summary.success_count += 1,
            RunStatus::Error => summary.failure_count += 1,
        }

        // Zero-unit SUCCESS lines record an idle cycle; they never advance
        // last_run. ERROR lines processed nothing successfully either.
        let processed_work = entry.units > 0
            && matches!(entry.status, RunStatus::Success | RunStatus::Partial);
        if processed_work {
            summary.last_run = Some(
                summary
                    .last_run
                    .map_or(entry.timestamp, |prev| prev.max(entry.timestamp)),
            );
        }
    }

    summary
}
