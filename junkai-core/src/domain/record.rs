//! Execution records and ledger summaries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Job-level status of one dispatch cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Success,
    Partial,
    Error,
}

impl RunStatus {
    /// Derives the cycle status from the fold tallies.
    ///
    /// A cycle with zero units is a SUCCESS; PARTIAL requires at least one
    /// success and at least one failure.
    pub fn from_counts(success_count: usize, total_units: usize) -> Self {
        if success_count == total_units {
            RunStatus::Success
        } else if success_count == 0 {
            RunStatus::Error
        } else {
            RunStatus::Partial
        }
    }

    /// Marker written to the ledger line.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "SUCCESS",
            RunStatus::Partial => "PARTIAL",
            RunStatus::Error => "ERROR",
        }
    }
}

/// Durable summary of one completed dispatch cycle.
///
/// Appended to the execution ledger, never mutated after write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub job_name: String,
    pub timestamp: DateTime<Utc>,
    pub total_units: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub status: RunStatus,
    pub message: String,
    /// Set when the selection ran in degraded mode (fallback device id
    /// after a store-query failure).
    pub degraded: bool,
}

impl ExecutionRecord {
    /// Builds a record from fold tallies, deriving the status.
    pub fn from_counts(
        job_name: impl Into<String>,
        total_units: usize,
        success_count: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            job_name: job_name.into(),
            timestamp: Utc::now(),
            total_units,
            success_count,
            failure_count: total_units - success_count,
            status: RunStatus::from_counts(success_count, total_units),
            message: message.into(),
            degraded: false,
        }
    }
}

/// Summary of a job's ledger history, recomputed by scanning the log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    /// Number of recorded cycles where at least one unit succeeded.
    pub success_count: usize,
    /// Number of recorded cycles where every unit failed.
    pub failure_count: usize,
    /// Timestamp of the most recent cycle that actually processed work
    /// successfully; zero-unit cycles never advance this.
    pub last_run: Option<DateTime<Utc>>,
}
