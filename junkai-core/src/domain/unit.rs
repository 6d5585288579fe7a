//! Work units and per-unit outcomes

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::job::DispatchStrategy;

/// One submittable chunk of work for a job cycle.
///
/// Produced fresh by the selector every cycle; never persisted by the
/// dispatcher itself. Which variant a job produces is fixed by its
/// dispatch strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkUnit {
    /// A single audio file path.
    File(String),
    /// A whole device/day.
    Device { device_id: String, date: NaiveDate },
    /// A time-aligned bucket of one device/day.
    TimeBlock {
        device_id: String,
        date: NaiveDate,
        time_block: String,
    },
    /// A full dashboard row; the prompt payload is needed at invocation.
    Record(DashboardRow),
}

impl fmt::Display for WorkUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkUnit::File(path) => write!(f, "{}", path),
            WorkUnit::Device { device_id, date } => write!(f, "{}@{}", device_id, date),
            WorkUnit::TimeBlock {
                device_id,
                date,
                time_block,
            } => write!(f, "{}@{}/{}", device_id, date, time_block),
            WorkUnit::Record(row) => {
                write!(f, "{}@{}/{}", row.device_id, row.date, row.time_block)
            }
        }
    }
}

/// One pending row of the dashboard analysis table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardRow {
    pub device_id: String,
    pub date: NaiveDate,
    pub time_block: String,
    pub prompt: String,
}

/// Outcome classification for one invoked unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitStatus {
    Success,
    Failure,
    /// The client-side timeout elapsed before the backend answered.
    /// Whether this counts as a success depends on the dispatch strategy.
    TimedOut,
}

/// Result of invoking one work unit. Ephemeral, created per invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitOutcome {
    pub unit: WorkUnit,
    pub status: UnitStatus,
    pub detail: String,
}

impl UnitOutcome {
    pub fn new(unit: WorkUnit, status: UnitStatus, detail: impl Into<String>) -> Self {
        Self {
            unit,
            status,
            detail: detail.into(),
        }
    }

    /// Folds the outcome into a success/failure tally for the given
    /// strategy, applying the timeout asymmetry.
    pub fn counts_as_success(&self, strategy: &DispatchStrategy) -> bool {
        match self.status {
            UnitStatus::Success => true,
            UnitStatus::Failure => false,
            UnitStatus::TimedOut => strategy.timeout_counts_as_success(),
        }
    }
}
