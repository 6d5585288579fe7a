//! Job definition types

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Immutable definition of one dispatchable job.
///
/// Loaded once from the registry at startup and never mutated at runtime.
/// Mutable per-job knobs (enable flag, interval, overrides) live in
/// [`crate::settings::JobSettings`] instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDefinition {
    /// Stable job name, used as registry key and ledger stream name.
    pub name: String,
    /// Human-readable name for log output.
    pub display_name: String,
    /// Backend endpoint for this job.
    pub backend_url: String,
    /// HTTP method the backend expects.
    pub method: HttpMethod,
    /// Client-side timeout for a single backend call.
    pub timeout: Duration,
    /// How work units are discovered and shaped for this job.
    pub strategy: DispatchStrategy,
}

/// HTTP method for backend calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Dispatch strategy for a job
///
/// A closed set of variants rather than open-ended string tags, so every
/// selector and invoker match is exhaustively checked by the compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchStrategy {
    /// Submit pending audio files, tracked per job via a status column on
    /// the `audio_files` table.
    FileBased {
        /// Per-job status column holding `pending` markers.
        status_column: String,
        /// Optional model name to include in the request body.
        model: Option<String>,
    },
    /// Submit one whole device/day per unit.
    DeviceBased,
    /// Submit pending (device, date, time_block) triples discovered across
    /// several per-stage status tables.
    TimeBlockBased {
        /// Upstream status tables to scan, one per pipeline stage.
        source_tables: Vec<String>,
    },
    /// Submit pending rows of a single table carrying a prompt payload,
    /// with a two-phase completion mark after a successful call.
    RecordBased {
        table: String,
        batch_limit: usize,
    },
}

impl DispatchStrategy {
    /// Short tag for log output.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchStrategy::FileBased { .. } => "file_based",
            DispatchStrategy::DeviceBased => "device_based",
            DispatchStrategy::TimeBlockBased { .. } => "time_block_based",
            DispatchStrategy::RecordBased { .. } => "record_based",
        }
    }

    /// Default cap on the number of units selected per cycle.
    ///
    /// `None` means the strategy is uncapped unless the per-job settings
    /// say otherwise.
    pub fn default_unit_cap(&self) -> Option<usize> {
        match self {
            DispatchStrategy::FileBased { .. } => Some(100),
            DispatchStrategy::DeviceBased => None,
            DispatchStrategy::TimeBlockBased { .. } => Some(50),
            DispatchStrategy::RecordBased { batch_limit, .. } => Some(*batch_limit),
        }
    }

    /// Whether a client-side timeout counts as a successful unit.
    ///
    /// Backends behind the file/device/time-block strategies perform
    /// long-running work that routinely outlives the client timeout; the
    /// unit must not be resubmitted by the next cycle. The record-based
    /// strategy is the exception: its completion mark cannot be trusted to
    /// have happened, so a timeout is a failure there.
    pub fn timeout_counts_as_success(&self) -> bool {
        !matches!(self, DispatchStrategy::RecordBased { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_classification_is_asymmetric() {
        let file = DispatchStrategy::FileBased {
            status_column: "transcriptions_status".to_string(),
            model: Some("base".to_string()),
        };
        let device = DispatchStrategy::DeviceBased;
        let block = DispatchStrategy::TimeBlockBased {
            source_tables: vec!["vibe_whisper".to_string()],
        };
        let record = DispatchStrategy::RecordBased {
            table: "dashboard".to_string(),
            batch_limit: 10,
        };

        assert!(file.timeout_counts_as_success());
        assert!(device.timeout_counts_as_success());
        assert!(block.timeout_counts_as_success());
        assert!(!record.timeout_counts_as_success());
    }

    #[test]
    fn default_unit_caps() {
        let file = DispatchStrategy::FileBased {
            status_column: "sed_status".to_string(),
            model: None,
        };
        assert_eq!(file.default_unit_cap(), Some(100));
        assert_eq!(DispatchStrategy::DeviceBased.default_unit_cap(), None);

        let block = DispatchStrategy::TimeBlockBased {
            source_tables: vec![],
        };
        assert_eq!(block.default_unit_cap(), Some(50));

        let record = DispatchStrategy::RecordBased {
            table: "dashboard".to_string(),
            batch_limit: 7,
        };
        assert_eq!(record.default_unit_cap(), Some(7));
    }
}
