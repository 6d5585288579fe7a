//! Job registry
//!
//! Static mapping from job name to definition: dispatch strategy, backend
//! address, and protocol parameters. Read-only, built once at startup.
//! An unknown job name is a caller error and never silently defaulted.

use anyhow::{Result, bail};
use junkai_core::domain::job::{DispatchStrategy, HttpMethod, JobDefinition};
use std::collections::HashMap;
use std::time::Duration;

/// Default backend call timeout for file- and device-based jobs, whose
/// backends batch a whole device/day of work.
const AGGREGATE_TIMEOUT: Duration = Duration::from_secs(300);
/// Time-block prompts are bounded per block.
const TIME_BLOCK_TIMEOUT: Duration = Duration::from_secs(120);
/// Dashboard analysis calls are single-row.
const RECORD_TIMEOUT: Duration = Duration::from_secs(60);

/// Registry of all dispatchable jobs
pub struct JobRegistry {
    jobs: HashMap<String, JobDefinition>,
}

impl JobRegistry {
    /// Builds the registry with the built-in job fleet.
    pub fn builtin() -> Self {
        let jobs = [
            file_based(
                "whisper",
                "Whisper Transcriber",
                "http://api-transcriber:8001/fetch-and-transcribe",
                "transcriptions_status",
                Some("base"),
            ),
            file_based(
                "behavior-features",
                "Behavior Features",
                "http://api-sed:8004/fetch-and-process-paths",
                "sed_status",
                None,
            ),
            file_based(
                "emotion-features",
                "Emotion Features",
                "http://opensmile-api:8011/process/emotion-features",
                "opensmile_status",
                None,
            ),
            device_based(
                "vibe-aggregator",
                "Vibe Aggregator",
                "http://api-gen-prompt:8009/generate-mood-prompt",
                HttpMethod::Get,
            ),
            device_based(
                "vibe-scorer",
                "Vibe Scorer",
                "http://api-gpt:8002/analyze-vibegraph",
                HttpMethod::Post,
            ),
            device_based(
                "behavior-aggregator",
                "Behavior Aggregator",
                "http://api-sed-aggregator:8010/analysis/sed",
                HttpMethod::Post,
            ),
            device_based(
                "emotion-aggregator",
                "Emotion Aggregator",
                "http://opensmile-aggregator:8012/analyze/opensmile-aggregator",
                HttpMethod::Post,
            ),
            JobDefinition {
                name: "timeblock-prompt".to_string(),
                display_name: "Timeblock Prompt Generator".to_string(),
                backend_url: "http://api-gen-prompt:8009/generate-timeblock-prompt".to_string(),
                method: HttpMethod::Get,
                timeout: TIME_BLOCK_TIMEOUT,
                strategy: DispatchStrategy::TimeBlockBased {
                    source_tables: vec![
                        "vibe_whisper".to_string(),
                        "behavior_yamnet".to_string(),
                        "emotion_opensmile".to_string(),
                    ],
                },
            },
            JobDefinition {
                name: "dashboard-analysis".to_string(),
                display_name: "Dashboard Analysis".to_string(),
                backend_url: "http://api-gpt:8002/analyze-timeblock".to_string(),
                method: HttpMethod::Post,
                timeout: RECORD_TIMEOUT,
                strategy: DispatchStrategy::RecordBased {
                    table: "dashboard".to_string(),
                    batch_limit: 10,
                },
            },
        ];

        Self {
            jobs: jobs
                .into_iter()
                .map(|def| (def.name.clone(), def))
                .collect(),
        }
    }

    /// Looks up a job by name. Unknown names are an error.
    pub fn lookup(&self, name: &str) -> Result<&JobDefinition> {
        match self.jobs.get(name) {
            Some(def) => Ok(def),
            None => bail!("unknown job: {}", name),
        }
    }

    /// All registered job names, for diagnostics.
    pub fn job_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.jobs.keys().map(String::as_str).collect();
        names.sort();
        names
    }
}

fn file_based(
    name: &str,
    display_name: &str,
    backend_url: &str,
    status_column: &str,
    model: Option<&str>,
) -> JobDefinition {
    JobDefinition {
        name: name.to_string(),
        display_name: display_name.to_string(),
        backend_url: backend_url.to_string(),
        method: HttpMethod::Post,
        timeout: AGGREGATE_TIMEOUT,
        strategy: DispatchStrategy::FileBased {
            status_column: status_column.to_string(),
            model: model.map(str::to_string),
        },
    }
}

fn device_based(
    name: &str,
    display_name: &str,
    backend_url: &str,
    method: HttpMethod,
) -> JobDefinition {
    JobDefinition {
        name: name.to_string(),
        display_name: display_name.to_string(),
        backend_url: backend_url.to_string(),
        method,
        timeout: AGGREGATE_TIMEOUT,
        strategy: DispatchStrategy::DeviceBased,
    }
}
