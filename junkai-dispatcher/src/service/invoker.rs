//! Backend invoker
//!
//! Shapes the protocol-specific request for one work unit, performs the
//! call through the backend seam, and classifies the outcome. Invocation
//! never raises: every transport or application failure becomes a unit
//! outcome the aggregator can fold.

use junkai_core::domain::job::{DispatchStrategy, HttpMethod, JobDefinition};
use junkai_core::domain::unit::{UnitOutcome, UnitStatus, WorkUnit};
use junkai_core::settings::JobSettings;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

use crate::repository::{BackendError, BackendRequest, BackendResponse, JobBackend, RecordStore};

/// Longest response-body excerpt carried in outcome details.
const DETAIL_BODY_LIMIT: usize = 200;

/// Invokes one work unit under a job's protocol contract
pub struct BackendInvoker {
    backend: Arc<dyn JobBackend>,
    store: Arc<dyn RecordStore>,
}

impl BackendInvoker {
    pub fn new(backend: Arc<dyn JobBackend>, store: Arc<dyn RecordStore>) -> Self {
        Self { backend, store }
    }

    /// Calls the job backend for one unit and classifies the result.
    pub async fn invoke(
        &self,
        def: &JobDefinition,
        settings: &JobSettings,
        unit: &WorkUnit,
    ) -> UnitOutcome {
        let request = build_request(def, settings, unit);

        match self.backend.call(request).await {
            Ok(response) if response.status == 200 => {
                self.handle_success(def, unit, &response).await
            }
            Ok(response) => {
                warn!(
                    job = %def.name, unit = %unit, status = response.status,
                    "backend rejected unit"
                );
                UnitOutcome::new(
                    unit.clone(),
                    UnitStatus::Failure,
                    format!(
                        "{}: {}",
                        response.status,
                        truncate(&response.body, DETAIL_BODY_LIMIT)
                    ),
                )
            }
            Err(BackendError::Timeout) => UnitOutcome::new(
                unit.clone(),
                UnitStatus::TimedOut,
                "client timeout elapsed; backend processing may continue in the background",
            ),
            Err(BackendError::Connect(detail)) => {
                warn!(job = %def.name, unit = %unit, %detail, "backend unreachable");
                UnitOutcome::new(
                    unit.clone(),
                    UnitStatus::Failure,
                    format!("network error: {}", detail),
                )
            }
            Err(BackendError::Other(detail)) => UnitOutcome::new(
                unit.clone(),
                UnitStatus::Failure,
                format!("request error: {}", detail),
            ),
        }
    }

    /// Handles a 200 answer; record-based jobs additionally mark the
    /// source row completed. If that second phase fails the unit is a
    /// failure despite the successful remote computation: the row state is
    /// now inconsistent and blind resubmission would risk duplicate
    /// downstream writes.
    async fn handle_success(
        &self,
        def: &JobDefinition,
        unit: &WorkUnit,
        response: &BackendResponse,
    ) -> UnitOutcome {
        if let (DispatchStrategy::RecordBased { table, .. }, WorkUnit::Record(row)) =
            (&def.strategy, unit)
        {
            if let Err(e) = self.store.mark_dashboard_completed(table, row).await {
                error!(
                    job = %def.name, unit = %unit, error = %e,
                    "backend succeeded but completion mark failed, row state inconsistent"
                );
                return UnitOutcome::new(
                    unit.clone(),
                    UnitStatus::Failure,
                    format!("completion update failed after successful call: {}", e),
                );
            }
        }

        UnitOutcome::new(unit.clone(), UnitStatus::Success, extract_message(&response.body))
    }
}

/// Builds the protocol-specific request for one unit.
fn build_request(def: &JobDefinition, settings: &JobSettings, unit: &WorkUnit) -> BackendRequest {
    let timeout = settings
        .timeout
        .map(Duration::from_secs)
        .unwrap_or(def.timeout);

    let mut request = BackendRequest {
        method: def.method,
        url: def.backend_url.clone(),
        timeout,
        query: Vec::new(),
        body: None,
    };

    match unit {
        WorkUnit::File(path) => {
            let mut body = json!({ "file_paths": [path] });
            if let DispatchStrategy::FileBased {
                model: Some(model), ..
            } = &def.strategy
            {
                body["model"] = json!(model);
            }
            request.body = Some(body);
        }
        WorkUnit::Device { device_id, date } => match def.method {
            HttpMethod::Get => {
                request.query = vec![
                    ("device_id".to_string(), device_id.clone()),
                    ("date".to_string(), date.to_string()),
                ];
            }
            HttpMethod::Post => {
                request.body = Some(json!({
                    "device_id": device_id,
                    "date": date.to_string(),
                }));
            }
        },
        WorkUnit::TimeBlock {
            device_id,
            date,
            time_block,
        } => {
            request.query = vec![
                ("device_id".to_string(), device_id.clone()),
                ("date".to_string(), date.to_string()),
                ("time_block".to_string(), time_block.clone()),
            ];
        }
        WorkUnit::Record(row) => {
            request.body = Some(json!({
                "prompt": row.prompt,
                "device_id": row.device_id,
                "date": row.date.to_string(),
                "time_block": row.time_block,
            }));
        }
    }

    request
}

/// Pulls the backend's `message` field out of a success body.
fn extract_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| "OK".to_string())
}

/// Char-safe truncation for log excerpts.
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
