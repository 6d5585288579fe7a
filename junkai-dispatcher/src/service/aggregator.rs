//! Run aggregator
//!
//! Drives one dispatch cycle: select, invoke each unit strictly
//! sequentially in selection order, fold outcomes into a job-level
//! execution record. Sequential invocation bounds backend load and keeps
//! log ordering; there is no retry within a cycle and no cancellation of
//! remaining units. `run` never fails: selection and invocation errors
//! are already folded below it.

use junkai_core::domain::job::JobDefinition;
use junkai_core::domain::record::{ExecutionRecord, RunStatus};
use junkai_core::settings::JobSettings;
use tracing::{info, warn};

use crate::service::invoker::BackendInvoker;
use crate::service::selector::WorkSelector;

/// Drives select → invoke → fold for one job cycle
pub struct RunAggregator {
    selector: WorkSelector,
    invoker: BackendInvoker,
}

impl RunAggregator {
    pub fn new(selector: WorkSelector, invoker: BackendInvoker) -> Self {
        Self { selector, invoker }
    }

    /// Runs one cycle and returns its execution record.
    pub async fn run(&self, def: &JobDefinition, settings: &JobSettings) -> ExecutionRecord {
        info!(
            job = %def.name, display = %def.display_name, strategy = def.strategy.kind(),
            "dispatch cycle started"
        );

        let selection = self.selector.select(def, settings).await;

        if selection.units.is_empty() {
            info!(job = %def.name, "no pending work, recording empty cycle");
            return ExecutionRecord::from_counts(&def.name, 0, 0, "未処理データなし");
        }

        let total_units = selection.units.len();
        let mut success_count = 0;

        for (idx, unit) in selection.units.iter().enumerate() {
            let outcome = self.invoker.invoke(def, settings, unit).await;

            if outcome.counts_as_success(&def.strategy) {
                success_count += 1;
                info!(
                    job = %def.name, unit = %outcome.unit, detail = %outcome.detail,
                    progress = format!("{}/{}", idx + 1, total_units),
                    "unit processed"
                );
            } else {
                warn!(
                    job = %def.name, unit = %outcome.unit, detail = %outcome.detail,
                    progress = format!("{}/{}", idx + 1, total_units),
                    "unit failed"
                );
            }
        }

        let mut message = match RunStatus::from_counts(success_count, total_units) {
            RunStatus::Success => "処理完了".to_string(),
            RunStatus::Partial => format!("一部失敗 ({}/{}件成功)", success_count, total_units),
            RunStatus::Error => "処理失敗".to_string(),
        };
        if selection.degraded {
            message.push_str(" (degraded mode)");
        }

        let mut record = ExecutionRecord::from_counts(&def.name, total_units, success_count, message);
        record.degraded = selection.degraded;

        info!(
            job = %def.name, status = record.status.as_str(),
            total = record.total_units, success = record.success_count,
            failure = record.failure_count, degraded = record.degraded,
            "dispatch cycle finished"
        );

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::test_support::FixedClock;
    use crate::registry::JobRegistry;
    use crate::repository::RecordStore;
    use crate::service::test_support::{CannedCall, FakeBackend, FakeStore, dashboard_row};
    use std::sync::Arc;

    fn aggregator(store: FakeStore, backend: FakeBackend, today: &str) -> RunAggregator {
        let store: Arc<dyn RecordStore> = Arc::new(store);
        let selector = WorkSelector::new(
            Arc::clone(&store),
            Arc::new(FixedClock(today.parse().unwrap())),
            "fallback-device".to_string(),
        );
        let invoker = BackendInvoker::new(Arc::new(backend), store);
        RunAggregator::new(selector, invoker)
    }

    fn job(name: &str) -> junkai_core::domain::job::JobDefinition {
        JobRegistry::builtin().lookup(name).unwrap().clone()
    }

    #[tokio::test]
    async fn mixed_outcomes_yield_partial_record() {
        // Two active devices; the backend accepts d1 and rejects d2.
        let store = FakeStore {
            devices: vec!["d1".to_string(), "d2".to_string()],
            ..FakeStore::default()
        };
        let backend = FakeBackend::scripted([
            CannedCall::Status(200, r#"{"message":"aggregated"}"#),
            CannedCall::Status(500, "boom"),
        ]);
        let settings = JobSettings {
            process_date: Some("2025-08-21".to_string()),
            ..JobSettings::default()
        };

        let record = aggregator(store, backend, "2025-08-21")
            .run(&job("behavior-aggregator"), &settings)
            .await;

        assert_eq!(record.total_units, 2);
        assert_eq!(record.success_count, 1);
        assert_eq!(record.failure_count, 1);
        assert_eq!(record.status, RunStatus::Partial);
        assert_eq!(record.success_count + record.failure_count, record.total_units);
    }

    #[tokio::test]
    async fn empty_selection_is_zero_unit_success() {
        let record = aggregator(FakeStore::default(), FakeBackend::default(), "2025-08-21")
            .run(&job("whisper"), &JobSettings::default())
            .await;

        assert_eq!(record.status, RunStatus::Success);
        assert_eq!(record.total_units, 0);
        assert_eq!(record.success_count, 0);
        assert_eq!(record.failure_count, 0);
    }

    #[tokio::test]
    async fn all_failures_yield_error_record() {
        let store = FakeStore {
            devices: vec!["d1".to_string()],
            ..FakeStore::default()
        };
        let backend = FakeBackend::scripted([CannedCall::Status(503, "unavailable")]);

        let record = aggregator(store, backend, "2025-08-21")
            .run(&job("behavior-aggregator"), &JobSettings::default())
            .await;

        assert_eq!(record.status, RunStatus::Error);
        assert_eq!(record.total_units, 1);
        assert_eq!(record.success_count, 0);
    }

    #[tokio::test]
    async fn device_timeout_counts_toward_success() {
        let store = FakeStore {
            devices: vec!["d1".to_string()],
            ..FakeStore::default()
        };
        let backend = FakeBackend::scripted([CannedCall::Timeout]);

        let record = aggregator(store, backend, "2025-08-21")
            .run(&job("behavior-aggregator"), &JobSettings::default())
            .await;

        assert_eq!(record.status, RunStatus::Success);
        assert_eq!(record.success_count, 1);
    }

    #[tokio::test]
    async fn record_timeout_counts_toward_failure() {
        let store = FakeStore {
            dashboard_rows: vec![dashboard_row("d1", "2025-08-21", "14-30")],
            ..FakeStore::default()
        };
        let backend = FakeBackend::scripted([CannedCall::Timeout]);

        let record = aggregator(store, backend, "2025-08-21")
            .run(&job("dashboard-analysis"), &JobSettings::default())
            .await;

        assert_eq!(record.status, RunStatus::Error);
        assert_eq!(record.failure_count, 1);
    }

    #[tokio::test]
    async fn degraded_selection_is_flagged_on_the_record() {
        let store = FakeStore {
            fail_devices: true,
            ..FakeStore::default()
        };
        // Fallback device call succeeds.
        let backend = FakeBackend::default();

        let record = aggregator(store, backend, "2025-08-21")
            .run(&job("behavior-aggregator"), &JobSettings::default())
            .await;

        assert!(record.degraded);
        assert_eq!(record.status, RunStatus::Success);
        assert!(record.message.contains("degraded"));
    }

    #[tokio::test]
    async fn units_are_invoked_sequentially_in_selection_order() {
        let store = FakeStore {
            devices: vec!["d1".to_string(), "d2".to_string(), "d3".to_string()],
            ..FakeStore::default()
        };
        let backend = Arc::new(FakeBackend::default());

        let store: Arc<dyn RecordStore> = Arc::new(store);
        let selector = WorkSelector::new(
            Arc::clone(&store),
            Arc::new(FixedClock("2025-08-21".parse().unwrap())),
            "fallback-device".to_string(),
        );
        let invoker = BackendInvoker::new(
            Arc::clone(&backend) as Arc<dyn crate::repository::JobBackend>,
            store,
        );

        let record = RunAggregator::new(selector, invoker)
            .run(&job("vibe-aggregator"), &JobSettings::default())
            .await;

        assert_eq!(record.total_units, 3);

        let requests = backend.requests.lock().unwrap();
        let devices: Vec<String> = requests
            .iter()
            .map(|r| r.query[0].1.clone())
            .collect();
        assert_eq!(devices, vec!["d1", "d2", "d3"]);
    }
}
