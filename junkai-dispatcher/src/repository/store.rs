//! Record store repository
//!
//! Read access to the pending-work tables and the one status transition
//! the dispatcher performs (marking dashboard rows completed). Queries are
//! shaped for the store's REST interface via [`junkai_client::StoreClient`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use junkai_client::StoreClient;
use junkai_core::domain::unit::DashboardRow;
use serde::Deserialize;

use crate::clock::jst;

/// Repository trait for the pending-work record store
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Audio files whose per-job status column is `pending`, oldest first.
    async fn pending_files(&self, status_column: &str, limit: usize) -> Result<Vec<PendingFile>>;

    /// Distinct device ids with activity on the given JST calendar date.
    async fn devices_active_on(&self, date: NaiveDate) -> Result<Vec<String>>;

    /// Pending (device, date, time_block) rows of one per-stage status
    /// table.
    async fn pending_time_blocks(&self, table: &str) -> Result<Vec<TimeBlockKey>>;

    /// Pending dashboard rows carrying a prompt payload.
    async fn pending_dashboard_rows(&self, table: &str, limit: usize)
    -> Result<Vec<DashboardRow>>;

    /// Marks one dashboard row `completed` with a processed-at timestamp.
    async fn mark_dashboard_completed(&self, table: &str, row: &DashboardRow) -> Result<()>;
}

/// One pending row of `audio_files`
#[derive(Debug, Clone, Deserialize)]
pub struct PendingFile {
    pub file_path: String,
    pub created_at: DateTime<Utc>,
    pub device_id: Option<String>,
}

/// Composite key of one per-stage status row
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct TimeBlockKey {
    pub device_id: String,
    pub date: NaiveDate,
    pub time_block: String,
}

/// HTTP implementation of [`RecordStore`]
pub struct HttpRecordStore {
    client: StoreClient,
}

impl HttpRecordStore {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn pending_files(&self, status_column: &str, limit: usize) -> Result<Vec<PendingFile>> {
        self.client
            .select("audio_files")
            .columns("file_path,created_at,device_id")
            .eq(status_column, "pending")
            .order_asc("created_at")
            .limit(limit)
            .fetch()
            .await
            .context("failed to query pending audio files")
    }

    async fn devices_active_on(&self, date: NaiveDate) -> Result<Vec<String>> {
        // The store keys activity by UTC creation time; translate the JST
        // calendar day into its UTC bounds and de-duplicate client-side.
        let (start, end) = jst_day_bounds_utc(date);

        #[derive(Deserialize)]
        struct Row {
            device_id: Option<String>,
        }

        let rows: Vec<Row> = self
            .client
            .select("audio_files")
            .columns("device_id,created_at")
            .gte("created_at", &start)
            .lte("created_at", &end)
            .fetch()
            .await
            .context("failed to query active devices")?;

        let mut seen = std::collections::HashSet::new();
        let mut device_ids = Vec::new();
        for row in rows {
            if let Some(id) = row.device_id {
                if seen.insert(id.clone()) {
                    device_ids.push(id);
                }
            }
        }
        Ok(device_ids)
    }

    async fn pending_time_blocks(&self, table: &str) -> Result<Vec<TimeBlockKey>> {
        self.client
            .select(table)
            .columns("device_id,date,time_block")
            .eq("status", "pending")
            .fetch()
            .await
            .with_context(|| format!("failed to query pending time blocks from {}", table))
    }

    async fn pending_dashboard_rows(
        &self,
        table: &str,
        limit: usize,
    ) -> Result<Vec<DashboardRow>> {
        self.client
            .select(table)
            .columns("device_id,date,time_block,prompt")
            .eq("status", "pending")
            .not_null("prompt")
            .limit(limit)
            .fetch()
            .await
            .with_context(|| format!("failed to query pending rows from {}", table))
    }

    async fn mark_dashboard_completed(&self, table: &str, row: &DashboardRow) -> Result<()> {
        let patch = serde_json::json!({
            "status": "completed",
            "processed_at": Utc::now().to_rfc3339(),
        });

        self.client
            .update(table)
            .eq("device_id", &row.device_id)
            .eq("date", &row.date.to_string())
            .eq("time_block", &row.time_block)
            .apply(&patch)
            .await
            .with_context(|| format!("failed to mark {} row completed", table))
    }
}

/// UTC bounds of one JST calendar day, RFC 3339 formatted.
fn jst_day_bounds_utc(date: NaiveDate) -> (String, String) {
    let start_jst = date.and_hms_opt(0, 0, 0).unwrap();
    let end_jst = date.and_hms_opt(23, 59, 59).unwrap();

    let start = start_jst
        .and_local_timezone(jst())
        .unwrap()
        .with_timezone(&Utc);
    let end = end_jst.and_local_timezone(jst()).unwrap().with_timezone(&Utc);

    (
        start.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        end.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jst_day_maps_to_shifted_utc_range() {
        let date = NaiveDate::from_ymd_opt(2025, 8, 21).unwrap();
        let (start, end) = jst_day_bounds_utc(date);

        // JST 00:00 is 15:00 UTC the previous day.
        assert_eq!(start, "2025-08-20T15:00:00Z");
        assert_eq!(end, "2025-08-21T14:59:59Z");
    }
}
