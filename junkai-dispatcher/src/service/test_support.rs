//! In-memory fakes for the repository seams, shared by service tests.

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::NaiveDate;
use junkai_core::domain::unit::DashboardRow;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::repository::{
    BackendError, BackendRequest, BackendResponse, JobBackend, PendingFile, RecordStore,
    TimeBlockKey,
};

/// Record store fake with canned rows and per-query failure switches.
#[derive(Default)]
pub struct FakeStore {
    pub files: Vec<PendingFile>,
    pub devices: Vec<String>,
    pub time_blocks: HashMap<String, Vec<TimeBlockKey>>,
    pub dashboard_rows: Vec<DashboardRow>,
    pub fail_files: bool,
    pub fail_devices: bool,
    pub fail_completion: bool,
    /// Dates the device query was asked about.
    pub device_queries: Mutex<Vec<NaiveDate>>,
    /// Completion marks that were attempted.
    pub completions: Mutex<Vec<DashboardRow>>,
}

#[async_trait]
impl RecordStore for FakeStore {
    async fn pending_files(&self, _status_column: &str, limit: usize) -> Result<Vec<PendingFile>> {
        if self.fail_files {
            bail!("store offline");
        }
        Ok(self.files.iter().take(limit).cloned().collect())
    }

    async fn devices_active_on(&self, date: NaiveDate) -> Result<Vec<String>> {
        self.device_queries.lock().unwrap().push(date);
        if self.fail_devices {
            bail!("store offline");
        }
        Ok(self.devices.clone())
    }

    async fn pending_time_blocks(&self, table: &str) -> Result<Vec<TimeBlockKey>> {
        Ok(self.time_blocks.get(table).cloned().unwrap_or_default())
    }

    async fn pending_dashboard_rows(
        &self,
        _table: &str,
        limit: usize,
    ) -> Result<Vec<DashboardRow>> {
        Ok(self.dashboard_rows.iter().take(limit).cloned().collect())
    }

    async fn mark_dashboard_completed(&self, _table: &str, row: &DashboardRow) -> Result<()> {
        if self.fail_completion {
            bail!("store offline");
        }
        self.completions.lock().unwrap().push(row.clone());
        Ok(())
    }
}

/// One scripted backend answer.
#[derive(Debug, Clone)]
pub enum CannedCall {
    Status(u16, &'static str),
    Timeout,
    ConnectError,
}

/// Backend fake replaying scripted answers in call order.
///
/// When the script runs out, further calls answer 200 with an OK message.
#[derive(Default)]
pub struct FakeBackend {
    script: Mutex<VecDeque<CannedCall>>,
    pub requests: Mutex<Vec<BackendRequest>>,
}

impl FakeBackend {
    pub fn scripted(calls: impl IntoIterator<Item = CannedCall>) -> Self {
        Self {
            script: Mutex::new(calls.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl JobBackend for FakeBackend {
    async fn call(&self, request: BackendRequest) -> Result<BackendResponse, BackendError> {
        self.requests.lock().unwrap().push(request);

        let next = self.script.lock().unwrap().pop_front();
        match next {
            None => Ok(BackendResponse {
                status: 200,
                body: r#"{"message":"OK"}"#.to_string(),
            }),
            Some(CannedCall::Status(status, body)) => Ok(BackendResponse {
                status,
                body: body.to_string(),
            }),
            Some(CannedCall::Timeout) => Err(BackendError::Timeout),
            Some(CannedCall::ConnectError) => {
                Err(BackendError::Connect("name resolution failed".to_string()))
            }
        }
    }
}

/// Dashboard row fixture.
pub fn dashboard_row(device_id: &str, date: &str, time_block: &str) -> DashboardRow {
    DashboardRow {
        device_id: device_id.to_string(),
        date: date.parse().unwrap(),
        time_block: time_block.to_string(),
        prompt: "analyze this block".to_string(),
    }
}

/// Time-block key fixture.
pub fn block_key(device_id: &str, date: &str, time_block: &str) -> TimeBlockKey {
    TimeBlockKey {
        device_id: device_id.to_string(),
        date: date.parse().unwrap(),
        time_block: time_block.to_string(),
    }
}
