//! Work selector
//!
//! Computes the ordered set of work units to submit for one cycle. A
//! fresh selection is made every cycle; nothing is carried over. Store
//! failures during selection never crash the cycle: they degrade to an
//! empty selection, or to the fallback device for device-based jobs.

use chrono::NaiveDate;
use junkai_core::domain::job::{DispatchStrategy, JobDefinition};
use junkai_core::domain::unit::WorkUnit;
use junkai_core::settings::{JobSettings, PROCESS_DATE_TODAY};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::repository::RecordStore;

/// Units selected for one cycle
pub struct Selection {
    /// Units in submission order.
    pub units: Vec<WorkUnit>,
    /// Set when the selection fell back to the default device after a
    /// store-query failure. A legitimate empty result is not degraded.
    pub degraded: bool,
}

impl Selection {
    fn new(units: Vec<WorkUnit>) -> Self {
        Self {
            units,
            degraded: false,
        }
    }

    fn empty() -> Self {
        Self::new(Vec::new())
    }
}

/// Resolves work units per job strategy
pub struct WorkSelector {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    fallback_device_id: String,
}

impl WorkSelector {
    pub fn new(
        store: Arc<dyn RecordStore>,
        clock: Arc<dyn Clock>,
        fallback_device_id: String,
    ) -> Self {
        Self {
            store,
            clock,
            fallback_device_id,
        }
    }

    /// Produces this cycle's selection for the job.
    pub async fn select(&self, def: &JobDefinition, settings: &JobSettings) -> Selection {
        match &def.strategy {
            DispatchStrategy::FileBased { status_column, .. } => {
                self.select_files(def, status_column, settings).await
            }
            DispatchStrategy::DeviceBased => self.select_devices(def, settings).await,
            DispatchStrategy::TimeBlockBased { source_tables } => {
                self.select_time_blocks(def, source_tables, settings).await
            }
            DispatchStrategy::RecordBased { table, .. } => {
                self.select_records(def, table, settings).await
            }
        }
    }

    async fn select_files(
        &self,
        def: &JobDefinition,
        status_column: &str,
        settings: &JobSettings,
    ) -> Selection {
        let limit = unit_cap(def, settings).unwrap_or(100);

        match self.store.pending_files(status_column, limit).await {
            Ok(rows) => {
                info!(job = %def.name, count = rows.len(), "pending files selected");
                Selection::new(rows.into_iter().map(|row| WorkUnit::File(row.file_path)).collect())
            }
            Err(e) => {
                warn!(job = %def.name, error = %e, "pending-file query failed, selecting nothing");
                Selection::empty()
            }
        }
    }

    async fn select_devices(&self, def: &JobDefinition, settings: &JobSettings) -> Selection {
        let date = self.resolve_date(def, settings);

        // A fixed device id in the settings pins the job to one device and
        // needs no store query.
        if let Some(device_id) = &settings.device_id {
            return Selection::new(vec![WorkUnit::Device {
                device_id: device_id.clone(),
                date,
            }]);
        }

        match self.store.devices_active_on(date).await {
            Ok(device_ids) => {
                info!(job = %def.name, %date, count = device_ids.len(), "active devices selected");
                Selection::new(
                    device_ids
                        .into_iter()
                        .map(|device_id| WorkUnit::Device { device_id, date })
                        .collect(),
                )
            }
            Err(e) => {
                warn!(
                    job = %def.name, %date, error = %e,
                    "device query failed, falling back to default device (degraded mode)"
                );
                Selection {
                    units: vec![WorkUnit::Device {
                        device_id: self.fallback_device_id.clone(),
                        date,
                    }],
                    degraded: true,
                }
            }
        }
    }

    async fn select_time_blocks(
        &self,
        def: &JobDefinition,
        source_tables: &[String],
        settings: &JobSettings,
    ) -> Selection {
        let cap = unit_cap(def, settings).unwrap_or(50);

        // A block pending in several stages must be submitted once.
        let mut seen = HashSet::new();
        for table in source_tables {
            match self.store.pending_time_blocks(table).await {
                Ok(keys) => {
                    for key in keys {
                        seen.insert(key);
                    }
                }
                Err(e) => {
                    warn!(job = %def.name, table = %table, error = %e, "status-table scan failed, skipping table");
                }
            }
        }

        let mut keys: Vec<_> = seen.into_iter().collect();
        keys.sort_by(|a, b| {
            (a.date, &a.time_block, &a.device_id).cmp(&(b.date, &b.time_block, &b.device_id))
        });
        keys.truncate(cap);

        info!(job = %def.name, count = keys.len(), "pending time blocks selected");

        Selection::new(
            keys.into_iter()
                .map(|key| WorkUnit::TimeBlock {
                    device_id: key.device_id,
                    date: key.date,
                    time_block: key.time_block,
                })
                .collect(),
        )
    }

    async fn select_records(
        &self,
        def: &JobDefinition,
        table: &str,
        settings: &JobSettings,
    ) -> Selection {
        let limit = unit_cap(def, settings).unwrap_or(10);

        match self.store.pending_dashboard_rows(table, limit).await {
            Ok(rows) => {
                info!(job = %def.name, count = rows.len(), "pending dashboard rows selected");
                Selection::new(rows.into_iter().map(WorkUnit::Record).collect())
            }
            Err(e) => {
                warn!(job = %def.name, error = %e, "dashboard query failed, selecting nothing");
                Selection::empty()
            }
        }
    }

    /// Resolves the processing date at selection time. `"today"` (or an
    /// absent date) means the current JST calendar date now, not the date
    /// the setting was saved.
    fn resolve_date(&self, def: &JobDefinition, settings: &JobSettings) -> NaiveDate {
        match settings.process_date.as_deref() {
            None => self.clock.today_jst(),
            Some(PROCESS_DATE_TODAY) => self.clock.today_jst(),
            Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(date) => date,
                Err(e) => {
                    warn!(job = %def.name, value = %raw, error = %e, "invalid processDate, using today");
                    self.clock.today_jst()
                }
            },
        }
    }
}

/// Per-cycle cap: settings override first, then the strategy default.
fn unit_cap(def: &JobDefinition, settings: &JobSettings) -> Option<usize> {
    settings.max_units.or(def.strategy.default_unit_cap())
}
