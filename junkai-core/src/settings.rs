//! Mutable per-job configuration document
//!
//! Owned by the configuration store and written only through the admin
//! surface; the dispatcher reads it once at the start of each cycle.
//! Persisted as a single JSON document. Field names match the historical
//! document so existing configs keep loading.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sentinel accepted in `process_date` meaning "the current JST calendar
/// date at selection time".
pub const PROCESS_DATE_TODAY: &str = "today";

/// The whole configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchSettings {
    #[serde(default)]
    pub apis: HashMap<String, JobSettings>,
    #[serde(default)]
    pub global: GlobalSettings,
}

impl DispatchSettings {
    /// Per-job settings, falling back to defaults for unconfigured jobs.
    pub fn job(&self, name: &str) -> JobSettings {
        self.apis.get(name).cloned().unwrap_or_default()
    }
}

/// Document-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            timezone: default_timezone(),
        }
    }
}

/// Mutable knobs for one job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSettings {
    #[serde(default)]
    pub enabled: bool,
    /// Invocation interval in hours, interpreted by the external
    /// supervisor; carried here so status queries can report it.
    #[serde(default = "default_interval")]
    pub interval: u32,
    /// Per-job override of the backend call timeout, in seconds.
    #[serde(default)]
    pub timeout: Option<u64>,
    /// Cap on units submitted per cycle; strategy default when absent.
    #[serde(default)]
    pub max_units: Option<usize>,
    /// Fixed device id for device-based jobs; all active devices when
    /// absent.
    #[serde(default, rename = "deviceId")]
    pub device_id: Option<String>,
    /// Fixed date (`YYYY-MM-DD`) or [`PROCESS_DATE_TODAY`]; resolved at
    /// selection time, not at configuration time.
    #[serde(default, rename = "processDate")]
    pub process_date: Option<String>,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: default_interval(),
            timeout: None,
            max_units: None,
            device_id: None,
            process_date: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_interval() -> u32 {
    3
}

fn default_timezone() -> String {
    "Asia/Tokyo".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_job_gets_defaults() {
        let settings = DispatchSettings::default();
        let job = settings.job("whisper");
        assert!(!job.enabled);
        assert_eq!(job.interval, 3);
        assert!(job.device_id.is_none());
    }

    #[test]
    fn historical_document_loads() {
        let doc = r#"{
            "apis": {
                "behavior-aggregator": {
                    "enabled": true,
                    "interval": 6,
                    "deviceId": "9f7d6e27-98c3-4c19-bdfb-f7fda58b9a93",
                    "processDate": "today"
                }
            },
            "global": { "enabled": true, "timezone": "Asia/Tokyo" }
        }"#;

        let settings: DispatchSettings = serde_json::from_str(doc).unwrap();
        let job = settings.job("behavior-aggregator");
        assert!(job.enabled);
        assert_eq!(job.interval, 6);
        assert_eq!(job.process_date.as_deref(), Some(PROCESS_DATE_TODAY));
        assert_eq!(settings.global.timezone, "Asia/Tokyo");
    }

    #[test]
    fn missing_fields_fall_back() {
        let settings: DispatchSettings = serde_json::from_str(r#"{"apis":{"whisper":{}}}"#).unwrap();
        let job = settings.job("whisper");
        assert!(!job.enabled);
        assert!(job.timeout.is_none());
        assert!(settings.global.enabled);
    }
}
